//! Match aggregate: membership, piece dealing, elimination and victory

use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerInfo};
use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::game::frequency_regulator::{MAX_SPEED, MIN_SPEED};
use crate::game::grid::Spectrum;
use crate::game::piece::Piece;
use crate::game::pool::{PiecePool, PoolPolicy};
use crate::types::{GameMode, MatchId, MatchStatus, PlayerId, PlayerStatus};

/// Speed of a new match when none is given
pub const DEFAULT_SPEED: u8 = 1;

/// Recognized match options. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchOptions {
    pub name: Option<MatchId>,
    pub mode: Option<GameMode>,
    pub max_players: Option<usize>,
    pub speed: Option<u8>,
}

impl MatchOptions {
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = Some(max_players);
        self
    }

    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_name(mut self, name: MatchId) -> Self {
        self.name = Some(name);
        self
    }
}

/// Read-only projection of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub name: MatchId,
    pub players: Vec<PlayerInfo>,
    pub max_players: usize,
    pub mode: GameMode,
    pub speed: u8,
    pub status: MatchStatus,
    pub leader_id: PlayerId,
    pub winner: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Match {
    name: MatchId,
    mode: GameMode,
    speed: u8,
    max_players: usize,
    max_players_limit: usize,
    status: MatchStatus,
    leader: PlayerId,
    // Username of the winner, set at most once per match lifetime
    winner: Option<String>,
    players: Vec<Player>,
    pool: PiecePool,
    pool_size: usize,
    pool_policy: PoolPolicy,
    pool_seed: Option<u64>,
    generation: u64,
}

fn generate_pool(size: usize, seed: Option<u64>, generation: u64) -> PiecePool {
    match seed {
        Some(seed) => PiecePool::with_seed(size, seed.wrapping_add(generation)),
        None => PiecePool::generate(size),
    }
}

impl Match {
    /// Create an idle match led by `leader`
    pub fn new(
        name: MatchId,
        leader: Player,
        options: &MatchOptions,
        config: &ArenaConfig,
    ) -> Result<Self> {
        let mut game_match = Match {
            name,
            mode: GameMode::default(),
            speed: DEFAULT_SPEED,
            max_players: config.default_max_players,
            max_players_limit: config.max_players_limit,
            status: MatchStatus::Idle,
            leader: leader.id().clone(),
            winner: None,
            players: vec![leader],
            pool: generate_pool(config.pool_size, config.pool_seed, 0),
            pool_size: config.pool_size,
            pool_policy: config.pool_policy,
            pool_seed: config.pool_seed,
            generation: 0,
        };
        game_match.apply_options(options)?;
        tracing::info!(
            "Match '{}' created by '{}' ({} players max, {:?}, speed {})",
            game_match.name,
            game_match.leader,
            game_match.max_players,
            game_match.mode,
            game_match.speed
        );
        Ok(game_match)
    }

    pub fn name(&self) -> &MatchId {
        &self.name
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn leader(&self) -> &PlayerId {
        &self.leader
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn pool(&self) -> &PiecePool {
        &self.pool
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    fn player_mut(&mut self, id: &PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| ArenaError::PlayerNotFound(id.clone()))
    }

    pub fn is_leader(&self, id: &PlayerId) -> bool {
        &self.leader == id
    }

    fn require_leader(&self, id: &PlayerId) -> Result<()> {
        if self.player(id).is_none() {
            return Err(ArenaError::PlayerNotFound(id.clone()));
        }
        if !self.is_leader(id) {
            return Err(ArenaError::NotLeader(id.clone()));
        }
        Ok(())
    }

    /// Members still on a live board
    pub fn playing(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_playing())
    }

    /// Append a member. Only allowed while the lobby is open.
    pub fn add_player(&mut self, player: Player) -> Result<()> {
        if self.status != MatchStatus::Idle {
            return Err(ArenaError::transition(self.status, "join"));
        }
        if let Some(existing) = self.player(player.id()) {
            return Err(ArenaError::AlreadyInMatch {
                player: existing.id().clone(),
                match_id: self.name.clone(),
            });
        }
        if self.players.len() >= self.max_players {
            return Err(ArenaError::MatchFull(self.name.clone()));
        }
        tracing::info!("Player '{}' joined match '{}'", player.id(), self.name);
        self.players.push(player);
        Ok(())
    }

    /// Remove a member, transferring leadership and re-running the
    /// elimination check if boards are live
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| ArenaError::PlayerNotFound(id.clone()))?;
        let removed = self.players.remove(index);
        tracing::info!("Player '{}' left match '{}'", id, self.name);

        if self.is_leader(id) {
            if let Some(next) = self.players.first() {
                self.leader = next.id().clone();
                tracing::info!("Match '{}' leadership moved to '{}'", self.name, self.leader);
            }
        }

        if self.status == MatchStatus::Playing && !self.players.is_empty() {
            self.check_elimination();
        }
        Ok(removed)
    }

    /// Deal the next pool piece to a member and advance its pointer
    pub fn deal_piece(&mut self, id: &PlayerId) -> Result<Piece> {
        let index = self
            .player(id)
            .map(Player::piece_index)
            .ok_or_else(|| ArenaError::PlayerNotFound(id.clone()))?;
        if self.status != MatchStatus::Playing {
            return Err(ArenaError::MatchNotPlaying(self.name.clone()));
        }

        if index >= self.pool.len() && self.pool_policy == PoolPolicy::Extend {
            self.pool.extend();
            tracing::debug!("Match '{}' pool extended to {} pieces", self.name, self.pool.len());
        }

        match self.pool.piece_at(index) {
            Ok(piece) => {
                self.player_mut(id)?.increment_piece_index();
                Ok(piece)
            }
            Err(e) => {
                tracing::warn!(
                    "Player '{}' exhausted the pool of match '{}', eliminating",
                    id,
                    self.name
                );
                self.report_game_over(id)?;
                Err(e)
            }
        }
    }

    /// Members that must receive a penalty for `count` cleared lines.
    ///
    /// Every other member still playing, in membership order. Nothing is
    /// sent for zero lines or outside of play.
    pub fn report_line_clear(&self, id: &PlayerId, count: u32) -> Result<Vec<PlayerId>> {
        if self.player(id).is_none() {
            return Err(ArenaError::PlayerNotFound(id.clone()));
        }
        if count == 0 || self.status != MatchStatus::Playing {
            return Ok(Vec::new());
        }
        Ok(self
            .playing()
            .filter(|p| p.id() != id)
            .map(|p| p.id().clone())
            .collect())
    }

    /// Mark a member KO and resolve the match if one player or less is left.
    ///
    /// Calling it again for a KO player or an ended match changes nothing.
    pub fn report_game_over(&mut self, id: &PlayerId) -> Result<()> {
        let status = self.status;
        let player = self.player_mut(id)?;
        match status {
            MatchStatus::Idle => return Err(ArenaError::transition(status, PlayerStatus::Ko)),
            MatchStatus::Ended => return Ok(()),
            MatchStatus::Playing => {}
        }
        if player.status() == PlayerStatus::Ko {
            return Ok(());
        }
        player.set_status(PlayerStatus::Ko);
        tracing::info!("Player '{}' is KO in match '{}'", id, self.name);

        if self.players.len() == 1 {
            let sole = self.players[0].username().to_string();
            self.end(Some(sole));
        } else {
            self.check_elimination();
        }
        Ok(())
    }

    // Ends the match when one playing member or none remains
    fn check_elimination(&mut self) {
        let remaining: Vec<String> = self
            .playing()
            .take(2)
            .map(|p| p.username().to_string())
            .collect();
        match remaining.as_slice() {
            [last] => self.end(Some(last.clone())),
            [] => self.end(None),
            _ => {}
        }
    }

    fn end(&mut self, winner: Option<String>) {
        if self.status == MatchStatus::Ended {
            return;
        }
        self.status = MatchStatus::Ended;
        self.winner = winner;
        match &self.winner {
            Some(winner) => tracing::info!("Match '{}' ended, winner '{}'", self.name, winner),
            None => tracing::info!("Match '{}' ended without a winner", self.name),
        }
    }

    pub fn update_spectrum(&mut self, id: &PlayerId, spectrum: Spectrum) -> Result<()> {
        self.player_mut(id)?.set_spectrum(spectrum);
        Ok(())
    }

    pub fn info(&self) -> MatchInfo {
        MatchInfo {
            name: self.name.clone(),
            players: self.players.iter().map(Player::info).collect(),
            max_players: self.max_players,
            mode: self.mode,
            speed: self.speed,
            status: self.status,
            leader_id: self.leader.clone(),
            winner: self.winner.clone(),
        }
    }

    /// Fresh pool, no winner, every player back to its initial state.
    /// The match status is left untouched.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.pool = generate_pool(self.pool_size, self.pool_seed, self.generation);
        self.winner = None;
        for player in self.players.iter_mut() {
            player.reset();
        }
        tracing::debug!("Match '{}' reset", self.name);
    }

    /// Leader starts play: idle -> playing, every member -> playing
    pub fn start(&mut self, by: &PlayerId) -> Result<()> {
        self.require_leader(by)?;
        if self.status != MatchStatus::Idle {
            return Err(ArenaError::transition(self.status, MatchStatus::Playing));
        }
        self.status = MatchStatus::Playing;
        for player in self.players.iter_mut() {
            player.set_status(PlayerStatus::Playing);
        }
        tracing::info!(
            "Match '{}' started with {} player(s)",
            self.name,
            self.players.len()
        );
        Ok(())
    }

    /// ended -> idle, so the same members can play again after `reset`
    pub fn open_lobby(&mut self) -> Result<()> {
        if self.status != MatchStatus::Ended {
            return Err(ArenaError::transition(self.status, MatchStatus::Idle));
        }
        self.status = MatchStatus::Idle;
        Ok(())
    }

    /// Leader changes options before play. Either every option is applied
    /// or none is.
    pub fn reconfigure(&mut self, by: &PlayerId, options: MatchOptions) -> Result<()> {
        self.require_leader(by)?;
        if self.status != MatchStatus::Idle {
            return Err(ArenaError::transition(self.status, "reconfigured"));
        }
        self.apply_options(&options)?;
        tracing::info!("Match '{}' reconfigured", self.name);
        Ok(())
    }

    fn apply_options(&mut self, options: &MatchOptions) -> Result<()> {
        if let Some(max_players) = options.max_players {
            if max_players == 0 || max_players > self.max_players_limit {
                return Err(ArenaError::InvalidOption(format!(
                    "max players must be between 1 and {}, got {}",
                    self.max_players_limit, max_players
                )));
            }
            if max_players < self.players.len() {
                return Err(ArenaError::InvalidOption(format!(
                    "max players {} is below the {} current members",
                    max_players,
                    self.players.len()
                )));
            }
        }
        if let Some(speed) = options.speed {
            if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
                return Err(ArenaError::InvalidOption(format!(
                    "speed must be between {} and {}, got {}",
                    MIN_SPEED, MAX_SPEED, speed
                )));
            }
        }

        if let Some(name) = &options.name {
            self.name = name.clone();
        }
        if let Some(mode) = options.mode {
            self.mode = mode;
        }
        if let Some(max_players) = options.max_players {
            self.max_players = max_players;
        }
        if let Some(speed) = options.speed {
            self.speed = speed;
        }
        Ok(())
    }
}

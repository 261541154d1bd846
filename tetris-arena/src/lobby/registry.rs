//! Owner of every match of a server
//!
//! All mutations go through `Match` operations. Each operation appends the
//! notifications it produces to `out`, in the order they must be delivered.

use std::collections::HashMap;

use super::game_match::{Match, MatchInfo, MatchOptions};
use super::player::Player;
use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::game::grid::Spectrum;
use crate::game::piece::Piece;
use crate::protocol::{Delivery, ServerEvent};
use crate::types::{MatchId, MatchStatus, PlayerId};

#[derive(Debug)]
pub struct Registry {
    config: ArenaConfig,
    matches: HashMap<MatchId, Match>,
    // Match each connected player belongs to
    members: HashMap<PlayerId, MatchId>,
}

// Send the current match projection to every member
fn broadcast_info(game_match: &Match, out: &mut Vec<Delivery>) {
    let info = game_match.info();
    for player in game_match.players() {
        out.push(Delivery::new(
            player.id().clone(),
            ServerEvent::MatchUpdated(info.clone()),
        ));
    }
}

impl Registry {
    pub fn new(config: ArenaConfig) -> Self {
        Registry {
            config,
            matches: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, name: &MatchId) -> Option<&Match> {
        self.matches.get(name)
    }

    /// Match the player currently belongs to
    pub fn match_of(&self, player: &PlayerId) -> Option<&MatchId> {
        self.members.get(player)
    }

    fn ensure_free(&self, player: &PlayerId) -> Result<()> {
        match self.members.get(player) {
            Some(match_id) => Err(ArenaError::AlreadyInMatch {
                player: player.clone(),
                match_id: match_id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn match_mut_of(&mut self, player: &PlayerId) -> Result<&mut Match> {
        let name = self
            .members
            .get(player)
            .ok_or_else(|| ArenaError::PlayerNotFound(player.clone()))?;
        self.matches
            .get_mut(name)
            .ok_or_else(|| ArenaError::MatchNotFound(name.clone()))
    }

    fn match_ref_of(&self, player: &PlayerId) -> Result<&Match> {
        let name = self
            .members
            .get(player)
            .ok_or_else(|| ArenaError::PlayerNotFound(player.clone()))?;
        self.matches
            .get(name)
            .ok_or_else(|| ArenaError::MatchNotFound(name.clone()))
    }

    pub fn create_match(
        &mut self,
        player: &PlayerId,
        name: MatchId,
        username: &str,
        options: &MatchOptions,
        out: &mut Vec<Delivery>,
    ) -> Result<MatchInfo> {
        self.ensure_free(player)?;
        // A name in the options overrides the requested one
        let name = options.name.clone().unwrap_or(name);
        if self.matches.contains_key(&name) {
            return Err(ArenaError::MatchAlreadyExists(name));
        }
        let game_match = Match::new(
            name,
            Player::new(player.clone(), username),
            options,
            &self.config,
        )?;
        let info = game_match.info();
        broadcast_info(&game_match, out);
        self.members.insert(player.clone(), info.name.clone());
        self.matches.insert(info.name.clone(), game_match);
        Ok(info)
    }

    pub fn join_match(
        &mut self,
        player: &PlayerId,
        name: &MatchId,
        username: &str,
        out: &mut Vec<Delivery>,
    ) -> Result<MatchInfo> {
        self.ensure_free(player)?;
        let game_match = self
            .matches
            .get_mut(name)
            .ok_or_else(|| ArenaError::MatchNotFound(name.clone()))?;
        game_match.add_player(Player::new(player.clone(), username))?;
        broadcast_info(game_match, out);
        let info = game_match.info();
        self.members.insert(player.clone(), name.clone());
        Ok(info)
    }

    /// Remove the player from its match. An emptied match is torn down.
    pub fn leave_match(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) -> Result<()> {
        let name = self
            .members
            .get(player)
            .cloned()
            .ok_or_else(|| ArenaError::PlayerNotFound(player.clone()))?;
        let game_match = self
            .matches
            .get_mut(&name)
            .ok_or_else(|| ArenaError::MatchNotFound(name.clone()))?;
        game_match.remove_player(player)?;
        self.members.remove(player);

        if game_match.is_empty() {
            self.matches.remove(&name);
            tracing::info!("Match '{}' has no members left, removed", name);
        } else {
            broadcast_info(game_match, out);
        }
        Ok(())
    }

    /// Connection lost: same as leaving, unknown players are ignored
    pub fn disconnect(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) {
        if !self.members.contains_key(player) {
            tracing::debug!("Disconnect of '{}' outside any match", player);
            return;
        }
        tracing::info!("Player '{}' disconnected", player);
        if let Err(e) = self.leave_match(player, out) {
            tracing::warn!("Failed to remove disconnected player '{}': {}", player, e);
        }
    }

    pub fn start_match(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) -> Result<MatchInfo> {
        let game_match = self.match_mut_of(player)?;
        game_match.start(player)?;
        broadcast_info(game_match, out);
        Ok(game_match.info())
    }

    /// Apply new options; a rename re-keys the match
    pub fn reconfigure(
        &mut self,
        player: &PlayerId,
        options: MatchOptions,
        out: &mut Vec<Delivery>,
    ) -> Result<MatchInfo> {
        let current = self
            .members
            .get(player)
            .cloned()
            .ok_or_else(|| ArenaError::PlayerNotFound(player.clone()))?;
        if let Some(new_name) = &options.name {
            if new_name != &current && self.matches.contains_key(new_name) {
                return Err(ArenaError::MatchAlreadyExists(new_name.clone()));
            }
        }

        let game_match = self.match_mut_of(player)?;
        game_match.reconfigure(player, options)?;
        broadcast_info(game_match, out);
        let info = game_match.info();

        if info.name != current {
            if let Some(game_match) = self.matches.remove(&current) {
                for member in game_match.players() {
                    self.members.insert(member.id().clone(), info.name.clone());
                }
                self.matches.insert(info.name.clone(), game_match);
                tracing::info!("Match '{}' renamed to '{}'", current, info.name);
            }
        }
        Ok(info)
    }

    /// Leader prepares a rematch: fresh pool and players, lobby reopened
    pub fn reset_match(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) -> Result<MatchInfo> {
        let game_match = self.match_mut_of(player)?;
        if game_match.player(player).is_none() {
            return Err(ArenaError::PlayerNotFound(player.clone()));
        }
        if !game_match.is_leader(player) {
            return Err(ArenaError::NotLeader(player.clone()));
        }
        if game_match.status() == MatchStatus::Playing {
            return Err(ArenaError::transition(MatchStatus::Playing, MatchStatus::Idle));
        }
        game_match.reset();
        if game_match.status() == MatchStatus::Ended {
            game_match.open_lobby()?;
        }
        broadcast_info(game_match, out);
        Ok(game_match.info())
    }

    /// `GET_PIECE`
    pub fn deal_piece(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) -> Result<Piece> {
        let game_match = self.match_mut_of(player)?;
        let result = game_match.deal_piece(player);
        if let Err(ArenaError::CapacityExceeded { .. }) = &result {
            broadcast_info(game_match, out);
        }
        result
    }

    /// `LINE`: fan a penalty out to every other playing member
    pub fn report_line_clear(
        &mut self,
        player: &PlayerId,
        count: u32,
        out: &mut Vec<Delivery>,
    ) -> Result<()> {
        let game_match = self.match_ref_of(player)?;
        let targets = game_match.report_line_clear(player, count)?;
        if !targets.is_empty() {
            tracing::debug!(
                "Player '{}' cleared {} line(s), penalizing {} opponent(s)",
                player,
                count,
                targets.len()
            );
        }
        for target in targets {
            out.push(Delivery::new(target, ServerEvent::LinePenalty(count)));
        }
        Ok(())
    }

    /// `SPECTRUM`: store it and relay it to the other members
    pub fn report_spectrum(
        &mut self,
        player: &PlayerId,
        spectrum: Spectrum,
        out: &mut Vec<Delivery>,
    ) -> Result<()> {
        let game_match = self.match_mut_of(player)?;
        game_match.update_spectrum(player, spectrum)?;
        for member in game_match.players().iter().filter(|p| p.id() != player) {
            out.push(Delivery::new(
                member.id().clone(),
                ServerEvent::Spectrum {
                    player: player.clone(),
                    spectrum,
                },
            ));
        }
        Ok(())
    }

    /// `GAME_OVER`
    pub fn report_game_over(&mut self, player: &PlayerId, out: &mut Vec<Delivery>) -> Result<()> {
        let game_match = self.match_mut_of(player)?;
        let before = (game_match.status(), game_match.player(player).map(Player::status));
        game_match.report_game_over(player)?;
        let after = (game_match.status(), game_match.player(player).map(Player::status));
        if before != after {
            broadcast_info(game_match, out);
        }
        Ok(())
    }

    /// Projection of the player's own match
    pub fn match_info(&self, player: &PlayerId) -> Result<MatchInfo> {
        Ok(self.match_ref_of(player)?.info())
    }

    pub fn info(&self, name: &MatchId) -> Result<MatchInfo> {
        self.matches
            .get(name)
            .map(Match::info)
            .ok_or_else(|| ArenaError::MatchNotFound(name.clone()))
    }

    /// Every match, sorted by name
    pub fn list(&self) -> Vec<MatchInfo> {
        let mut infos: Vec<MatchInfo> = self.matches.values().map(Match::info).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Action, Board, StepResult};
    use crate::game::grid::{Grid, GRID_HEIGHT};
    use crate::game::piece::PieceType;
    use crate::types::PlayerStatus;

    fn pid(name: &str) -> PlayerId {
        PlayerId::from_name(name).unwrap()
    }

    fn mid(name: &str) -> MatchId {
        MatchId::from_name(name).unwrap()
    }

    fn registry_with(players: &[&str]) -> (Registry, Vec<Delivery>) {
        let config = ArenaConfig::default()
            .with_pool_seed(1)
            .with_default_max_players(4);
        let mut registry = Registry::new(config);
        let mut out = Vec::new();
        let options = MatchOptions::default();
        registry
            .create_match(&pid(players[0]), mid("room"), players[0], &options, &mut out)
            .unwrap();
        for name in &players[1..] {
            registry.join_match(&pid(name), &mid("room"), name, &mut out).unwrap();
        }
        (registry, out)
    }

    #[test]
    fn test_create_and_join() {
        let (registry, out) = registry_with(&["a", "b"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.match_of(&pid("b")), Some(&mid("room")));
        // Creator notified once, then both members after the join
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|d| matches!(d.event, ServerEvent::MatchUpdated(_))));
    }

    #[test]
    fn test_create_uses_name_from_options() {
        let (mut registry, mut out) = registry_with(&["a"]);
        let taken = MatchOptions::default().with_name(mid("room"));
        assert!(matches!(
            registry.create_match(&pid("b"), mid("fresh"), "b", &taken, &mut out),
            Err(ArenaError::MatchAlreadyExists(name)) if name == mid("room")
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.match_of(&pid("b")), None);

        let renamed = MatchOptions::default().with_name(mid("arena"));
        let info = registry
            .create_match(&pid("b"), mid("fresh"), "b", &renamed, &mut out)
            .unwrap();
        assert_eq!(info.name, mid("arena"));
        assert!(registry.get(&mid("fresh")).is_none());
        assert_eq!(registry.match_of(&pid("b")), Some(&mid("arena")));

        registry.join_match(&pid("c"), &mid("arena"), "c", &mut out).unwrap();
        assert_eq!(registry.info(&mid("arena")).unwrap().players.len(), 2);
        assert_eq!(registry.info(&mid("room")).unwrap().players.len(), 1);
        let names: Vec<MatchId> = registry.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec![mid("arena"), mid("room")]);
    }

    #[test]
    fn test_duplicate_names_and_membership() {
        let (mut registry, mut out) = registry_with(&["a"]);
        assert!(matches!(
            registry.create_match(&pid("b"), mid("room"), "b", &MatchOptions::default(), &mut out),
            Err(ArenaError::MatchAlreadyExists(_))
        ));
        assert!(matches!(
            registry.create_match(&pid("a"), mid("other"), "a", &MatchOptions::default(), &mut out),
            Err(ArenaError::AlreadyInMatch { .. })
        ));
        assert!(matches!(
            registry.join_match(&pid("b"), &mid("nowhere"), "b", &mut out),
            Err(ArenaError::MatchNotFound(_))
        ));
    }

    #[test]
    fn test_line_clear_penalizes_opponent() {
        let (mut registry, _) = registry_with(&["a", "b"]);
        let mut out = Vec::new();
        registry.start_match(&pid("a"), &mut out).unwrap();

        // Player A fills the last hole of its bottom row with a vertical I
        let mut board_a = Board::from_grid(Grid::from_rows(&["LLLLLLLLL."]), 1);
        assert!(board_a.spawn(Piece::spawn(PieceType::I).rotated().moved(4, 0)));
        let StepResult::Locked { lines_removed } = board_a.apply(Action::Drop) else {
            panic!("expected a lock");
        };
        assert_eq!(lines_removed, 1);

        out.clear();
        registry.report_line_clear(&pid("a"), lines_removed, &mut out).unwrap();
        assert_eq!(out, vec![Delivery::new(pid("b"), ServerEvent::LinePenalty(1))]);

        let ServerEvent::LinePenalty(lines) = out[0].event.clone() else {
            panic!("expected a penalty");
        };
        let mut board_b = Board::with_seed(2);
        assert!(board_b.apply_penalty(lines));
        assert_eq!(board_b.grid().rows(), GRID_HEIGHT);
        assert_eq!(board_b.spectrum().max_height(), 1);
    }

    #[test]
    fn test_penalties_are_not_coalesced() {
        let (mut registry, _) = registry_with(&["a", "b", "c"]);
        let mut out = Vec::new();
        registry.start_match(&pid("a"), &mut out).unwrap();
        out.clear();

        registry.report_line_clear(&pid("a"), 1, &mut out).unwrap();
        registry.report_line_clear(&pid("a"), 2, &mut out).unwrap();
        let for_b: Vec<ServerEvent> = out
            .iter()
            .filter(|d| d.to == pid("b"))
            .map(|d| d.event.clone())
            .collect();
        assert_eq!(
            for_b,
            vec![ServerEvent::LinePenalty(1), ServerEvent::LinePenalty(2)]
        );
        assert!(out.iter().all(|d| d.to != pid("a")));
    }

    #[test]
    fn test_spectrum_is_relayed_to_others() {
        let (mut registry, _) = registry_with(&["a", "b"]);
        let mut out = Vec::new();
        let spectrum = Spectrum::new(vec![19; 10]).unwrap();
        registry.report_spectrum(&pid("a"), spectrum, &mut out).unwrap();
        assert_eq!(
            out,
            vec![Delivery::new(
                pid("b"),
                ServerEvent::Spectrum {
                    player: pid("a"),
                    spectrum
                }
            )]
        );
        let info = registry.match_info(&pid("b")).unwrap();
        assert_eq!(info.players[0].spectrum, spectrum);
    }

    #[test]
    fn test_game_over_broadcasts_result_once() {
        let (mut registry, _) = registry_with(&["a", "b"]);
        let mut out = Vec::new();
        registry.start_match(&pid("a"), &mut out).unwrap();
        out.clear();

        registry.report_game_over(&pid("b"), &mut out).unwrap();
        assert_eq!(out.len(), 2);
        let ServerEvent::MatchUpdated(info) = &out[0].event else {
            panic!("expected match update");
        };
        assert_eq!(info.status, MatchStatus::Ended);
        assert_eq!(info.winner.as_deref(), Some("a"));

        out.clear();
        registry.report_game_over(&pid("b"), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_disconnect_tears_down_empty_match() {
        let (mut registry, _) = registry_with(&["a", "b"]);
        let mut out = Vec::new();
        registry.start_match(&pid("a"), &mut out).unwrap();

        registry.disconnect(&pid("a"), &mut out);
        let info = registry.info(&mid("room")).unwrap();
        assert_eq!(info.leader_id, pid("b"));
        assert_eq!(info.status, MatchStatus::Ended);
        assert_eq!(info.winner.as_deref(), Some("b"));

        registry.disconnect(&pid("b"), &mut out);
        assert!(registry.is_empty());
        assert!(registry.match_of(&pid("b")).is_none());

        // Unknown players are ignored
        registry.disconnect(&pid("ghost"), &mut out);
    }

    #[test]
    fn test_reconfigure_rename_rekeys() {
        let (mut registry, mut out) = registry_with(&["a", "b"]);
        registry
            .create_match(&pid("c"), mid("taken"), "c", &MatchOptions::default(), &mut out)
            .unwrap();
        assert!(matches!(
            registry.reconfigure(
                &pid("a"),
                MatchOptions::default().with_name(mid("taken")),
                &mut out
            ),
            Err(ArenaError::MatchAlreadyExists(_))
        ));

        let info = registry
            .reconfigure(&pid("a"), MatchOptions::default().with_name(mid("arena")), &mut out)
            .unwrap();
        assert_eq!(info.name, mid("arena"));
        assert!(registry.get(&mid("room")).is_none());
        assert!(registry.get(&mid("arena")).is_some());
        assert_eq!(registry.match_of(&pid("b")), Some(&mid("arena")));
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_reset_reopens_lobby() {
        let (mut registry, _) = registry_with(&["a", "b"]);
        let mut out = Vec::new();
        registry.start_match(&pid("a"), &mut out).unwrap();
        assert!(matches!(
            registry.reset_match(&pid("a"), &mut out),
            Err(ArenaError::InvalidStateTransition { .. })
        ));

        registry.report_game_over(&pid("a"), &mut out).unwrap();
        assert!(matches!(
            registry.reset_match(&pid("b"), &mut out),
            Err(ArenaError::NotLeader(_))
        ));
        let info = registry.reset_match(&pid("a"), &mut out).unwrap();
        assert_eq!(info.status, MatchStatus::Idle);
        assert_eq!(info.winner, None);
        assert!(info.players.iter().all(|p| p.status == PlayerStatus::Waiting));
    }

    #[test]
    fn test_unknown_player_requests() {
        let (mut registry, _) = registry_with(&["a"]);
        let mut out = Vec::new();
        assert!(matches!(
            registry.deal_piece(&pid("zed"), &mut out),
            Err(ArenaError::PlayerNotFound(_))
        ));
        assert!(matches!(
            registry.leave_match(&pid("zed"), &mut out),
            Err(ArenaError::PlayerNotFound(_))
        ));
        assert!(out.is_empty());
    }
}

//! Automatic player: joins a match and drives a board with random moves

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tetris_arena::game::frequency_regulator::STEPS_PER_SECOND;
use tetris_arena::game::{Action, BoardClient, Outbound};
use tetris_arena::lobby::{MatchInfo, MatchOptions};
use tetris_arena::{ArenaClient, ArenaError, MatchId, MatchStatus, ServerEvent};

const ACTIONS: [Action; 4] = [
    Action::MoveLeft,
    Action::MoveRight,
    Action::Rotate,
    Action::MoveDown,
];

#[derive(Debug, Clone)]
pub struct BotOptions {
    pub match_name: MatchId,
    pub username: String,
    /// Options applied when this bot creates the match
    pub options: MatchOptions,
    /// Players the leader waits for before starting
    pub wait_for: usize,
}

/// Join or create the match, play it to the end and leave
pub async fn play(client: &ArenaClient, bot: BotOptions) -> anyhow::Result<()> {
    let info = enter_match(client, &bot).await?;
    let info = wait_for_start(client, &bot, info).await?;
    println!(
        "Match '{}' started with {} player(s) at speed {}",
        info.name,
        info.players.len(),
        info.speed
    );

    let ended = drive_board(client, info.speed).await?;
    match &ended.winner {
        Some(winner) if *winner == bot.username => println!("You win!"),
        Some(winner) => println!("Winner: {}", winner),
        None => println!("No winner"),
    }

    client.leave_match().await?;
    Ok(())
}

async fn enter_match(client: &ArenaClient, bot: &BotOptions) -> anyhow::Result<MatchInfo> {
    match client
        .join_match(bot.match_name.clone(), bot.username.clone())
        .await
    {
        Ok(info) => {
            tracing::info!("Joined match '{}'", info.name);
            Ok(info)
        }
        Err(ArenaError::Rejected(reason)) => {
            tracing::debug!("Join refused ({}), creating match", reason);
            let info = client
                .create_match(
                    bot.match_name.clone(),
                    bot.username.clone(),
                    bot.options.clone(),
                )
                .await?;
            tracing::info!("Created match '{}'", info.name);
            Ok(info)
        }
        Err(e) => Err(e.into()),
    }
}

async fn wait_for_start(
    client: &ArenaClient,
    bot: &BotOptions,
    mut info: MatchInfo,
) -> anyhow::Result<MatchInfo> {
    loop {
        if info.status == MatchStatus::Playing {
            return Ok(info);
        }
        let leader = info.leader_id == *client.player();
        if leader && info.players.len() >= bot.wait_for.min(info.max_players) {
            return Ok(client.start_match().await?);
        }
        tracing::info!(
            "Waiting in '{}': {}/{} player(s)",
            info.name,
            info.players.len(),
            info.max_players
        );
        // Leadership and membership changes arrive as match updates
        loop {
            if let ServerEvent::MatchUpdated(updated) = client.recv().await? {
                info = updated;
                break;
            }
        }
    }
}

/// Run the board until the match ends, returning the final match info
async fn drive_board(client: &ArenaClient, speed: u8) -> anyhow::Result<MatchInfo> {
    let mut board = BoardClient::new(speed);
    let mut rng = StdRng::from_os_rng();
    let mut ticker = tokio::time::interval(Duration::from_millis(1000 / STEPS_PER_SECOND as u64));

    board.start();
    flush(client, &mut board).await?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !board.is_terminal() {
                    if rng.random_bool(0.2) {
                        board.add_action(ACTIONS[rng.random_range(0..ACTIONS.len())]);
                    } else if rng.random_bool(0.02) {
                        board.add_action(Action::Drop);
                    }
                    board.step();
                }
                flush(client, &mut board).await?;
            }
            event = client.recv() => {
                match event? {
                    ServerEvent::LinePenalty(lines) => {
                        tracing::info!("Received {} penalty line(s)", lines);
                        board.on_penalty(lines);
                        flush(client, &mut board).await?;
                    }
                    ServerEvent::Spectrum { player, spectrum } => {
                        tracing::debug!("Spectrum of '{}': {:?}", player, spectrum);
                    }
                    ServerEvent::MatchUpdated(info) => {
                        if info.status == MatchStatus::Ended {
                            return Ok(info);
                        }
                    }
                }
            }
        }
    }
}

/// Send every pending board output in order
async fn flush(client: &ArenaClient, board: &mut BoardClient) -> anyhow::Result<()> {
    loop {
        let outbox = board.drain_outbox();
        if outbox.is_empty() {
            return Ok(());
        }
        for outbound in outbox {
            match outbound {
                Outbound::RequestPiece => match client.get_piece().await {
                    Ok(piece) => board.receive_piece(piece),
                    Err(e) => {
                        tracing::warn!("No piece dealt: {}", e);
                        board.abandon();
                    }
                },
                Outbound::Fire(event) => client.fire(&event).await?,
            }
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tetris_arena::game::pool::PoolPolicy;
use tetris_arena::lobby::MatchOptions;
use tetris_arena::name_generator::generate_player_name;
use tetris_arena::{ArenaClient, ArenaConfig, ArenaHost, GameMode, MatchId, PlayerId, ServerCommand};
use zenoh::key_expr::KeyExpr;

mod bot;

/// z_tetris - multiplayer Tetris over Zenoh
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Key expression prefix
    #[arg(short, long, global = true)]
    prefix: Option<KeyExpr<'static>>,

    /// Path to Zenoh config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve matches until interrupted
    Host {
        /// Pieces per pool batch
        #[arg(long, default_value_t = 100)]
        pool_size: usize,

        /// Append a new batch when a player reaches the end of the pool
        #[arg(long)]
        extend_pool: bool,
    },
    /// Join a match, creating it if needed, and let a bot play it
    Play {
        /// Player name (generated when omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// Match name
        #[arg(short, long = "match", default_value = "lobby")]
        match_name: String,

        /// Capacity of a created match
        #[arg(long)]
        max_players: Option<usize>,

        /// Gravity of a created match (1-5)
        #[arg(long)]
        speed: Option<u8>,

        /// Mode of a created match: classic or invisible
        #[arg(long)]
        mode: Option<GameMode>,

        /// Players to wait for before the leader starts the match
        #[arg(short, long, default_value_t = 2)]
        wait_for: usize,
    },
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let zenoh_config = if let Some(config_path) = args.config {
        zenoh::Config::from_file(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        zenoh::Config::default()
    };

    let session = zenoh::open(zenoh_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open zenoh session: {}", e))?;

    let mut config = ArenaConfig::default();
    if let Some(prefix) = &args.prefix {
        config = config.with_keyexpr_prefix(prefix.to_string());
    }

    println!("=== z_tetris ===");
    println!("Prefix: {}", config.keyexpr_prefix);

    match args.command {
        Command::Host {
            pool_size,
            extend_pool,
        } => {
            let policy = if extend_pool {
                PoolPolicy::Extend
            } else {
                PoolPolicy::Fixed
            };
            let config = config.with_pool_size(pool_size).with_pool_policy(policy);
            let host = ArenaHost::declare(&session, config).await?;

            let stop = host.sender();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    println!("→ Stopping host");
                    if let Err(e) = stop.send(ServerCommand::Stop) {
                        tracing::warn!("Host already stopped: {}", e);
                    }
                }
            });

            println!("Hosting matches, press Ctrl-C to stop");
            host.run().await?;
        }
        Command::Play {
            name,
            match_name,
            max_players,
            speed,
            mode,
            wait_for,
        } => {
            let username = name.unwrap_or_else(generate_player_name);
            let player =
                PlayerId::from_name(username.clone()).unwrap_or_else(|_| PlayerId::generate());
            println!("Player: {} ({})", username, player);

            let mut options = MatchOptions::default();
            if let Some(max_players) = max_players {
                options = options.with_max_players(max_players);
            }
            if let Some(speed) = speed {
                options = options.with_speed(speed);
            }
            if let Some(mode) = mode {
                options = options.with_mode(mode);
            }

            let client = ArenaClient::connect(&session, &config, player).await?;
            bot::play(
                &client,
                bot::BotOptions {
                    match_name: MatchId::from_name(match_name)?,
                    username,
                    options,
                    wait_for,
                },
            )
            .await?;
        }
    }

    session
        .close()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to close zenoh session: {}", e))?;
    Ok(())
}

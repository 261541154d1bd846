//! # tetris-arena
//!
//! Multiplayer Tetris match engine and its synchronization protocol over Zenoh.
//!
//! ## Overview
//!
//! Every player runs a local [`game::Board`] fed from a piece pool shared by
//! the whole match, so all boards see the same piece sequence. The match
//! server tracks players and matches, deals pieces, turns line clears into
//! penalties for the opponents, relays board spectrums and decides the
//! winner when everyone else has topped out.
//!
//! ## Layers
//!
//! - [`game`]: pieces, grid, shared pool, board engine and the client-side
//!   board driver
//! - [`lobby`]: players, matches and the registry of open matches
//! - [`protocol`] and [`server`]: request/event messages and the single-threaded
//!   command loop applying them
//! - [`network`]: zenoh binding of the server ([`ArenaHost`]) and of a
//!   player ([`ArenaClient`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use tetris_arena::{ArenaClient, ArenaConfig, ArenaHost, MatchId, PlayerId};
//! use tetris_arena::lobby::MatchOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let session = zenoh::open(zenoh::Config::default()).await?;
//!     let config = ArenaConfig::default();
//!
//!     let host = ArenaHost::declare(&session, config.clone()).await?;
//!     tokio::spawn(host.run());
//!
//!     let client = ArenaClient::connect(&session, &config, PlayerId::generate()).await?;
//!     let info = client
//!         .create_match(MatchId::from_name("lobby")?, "Vega", MatchOptions::default())
//!         .await?;
//!     println!("Created match {}", info.name);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod game;
pub mod lobby;
pub mod name_generator;
pub mod network;
pub mod protocol;
pub mod server;
pub mod types;

// Re-exports for convenience
pub use config::ArenaConfig;
pub use error::{ArenaError, Result};
pub use network::{ArenaClient, ArenaHost};
pub use protocol::{ClientEvent, Delivery, Request, Response, ServerEvent};
pub use server::{MatchServer, ServerCommand};
pub use types::{GameMode, MatchId, MatchStatus, PlayerId, PlayerStatus};

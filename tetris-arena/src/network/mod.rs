//! Zenoh transport for the match server

pub mod client;
pub mod codec;
pub mod host;
pub mod keyexpr;
pub mod liveliness;
pub mod publisher;
pub mod queryable;
pub mod subscriber;

pub use client::ArenaClient;
pub use host::ArenaHost;
pub use keyexpr::{ArenaKeyexpr, Channel};
pub use liveliness::{PlayerLivelinessToken, PlayerLivelinessWatch, Presence};

//! Players, matches and the registry that owns them

pub mod game_match;
pub mod player;
pub mod registry;

pub use game_match::{Match, MatchInfo, MatchOptions};
pub use player::{Player, PlayerInfo};
pub use registry::Registry;

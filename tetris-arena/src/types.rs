//! Core types for the tetris-arena library

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

/// Check that a string can be used as a single keyexpr chunk
///
/// - Non-empty UTF-8 string
/// - Cannot contain: / * $ ? # @
fn validate_chunk(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(ArenaError::InvalidName("Name cannot be empty".to_string()));
    }

    for ch in s.chars() {
        if matches!(ch, '/' | '*' | '$' | '?' | '#' | '@') {
            return Err(ArenaError::InvalidName(format!(
                "Name '{}' contains invalid character '{}'",
                s, ch
            )));
        }
    }

    Ok(())
}

/// Unique player (connection) identifier
///
/// PlayerId is used as a keyexpr chunk on the wire, so it follows the same
/// character rules as a match name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Generate a new unique player ID (guaranteed to be keyexpr-safe)
    /// Uses base58 encoding of UUID to avoid special characters
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let encoded = bs58::encode(uuid.as_bytes()).into_string();
        // Take first 16 characters for reasonable length
        let shortened = encoded.chars().take(16).collect::<String>();
        PlayerId(shortened)
    }

    /// Create from a specific name (must be unique and keyexpr-compatible)
    pub fn from_name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_chunk(&name)?;
        Ok(PlayerId(name))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ArenaError;

    fn try_from(value: String) -> Result<Self> {
        PlayerId::from_name(value)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Match name, unique within a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    /// Create from a user supplied name
    pub fn from_name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_chunk(&name)?;
        Ok(MatchId(name))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MatchId {
    type Error = ArenaError;

    fn try_from(value: String) -> Result<Self> {
        MatchId::from_name(value)
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a player inside a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// In the lobby, waiting for the leader to start
    #[default]
    Waiting,
    /// Board is live
    Playing,
    /// Board topped out (or the player ran out of pieces)
    #[serde(rename = "KO")]
    Ko,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Waiting => write!(f, "waiting"),
            PlayerStatus::Playing => write!(f, "playing"),
            PlayerStatus::Ko => write!(f, "KO"),
        }
    }
}

/// Match-wide status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Lobby open, players may join
    #[default]
    Idle,
    /// Boards are live
    Playing,
    /// Zero or one player left standing
    Ended,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Idle => write!(f, "idle"),
            MatchStatus::Playing => write!(f, "playing"),
            MatchStatus::Ended => write!(f, "ended"),
        }
    }
}

/// Game mode selected by the leader
///
/// Invisible mode only changes what the client draws: locked cells are
/// hidden, the engine rules are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Invisible,
}

impl std::str::FromStr for GameMode {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "classic" => Ok(GameMode::Classic),
            "invisible" => Ok(GameMode::Invisible),
            other => Err(ArenaError::InvalidOption(format!(
                "unknown mode '{}', expected 'classic' or 'invisible'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_generation() {
        let id1 = PlayerId::generate();
        let id2 = PlayerId::generate();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
        assert!(PlayerId::from_name(id1.as_str()).is_ok());
    }

    #[test]
    fn test_invalid_characters() {
        assert!(PlayerId::from_name("has/slash").is_err());
        assert!(PlayerId::from_name("has*star").is_err());
        assert!(MatchId::from_name("has$dollar").is_err());
        assert!(MatchId::from_name("has?question").is_err());
        assert!(MatchId::from_name("has#hash").is_err());
        assert!(MatchId::from_name("has@at").is_err());
        assert!(MatchId::from_name("").is_err());
    }

    #[test]
    fn test_ids_reject_invalid_json() {
        let parsed: std::result::Result<MatchId, _> = serde_json::from_str("\"a/b\"");
        assert!(parsed.is_err());

        let parsed: MatchId = serde_json::from_str("\"room42\"").unwrap();
        assert_eq!(parsed.as_str(), "room42");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&PlayerStatus::Ko).unwrap(), "\"KO\"");
        assert_eq!(serde_json::to_string(&PlayerStatus::Waiting).unwrap(), "\"waiting\"");
        assert_eq!(serde_json::to_string(&MatchStatus::Ended).unwrap(), "\"ended\"");
    }

    #[test]
    fn test_game_mode_parse() {
        assert_eq!("invisible".parse::<GameMode>().unwrap(), GameMode::Invisible);
        assert!("hard".parse::<GameMode>().is_err());
    }
}

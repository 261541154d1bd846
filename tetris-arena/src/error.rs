//! Error types for the tetris-arena library

use thiserror::Error;

use crate::types::{MatchId, PlayerId};

/// Result type alias for arena operations
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Errors that can occur in tetris-arena operations
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Zenoh-related errors
    #[error("Zenoh error: {0}")]
    Zenoh(#[from] zenoh::Error),

    /// Invalid player or match name provided
    #[error("Invalid name: {0}. Must be a valid single-chunk keyexpr (no /, *, $, ?, #, @)")]
    InvalidName(String),

    /// Invalid keyexpr pattern
    #[error("Invalid keyexpr: {0}")]
    InvalidKeyexpr(String),

    /// Player id does not resolve to a member of the addressed match
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Match name does not resolve to a registered match
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// A match with the same name is already registered
    #[error("Match already exists: {0}")]
    MatchAlreadyExists(MatchId),

    /// Player is already a member of a match
    #[error("Player '{player}' already belongs to match '{match_id}'")]
    AlreadyInMatch {
        /// Player trying to join
        player: PlayerId,
        /// Match the player currently belongs to
        match_id: MatchId,
    },

    /// Match has reached its configured capacity
    #[error("Match '{0}' is full")]
    MatchFull(MatchId),

    /// Gameplay request while boards are not live
    #[error("Match '{0}' is not in play")]
    MatchNotPlaying(MatchId),

    /// Operation reserved to the match leader
    #[error("Player '{0}' is not the match leader")]
    NotLeader(PlayerId),

    /// Invalid state transition attempted
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Piece requested beyond the generated pool
    #[error("Piece pool exhausted: index {index} is outside a pool of {len} pieces")]
    CapacityExceeded {
        /// Requested pool index
        index: usize,
        /// Pool length at the time of the request
        len: usize,
    },

    /// Rejected reconfiguration option
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Spectrum with the wrong shape or out-of-range heights
    #[error("Invalid spectrum: {0}")]
    InvalidSpectrum(String),

    /// Request refused by the remote match server
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Unexpected response to a request
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying zenoh channel is gone (session closed or entity undeclared)
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Operation timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArenaError {
    /// Shorthand for a rejected status change
    pub(crate) fn transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        ArenaError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArenaError {
    fn from(e: serde_json::Error) -> Self {
        ArenaError::Serialization(e.to_string())
    }
}

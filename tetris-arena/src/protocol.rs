//! Messages exchanged between a player's board and the match server
//!
//! | Message        | Direction                 | Kind         |
//! |----------------|---------------------------|--------------|
//! | `GET_PIECE`    | board -> match            | request/ack  |
//! | `LINE`         | board -> match            | fire         |
//! | `LINE_PENALTY` | match -> other boards     | fan-out      |
//! | `SPECTRUM`     | board -> match -> others  | fan-out      |
//! | `GAME_OVER`    | board -> match            | fire         |
//!
//! Lobby operations (create, join, start...) travel as requests too. Every
//! message is serialized as JSON with an `event` tag.

use serde::{Deserialize, Serialize};

use crate::game::grid::Spectrum;
use crate::game::piece::Piece;
use crate::lobby::game_match::{MatchInfo, MatchOptions};
use crate::types::{MatchId, PlayerId};

/// Request expecting exactly one reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    CreateMatch {
        name: MatchId,
        username: String,
        #[serde(default)]
        options: MatchOptions,
    },
    JoinMatch {
        name: MatchId,
        username: String,
    },
    LeaveMatch,
    StartMatch,
    Reconfigure(MatchOptions),
    ResetMatch,
    GetPiece,
    MatchInfo,
    ListMatches,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::CreateMatch { .. } => "CREATE_MATCH",
            Request::JoinMatch { .. } => "JOIN_MATCH",
            Request::LeaveMatch => "LEAVE_MATCH",
            Request::StartMatch => "START_MATCH",
            Request::Reconfigure(_) => "RECONFIGURE",
            Request::ResetMatch => "RESET_MATCH",
            Request::GetPiece => "GET_PIECE",
            Request::MatchInfo => "MATCH_INFO",
            Request::ListMatches => "LIST_MATCHES",
        }
    }
}

/// Successful reply to a `Request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Joined(MatchInfo),
    Left,
    Piece(Piece),
    Info(MatchInfo),
    Matches(Vec<MatchInfo>),
}

/// Fire-and-forget report from a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// Rows removed by the last lock, zero included
    Line(u32),
    Spectrum(Spectrum),
    GameOver,
}

/// Notification pushed by the match server to one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    LinePenalty(u32),
    Spectrum { player: PlayerId, spectrum: Spectrum },
    MatchUpdated(MatchInfo),
}

/// A server event addressed to one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: ServerEvent,
}

impl Delivery {
    pub fn new(to: PlayerId, event: ServerEvent) -> Self {
        Delivery { to, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_on_the_wire() {
        let json = serde_json::to_value(ClientEvent::Line(2)).unwrap();
        assert_eq!(json["event"], "LINE");
        assert_eq!(json["payload"], 2);

        let json = serde_json::to_value(ClientEvent::GameOver).unwrap();
        assert_eq!(json["event"], "GAME_OVER");

        let json = serde_json::to_value(ServerEvent::LinePenalty(1)).unwrap();
        assert_eq!(json["event"], "LINE_PENALTY");

        let json = serde_json::to_value(Request::GetPiece).unwrap();
        assert_eq!(json["event"], Request::GetPiece.name());
    }

    #[test]
    fn test_spectrum_event_is_validated() {
        let bad = r#"{"event":"SPECTRUM","payload":[1,2,3]}"#;
        assert!(serde_json::from_str::<ClientEvent>(bad).is_err());

        let good = r#"{"event":"SPECTRUM","payload":[20,20,20,20,20,15,20,20,20,20]}"#;
        match serde_json::from_str::<ClientEvent>(good).unwrap() {
            ClientEvent::Spectrum(spectrum) => assert_eq!(spectrum[5], 15),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_create_request_defaults_options() {
        let json = r#"{"event":"CREATE_MATCH","payload":{"name":"room","username":"ann"}}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            Request::CreateMatch {
                name: MatchId::from_name("room").unwrap(),
                username: "ann".to_string(),
                options: MatchOptions::default(),
            }
        );
    }

    #[test]
    fn test_invalid_match_name_rejected() {
        let json = r#"{"event":"JOIN_MATCH","payload":{"name":"a/b","username":"ann"}}"#;
        assert!(serde_json::from_str::<Request>(json).is_err());
    }
}

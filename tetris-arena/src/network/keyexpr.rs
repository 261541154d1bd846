//! Key expression types for match server traffic

use crate::error::ArenaError;
use crate::types::PlayerId;
use zenoh::key_expr::KeyExpr;

/// Traffic class carried under the arena prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Request/reply, served by the host queryable
    Request,
    /// Board reports published by a player
    Event,
    /// Server notifications published for a player
    Notify,
    /// Liveliness token of a connected player
    Alive,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Request => "request",
            Channel::Event => "event",
            Channel::Notify => "notify",
            Channel::Alive => "alive",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "request" => Some(Channel::Request),
            "event" => Some(Channel::Event),
            "notify" => Some(Channel::Notify),
            "alive" => Some(Channel::Alive),
            _ => None,
        }
    }
}

/// Arena keyexpr
///
/// Pattern: `<prefix>/<channel>/<player_id>`, or `<prefix>/<channel>/*`
/// when `player` is None.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaKeyexpr {
    prefix: String,
    channel: Channel,
    player: Option<PlayerId>,
}

impl ArenaKeyexpr {
    pub fn new(prefix: &KeyExpr<'_>, channel: Channel, player: Option<PlayerId>) -> Self {
        Self {
            prefix: prefix.to_string(),
            channel,
            player,
        }
    }

    /// Keyexpr matching every player on a channel
    pub fn any(prefix: &KeyExpr<'_>, channel: Channel) -> Self {
        Self::new(prefix, channel, None)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn player(&self) -> Option<&PlayerId> {
        self.player.as_ref()
    }
}

impl TryFrom<KeyExpr<'_>> for ArenaKeyexpr {
    type Error = ArenaError;

    fn try_from(keyexpr: KeyExpr<'_>) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = keyexpr.as_str().split('/').collect();

        // Expected pattern: [...prefix]/<channel>/<player_id or *>
        if parts.len() < 3 {
            return Err(ArenaError::InvalidKeyexpr(format!(
                "Invalid arena keyexpr pattern: {}",
                keyexpr.as_str()
            )));
        }
        let channel = Channel::parse(parts[parts.len() - 2]).ok_or_else(|| {
            ArenaError::InvalidKeyexpr(format!("Unknown channel in keyexpr: {}", keyexpr.as_str()))
        })?;
        let player = match parts[parts.len() - 1] {
            "*" => None,
            id => Some(PlayerId::from_name(id)?),
        };
        let prefix = parts[..parts.len() - 2].join("/");

        Ok(Self {
            prefix,
            channel,
            player,
        })
    }
}

impl TryFrom<&ArenaKeyexpr> for KeyExpr<'static> {
    type Error = ArenaError;

    fn try_from(arena_keyexpr: &ArenaKeyexpr) -> Result<Self, Self::Error> {
        let player = arena_keyexpr
            .player
            .as_ref()
            .map(PlayerId::as_str)
            .unwrap_or("*");
        let keyexpr_str = format!(
            "{}/{}/{}",
            arena_keyexpr.prefix,
            arena_keyexpr.channel.as_str(),
            player
        );
        KeyExpr::try_from(keyexpr_str)
            .map_err(|e| ArenaError::InvalidKeyexpr(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyexpr_roundtrip() {
        let prefix = KeyExpr::try_from("tetris/arena").unwrap();
        let player = PlayerId::from_name("p1").unwrap();

        let arena_keyexpr = ArenaKeyexpr::new(&prefix, Channel::Event, Some(player.clone()));
        let keyexpr = KeyExpr::try_from(&arena_keyexpr).unwrap();
        assert_eq!(keyexpr.as_str(), "tetris/arena/event/p1");

        let parsed = ArenaKeyexpr::try_from(keyexpr).unwrap();
        assert_eq!(parsed.player(), Some(&player));
        assert_eq!(parsed.channel(), Channel::Event);
        assert_eq!(parsed.prefix(), "tetris/arena");
    }

    #[test]
    fn test_wildcard_player() {
        let prefix = KeyExpr::try_from("tetris/arena").unwrap();
        let keyexpr = KeyExpr::try_from(&ArenaKeyexpr::any(&prefix, Channel::Alive)).unwrap();
        assert_eq!(keyexpr.as_str(), "tetris/arena/alive/*");
        assert_eq!(ArenaKeyexpr::try_from(keyexpr).unwrap().player(), None);
    }

    #[test]
    fn test_invalid_patterns() {
        let keyexpr = KeyExpr::try_from("tetris/arena/unknown/p1").unwrap();
        assert!(ArenaKeyexpr::try_from(keyexpr).is_err());

        let keyexpr = KeyExpr::try_from("notify/p1").unwrap();
        assert!(ArenaKeyexpr::try_from(keyexpr).is_err());
    }
}

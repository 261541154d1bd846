//! Player presence over liveliness tokens

use zenoh::key_expr::KeyExpr;
use zenoh::liveliness::LivelinessToken;
use zenoh::sample::SampleKind;

use crate::error::{ArenaError, Result};
use crate::network::keyexpr::{ArenaKeyexpr, Channel};
use crate::types::PlayerId;

/// Liveliness token of a connected player.
///
/// The token is undeclared when dropped, which the host sees as a disconnect.
#[derive(Debug)]
pub struct PlayerLivelinessToken {
    #[allow(dead_code)]
    token: LivelinessToken,
    player: PlayerId,
}

impl PlayerLivelinessToken {
    pub async fn declare(
        session: &zenoh::Session,
        prefix: &KeyExpr<'_>,
        player: PlayerId,
    ) -> Result<Self> {
        let arena_keyexpr = ArenaKeyexpr::new(prefix, Channel::Alive, Some(player.clone()));
        let keyexpr = KeyExpr::try_from(&arena_keyexpr)?;
        let token = session
            .liveliness()
            .declare_token(keyexpr)
            .await
            .map_err(ArenaError::Zenoh)?;

        Ok(Self { token, player })
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }
}

/// Change of a player's presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Joined(PlayerId),
    Left(PlayerId),
}

/// Watches the liveliness tokens of every player under the prefix
#[derive(Debug)]
pub struct PlayerLivelinessWatch {
    subscriber:
        zenoh::pubsub::Subscriber<zenoh::handlers::FifoChannelHandler<zenoh::sample::Sample>>,
}

impl PlayerLivelinessWatch {
    pub async fn declare(session: &zenoh::Session, prefix: &KeyExpr<'_>) -> Result<Self> {
        let keyexpr = KeyExpr::try_from(&ArenaKeyexpr::any(prefix, Channel::Alive))?;
        let subscriber = session
            .liveliness()
            .declare_subscriber(keyexpr)
            .await
            .map_err(ArenaError::Zenoh)?;

        Ok(Self { subscriber })
    }

    /// Wait for the next presence change
    pub async fn recv(&self) -> Result<Presence> {
        let sample = self
            .subscriber
            .recv_async()
            .await
            .map_err(|e| ArenaError::ChannelClosed(format!("Liveliness subscriber: {}", e)))?;

        let arena_keyexpr = ArenaKeyexpr::try_from(sample.key_expr().clone())?;
        let player = arena_keyexpr.player().cloned().ok_or_else(|| {
            ArenaError::InvalidKeyexpr(format!(
                "Liveliness token without player: {}",
                sample.key_expr()
            ))
        })?;

        Ok(match sample.kind() {
            SampleKind::Put => Presence::Joined(player),
            SampleKind::Delete => Presence::Left(player),
        })
    }
}

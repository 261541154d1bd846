//! Subscriber of JSON protocol messages

use serde::de::DeserializeOwned;
use zenoh::key_expr::KeyExpr;

use crate::error::{ArenaError, Result};
use crate::network::codec;
use crate::network::keyexpr::{ArenaKeyexpr, Channel};
use crate::types::PlayerId;

/// Subscribes to `<prefix>/<channel>/<player_id>` and decodes received samples.
///
/// With no player given it subscribes to every player on the channel;
/// `recv()` returns the player the sample was published for.
pub struct JsonSubscriber<T> {
    subscriber:
        zenoh::pubsub::Subscriber<zenoh::handlers::FifoChannelHandler<zenoh::sample::Sample>>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> std::fmt::Debug for JsonSubscriber<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSubscriber")
            .field("type", &std::any::type_name::<T>())
            .field("key_expr", &self.subscriber.key_expr())
            .finish()
    }
}

impl<T> JsonSubscriber<T>
where
    T: DeserializeOwned,
{
    pub async fn new(
        session: &zenoh::Session,
        prefix: &KeyExpr<'_>,
        channel: Channel,
        player: Option<&PlayerId>,
    ) -> Result<Self> {
        let arena_keyexpr = ArenaKeyexpr::new(prefix, channel, player.cloned());
        let keyexpr = KeyExpr::try_from(&arena_keyexpr)?;

        let subscriber = session
            .declare_subscriber(keyexpr)
            .await
            .map_err(ArenaError::Zenoh)?;

        Ok(Self {
            subscriber,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Receive the next value with the player it belongs to
    pub async fn recv(&self) -> Result<(PlayerId, T)> {
        let sample = self
            .subscriber
            .recv_async()
            .await
            .map_err(|e| ArenaError::ChannelClosed(format!("Subscriber: {}", e)))?;

        let arena_keyexpr = ArenaKeyexpr::try_from(sample.key_expr().clone())?;
        let player = arena_keyexpr.player().cloned().ok_or_else(|| {
            ArenaError::InvalidKeyexpr(format!(
                "Received sample with wildcard player in keyexpr '{}'",
                sample.key_expr()
            ))
        })?;

        let value: T = codec::decode(sample.payload())?;
        Ok((player, value))
    }
}

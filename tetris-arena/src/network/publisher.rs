//! Publisher of JSON protocol messages

use serde::Serialize;
use zenoh::key_expr::KeyExpr;

use crate::error::{ArenaError, Result};
use crate::network::codec;
use crate::network::keyexpr::{ArenaKeyexpr, Channel};
use crate::types::PlayerId;

/// Publishes values of type T on `<prefix>/<channel>/<player_id>`
pub struct JsonPublisher<T> {
    publisher: zenoh::pubsub::Publisher<'static>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> std::fmt::Debug for JsonPublisher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonPublisher")
            .field("type", &std::any::type_name::<T>())
            .field("key_expr", &self.publisher.key_expr())
            .finish()
    }
}

impl<T> JsonPublisher<T>
where
    T: Serialize,
{
    pub async fn new(
        session: &zenoh::Session,
        prefix: &KeyExpr<'_>,
        channel: Channel,
        player: &PlayerId,
    ) -> Result<Self> {
        let arena_keyexpr = ArenaKeyexpr::new(prefix, channel, Some(player.clone()));
        let keyexpr = KeyExpr::try_from(&arena_keyexpr)?;

        let publisher = session
            .declare_publisher(keyexpr)
            .await
            .map_err(ArenaError::Zenoh)?;

        Ok(Self {
            publisher,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Serialize and publish a value
    pub async fn put(&self, value: &T) -> Result<()> {
        let payload = codec::encode(value)?;
        self.publisher.put(payload).await.map_err(ArenaError::Zenoh)?;
        Ok(())
    }
}

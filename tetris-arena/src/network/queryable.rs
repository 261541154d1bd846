//! Queryable serving player requests
//!
//! The host declares a single queryable on `<prefix>/request/*`. A player
//! sends a request as the payload of a query on `<prefix>/request/<player_id>`
//! and gets one reply: the encoded `Response`, or an error reply carrying
//! the failure message.

use zenoh::key_expr::KeyExpr;
use zenoh::query::{Query, Queryable};

use crate::error::{ArenaError, Result};
use crate::network::codec;
use crate::network::keyexpr::{ArenaKeyexpr, Channel};
use crate::protocol::{Request, Response};
use crate::types::PlayerId;

/// Decoded request waiting for its reply
#[derive(Debug)]
pub struct PendingRequest {
    query: Query,
    player: PlayerId,
    request: Request,
}

impl PendingRequest {
    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Split into the decoded parts and a responder
    pub fn into_parts(self) -> (PlayerId, Request, Responder) {
        (
            self.player,
            self.request,
            Responder { query: self.query },
        )
    }
}

/// Sends the single reply to a query
#[derive(Debug)]
pub struct Responder {
    query: Query,
}

impl Responder {
    pub async fn reply(self, response: Result<Response>) -> Result<()> {
        match response {
            Ok(response) => {
                let payload = codec::encode(&response)?;
                let keyexpr = self.query.key_expr().clone();
                self.query
                    .reply(keyexpr, payload)
                    .await
                    .map_err(ArenaError::Zenoh)?;
            }
            Err(e) => {
                self.query
                    .reply_err(e.to_string())
                    .await
                    .map_err(ArenaError::Zenoh)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct RequestQueryable {
    queryable: Queryable<zenoh::handlers::FifoChannelHandler<Query>>,
}

impl RequestQueryable {
    /// Declare the queryable on `<prefix>/request/*`
    pub async fn declare(session: &zenoh::Session, prefix: &KeyExpr<'_>) -> Result<Self> {
        let keyexpr = KeyExpr::try_from(&ArenaKeyexpr::any(prefix, Channel::Request))?;
        let queryable = session
            .declare_queryable(keyexpr)
            .await
            .map_err(ArenaError::Zenoh)?;

        Ok(Self { queryable })
    }

    /// Wait for the next well-formed request.
    ///
    /// Queries that can't be decoded get an error reply and are skipped.
    pub async fn expect_request(&self) -> Result<PendingRequest> {
        loop {
            let query = self
                .queryable
                .recv_async()
                .await
                .map_err(|e| ArenaError::ChannelClosed(format!("Queryable: {}", e)))?;

            match Self::decode(&query) {
                Ok((player, request)) => {
                    return Ok(PendingRequest {
                        query,
                        player,
                        request,
                    });
                }
                Err(e) => {
                    tracing::debug!("Malformed request on '{}': {}", query.key_expr(), e);
                    if let Err(e) = query.reply_err(e.to_string()).await {
                        tracing::debug!("Failed to reply to malformed request: {}", e);
                    }
                }
            }
        }
    }

    fn decode(query: &Query) -> Result<(PlayerId, Request)> {
        let arena_keyexpr = ArenaKeyexpr::try_from(query.key_expr().clone())?;
        if arena_keyexpr.channel() != Channel::Request {
            return Err(ArenaError::InvalidKeyexpr(format!(
                "Not a request keyexpr: {}",
                query.key_expr()
            )));
        }
        let player = arena_keyexpr.player().cloned().ok_or_else(|| {
            ArenaError::InvalidKeyexpr(format!(
                "Request without player: {}",
                query.key_expr()
            ))
        })?;
        let payload = query
            .payload()
            .ok_or_else(|| ArenaError::Serialization("Request without payload".to_string()))?;
        let request = codec::decode(payload)?;
        Ok((player, request))
    }
}

//! Player side of the arena protocol

use std::time::Duration;

use zenoh::key_expr::KeyExpr;

use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::game::piece::Piece;
use crate::lobby::game_match::{MatchInfo, MatchOptions};
use crate::network::codec;
use crate::network::keyexpr::{ArenaKeyexpr, Channel};
use crate::network::liveliness::PlayerLivelinessToken;
use crate::network::publisher::JsonPublisher;
use crate::network::subscriber::JsonSubscriber;
use crate::protocol::{ClientEvent, Request, Response, ServerEvent};
use crate::types::{MatchId, PlayerId};

/// Connection of one player to an arena host.
///
/// Holds the player's liveliness token; dropping the client is seen by the
/// host as a disconnect.
pub struct ArenaClient {
    session: zenoh::Session,
    player: PlayerId,
    request_keyexpr: KeyExpr<'static>,
    request_timeout: Duration,
    events: JsonPublisher<ClientEvent>,
    notifications: JsonSubscriber<ServerEvent>,
    _token: PlayerLivelinessToken,
}

impl std::fmt::Debug for ArenaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaClient")
            .field("player", &self.player)
            .field("request_keyexpr", &self.request_keyexpr)
            .finish()
    }
}

impl ArenaClient {
    pub async fn connect(
        session: &zenoh::Session,
        config: &ArenaConfig,
        player: PlayerId,
    ) -> Result<Self> {
        let prefix = KeyExpr::try_from(config.keyexpr_prefix.clone())
            .map_err(|e| ArenaError::InvalidKeyexpr(e.to_string()))?;
        let request_keyexpr = KeyExpr::try_from(&ArenaKeyexpr::new(
            &prefix,
            Channel::Request,
            Some(player.clone()),
        ))?;

        // Subscribe before announcing presence so no notification is missed
        let notifications =
            JsonSubscriber::new(session, &prefix, Channel::Notify, Some(&player)).await?;
        let events = JsonPublisher::new(session, &prefix, Channel::Event, &player).await?;
        let token = PlayerLivelinessToken::declare(session, &prefix, player.clone()).await?;

        tracing::debug!("Player '{}' connected to '{}'", player, prefix);

        Ok(Self {
            session: session.clone(),
            player,
            request_keyexpr,
            request_timeout: config.request_timeout(),
            events,
            notifications,
            _token: token,
        })
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    /// Send a request and wait for the host's reply
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let payload = codec::encode(request)?;
        let replies = self
            .session
            .get(self.request_keyexpr.clone())
            .payload(payload)
            .timeout(self.request_timeout)
            .await
            .map_err(ArenaError::Zenoh)?;

        let reply = replies
            .recv_async()
            .await
            .map_err(|_| ArenaError::Timeout(format!("No reply to {}", request.name())))?;

        match reply.result() {
            Ok(sample) => codec::decode(sample.payload()),
            Err(err) => {
                let reason = err
                    .payload()
                    .try_to_string()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| "unreadable error reply".to_string());
                Err(ArenaError::Rejected(reason))
            }
        }
    }

    pub async fn create_match(
        &self,
        name: MatchId,
        username: impl Into<String>,
        options: MatchOptions,
    ) -> Result<MatchInfo> {
        let request = Request::CreateMatch {
            name,
            username: username.into(),
            options,
        };
        match self.request(&request).await? {
            Response::Joined(info) => Ok(info),
            other => Err(unexpected(&request, other)),
        }
    }

    pub async fn join_match(
        &self,
        name: MatchId,
        username: impl Into<String>,
    ) -> Result<MatchInfo> {
        let request = Request::JoinMatch {
            name,
            username: username.into(),
        };
        match self.request(&request).await? {
            Response::Joined(info) => Ok(info),
            other => Err(unexpected(&request, other)),
        }
    }

    pub async fn leave_match(&self) -> Result<()> {
        let request = Request::LeaveMatch;
        match self.request(&request).await? {
            Response::Left => Ok(()),
            other => Err(unexpected(&request, other)),
        }
    }

    pub async fn start_match(&self) -> Result<MatchInfo> {
        self.expect_info(Request::StartMatch).await
    }

    pub async fn reconfigure(&self, options: MatchOptions) -> Result<MatchInfo> {
        self.expect_info(Request::Reconfigure(options)).await
    }

    pub async fn reset_match(&self) -> Result<MatchInfo> {
        self.expect_info(Request::ResetMatch).await
    }

    pub async fn match_info(&self) -> Result<MatchInfo> {
        self.expect_info(Request::MatchInfo).await
    }

    /// Next piece of the match pool for this player
    pub async fn get_piece(&self) -> Result<Piece> {
        let request = Request::GetPiece;
        match self.request(&request).await? {
            Response::Piece(piece) => Ok(piece),
            other => Err(unexpected(&request, other)),
        }
    }

    pub async fn list_matches(&self) -> Result<Vec<MatchInfo>> {
        let request = Request::ListMatches;
        match self.request(&request).await? {
            Response::Matches(matches) => Ok(matches),
            other => Err(unexpected(&request, other)),
        }
    }

    async fn expect_info(&self, request: Request) -> Result<MatchInfo> {
        match self.request(&request).await? {
            Response::Info(info) => Ok(info),
            other => Err(unexpected(&request, other)),
        }
    }

    /// Publish a board report
    pub async fn fire(&self, event: &ClientEvent) -> Result<()> {
        self.events.put(event).await
    }

    /// Wait for the next notification addressed to this player
    pub async fn recv(&self) -> Result<ServerEvent> {
        let (_, event) = self.notifications.recv().await?;
        Ok(event)
    }
}

fn unexpected(request: &Request, response: Response) -> ArenaError {
    ArenaError::UnexpectedResponse(format!("{:?} in reply to {}", response, request.name()))
}

//! Arena host: binds the match server to zenoh
//!
//! Requests arrive on the request queryable, board reports on the event
//! subscriber and disconnects through the liveliness watch. All of them are
//! forwarded to the match server as commands. Deliveries produced by the
//! server are published on each recipient's notify keyexpr.

use std::collections::HashMap;
use std::time::Duration;

use zenoh::key_expr::KeyExpr;

use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::network::keyexpr::Channel;
use crate::network::liveliness::{PlayerLivelinessWatch, Presence};
use crate::network::publisher::JsonPublisher;
use crate::network::queryable::{PendingRequest, RequestQueryable};
use crate::network::subscriber::JsonSubscriber;
use crate::protocol::{ClientEvent, Delivery, ServerEvent};
use crate::server::{MatchServer, ServerCommand};
use crate::types::PlayerId;

pub struct ArenaHost {
    session: zenoh::Session,
    prefix: KeyExpr<'static>,
    request_timeout: Duration,
    queryable: RequestQueryable,
    events: JsonSubscriber<ClientEvent>,
    presence: PlayerLivelinessWatch,
    notifiers: HashMap<PlayerId, JsonPublisher<ServerEvent>>,
    commands: flume::Sender<ServerCommand>,
    deliveries: flume::Receiver<Delivery>,
    server: Option<MatchServer>,
}

impl std::fmt::Debug for ArenaHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaHost")
            .field("prefix", &self.prefix)
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}

impl ArenaHost {
    /// Declare the host's queryable, subscribers and liveliness watch
    pub async fn declare(session: &zenoh::Session, config: ArenaConfig) -> Result<Self> {
        let prefix = KeyExpr::try_from(config.keyexpr_prefix.clone())
            .map_err(|e| ArenaError::InvalidKeyexpr(e.to_string()))?;
        let request_timeout = config.request_timeout();

        let queryable = RequestQueryable::declare(session, &prefix).await?;
        let events = JsonSubscriber::new(session, &prefix, Channel::Event, None).await?;
        let presence = PlayerLivelinessWatch::declare(session, &prefix).await?;

        let server = MatchServer::new(config);
        let commands = server.sender();
        let deliveries = server.deliveries();

        tracing::info!("Arena host declared on '{}'", prefix);

        Ok(Self {
            session: session.clone(),
            prefix,
            request_timeout,
            queryable,
            events,
            presence,
            notifiers: HashMap::new(),
            commands,
            deliveries,
            server: Some(server),
        })
    }

    pub fn prefix(&self) -> &KeyExpr<'static> {
        &self.prefix
    }

    /// Channel to send commands to the match server.
    ///
    /// Sending `ServerCommand::Stop` makes `run()` return once every pending
    /// delivery is published.
    pub fn sender(&self) -> flume::Sender<ServerCommand> {
        self.commands.clone()
    }

    /// Serve the arena until the match server stops
    pub async fn run(mut self) -> Result<()> {
        let server = self
            .server
            .take()
            .ok_or_else(|| ArenaError::Internal("Arena host already running".to_string()))?;
        let server_task = tokio::spawn(server.run());

        while tokio::select! {
            // Request from a player
            request_result = self.queryable.expect_request() => {
                match request_result {
                    Ok(request) => self.forward_request(request),
                    Err(e) => {
                        tracing::warn!("Arena host stops serving requests: {}", e);
                        false
                    }
                }
            }
            // Board report from a player
            event_result = self.events.recv() => {
                match event_result {
                    Ok((player, event)) => {
                        tracing::trace!("Player '{}' reported {:?}", player, event);
                        self.commands
                            .send(ServerCommand::Event { player, event })
                            .is_ok()
                    }
                    Err(e) => Self::keep_receiving("event", e),
                }
            }
            // Player presence
            presence_result = self.presence.recv() => {
                match presence_result {
                    Ok(Presence::Joined(player)) => {
                        tracing::debug!("Player '{}' is connected", player);
                        true
                    }
                    Ok(Presence::Left(player)) => {
                        tracing::info!("Player '{}' disconnected", player);
                        self.notifiers.remove(&player);
                        self.commands.send(ServerCommand::Disconnect(player)).is_ok()
                    }
                    Err(e) => Self::keep_receiving("presence", e),
                }
            }
            // Notification produced by the match server
            delivery_result = self.deliveries.recv_async() => {
                match delivery_result {
                    Ok(delivery) => {
                        self.publish(delivery).await;
                        true
                    }
                    Err(_) => {
                        tracing::info!("Match server stopped, arena host exiting");
                        false
                    }
                }
            }
        } {}

        // Transport loss ends the loop with the server still running
        if self.commands.send(ServerCommand::Stop).is_err() {
            tracing::debug!("Match server already stopped");
        }
        server_task
            .await
            .map_err(|e| ArenaError::Internal(format!("Match server task failed: {}", e)))?;
        Ok(())
    }

    /// Decide whether a receive failure leaves the loop running.
    /// Malformed samples are skipped, a closed channel stops the host.
    fn keep_receiving(what: &str, error: ArenaError) -> bool {
        match &error {
            ArenaError::ChannelClosed(_) => {
                tracing::warn!("Arena host lost its {} channel: {}", what, error);
                false
            }
            _ => {
                tracing::warn!("Arena host failed to receive {}: {}", what, error);
                true
            }
        }
    }

    /// Hand a request to the match server and reply from a separate task,
    /// so the host loop never waits on the server.
    fn forward_request(&self, request: PendingRequest) -> bool {
        let (player, request, responder) = request.into_parts();
        let name = request.name();
        let (reply_tx, reply_rx) = flume::bounded(1);
        if self
            .commands
            .send(ServerCommand::Request {
                player: player.clone(),
                request,
                reply: reply_tx,
            })
            .is_err()
        {
            return false;
        }

        let timeout = self.request_timeout;
        tokio::spawn(async move {
            let response = match tokio::time::timeout(timeout, reply_rx.recv_async()).await {
                Ok(Ok(response)) => response,
                Ok(Err(_)) => Err(ArenaError::Internal("Match server stopped".to_string())),
                Err(_) => Err(ArenaError::Timeout(format!("{} from '{}'", name, player))),
            };
            if let Err(e) = responder.reply(response).await {
                tracing::warn!("Failed to reply to '{}': {}", player, e);
            }
        });
        true
    }

    async fn publish(&mut self, delivery: Delivery) {
        if !self.notifiers.contains_key(&delivery.to) {
            match JsonPublisher::new(&self.session, &self.prefix, Channel::Notify, &delivery.to)
                .await
            {
                Ok(publisher) => {
                    self.notifiers.insert(delivery.to.clone(), publisher);
                }
                Err(e) => {
                    tracing::error!("Failed to declare notifier for '{}': {}", delivery.to, e);
                    return;
                }
            }
        }
        if let Some(publisher) = self.notifiers.get(&delivery.to) {
            if let Err(e) = publisher.put(&delivery.event).await {
                tracing::error!("Failed to notify '{}': {}", delivery.to, e);
            }
        }
    }
}

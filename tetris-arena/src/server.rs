//! Match server: serializes every command against the registry

use crate::config::ArenaConfig;
use crate::error::Result;
use crate::lobby::registry::Registry;
use crate::protocol::{ClientEvent, Delivery, Request, Response};
use crate::types::PlayerId;

/// Commands accepted by the match server
#[derive(Debug)]
pub enum ServerCommand {
    /// Request from a player; the reply goes back on `reply`
    Request {
        player: PlayerId,
        request: Request,
        reply: flume::Sender<Result<Response>>,
    },
    /// Fire-and-forget board report
    Event { player: PlayerId, event: ClientEvent },
    /// Connection of the player is gone
    Disconnect(PlayerId),
    /// Stop the server's run loop
    Stop,
}

/// Owns the registry and handles one command at a time.
///
/// Each command is applied in full before the next one is read, so no two
/// operations on the same match ever interleave. Resulting notifications
/// are emitted on the deliveries channel in processing order.
pub struct MatchServer {
    registry: Registry,
    command_tx: flume::Sender<ServerCommand>,
    command_rx: flume::Receiver<ServerCommand>,
    delivery_tx: flume::Sender<Delivery>,
    delivery_rx: flume::Receiver<Delivery>,
}

impl MatchServer {
    pub fn new(config: ArenaConfig) -> Self {
        let (command_tx, command_rx) = flume::unbounded();
        let (delivery_tx, delivery_rx) = flume::unbounded();
        MatchServer {
            registry: Registry::new(config),
            command_tx,
            command_rx,
            delivery_tx,
            delivery_rx,
        }
    }

    /// Channel to submit commands
    pub fn sender(&self) -> flume::Sender<ServerCommand> {
        self.command_tx.clone()
    }

    /// Channel of outgoing notifications
    pub fn deliveries(&self) -> flume::Receiver<Delivery> {
        self.delivery_rx.clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Apply a request and return its reply
    pub fn handle_request(&mut self, player: &PlayerId, request: Request) -> Result<Response> {
        let mut out = Vec::new();
        tracing::debug!("Player '{}' request {}", player, request.name());
        let response = match request {
            Request::CreateMatch {
                name,
                username,
                options,
            } => self
                .registry
                .create_match(player, name, &username, &options, &mut out)
                .map(Response::Joined),
            Request::JoinMatch { name, username } => self
                .registry
                .join_match(player, &name, &username, &mut out)
                .map(Response::Joined),
            Request::LeaveMatch => self
                .registry
                .leave_match(player, &mut out)
                .map(|()| Response::Left),
            Request::StartMatch => self
                .registry
                .start_match(player, &mut out)
                .map(Response::Info),
            Request::Reconfigure(options) => self
                .registry
                .reconfigure(player, options, &mut out)
                .map(Response::Info),
            Request::ResetMatch => self
                .registry
                .reset_match(player, &mut out)
                .map(Response::Info),
            Request::GetPiece => self
                .registry
                .deal_piece(player, &mut out)
                .map(Response::Piece),
            Request::MatchInfo => self.registry.match_info(player).map(Response::Info),
            Request::ListMatches => Ok(Response::Matches(self.registry.list())),
        };
        if let Err(e) = &response {
            tracing::debug!("Player '{}' request failed: {}", player, e);
        }
        self.emit(out);
        response
    }

    /// Apply a board report. Reports from unknown players are dropped.
    pub fn handle_event(&mut self, player: &PlayerId, event: ClientEvent) {
        let mut out = Vec::new();
        let result = match event {
            ClientEvent::Line(count) => self.registry.report_line_clear(player, count, &mut out),
            ClientEvent::Spectrum(spectrum) => {
                self.registry.report_spectrum(player, spectrum, &mut out)
            }
            ClientEvent::GameOver => self.registry.report_game_over(player, &mut out),
        };
        if let Err(e) = result {
            tracing::warn!("Dropped event from '{}': {}", player, e);
        }
        self.emit(out);
    }

    pub fn handle_disconnect(&mut self, player: &PlayerId) {
        let mut out = Vec::new();
        self.registry.disconnect(player, &mut out);
        self.emit(out);
    }

    /// Process a single command. Returns false on `Stop`.
    pub fn handle(&mut self, command: ServerCommand) -> bool {
        match command {
            ServerCommand::Request {
                player,
                request,
                reply,
            } => {
                let response = self.handle_request(&player, request);
                if reply.send(response).is_err() {
                    tracing::debug!("Requester '{}' went away before the reply", player);
                }
            }
            ServerCommand::Event { player, event } => self.handle_event(&player, event),
            ServerCommand::Disconnect(player) => self.handle_disconnect(&player),
            ServerCommand::Stop => {
                tracing::info!("Match server received Stop command, exiting");
                return false;
            }
        }
        true
    }

    fn emit(&self, out: Vec<Delivery>) {
        for delivery in out {
            if let Err(e) = self.delivery_tx.send(delivery) {
                tracing::error!("Failed to queue delivery: {}", e);
            }
        }
    }

    /// Consume commands until `Stop`
    pub async fn run(mut self) {
        while let Ok(command) = self.command_rx.recv_async().await {
            if !self.handle(command) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pool::PoolPolicy;
    use crate::lobby::game_match::MatchOptions;
    use crate::protocol::ServerEvent;
    use crate::types::{MatchId, MatchStatus};

    fn pid(name: &str) -> PlayerId {
        PlayerId::from_name(name).unwrap()
    }

    fn create(name: &str) -> Request {
        Request::CreateMatch {
            name: MatchId::from_name("room").unwrap(),
            username: name.to_string(),
            options: MatchOptions::default(),
        }
    }

    fn join(name: &str) -> Request {
        Request::JoinMatch {
            name: MatchId::from_name("room").unwrap(),
            username: name.to_string(),
        }
    }

    async fn request(
        tx: &flume::Sender<ServerCommand>,
        player: &str,
        req: Request,
    ) -> Result<Response> {
        let (reply, rx) = flume::bounded(1);
        tx.send(ServerCommand::Request {
            player: pid(player),
            request: req,
            reply,
        })
        .unwrap();
        rx.recv_async().await.unwrap()
    }

    #[tokio::test]
    async fn test_server_runs_a_match() {
        let server = MatchServer::new(ArenaConfig::default().with_pool_seed(3));
        let tx = server.sender();
        let deliveries = server.deliveries();
        let handle = tokio::spawn(server.run());

        assert!(matches!(
            request(&tx, "a", create("a")).await,
            Ok(Response::Joined(_))
        ));
        assert!(matches!(
            request(&tx, "b", join("b")).await,
            Ok(Response::Joined(_))
        ));
        assert!(matches!(
            request(&tx, "a", Request::StartMatch).await,
            Ok(Response::Info(_))
        ));

        let Ok(Response::Piece(piece_a)) = request(&tx, "a", Request::GetPiece).await else {
            panic!("expected a piece");
        };
        let Ok(Response::Piece(piece_b)) = request(&tx, "b", Request::GetPiece).await else {
            panic!("expected a piece");
        };
        assert_eq!(piece_a, piece_b);

        tx.send(ServerCommand::Event {
            player: pid("a"),
            event: ClientEvent::Line(2),
        })
        .unwrap();
        tx.send(ServerCommand::Event {
            player: pid("b"),
            event: ClientEvent::GameOver,
        })
        .unwrap();
        let Ok(Response::Info(info)) = request(&tx, "a", Request::MatchInfo).await else {
            panic!("expected match info");
        };
        assert_eq!(info.status, MatchStatus::Ended);
        assert_eq!(info.winner.as_deref(), Some("a"));

        tx.send(ServerCommand::Stop).unwrap();
        handle.await.unwrap();

        let events: Vec<Delivery> = deliveries.drain().collect();
        let penalty = events
            .iter()
            .position(|d| d.to == pid("b") && d.event == ServerEvent::LinePenalty(2))
            .expect("penalty delivered");
        let ended = events
            .iter()
            .position(|d| {
                matches!(
                    &d.event,
                    ServerEvent::MatchUpdated(info) if info.status == MatchStatus::Ended
                )
            })
            .expect("end of match delivered");
        assert!(penalty < ended);
    }

    #[test]
    fn test_errors_are_returned_to_caller() {
        let mut server = MatchServer::new(ArenaConfig::default());
        assert!(server.handle_request(&pid("a"), Request::GetPiece).is_err());
        assert!(server.handle_request(&pid("a"), Request::StartMatch).is_err());
        assert!(matches!(
            server.handle_request(&pid("a"), Request::ListMatches),
            Ok(Response::Matches(list)) if list.is_empty()
        ));
        // Dropped silently
        server.handle_event(&pid("a"), ClientEvent::GameOver);
        assert!(server.deliveries().is_empty());
    }

    #[test]
    fn test_capacity_exceeded_is_fatal_for_player() {
        let config = ArenaConfig::default()
            .with_pool_seed(5)
            .with_pool_size(2)
            .with_pool_policy(PoolPolicy::Fixed);
        let mut server = MatchServer::new(config);
        server.handle_request(&pid("a"), create("a")).unwrap();
        server.handle_request(&pid("a"), Request::StartMatch).unwrap();

        assert!(server.handle_request(&pid("a"), Request::GetPiece).is_ok());
        assert!(server.handle_request(&pid("a"), Request::GetPiece).is_ok());
        assert!(matches!(
            server.handle_request(&pid("a"), Request::GetPiece),
            Err(crate::error::ArenaError::CapacityExceeded { index: 2, len: 2 })
        ));

        let info = server.registry().match_info(&pid("a")).unwrap();
        assert_eq!(info.status, MatchStatus::Ended);
        assert_eq!(info.winner.as_deref(), Some("a"));
    }

    #[test]
    fn test_disconnect_command() {
        let mut server = MatchServer::new(ArenaConfig::default());
        server.handle_request(&pid("a"), create("a")).unwrap();
        assert!(server.handle(ServerCommand::Disconnect(pid("a"))));
        assert!(server.registry().is_empty());
        assert!(!server.handle(ServerCommand::Stop));
    }
}

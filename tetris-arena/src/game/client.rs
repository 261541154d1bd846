//! Client-local driver of one board
//!
//! Owns the board, the next-piece preview and a queue of player actions.
//! Every output meant for the match (piece requests and board reports) is
//! appended to an outbox that the transport drains in order.

use std::collections::VecDeque;

use super::board::{Action, Board, StepResult};
use super::frequency_regulator::FrequencyRegulator;
use super::piece::Piece;
use crate::protocol::ClientEvent;

/// Something the board wants to tell the match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Ask for the next pool piece (`GET_PIECE`)
    RequestPiece,
    /// Fire a board report
    Fire(ClientEvent),
}

pub struct BoardClient {
    board: Board,
    next: Option<Piece>,
    // User actions queue
    actions: VecDeque<Action>,
    gravity: FrequencyRegulator,
    outbox: VecDeque<Outbound>,
    game_over_sent: bool,
}

impl BoardClient {
    pub fn new(speed: u8) -> Self {
        Self::with_board(Board::new(), speed)
    }

    pub fn with_board(board: Board, speed: u8) -> Self {
        BoardClient {
            board,
            next: None,
            actions: VecDeque::new(),
            gravity: FrequencyRegulator::gravity(speed),
            outbox: VecDeque::new(),
            game_over_sent: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn next(&self) -> Option<&Piece> {
        self.next.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    /// Request the current and the next piece
    pub fn start(&mut self) {
        self.outbox.push_back(Outbound::RequestPiece);
        self.outbox.push_back(Outbound::RequestPiece);
    }

    /// A dealt piece arrived. It becomes the falling piece if the board
    /// is waiting for one, otherwise the preview.
    pub fn receive_piece(&mut self, piece: Piece) {
        if self.board.is_terminal() {
            return;
        }
        if self.board.active().is_none() {
            if !self.board.spawn(piece) {
                self.report_game_over();
            }
        } else if self.next.is_none() {
            self.next = Some(piece);
        } else {
            tracing::warn!("Dropping unrequested piece {:?}", piece.kind());
        }
    }

    /// The match could not deal a piece; this board cannot go on
    pub fn abandon(&mut self) {
        self.board.abandon();
        self.report_game_over();
    }

    // Add user action to actions queue
    pub fn add_action(&mut self, action: Action) {
        if !self.board.is_terminal() {
            self.actions.push_back(action);
        }
    }

    /// Advance one driver step: queue gravity, then process one action
    pub fn step(&mut self) -> StepResult {
        if self.board.is_terminal() {
            return StepResult::Ignored;
        }
        if self.board.active().is_some() {
            for _ in 0..self.gravity.step() {
                self.actions.push_back(Action::MoveDown);
            }
        }
        let Some(action) = self.actions.pop_front() else {
            return StepResult::Ignored;
        };
        self.apply(action)
    }

    /// Apply one action right away
    pub fn apply(&mut self, action: Action) -> StepResult {
        let result = self.board.apply(action);
        match result {
            StepResult::Locked { lines_removed } => self.on_lock(lines_removed, false),
            StepResult::GameOver { lines_removed } => self.on_lock(lines_removed, true),
            _ => {}
        }
        result
    }

    fn on_lock(&mut self, lines_removed: u32, game_over: bool) {
        // Pending moves were aimed at the piece that just locked
        self.actions.clear();
        self.fire(ClientEvent::Line(lines_removed));
        self.fire(ClientEvent::Spectrum(self.board.spectrum()));
        if game_over {
            self.report_game_over();
            return;
        }
        if let Some(next) = self.next.take() {
            if !self.board.spawn(next) {
                self.report_game_over();
                return;
            }
        }
        self.outbox.push_back(Outbound::RequestPiece);
    }

    /// Apply an opponent's `LINE_PENALTY`
    pub fn on_penalty(&mut self, lines: u32) {
        if lines == 0 || self.board.is_terminal() {
            return;
        }
        let alive = self.board.apply_penalty(lines);
        self.fire(ClientEvent::Spectrum(self.board.spectrum()));
        if !alive {
            self.report_game_over();
        }
    }

    fn report_game_over(&mut self) {
        if !self.game_over_sent {
            self.game_over_sent = true;
            self.fire(ClientEvent::GameOver);
        }
    }

    fn fire(&mut self, event: ClientEvent) {
        self.outbox.push_back(Outbound::Fire(event));
    }

    /// Take every pending output in emission order
    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        self.outbox.drain(..).collect()
    }
}

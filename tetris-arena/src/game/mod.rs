//! Board engine and the pieces it plays with

pub mod board;
pub mod client;
pub mod frequency_regulator;
pub mod grid;
pub mod piece;
pub mod pool;

pub use board::{Action, Board, Phase, StepResult};
pub use client::{BoardClient, Outbound};
pub use grid::{Cell, Grid, Spectrum, GRID_HEIGHT, GRID_WIDTH};
pub use piece::{Piece, PieceType, Position};
pub use pool::{PiecePool, PoolPolicy};

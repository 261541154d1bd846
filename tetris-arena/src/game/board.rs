use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::grid::{Grid, Spectrum};
use super::piece::Piece;

// Enum with all possible player actions
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveDown,
    Rotate,
    Drop,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepResult {
    // Board is frozen or has no active piece
    Ignored,
    // Action was applied
    Moved,
    // Candidate position failed the collision check, nothing changed
    Rejected,
    // Piece was committed to the grid
    Locked { lines_removed: u32 },
    // Piece was committed and the stack topped out
    GameOver { lines_removed: u32 },
}

/// Board phase. Spawning means the board waits for its next piece.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    Spawning,
    Falling,
    Terminal,
}

/// One player's local simulation
pub struct Board {
    grid: Grid,
    active: Option<Piece>,
    terminal: bool,
    // Garbage hole placement
    rng: StdRng,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Board {
            grid: Grid::new(),
            active: None,
            terminal: false,
            rng,
        }
    }

    /// Start from an arbitrary grid
    pub fn from_grid(grid: Grid, seed: u64) -> Self {
        let mut board = Self::with_seed(seed);
        board.terminal = grid.is_game_over();
        board.grid = grid;
        board
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.terminal {
            Phase::Terminal
        } else if self.active.is_some() {
            Phase::Falling
        } else {
            Phase::Spawning
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn spectrum(&self) -> Spectrum {
        self.grid.spectrum()
    }

    /// Freeze the board, e.g. when no further piece can be dealt
    pub fn abandon(&mut self) {
        self.active = None;
        self.terminal = true;
    }

    /// Place a freshly dealt piece. Returns false and turns the board
    /// terminal if the spawn area is already blocked.
    pub fn spawn(&mut self, piece: Piece) -> bool {
        if self.terminal {
            return false;
        }
        if !self.grid.check_position(piece.positions()) {
            tracing::debug!("Spawn of {:?} blocked, board topped out", piece.kind());
            self.abandon();
            return false;
        }
        self.active = Some(piece);
        true
    }

    /// Apply a single player action
    pub fn apply(&mut self, action: Action) -> StepResult {
        match action {
            Action::MoveLeft => self.shift(-1),
            Action::MoveRight => self.shift(1),
            Action::MoveDown => self.move_down(),
            Action::Rotate => self.rotate(),
            Action::Drop => self.hard_drop(),
        }
    }

    // Replace the active piece with the candidate if it fits
    fn try_commit(&mut self, candidate: Piece) -> StepResult {
        if self.grid.check_position(candidate.positions()) {
            self.active = Some(candidate);
            StepResult::Moved
        } else {
            StepResult::Rejected
        }
    }

    fn shift(&mut self, dx: i32) -> StepResult {
        match (&self.active, self.terminal) {
            (Some(piece), false) => {
                let candidate = piece.moved(dx, 0);
                self.try_commit(candidate)
            }
            _ => StepResult::Ignored,
        }
    }

    pub fn move_left(&mut self) -> StepResult {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> StepResult {
        self.shift(1)
    }

    pub fn rotate(&mut self) -> StepResult {
        match (&self.active, self.terminal) {
            (Some(piece), false) => {
                let candidate = piece.rotated();
                self.try_commit(candidate)
            }
            _ => StepResult::Ignored,
        }
    }

    /// Move down one row; a rejected downward move locks the piece
    pub fn move_down(&mut self) -> StepResult {
        let Some(piece) = &self.active else {
            return StepResult::Ignored;
        };
        if self.terminal {
            return StepResult::Ignored;
        }
        let candidate = piece.moved(0, 1);
        if self.grid.check_position(candidate.positions()) {
            self.active = Some(candidate);
            StepResult::Moved
        } else {
            self.lock()
        }
    }

    /// Lowest valid position of the active piece in its column
    pub fn drop_position(&self) -> Option<Piece> {
        let mut piece = self.active.clone()?;
        loop {
            let candidate = piece.moved(0, 1);
            if !self.grid.check_position(candidate.positions()) {
                return Some(piece);
            }
            piece = candidate;
        }
    }

    /// Move the active piece to its lowest valid position and lock it
    pub fn hard_drop(&mut self) -> StepResult {
        if self.terminal {
            return StepResult::Ignored;
        }
        let Some(landed) = self.drop_position() else {
            return StepResult::Ignored;
        };
        self.active = Some(landed);
        self.lock()
    }

    fn lock(&mut self) -> StepResult {
        let Some(piece) = self.active.take() else {
            return StepResult::Ignored;
        };
        let (grid, lines_removed) = self.grid.lock_and_clear(&piece);
        self.grid = grid;
        if self.grid.is_game_over() {
            self.terminal = true;
            StepResult::GameOver { lines_removed }
        } else {
            StepResult::Locked { lines_removed }
        }
    }

    /// Receive `lines` garbage rows from an opponent.
    ///
    /// The falling piece is lifted just enough to stay clear of the new
    /// stack, by at most `lines` rows. Returns false if the board topped out.
    pub fn apply_penalty(&mut self, lines: u32) -> bool {
        if self.terminal {
            return false;
        }
        if lines == 0 {
            return true;
        }
        self.grid = self.grid.with_penalty(lines as usize, &mut self.rng);

        if let Some(piece) = self.active.take() {
            let lifted = (0..=lines as i32)
                .map(|dy| piece.moved(0, -dy))
                .find(|candidate| self.grid.check_position(candidate.positions()));
            match lifted {
                Some(candidate) => self.active = Some(candidate),
                None => {
                    self.abandon();
                    return false;
                }
            }
        }

        if self.grid.is_game_over() {
            self.abandon();
            return false;
        }
        true
    }
}

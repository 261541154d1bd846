use rand::Rng;
use serde::{Deserialize, Serialize};

use super::piece::{Piece, PieceType, Position};
use crate::error::{ArenaError, Result};

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

/// Rows at the top of the grid where new pieces appear. A locked cell in
/// this band means the stack has topped out.
pub const SPAWN_ZONE_ROWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Piece(PieceType),
    // Penalty row injected by an opponent's line clear
    Garbage,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Per-column stack summary: for each column, the row index of the
/// topmost occupied cell, or `GRID_HEIGHT` if the column is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Spectrum([u8; GRID_WIDTH]);

impl Spectrum {
    /// Spectrum of an empty grid
    pub fn empty() -> Self {
        Spectrum([GRID_HEIGHT as u8; GRID_WIDTH])
    }

    pub fn new(values: Vec<u8>) -> Result<Self> {
        Spectrum::try_from(values)
    }

    pub fn values(&self) -> &[u8; GRID_WIDTH] {
        &self.0
    }

    /// Height of the tallest column counted from the floor
    pub fn max_height(&self) -> usize {
        GRID_HEIGHT - self.0.iter().copied().min().unwrap_or(GRID_HEIGHT as u8) as usize
    }
}

impl Default for Spectrum {
    fn default() -> Self {
        Spectrum::empty()
    }
}

impl std::ops::Index<usize> for Spectrum {
    type Output = u8;

    fn index(&self, column: usize) -> &u8 {
        &self.0[column]
    }
}

impl TryFrom<Vec<u8>> for Spectrum {
    type Error = ArenaError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        let values: [u8; GRID_WIDTH] = values.try_into().map_err(|v: Vec<u8>| {
            ArenaError::InvalidSpectrum(format!(
                "expected {} columns, got {}",
                GRID_WIDTH,
                v.len()
            ))
        })?;
        if let Some(bad) = values.iter().find(|h| **h as usize > GRID_HEIGHT) {
            return Err(ArenaError::InvalidSpectrum(format!(
                "row {} is outside a grid of {} rows",
                bad, GRID_HEIGHT
            )));
        }
        Ok(Spectrum(values))
    }
}

impl From<Spectrum> for Vec<u8> {
    fn from(spectrum: Spectrum) -> Self {
        spectrum.0.to_vec()
    }
}

/// Fixed-size playfield, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<[Cell; GRID_WIDTH]>,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            rows: vec![[Cell::Empty; GRID_WIDTH]; GRID_HEIGHT],
        }
    }

    /// Build a grid from text rows, top row first. `.` is empty, `#` is
    /// garbage, a piece letter is a locked cell of that type. Missing rows
    /// are filled as empty at the top.
    pub fn from_rows(lines: &[&str]) -> Self {
        let mut grid = Grid::new();
        let offset = GRID_HEIGHT.saturating_sub(lines.len());
        for (i, line) in lines.iter().take(GRID_HEIGHT).enumerate() {
            for (x, ch) in line.chars().take(GRID_WIDTH).enumerate() {
                grid.rows[offset + i][x] = match ch {
                    '#' => Cell::Garbage,
                    'I' => Cell::Piece(PieceType::I),
                    'J' => Cell::Piece(PieceType::J),
                    'L' => Cell::Piece(PieceType::L),
                    'O' => Cell::Piece(PieceType::O),
                    'S' => Cell::Piece(PieceType::S),
                    'T' => Cell::Piece(PieceType::T),
                    'Z' => Cell::Piece(PieceType::Z),
                    _ => Cell::Empty,
                };
            }
        }
        grid
    }

    pub fn cols(&self) -> usize {
        GRID_WIDTH
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    pub fn row(&self, y: usize) -> &[Cell; GRID_WIDTH] {
        &self.rows[y]
    }

    /// True iff every position is inside the grid and lands on an empty cell
    pub fn check_position(&self, positions: &[Position]) -> bool {
        positions.iter().all(|p| {
            p.x >= 0
                && p.y >= 0
                && (p.x as usize) < GRID_WIDTH
                && (p.y as usize) < GRID_HEIGHT
                && self.rows[p.y as usize][p.x as usize].is_empty()
        })
    }

    /// Merge the piece into the grid, then drop every full row.
    ///
    /// Returns the new grid and the number of rows removed.
    pub fn lock_and_clear(&self, piece: &Piece) -> (Grid, u32) {
        let mut rows = self.rows.clone();
        let cell = Cell::Piece(piece.kind());
        for p in piece.positions() {
            if p.x >= 0 && p.y >= 0 && (p.x as usize) < GRID_WIDTH && (p.y as usize) < GRID_HEIGHT {
                rows[p.y as usize][p.x as usize] = cell;
            }
        }

        rows.retain(|row| row.iter().any(Cell::is_empty));
        let removed = GRID_HEIGHT - rows.len();
        let mut cleared = vec![[Cell::Empty; GRID_WIDTH]; removed];
        cleared.extend(rows);

        (Grid { rows: cleared }, removed as u32)
    }

    /// Push `lines` garbage rows in from the bottom, discarding the same
    /// number of rows at the top. Each garbage row keeps one random hole so
    /// it stays clearable.
    pub fn with_penalty<R: Rng>(&self, lines: usize, rng: &mut R) -> Grid {
        let lines = lines.min(GRID_HEIGHT);
        let mut rows: Vec<[Cell; GRID_WIDTH]> = self.rows[lines..].to_vec();
        for _ in 0..lines {
            let mut row = [Cell::Garbage; GRID_WIDTH];
            row[rng.random_range(0..GRID_WIDTH)] = Cell::Empty;
            rows.push(row);
        }
        Grid { rows }
    }

    pub fn spectrum(&self) -> Spectrum {
        let mut values = [GRID_HEIGHT as u8; GRID_WIDTH];
        for (x, value) in values.iter_mut().enumerate() {
            if let Some(y) = (0..GRID_HEIGHT).find(|y| !self.rows[*y][x].is_empty()) {
                *value = y as u8;
            }
        }
        Spectrum(values)
    }

    /// Top-out test: some column reaches into the spawn zone
    pub fn is_game_over(&self) -> bool {
        self.rows[..SPAWN_ZONE_ROWS]
            .iter()
            .any(|row| row.iter().any(|cell| !cell.is_empty()))
    }

    pub fn filled_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| !c.is_empty()).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_check_position_bounds() {
        let grid = Grid::new();
        assert!(grid.check_position(&[Position::new(0, 0), Position::new(9, 19)]));
        assert!(!grid.check_position(&[Position::new(-1, 0)]));
        assert!(!grid.check_position(&[Position::new(10, 0)]));
        assert!(!grid.check_position(&[Position::new(0, 20)]));
        assert!(!grid.check_position(&[Position::new(0, -1)]));
    }

    #[test]
    fn test_check_position_occupied() {
        let grid = Grid::from_rows(&["#........."]);
        assert!(!grid.check_position(&[Position::new(0, 19)]));
        assert!(grid.check_position(&[Position::new(1, 19)]));
    }

    #[test]
    fn test_lock_and_clear_single_line() {
        // Bottom row misses its last four cells, an I piece fills them
        let grid = Grid::from_rows(&["ZZZZZZ...."]);
        let piece = Piece::spawn(PieceType::I).moved(3, 18);
        assert_eq!(
            piece.positions(),
            &[
                Position::new(6, 19),
                Position::new(7, 19),
                Position::new(8, 19),
                Position::new(9, 19)
            ]
        );

        let (cleared, removed) = grid.lock_and_clear(&piece);
        assert_eq!(removed, 1);
        assert_eq!(cleared.rows(), GRID_HEIGHT);
        assert_eq!(cleared.filled_count(), 0);
    }

    #[test]
    fn test_lock_and_clear_shifts_rows_down() {
        let grid = Grid::from_rows(&[
            "T.........",
            "OOOOOOOOO.",
            "S.........",
        ]);
        // Vertical I in the last column covers rows 16..20
        let piece = Piece::spawn(PieceType::I).rotated().moved(4, 16);
        let (cleared, removed) = grid.lock_and_clear(&piece);
        assert_eq!(removed, 1);
        assert_eq!(cleared.cell(0, 19), Cell::Piece(PieceType::S));
        assert_eq!(cleared.cell(0, 18), Cell::Piece(PieceType::T));
        assert_eq!(cleared.cell(9, 19), Cell::Piece(PieceType::I));
        assert_eq!(cleared.cell(9, 18), Cell::Piece(PieceType::I));
        assert_eq!(cleared.cell(9, 17), Cell::Piece(PieceType::I));
        assert_eq!(cleared.cell(9, 16), Cell::Empty);
    }

    #[test]
    fn test_lock_without_full_row_removes_nothing() {
        let grid = Grid::new();
        let (locked, removed) = grid.lock_and_clear(&Piece::spawn(PieceType::O).moved(0, 18));
        assert_eq!(removed, 0);
        assert_eq!(locked.filled_count(), 4);
    }

    #[test]
    fn test_penalty_keeps_height_and_hole() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = Grid::from_rows(&["LL........"]);
        let penalized = grid.with_penalty(2, &mut rng);

        assert_eq!(penalized.rows(), GRID_HEIGHT);
        // Previous bottom row moved up by two
        assert_eq!(penalized.cell(0, 17), Cell::Piece(PieceType::L));
        for y in [18, 19] {
            let holes = penalized.row(y).iter().filter(|c| c.is_empty()).count();
            let garbage = penalized.row(y).iter().filter(|c| **c == Cell::Garbage).count();
            assert_eq!(holes, 1);
            assert_eq!(garbage, GRID_WIDTH - 1);
        }
    }

    #[test]
    fn test_spectrum_values() {
        let mut lines = vec![".........."; 5];
        lines[0] = ".....J....";
        let grid = Grid::from_rows(&lines);

        let spectrum = grid.spectrum();
        assert_eq!(spectrum[5], 15);
        for x in (0..GRID_WIDTH).filter(|x| *x != 5) {
            assert_eq!(spectrum[x] as usize, GRID_HEIGHT);
        }
        assert_eq!(spectrum.max_height(), 5);
        assert_eq!(Grid::new().spectrum(), Spectrum::empty());
    }

    #[test]
    fn test_game_over_in_spawn_zone() {
        assert!(!Grid::new().is_game_over());
        let mut lines = vec!["....O....."; GRID_HEIGHT];
        assert!(Grid::from_rows(&lines).is_game_over());
        lines[0] = "..........";
        assert!(!Grid::from_rows(&lines).is_game_over());
    }

    #[test]
    fn test_spectrum_validation() {
        assert!(Spectrum::new(vec![20; 10]).is_ok());
        assert!(Spectrum::new(vec![20; 9]).is_err());
        assert!(Spectrum::new(vec![21; 10]).is_err());
        let parsed: std::result::Result<Spectrum, _> = serde_json::from_str("[1,2,3]");
        assert!(parsed.is_err());
    }
}

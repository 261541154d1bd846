use serde::{Deserialize, Serialize};

use super::grid::GRID_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceType {
    pub const ALL: [PieceType; 7] = [
        PieceType::I,
        PieceType::J,
        PieceType::L,
        PieceType::O,
        PieceType::S,
        PieceType::T,
        PieceType::Z,
    ];

    // Spawn orientation of the shape
    pub fn structure(&self) -> Structure {
        match self {
            PieceType::I => STRUCTURE_I,
            PieceType::J => STRUCTURE_J,
            PieceType::L => STRUCTURE_L,
            PieceType::O => STRUCTURE_O,
            PieceType::S => STRUCTURE_S,
            PieceType::T => STRUCTURE_T,
            PieceType::Z => STRUCTURE_Z,
        }
    }
}

/// Grid coordinate. Signed so that candidate moves may leave the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Position::new(self.x + dx, self.y + dy)
    }
}

/// Rotation state of a shape: a square occupancy matrix of side `size`
/// stored in the top-left corner of a 4x4 array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    size: usize,
    cells: [[bool; 4]; 4],
}

const STRUCTURE_I: Structure = Structure {
    size: 4,
    cells: [
        [false, false, false, false],
        [true, true, true, true],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_J: Structure = Structure {
    size: 3,
    cells: [
        [true, false, false, false],
        [true, true, true, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_L: Structure = Structure {
    size: 3,
    cells: [
        [false, false, true, false],
        [true, true, true, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_O: Structure = Structure {
    size: 2,
    cells: [
        [true, true, false, false],
        [true, true, false, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_S: Structure = Structure {
    size: 3,
    cells: [
        [false, true, true, false],
        [true, true, false, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_T: Structure = Structure {
    size: 3,
    cells: [
        [false, true, false, false],
        [true, true, true, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

const STRUCTURE_Z: Structure = Structure {
    size: 3,
    cells: [
        [true, true, false, false],
        [false, true, true, false],
        [false, false, false, false],
        [false, false, false, false],
    ],
};

impl Structure {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.cells[y][x]
    }

    /// Next clockwise rotation state. The caller must still validate the
    /// resulting positions against the grid before committing.
    pub fn rotated(&self) -> Structure {
        let n = self.size;
        let mut cells = [[false; 4]; 4];
        for (y, row) in cells.iter_mut().enumerate().take(n) {
            for (x, cell) in row.iter_mut().enumerate().take(n) {
                *cell = self.cells[n - x - 1][y];
            }
        }
        Structure { size: n, cells }
    }

    /// Absolute coordinates of the occupied cells for a given top-left anchor
    pub fn positions(&self, anchor: Position) -> Vec<Position> {
        let mut positions = Vec::with_capacity(4);
        for y in 0..self.size {
            for x in 0..self.size {
                if self.cells[y][x] {
                    positions.push(anchor.offset(x as i32, y as i32));
                }
            }
        }
        positions
    }
}

/// A falling piece.
///
/// `positions` is always derived from `(structure, anchor)`; both
/// constructors and deserialization recompute it so the two never diverge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PieceWire", into = "PieceWire")]
pub struct Piece {
    kind: PieceType,
    structure: Structure,
    anchor: Position,
    positions: Vec<Position>,
}

#[derive(Clone, Serialize, Deserialize)]
struct PieceWire {
    kind: PieceType,
    structure: Structure,
    anchor: Position,
}

impl From<PieceWire> for Piece {
    fn from(wire: PieceWire) -> Self {
        Piece::with_structure(wire.kind, wire.structure, wire.anchor)
    }
}

impl From<Piece> for PieceWire {
    fn from(piece: Piece) -> Self {
        PieceWire {
            kind: piece.kind,
            structure: piece.structure,
            anchor: piece.anchor,
        }
    }
}

impl Piece {
    /// New piece in spawn orientation, horizontally centered on row 0
    pub fn spawn(kind: PieceType) -> Self {
        let structure = kind.structure();
        let x = (GRID_WIDTH - structure.size()) as i32 / 2;
        Piece::with_structure(kind, structure, Position::new(x, 0))
    }

    pub fn with_structure(kind: PieceType, structure: Structure, anchor: Position) -> Self {
        Piece {
            kind,
            structure,
            anchor,
            positions: structure.positions(anchor),
        }
    }

    pub fn kind(&self) -> PieceType {
        self.kind
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Pure translation; the grid is not consulted
    pub fn moved(&self, dx: i32, dy: i32) -> Piece {
        Piece {
            kind: self.kind,
            structure: self.structure,
            anchor: self.anchor.offset(dx, dy),
            positions: self.positions.iter().map(|p| p.offset(dx, dy)).collect(),
        }
    }

    /// Candidate rotated piece around the same anchor
    pub fn rotated(&self) -> Piece {
        Piece::with_structure(self.kind, self.structure.rotated(), self.anchor)
    }
}

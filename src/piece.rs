use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MAX_SHAPE_SIZE: usize = 4;

// ============================================================================
// Tetromino Kinds
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TetrominoType {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::L,
        TetrominoType::J,
        TetrominoType::S,
        TetrominoType::Z,
    ];

    /// Canonical, unrotated shape used at spawn and in the preview box.
    pub fn shape(&self) -> Shape {
        match self {
            TetrominoType::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
            TetrominoType::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            TetrominoType::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
            TetrominoType::L => Shape::from_rows(&[&[1, 0], &[1, 0], &[1, 1]]),
            TetrominoType::J => Shape::from_rows(&[&[0, 1], &[0, 1], &[1, 1]]),
            TetrominoType::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            TetrominoType::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            TetrominoType::I => "#00f0f0",
            TetrominoType::O => "#f0f000",
            TetrominoType::T => "#a000f0",
            TetrominoType::L => "#f0a000",
            TetrominoType::J => "#0000f0",
            TetrominoType::S => "#00f000",
            TetrominoType::Z => "#f00000",
        }
    }

    /// 4x4 mask of the canonical shape anchored at the top-left corner.
    pub fn preview(&self) -> [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE] {
        let mut mask = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (row, col) in self.shape().cells() {
            mask[row][col] = true;
        }
        mask
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Filled cells of a piece's bounding box, at most 4x4.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Shape {
    rows: usize,
    cols: usize,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    fn from_rows(rows: &[&[u8]]) -> Self {
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                cells[i][j] = v != 0;
            }
        }
        Self {
            rows: rows.len(),
            cols: rows.first().map_or(0, |r| r.len()),
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row][col]
    }

    /// Filled `(row, col)` offsets inside the bounding box, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows).flat_map(move |i| {
            (0..self.cols).filter_map(move |j| self.cells[i][j].then_some((i, j)))
        })
    }

    /// Transpose then reverse each row: a clockwise quarter turn.
    pub fn rotated_clockwise(&self) -> Self {
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (i, row) in cells.iter_mut().enumerate().take(self.cols) {
            for (j, cell) in row.iter_mut().enumerate().take(self.rows) {
                *cell = self.cells[self.rows - 1 - j][i];
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform draw over the seven kinds with repeats allowed (no bag).
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::ALL[self.rng.gen_range(0..TetrominoType::ALL.len())]
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(shape: &Shape) -> Vec<String> {
        (0..shape.rows())
            .map(|i| {
                (0..shape.cols())
                    .map(|j| if shape.is_filled(i, j) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn every_canonical_shape_has_four_cells() {
        for kind in TetrominoType::ALL {
            assert_eq!(kind.shape().cells().count(), 4, "{:?}", kind);
        }
    }

    #[test]
    fn t_rotates_clockwise() {
        let rotated = TetrominoType::T.shape().rotated_clockwise();
        assert_eq!(render(&rotated), vec!["#.", "##", "#."]);
    }

    #[test]
    fn i_rotation_swaps_dimensions() {
        let rotated = TetrominoType::I.shape().rotated_clockwise();
        assert_eq!((rotated.rows(), rotated.cols()), (4, 1));
        assert_eq!(rotated.cells().count(), 4);
    }

    #[test]
    fn four_rotations_return_to_canonical() {
        for kind in TetrominoType::ALL {
            let shape = kind.shape();
            let full_turn = shape
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise();
            assert_eq!(full_turn, shape, "{:?}", kind);
        }
    }

    #[test]
    fn preview_matches_canonical_shape() {
        let mask = TetrominoType::L.preview();
        assert!(mask[0][0] && mask[1][0] && mask[2][0] && mask[2][1]);
        assert_eq!(mask.iter().flatten().filter(|c| **c).count(), 4);
        assert!(!mask[3][3]);
    }

    #[test]
    fn seeded_provider_is_reproducible() {
        let mut a = RandomPieceProvider::seeded(42);
        let mut b = RandomPieceProvider::seeded(42);
        let left: Vec<_> = (0..32).map(|_| a.next_piece()).collect();
        let right: Vec<_> = (0..32).map(|_| b.next_piece()).collect();
        assert_eq!(left, right);
    }
}

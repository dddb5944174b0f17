use crate::error::EngineError;
use crate::types::{AnimationHint, Direction, Tile};

/// Fixed-size board stored row-major. Dimensions never change after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergedCell {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

#[derive(Clone, Debug)]
pub struct Shift {
    pub grid: Grid,
    pub merges: Vec<MergedCell>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineSlide {
    pub tiles: Vec<Tile>,
    /// Positions in `tiles` holding the result of a merge.
    pub merged: Vec<usize>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Tile::EMPTY; rows * cols],
        })
    }

    pub fn from_values(rows: usize, cols: usize, values: &[u32]) -> Result<Self, EngineError> {
        let mut grid = Self::new(rows, cols)?;
        if values.len() != grid.cells.len() {
            return Err(EngineError::CellCountMismatch {
                expected: grid.cells.len(),
                actual: values.len(),
            });
        }
        for (cell, &value) in grid.cells.iter_mut().zip(values) {
            cell.value = value;
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<Tile> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    pub fn set_tile(&mut self, row: usize, col: usize, tile: Tile) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.cells[row * self.cols + col] = tile;
        true
    }

    pub fn values(&self) -> Vec<u32> {
        self.cells.iter().map(|tile| tile.value).collect()
    }

    pub fn value_rows(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|tile| tile.value).collect())
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.cols).map(|row| row.to_vec()).collect()
    }

    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_empty())
            .map(|(idx, _)| (idx / self.cols, idx % self.cols))
            .collect()
    }

    pub fn has_empty_cell(&self) -> bool {
        self.cells.iter().any(Tile::is_empty)
    }

    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().map(|tile| tile.value as u64).sum()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|tile| !tile.is_empty()).count()
    }

    pub fn highest_tile(&self) -> u32 {
        self.cells.iter().map(|tile| tile.value).max().unwrap_or(0)
    }

    /// Compares tile values only; animation hints are ignored.
    pub fn same_values(&self, other: &Grid) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.value == b.value)
    }

    pub fn reset_animation_hints(&mut self) {
        for tile in &mut self.cells {
            tile.hint = AnimationHint::None;
        }
    }

    /// Slides and merges every line toward `direction`, leaving `self` untouched.
    pub fn shift(&self, direction: Direction) -> Shift {
        let mut grid = self.clone();
        let mut merges = Vec::new();
        let line_count = if direction.is_horizontal() {
            self.rows
        } else {
            self.cols
        };

        for line in 0..line_count {
            let indices = self.line_cells(direction, line);
            let tiles: Vec<Tile> = indices.iter().map(|&idx| self.cells[idx]).collect();
            let slide = slide_line(&tiles, direction.entry_hint());
            for (&idx, tile) in indices.iter().zip(slide.tiles) {
                grid.cells[idx] = tile;
            }
            for pos in slide.merged {
                let idx = indices[pos];
                merges.push(MergedCell {
                    row: idx / self.cols,
                    col: idx % self.cols,
                    value: grid.cells[idx].value,
                });
            }
        }

        Shift { grid, merges }
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        !self.shift(direction).grid.same_values(self)
    }

    pub fn has_legal_move(&self) -> bool {
        Direction::ALL
            .iter()
            .any(|&direction| self.can_move(direction))
    }

    /// Cell indices of one line, ordered so the first index is where tiles travel to.
    fn line_cells(&self, direction: Direction, line: usize) -> Vec<usize> {
        let cols = self.cols;
        match direction {
            Direction::Left => (0..cols).map(|col| line * cols + col).collect(),
            Direction::Right => (0..cols).rev().map(|col| line * cols + col).collect(),
            Direction::Up => (0..self.rows).map(|row| row * cols + line).collect(),
            Direction::Down => (0..self.rows).rev().map(|row| row * cols + line).collect(),
        }
    }
}

/// Compacts a line toward index 0, merges equal neighbours once, and pads the tail.
///
/// The scan is a single pass: a tile produced by a merge is never merged again
/// during the same call, and a tile always pairs with its immediate successor.
pub fn slide_line(line: &[Tile], pad_hint: AnimationHint) -> LineSlide {
    let mut compacted: Vec<Tile> = line.iter().copied().filter(|tile| !tile.is_empty()).collect();
    let mut merged_flags = vec![false; compacted.len()];

    for idx in 0..compacted.len().saturating_sub(1) {
        let current = compacted[idx].value;
        if current != 0 && current == compacted[idx + 1].value {
            compacted[idx].value = current.saturating_mul(2);
            compacted[idx].hint = AnimationHint::Merged;
            compacted[idx + 1].value = 0;
            merged_flags[idx] = true;
        }
    }

    let mut tiles = vec![Tile::new(0, pad_hint); line.len()];
    let mut merged = Vec::new();
    let survivors = compacted
        .into_iter()
        .zip(merged_flags)
        .filter(|(tile, _)| !tile.is_empty());
    for (slot, (tile, was_merged)) in survivors.enumerate() {
        tiles[slot] = tile;
        if was_merged {
            merged.push(slot);
        }
    }

    LineSlide { tiles, merged }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of(values: &[u32]) -> Vec<Tile> {
        values
            .iter()
            .map(|&value| Tile::new(value, AnimationHint::None))
            .collect()
    }

    fn slide_values(values: &[u32]) -> Vec<u32> {
        slide_line(&line_of(values), AnimationHint::FromRight)
            .tiles
            .iter()
            .map(|tile| tile.value)
            .collect()
    }

    fn grid(rows: usize, cols: usize, values: &[u32]) -> Grid {
        Grid::from_values(rows, cols, values).expect("valid grid")
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 4),
            Err(EngineError::InvalidDimensions { rows: 0, cols: 4 })
        );
        assert_eq!(
            Grid::new(4, 0),
            Err(EngineError::InvalidDimensions { rows: 4, cols: 0 })
        );
    }

    #[test]
    fn from_values_requires_exact_cell_count() {
        assert_eq!(
            Grid::from_values(2, 2, &[2, 2, 2]),
            Err(EngineError::CellCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn three_equal_tiles_merge_only_the_leading_pair() {
        assert_eq!(slide_values(&[2, 2, 2, 0]), vec![4, 2, 0, 0]);
    }

    #[test]
    fn two_pairs_merge_independently() {
        assert_eq!(slide_values(&[2, 2, 4, 4]), vec![4, 8, 0, 0]);
        assert_eq!(slide_values(&[2, 2, 2, 2]), vec![4, 4, 0, 0]);
    }

    #[test]
    fn merged_tile_is_not_merged_again() {
        assert_eq!(slide_values(&[2, 2, 4, 0]), vec![4, 4, 0, 0]);
        assert_eq!(slide_values(&[4, 2, 2, 0]), vec![4, 4, 0, 0]);
    }

    #[test]
    fn gaps_are_compacted_before_merging() {
        assert_eq!(slide_values(&[2, 0, 0, 2]), vec![4, 0, 0, 0]);
        assert_eq!(slide_values(&[0, 4, 0, 8]), vec![4, 8, 0, 0]);
    }

    #[test]
    fn slide_tags_merges_and_padding() {
        let slide = slide_line(&line_of(&[2, 2, 8, 0]), AnimationHint::FromRight);
        assert_eq!(slide.merged, vec![0]);
        assert_eq!(slide.tiles[0].hint, AnimationHint::Merged);
        assert_eq!(slide.tiles[1].hint, AnimationHint::None);
        assert_eq!(slide.tiles[2], Tile::new(0, AnimationHint::FromRight));
        assert_eq!(slide.tiles[3], Tile::new(0, AnimationHint::FromRight));
    }

    #[test]
    fn shift_left_matches_line_rule() {
        let before = grid(2, 4, &[2, 2, 4, 4, 2, 2, 2, 0]);
        let after = before.shift(Direction::Left);
        assert_eq!(after.grid.values(), vec![4, 8, 0, 0, 4, 2, 0, 0]);
        assert_eq!(after.merges.len(), 3);
    }

    #[test]
    fn shift_right_merges_toward_the_right_edge() {
        let before = grid(1, 4, &[2, 2, 2, 0]);
        let after = before.shift(Direction::Right);
        assert_eq!(after.grid.values(), vec![0, 0, 2, 4]);
        assert_eq!(
            after.merges,
            vec![MergedCell {
                row: 0,
                col: 3,
                value: 4
            }]
        );
        assert_eq!(after.grid.tile(0, 0).map(|t| t.hint), Some(AnimationHint::FromLeft));
    }

    #[test]
    fn shift_up_and_down_operate_on_columns() {
        let before = grid(4, 1, &[2, 2, 2, 0]);
        assert_eq!(before.shift(Direction::Up).grid.values(), vec![4, 2, 0, 0]);
        assert_eq!(before.shift(Direction::Down).grid.values(), vec![0, 0, 2, 4]);
        assert_eq!(
            before.shift(Direction::Up).grid.tile(3, 0).map(|t| t.hint),
            Some(AnimationHint::FromBottom)
        );
        assert_eq!(
            before.shift(Direction::Down).grid.tile(0, 0).map(|t| t.hint),
            Some(AnimationHint::FromTop)
        );
    }

    #[test]
    fn shift_leaves_source_grid_untouched() {
        let before = grid(1, 4, &[2, 2, 0, 0]);
        let _ = before.shift(Direction::Left);
        assert_eq!(before.values(), vec![2, 2, 0, 0]);
    }

    #[test]
    fn blocked_tile_does_not_move() {
        let before = grid(1, 4, &[0, 0, 0, 2]);
        assert!(!before.can_move(Direction::Right));
        assert!(before.shift(Direction::Right).grid.same_values(&before));
        assert!(before.can_move(Direction::Left));
    }

    #[test]
    fn non_square_grids_keep_their_shape() {
        let before = grid(
            3,
            5,
            &[
                2, 0, 2, 0, 4, //
                0, 0, 0, 0, 0, //
                8, 8, 8, 0, 2,
            ],
        );
        for direction in Direction::ALL {
            let after = before.shift(direction).grid;
            assert_eq!(after.rows(), 3);
            assert_eq!(after.cols(), 5);
            assert_eq!(after.value_rows().len(), 3);
            assert!(after.value_rows().iter().all(|row| row.len() == 5));
        }
        assert_eq!(
            before.shift(Direction::Left).grid.value_rows(),
            vec![vec![4, 4, 0, 0, 0], vec![0; 5], vec![16, 8, 2, 0, 0]]
        );
        assert_eq!(
            before.shift(Direction::Down).grid.value_rows(),
            vec![vec![0; 5], vec![2, 0, 2, 0, 4], vec![8, 8, 8, 0, 2]]
        );
    }

    #[test]
    fn shifting_never_loses_value_or_adds_tiles() {
        let samples: [&[u32]; 4] = [
            &[2, 2, 2, 2, 4, 0, 4, 8, 0, 0, 0, 0, 16, 16, 2, 2],
            &[2, 4, 8, 16, 4, 8, 16, 2, 8, 16, 2, 4, 16, 2, 4, 8],
            &[0, 0, 0, 2, 0, 0, 2, 0, 0, 2, 0, 0, 2, 0, 0, 0],
            &[4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
        ];
        for values in samples {
            let before = grid(4, 4, values);
            for direction in Direction::ALL {
                let after = before.shift(direction).grid;
                assert_eq!(after.tile_sum(), before.tile_sum());
                assert!(after.occupied_count() <= before.occupied_count());
            }
        }
    }

    #[test]
    fn full_board_without_pairs_has_no_legal_move() {
        let stuck = grid(
            4,
            4,
            &[2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2],
        );
        assert!(!stuck.has_legal_move());
        for direction in Direction::ALL {
            assert!(stuck.shift(direction).grid.same_values(&stuck));
        }
    }

    #[test]
    fn same_values_ignores_hints() {
        let mut a = grid(1, 2, &[2, 4]);
        let b = a.clone();
        a.set_tile(0, 0, Tile::new(2, AnimationHint::Spawned));
        assert!(a.same_values(&b));
        a.reset_animation_hints();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_cells_are_reported_row_major() {
        let g = grid(2, 2, &[2, 0, 0, 4]);
        assert_eq!(g.empty_cells(), vec![(0, 1), (1, 0)]);
        assert!(g.has_empty_cell());
        assert_eq!(g.highest_tile(), 4);
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("grid dimensions must be non-zero (got {rows}x{cols})")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("expected {expected} cells for the grid, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("spawn probability must be within [0, 1] (got {0})")]
    InvalidSpawnProbability(f32),
    #[error("spawn values must be non-zero (got {base} and {high})")]
    InvalidSpawnValue { base: u32, high: u32 },
}

pub const DEFAULT_ROWS: usize = 4;
pub const DEFAULT_COLS: usize = 4;

pub const INITIAL_TILE_COUNT: usize = 2;
pub const BASE_SPAWN_VALUE: u32 = 2;
pub const HIGH_SPAWN_VALUE: u32 = 4;
pub const HIGH_SPAWN_PROBABILITY: f32 = 0.2;

// Bounds for dimensions requested by remote clients.
pub const MIN_CLIENT_DIMENSION: usize = 2;
pub const MAX_CLIENT_DIMENSION: usize = 8;

pub const DEFAULT_MAX_SIMULATED_MOVES: u64 = 20_000;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Hint given to cells that open up behind the moving tiles.
    pub fn entry_hint(self) -> AnimationHint {
        match self {
            Direction::Up => AnimationHint::FromBottom,
            Direction::Right => AnimationHint::FromLeft,
            Direction::Down => AnimationHint::FromTop,
            Direction::Left => AnimationHint::FromRight,
        }
    }
}

/// Presentation-only tag. Never consulted by the merge rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationHint {
    FromTop,
    FromRight,
    FromBottom,
    FromLeft,
    Spawned,
    Merged,
    #[default]
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub value: u32,
    #[serde(rename = "animation")]
    pub hint: AnimationHint,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        value: 0,
        hint: AnimationHint::None,
    };

    pub fn new(value: u32, hint: AnimationHint) -> Self {
        Self { value, hint }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    BoardFull,
    Stuck,
    MoveLimit,
}

impl GameOverReason {
    pub fn key(self) -> &'static str {
        match self {
            GameOverReason::BoardFull => "board_full",
            GameOverReason::Stuck => "stuck",
            GameOverReason::MoveLimit => "move_limit",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    #[serde(rename = "baseSpawnValue")]
    pub base_spawn_value: u32,
    #[serde(rename = "highSpawnValue")]
    pub high_spawn_value: u32,
    #[serde(rename = "highSpawnProbability")]
    pub high_spawn_probability: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    TileSpawned { row: usize, col: usize, value: u32 },
    TilesMerged { row: usize, col: usize, value: u32 },
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub seq: u64,
    pub rows: usize,
    pub cols: usize,
    pub tiles: Vec<Vec<Tile>>,
    pub over: bool,
    pub stuck: bool,
    #[serde(rename = "highestTile")]
    pub highest_tile: u32,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: GameOverReason,
    pub moves: u64,
    #[serde(rename = "noOpMoves")]
    pub no_op_moves: u64,
    #[serde(rename = "highestTile")]
    pub highest_tile: u32,
    #[serde(rename = "tileSum")]
    pub tile_sum: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "startedAt")]
    pub started_at: String,
}

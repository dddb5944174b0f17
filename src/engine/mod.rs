use tracing::debug;

use crate::constants::{
    BASE_SPAWN_VALUE, DEFAULT_COLS, DEFAULT_ROWS, HIGH_SPAWN_PROBABILITY, HIGH_SPAWN_VALUE,
};
use crate::error::EngineError;
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Direction, GameConfig, GameOverReason, GameSummary, RuntimeEvent, Snapshot};

mod spawn_system;
mod utils;

use self::utils::{now_ms, now_rfc3339};

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub rows: usize,
    pub cols: usize,
    pub base_spawn_value: u32,
    pub high_spawn_value: u32,
    pub high_spawn_probability: f32,
    /// Fixed seed for reproducible spawns; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            base_spawn_value: BASE_SPAWN_VALUE,
            high_spawn_value: HIGH_SPAWN_VALUE,
            high_spawn_probability: HIGH_SPAWN_PROBABILITY,
            seed: None,
        }
    }
}

impl GameEngineOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(EngineError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !self.high_spawn_probability.is_finite()
            || !(0.0..=1.0).contains(&self.high_spawn_probability)
        {
            return Err(EngineError::InvalidSpawnProbability(
                self.high_spawn_probability,
            ));
        }
        if self.base_spawn_value == 0 || self.high_spawn_value == 0 {
            return Err(EngineError::InvalidSpawnValue {
                base: self.base_spawn_value,
                high: self.high_spawn_value,
            });
        }
        Ok(())
    }
}

/// Result of feeding one direction to the engine.
#[derive(Clone, Debug)]
pub enum MoveOutcome {
    /// The game already ended; the move was not evaluated.
    Rejected,
    /// No tile moved or merged. Nothing is published.
    Unchanged,
    Moved(Snapshot),
    /// A spawn found no empty cell. The snapshot is the empty game-over sentinel.
    GameOver(Snapshot),
}

impl MoveOutcome {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            MoveOutcome::Moved(snapshot) | MoveOutcome::GameOver(snapshot) => Some(snapshot),
            MoveOutcome::Rejected | MoveOutcome::Unchanged => None,
        }
    }
}

/// One game of the merge puzzle. A new game is a new engine.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub started_at_ms: u64,
    pub config: GameConfig,

    grid: Grid,
    rng: Rng,
    events: Vec<RuntimeEvent>,
    ended: bool,
    ended_at_ms: Option<u64>,
    started_at: String,
    snapshot_seq: u64,
    moves: u64,
    no_op_moves: u64,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Result<Self, EngineError> {
        options.validate()?;
        let grid = Grid::new(options.rows, options.cols)?;
        let rng = options.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);

        let config = GameConfig {
            rows: options.rows,
            cols: options.cols,
            base_spawn_value: options.base_spawn_value,
            high_spawn_value: options.high_spawn_value,
            high_spawn_probability: options.high_spawn_probability,
        };

        let mut engine = Self {
            started_at_ms: now_ms(),
            config,
            grid,
            rng,
            events: Vec::new(),
            ended: false,
            ended_at_ms: None,
            started_at: now_rfc3339(),
            snapshot_seq: 0,
            moves: 0,
            no_op_moves: 0,
        };
        engine.spawn_initial_tiles();
        Ok(engine)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Full board with every direction a no-op. Advisory only: the game ends
    /// when a spawn finds no empty cell, not when this turns true.
    pub fn is_stuck(&self) -> bool {
        !self.grid.has_empty_cell() && !self.grid.has_legal_move()
    }

    pub fn apply_move(&mut self, direction: Direction) -> MoveOutcome {
        if self.ended {
            debug!(?direction, "move ignored after game over");
            return MoveOutcome::Rejected;
        }

        let shift = self.grid.shift(direction);
        if shift.grid.same_values(&self.grid) {
            self.no_op_moves += 1;
            debug!(?direction, "move left the grid unchanged");
            return MoveOutcome::Unchanged;
        }

        self.moves += 1;
        for merged in &shift.merges {
            self.events.push(RuntimeEvent::TilesMerged {
                row: merged.row,
                col: merged.col,
                value: merged.value,
            });
        }
        debug!(
            ?direction,
            merges = shift.merges.len(),
            move_index = self.moves,
            "move applied"
        );
        self.grid = shift.grid;

        if self.spawn_tile() {
            MoveOutcome::Moved(self.build_snapshot())
        } else {
            self.mark_terminal();
            MoveOutcome::GameOver(self.build_snapshot())
        }
    }

    /// Publishes the current state and drains pending events. Animation hints
    /// are cleared afterwards so each hint is rendered once.
    pub fn build_snapshot(&mut self) -> Snapshot {
        let tiles = if self.ended {
            Vec::new()
        } else {
            self.grid.to_rows()
        };
        let snapshot = Snapshot {
            seq: self.snapshot_seq,
            rows: self.config.rows,
            cols: self.config.cols,
            tiles,
            over: self.ended,
            stuck: !self.ended && self.is_stuck(),
            highest_tile: self.grid.highest_tile(),
            events: std::mem::take(&mut self.events),
        };
        self.snapshot_seq += 1;
        self.grid.reset_animation_hints();
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        let reason = if self.ended {
            GameOverReason::BoardFull
        } else if self.is_stuck() {
            GameOverReason::Stuck
        } else {
            GameOverReason::MoveLimit
        };
        let finished_at_ms = self.ended_at_ms.unwrap_or_else(now_ms);

        GameSummary {
            reason,
            moves: self.moves,
            no_op_moves: self.no_op_moves,
            highest_tile: self.grid.highest_tile(),
            tile_sum: self.grid.tile_sum(),
            duration_ms: finished_at_ms.saturating_sub(self.started_at_ms),
            started_at: self.started_at.clone(),
        }
    }
}

use tracing::{debug, info};

use super::*;
use crate::constants::INITIAL_TILE_COUNT;
use crate::types::{AnimationHint, Tile};

use super::utils::pick_spawn_value;

impl GameEngine {
    pub(super) fn spawn_initial_tiles(&mut self) {
        for _ in 0..INITIAL_TILE_COUNT {
            if !self.spawn_tile() {
                self.mark_terminal();
                return;
            }
        }
    }

    /// Places one tile in a uniformly chosen empty cell. Returns false when
    /// the grid has no empty cell.
    pub(super) fn spawn_tile(&mut self) -> bool {
        let empty = self.grid.empty_cells();
        if empty.is_empty() {
            return false;
        }
        let (row, col) = empty[self.rng.pick_index(empty.len())];
        let value = pick_spawn_value(&self.config, &mut self.rng);
        self.grid
            .set_tile(row, col, Tile::new(value, AnimationHint::Spawned));
        self.events
            .push(RuntimeEvent::TileSpawned { row, col, value });
        debug!(row, col, value, "tile spawned");
        true
    }

    pub(super) fn mark_terminal(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.ended_at_ms = Some(now_ms());
        self.events.push(RuntimeEvent::GameOver);
        info!(
            moves = self.moves,
            highest_tile = self.grid.highest_tile(),
            "no empty cell left for a spawn, game over"
        );
    }
}

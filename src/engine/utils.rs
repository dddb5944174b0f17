use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};

use crate::rng::Rng;
use crate::types::GameConfig;

pub(super) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(super) fn pick_spawn_value(config: &GameConfig, rng: &mut Rng) -> u32 {
    if rng.bool(config.high_spawn_probability) {
        config.high_spawn_value
    } else {
        config.base_spawn_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(probability: f32) -> GameConfig {
        GameConfig {
            rows: 4,
            cols: 4,
            base_spawn_value: 2,
            high_spawn_value: 4,
            high_spawn_probability: probability,
        }
    }

    #[test]
    fn spawn_value_ratio_is_close_to_configured_probability() {
        let config = config(0.2);
        let mut rng = Rng::new(2_048);
        let trials = 20_000;
        let fours = (0..trials)
            .filter(|_| pick_spawn_value(&config, &mut rng) == 4)
            .count();
        let ratio = fours as f64 / trials as f64;
        assert!((0.18..=0.22).contains(&ratio), "ratio of fours was {ratio}");
    }

    #[test]
    fn zero_probability_always_spawns_base_value() {
        let config = config(0.0);
        let mut rng = Rng::new(1);
        assert!((0..1_000).all(|_| pick_spawn_value(&config, &mut rng) == 2));
    }
}

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use serde::Serialize;
use tile_merge_server::constants::{DEFAULT_COLS, DEFAULT_MAX_SIMULATED_MOVES, DEFAULT_ROWS};
use tile_merge_server::engine::{GameEngine, GameEngineOptions, MoveOutcome};
use tile_merge_server::rng::Rng;
use tile_merge_server::types::{Direction, GameOverReason, Snapshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 3)]
    games: u32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,
    #[arg(long, default_value_t = DEFAULT_COLS)]
    cols: usize,
    /// Upper bound on direction inputs per game, no-ops included.
    #[arg(long, default_value_t = DEFAULT_MAX_SIMULATED_MOVES)]
    max_moves: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,
}

#[derive(Clone, Debug)]
struct SimulatedGame {
    name: String,
    seed: u64,
    rows: usize,
    cols: usize,
    max_moves: u64,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: String,
    seed: u64,
    rows: usize,
    cols: usize,
    reason: GameOverReason,
    moves: u64,
    #[serde(rename = "noOpMoves")]
    no_op_moves: u64,
    #[serde(rename = "highestTile")]
    highest_tile: u32,
    #[serde(rename = "tileSum")]
    tile_sum: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    input: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct GameRunResult {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageMoves")]
    average_moves: u64,
    #[serde(rename = "bestTile")]
    best_tile: u32,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let games = resolve_games(&cli);
    let started_at = now_rfc3339();
    let seed_hint = games.first().map(|game| game.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, &started_at));

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for game in games {
        info!(
            %run_id,
            game = %game.name,
            seed = game.seed,
            rows = game.rows,
            cols = game.cols,
            "game started"
        );
        let run = run_game(&game).with_context(|| format!("failed to start {}", game.name))?;

        for anomaly in &run.anomaly_records {
            warn!(
                %run_id,
                game = %game.name,
                input = anomaly.input,
                message = %anomaly.message,
                "anomaly detected"
            );
        }
        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();
        *reason_counts
            .entry(run.result.reason.key().to_string())
            .or_insert(0) += 1;

        info!(
            %run_id,
            game = %game.name,
            reason = run.result.reason.key(),
            moves = run.result.moves,
            highest_tile = run.result.highest_tile,
            "game finished"
        );
        println!(
            "{}",
            serde_json::to_string(&run.result).context("game result should serialize")?
        );
        results.push(run.result);
    }

    let summary = build_run_summary(
        run_id,
        started_at,
        now_rfc3339(),
        results,
        reason_counts,
        total_anomalies,
    );
    if let Some(path) = cli.summary_out.as_deref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!(path = %path.display(), "run summary written");
    }

    info!(
        run_id = %summary.run_id,
        games = summary.game_count,
        anomalies = summary.anomaly_count,
        average_moves = summary.average_moves,
        best_tile = summary.best_tile,
        "run finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
    Ok(())
}

fn run_game(game: &SimulatedGame) -> Result<GameRunResult> {
    let mut engine = GameEngine::new(GameEngineOptions {
        rows: game.rows,
        cols: game.cols,
        seed: Some(game.seed),
        ..GameEngineOptions::default()
    })?;
    let mut input_rng = Rng::new(game.seed.wrapping_add(1));

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let opening = engine.build_snapshot();
    for message in collect_snapshot_anomalies(&opening, game.rows, game.cols) {
        push_anomaly(&mut anomalies, &mut anomaly_records, &mut anomaly_seen, 0, message);
    }

    let mut last_sum = engine.grid().tile_sum();
    let mut inputs = 0u64;
    while !engine.is_ended() && !engine.is_stuck() && inputs < game.max_moves {
        inputs += 1;
        let direction = Direction::ALL[input_rng.pick_index(Direction::ALL.len())];
        let outcome = engine.apply_move(direction);
        let sum = engine.grid().tile_sum();

        match &outcome {
            MoveOutcome::Moved(snapshot) => {
                for message in collect_snapshot_anomalies(snapshot, game.rows, game.cols) {
                    push_anomaly(
                        &mut anomalies,
                        &mut anomaly_records,
                        &mut anomaly_seen,
                        inputs,
                        message,
                    );
                }
                let added = sum.saturating_sub(last_sum);
                if sum < last_sum || (added != 2 && added != 4) {
                    push_anomaly(
                        &mut anomalies,
                        &mut anomaly_records,
                        &mut anomaly_seen,
                        inputs,
                        format!("tile sum changed by an unexpected amount: {last_sum} -> {sum}"),
                    );
                }
            }
            MoveOutcome::Unchanged => {
                if sum != last_sum {
                    push_anomaly(
                        &mut anomalies,
                        &mut anomaly_records,
                        &mut anomaly_seen,
                        inputs,
                        "no-op move changed the tile sum".to_string(),
                    );
                }
            }
            MoveOutcome::GameOver(snapshot) => {
                if !snapshot.over || !snapshot.tiles.is_empty() {
                    push_anomaly(
                        &mut anomalies,
                        &mut anomaly_records,
                        &mut anomaly_seen,
                        inputs,
                        "game over snapshot is not the empty sentinel".to_string(),
                    );
                }
            }
            MoveOutcome::Rejected => {}
        }
        last_sum = sum;
    }

    let summary = engine.build_summary();
    Ok(GameRunResult {
        result: GameResultLine {
            game: game.name.clone(),
            seed: game.seed,
            rows: game.rows,
            cols: game.cols,
            reason: summary.reason,
            moves: summary.moves,
            no_op_moves: summary.no_op_moves,
            highest_tile: summary.highest_tile,
            tile_sum: summary.tile_sum,
            duration_ms: summary.duration_ms,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, rows: usize, cols: usize) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.over {
        return anomalies;
    }
    if snapshot.rows != rows || snapshot.cols != cols || snapshot.tiles.len() != rows {
        anomalies.push(format!(
            "grid shape changed: expected {rows}x{cols}, got {}x{}",
            snapshot.tiles.len(),
            snapshot.tiles.first().map(Vec::len).unwrap_or(0)
        ));
    }
    if snapshot.tiles.iter().any(|row| row.len() != cols) {
        anomalies.push("row with unexpected length".to_string());
    }
    for tile in snapshot.tiles.iter().flatten() {
        if tile.value != 0 && (!tile.value.is_power_of_two() || tile.value == 1) {
            anomalies.push(format!("tile value is not a power of two: {}", tile.value));
        }
    }
    anomalies
}

fn resolve_games(cli: &Cli) -> Vec<SimulatedGame> {
    let seed = cli.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    });
    let rows = cli.rows.max(1);
    let cols = cli.cols.max(1);

    (0..cli.games.max(1))
        .map(|idx| SimulatedGame {
            name: format!("game-{}-{rows}x{cols}", idx + 1),
            seed: seed.wrapping_add(idx as u64),
            rows,
            cols,
            max_moves: cli.max_moves.max(1),
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    input: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        input,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, started_at: &str) -> String {
    format!("sim-{seed}-{started_at}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    games: Vec<GameResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let total_moves: u64 = games.iter().map(|game| game.moves).sum();
    let average_moves = if game_count == 0 {
        0
    } else {
        total_moves / game_count as u64
    };
    let best_tile = games.iter().map(|game| game.highest_tile).max().unwrap_or(0);
    RunSummary {
        run_id,
        started_at,
        finished_at,
        game_count,
        anomaly_count,
        average_moves,
        best_tile,
        reason_counts,
        games,
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)?;
    Ok(())
}

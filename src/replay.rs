// Replay module for analyzing logged turns and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the planner on logged states with the logged seed
// 3. Compare logged vs replayed moves
// 4. Generate analysis reports
//
// Turns are independent of each other, so whole logs are replayed in parallel.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::LogEntry;
use crate::planner::{plan, Decision};
use crate::types::Direction;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub best_route: Option<String>,
    pub candidate_count: usize,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Runs the planner on a logged turn with the turn's own seed
    pub fn replay_turn(&self, entry: &LogEntry) -> Result<(Decision, u128), String> {
        let state = entry.game_state()?;
        let start_time = Instant::now();
        let mut rng = StdRng::seed_from_u64(entry.seed);
        let decision = plan(&state, &self.config, &mut rng)
            .map_err(|e| format!("Turn {} cannot be played: {}", entry.turn, e))?;
        Ok((decision, start_time.elapsed().as_millis()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let (decision, computation_time) = self.replay_turn(entry)?;
        let matches = entry.chosen_move == decision.direction;
        let best_route = decision.best_route().map(|r| r.to_string());

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} ({}, {}ms)",
                    entry.turn,
                    decision.direction,
                    best_route.as_deref().unwrap_or("fallback"),
                    computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} ({}, {}ms)",
                    entry.turn,
                    entry.chosen_move,
                    decision.direction,
                    best_route.as_deref().unwrap_or("fallback"),
                    computation_time
                );
                info!("Turn {} map:\n{}", entry.turn, decision.grid);
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            original_move: entry.chosen_move,
            replayed_move: decision.direction,
            matches,
            best_route,
            candidate_count: decision.routes.candidates().len(),
            computation_time_ms: computation_time,
        })
    }

    /// Replays all entries, in parallel, keeping log order in the results
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        entries
            .par_iter()
            .filter_map(|entry| match self.replay_entry(entry) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                    None
                }
            })
            .collect()
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let count = results.len() as f64;
            let avg_time =
                results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / count;
            let avg_routes = results.iter().map(|r| r.candidate_count as f64).sum::<f64>() / count;

            println!("Average Candidate Routes:   {:.1}", avg_routes);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} ({})",
                    result.turn,
                    result.original_move,
                    result.replayed_move,
                    result.best_route.as_deref().unwrap_or("fallback"),
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            if !acceptable.contains(&entry.chosen_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    entry.chosen_move
                ));
            }
        }

        Ok(())
    }
}

/// Parses `turn:move|move,...` into per-turn acceptable moves
pub fn parse_expected_moves(s: &str) -> Result<Vec<(i32, Vec<Direction>)>, String> {
    s.split(',')
        .map(|pair| {
            let (turn, moves) = pair
                .trim()
                .split_once(':')
                .ok_or_else(|| format!("Invalid format '{}'. Expected 'turn:move'", pair))?;

            let turn = turn
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", turn, e))?;

            // Several acceptable moves are separated by '|'
            let moves = moves
                .split('|')
                .map(|m| m.trim().parse::<Direction>())
                .collect::<Result<Vec<_>, _>>()?;

            Ok((turn, moves))
        })
        .collect()
}

/// Parses a comma separated list of turn numbers
pub fn parse_turns(s: &str) -> Result<Vec<i32>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

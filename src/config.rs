// Configuration module for reading Snake.toml
// Every tuning constant of the route engine lives here and is passed into the pipeline explicitly

use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub route: RouteConfig,
    pub scores: ScoresConfig,
    pub targets: TargetsConfig,
    pub snake: SnakeConfig,
    pub appearance: AppearanceConfig,
    pub debug: DebugConfig,
}

/// Response time budget of the move endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Bounds of the greedy route search
#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    /// Initial per-turn step limit; resolved routes tighten it further
    pub step_limit: usize,
    /// Number of leading steps penalized for enemy heads next to the current cell
    pub best_move_selection: usize,
    /// Lookahead of an opponent simulation
    pub opponent_max_steps: usize,
    /// A back-route stuck before this many steps marks the destination as a trap
    pub min_backroute_steps: usize,
    /// Largest board, in cells, a request may describe
    pub max_board_cells: usize,
}

/// Score weights; every value is added to a route's raw score or a cell's overlay
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    // Route outcome penalties
    pub unresolved_bump: i32,
    pub direct_neighbor_bump: i32,
    pub snake_around_bump: i32,
    pub unavailable_tail_bump: i32,

    // Cell overlay bumps
    pub border_bump: i32,
    pub opponent_head_bump: i32,
    pub opponent_path_bump: i32,
    pub opponent_food_tail_bump: i32,
}

/// Which target families are generated, and how decoys are placed
#[derive(Debug, Deserialize, Clone)]
pub struct TargetsConfig {
    pub decoy_count: usize,
    /// Share of each axis, centred, from which decoys are drawn
    pub decoy_scope_percent: u8,
    pub decoys_enabled: bool,
    pub corners_enabled: bool,
    pub tail_route_enabled: bool,
    pub tail_route_min_length: usize,
}

/// Thresholds on the controlled snake
#[derive(Debug, Deserialize, Clone)]
pub struct SnakeConfig {
    /// At or below this health only food routes are generated
    pub health_critical: i32,
    /// Below this length the own tail is never treated as passable
    pub min_length: usize,
}

/// Appearance reported on GET /
#[derive(Debug, Deserialize, Clone)]
pub struct AppearanceConfig {
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
            },
            route: RouteConfig {
                step_limit: 50,
                best_move_selection: 1,
                opponent_max_steps: 4,
                min_backroute_steps: 15,
                max_board_cells: 4096,
            },
            scores: ScoresConfig {
                unresolved_bump: 300,
                direct_neighbor_bump: 80,
                snake_around_bump: 5,
                unavailable_tail_bump: 50,
                border_bump: 10,
                opponent_head_bump: 5,
                opponent_path_bump: 5,
                opponent_food_tail_bump: 100,
            },
            targets: TargetsConfig {
                decoy_count: 6,
                decoy_scope_percent: 70,
                decoys_enabled: true,
                corners_enabled: true,
                tail_route_enabled: false,
                tail_route_min_length: 4,
            },
            snake: SnakeConfig {
                health_critical: 20,
                min_length: 2,
            },
            appearance: AppearanceConfig {
                author: "routesnake".to_string(),
                color: "#ff00ff".to_string(),
                head: "default".to_string(),
                tail: "default".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "routesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

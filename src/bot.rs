// Battlesnake service facade
//
// Maps the API endpoints onto the route planner. Planning is synchronous and
// CPU bound, so every move runs on the blocking pool under the turn's time
// budget; a late or failed computation is answered with the default move.

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::{DebugLogger, LogEntry};
use crate::error::MalformedState;
use crate::planner::plan;
use crate::types::{Battlesnake, Board, Direction, Game, GameState};

/// Battlesnake Bot
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Arc<Config>,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance without audit logging
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, DebugLogger::disabled())
    }

    /// Creates a new Bot instance that records every decided move
    pub fn with_logger(config: Config, logger: DebugLogger) -> Self {
        Bot {
            config: Arc::new(config),
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        let appearance = &self.config.appearance;
        json!({
            "apiversion": "1",
            "author": appearance.author,
            "color": appearance.color,
            "head": appearance.head,
            "tail": appearance.tail,
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, you: &Battlesnake) {
        info!(
            "GAME START {} ({}x{}, {} snakes) as {}",
            game.id,
            board.width,
            board.height,
            board.snakes.len(),
            you.id
        );
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, _board: &Board, _you: &Battlesnake) {
        info!("GAME OVER {} after {} turns", game.id, turn);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// # Arguments
    /// * `game` - Current game metadata
    /// * `turn` - Current turn number
    /// * `board` - Current board state
    /// * `you` - Your snake's current state
    ///
    /// # Returns
    /// * `Result<Value, MalformedState>` - JSON response containing the chosen move
    ///   direction, or why the request cannot be played
    pub async fn get_move(
        &self,
        game: &Game,
        turn: &i32,
        board: &Board,
        you: &Battlesnake,
    ) -> Result<Value, MalformedState> {
        let start_time = Instant::now();

        let state = GameState {
            game: game.clone(),
            turn: *turn,
            board: board.clone(),
            you: you.clone(),
        };
        let seed: u64 = rand::random();

        let task_state = state.clone();
        let config = self.config.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            plan(&task_state, &config, &mut rng)
        });

        let budget = self.config.timing.effective_budget_ms();
        let decision = match tokio::time::timeout(Duration::from_millis(budget), task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                error!("Turn {}: move computation failed: {}", turn, e);
                return Ok(Self::respond(Direction::default()));
            }
            Err(_) => {
                warn!(
                    "Turn {}: no decision within {}ms, answering {}",
                    turn,
                    budget,
                    Direction::default()
                );
                return Ok(Self::respond(Direction::default()));
            }
        };

        let best_route = decision.best_route().map(|r| r.to_string());
        info!(
            "Turn {}: Chose {} (route: {}, time: {}ms)",
            turn,
            decision.direction,
            best_route.as_deref().unwrap_or("fallback"),
            start_time.elapsed().as_millis()
        );

        self.logger
            .log_move(LogEntry::new(&state, seed, decision.direction, best_route));

        Ok(Self::respond(decision.direction))
    }

    fn respond(direction: Direction) -> Value {
        json!({ "move": direction.as_str() })
    }
}

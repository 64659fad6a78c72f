// Audit log of every decided move
//
// Fire-and-forget async logging so the response is never held up by disk I/O.
// Each turn becomes one JSON line carrying everything needed to replay it,
// including the seed of the turn's decoy randomness.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::types::{Board, Direction, Game, GameState};

/// One logged turn
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub turn: i32,
    pub game_id: String,
    pub you_id: String,
    pub seed: u64,
    pub chosen_move: Direction,
    /// Rendered best route, absent when the move came from the fallback
    #[serde(default)]
    pub best_route: Option<String>,
    pub board: Board,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(
        state: &GameState,
        seed: u64,
        chosen_move: Direction,
        best_route: Option<String>,
    ) -> Self {
        LogEntry {
            turn: state.turn,
            game_id: state.game.id.clone(),
            you_id: state.you.id.clone(),
            seed,
            chosen_move,
            best_route,
            board: state.board.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuilds the move request the entry was logged for
    pub fn game_state(&self) -> Result<GameState, String> {
        let you = self
            .board
            .snakes
            .iter()
            .find(|s| s.id == self.you_id)
            .cloned()
            .ok_or_else(|| format!("Snake with id '{}' not found in board state", self.you_id))?;

        Ok(GameState {
            game: Game {
                id: self.game_id.clone(),
                ..Game::default()
            },
            turn: self.turn,
            board: self.board.clone(),
            you,
        })
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a move decision asynchronously (fire-and-forget)
    /// Must be called from within a tokio runtime
    pub fn log_move(&self, entry: LogEntry) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        tokio::spawn(async move {
            Self::append(file_handle, entry).await;
        });
    }

    /// Writes one entry as a JSON line and flushes it
    async fn append(file_handle: Arc<Mutex<Option<File>>>, entry: LogEntry) {
        let mut file_guard = file_handle.lock().await;
        let Some(file) = file_guard.as_mut() else {
            return;
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        if let Err(e) = file.write_all(format!("{}\n", json_line).as_bytes()).await {
            error!("Failed to write debug log entry: {}", e);
        } else if let Err(e) = file.flush().await {
            error!("Failed to flush debug log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Battlesnake, Coord};

    fn sample_state() -> GameState {
        let you = Battlesnake::new("me", 90, vec![Coord::new(5, 5), Coord::new(5, 6)]);
        GameState {
            game: Game {
                id: "game-1".to_string(),
                ..Game::default()
            },
            turn: 7,
            board: Board {
                width: 11,
                height: 11,
                food: vec![Coord::new(5, 2)],
                snakes: vec![you.clone()],
                hazards: vec![],
            },
            you,
        }
    }

    #[test]
    fn test_entry_restores_game_state() {
        let state = sample_state();
        let entry = LogEntry::new(&state, 42, Direction::Up, None);
        let restored = entry.game_state().unwrap();

        assert_eq!(restored.turn, 7);
        assert_eq!(restored.game.id, "game-1");
        assert_eq!(restored.you.id, "me");
        assert_eq!(restored.board.food, state.board.food);
    }

    #[test]
    fn test_entry_without_own_snake_is_rejected() {
        let mut entry = LogEntry::new(&sample_state(), 1, Direction::Up, None);
        entry.you_id = "ghost".to_string();
        assert!(entry.game_state().is_err());
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let logger = DebugLogger::new(false, "should_not_exist.jsonl").await;
        assert!(!logger.is_enabled());
        logger.log_move(LogEntry::new(&sample_state(), 1, Direction::Up, None));
        assert!(!std::path::Path::new("should_not_exist.jsonl").exists());
    }

    #[tokio::test]
    async fn test_append_writes_json_line() {
        let path = std::env::temp_dir().join(format!("routesnake_log_{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());

        let entry = LogEntry::new(&sample_state(), u64::MAX, Direction::Left, Some("food".into()));
        DebugLogger::append(logger.file.clone(), entry).await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: LogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.seed, u64::MAX);
        assert_eq!(parsed.chosen_move, Direction::Left);
        assert_eq!(parsed.best_route.as_deref(), Some("food"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}

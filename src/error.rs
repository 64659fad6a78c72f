// Errors raised while turning a decoded request into a Board
//
// A malformed state is fatal for the turn: the caller answers the request
// with an error instead of a move.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedState {
    #[error("board dimensions {width}x{height} are not playable")]
    Dimensions { width: i32, height: i32 },
    #[error("snake `{0}` is not on the board")]
    MissingSelf(String),
    #[error("snake `{0}` has an empty body")]
    EmptyBody(String),
    #[error("{what} at ({x}, {y}) lies outside the board")]
    OutOfBounds { what: &'static str, x: i32, y: i32 },
}

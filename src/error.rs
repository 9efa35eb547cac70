use crate::engine::Move;

/// Errors surfaced by the engine, sessions, selectors and the arena.
///
/// All of these are caller contract violations or bad external input; none
/// are retried internally.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("cannot spawn a tile on a full grid")]
    SpawnOnFullGrid,
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("strategy '{strategy}' produced a non-finite score for {dir}")]
    NonFiniteScore { strategy: &'static str, dir: Move },
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

//! slide2048: a 2048 move engine + one-ply heuristic players
//!
//! This crate provides:
//! - A value-type `Grid` with a pure slide/merge engine (`engine::apply_move`,
//!   `engine::legal_moves`)
//! - A mutable `Game` session with seeded tile spawning and change observers (`game` module)
//! - Pluggable `Heuristic` strategies and a named registry (`heuristic` module)
//! - A move selector that scores every legal move one ply ahead (`ai` module)
//! - An `Arena` that plays whole games in batches and tallies max tiles (`arena` module)
//!
//! Quick start:
//! ```
//! use slide2048::engine::{GameConfig, Grid, Move};
//!
//! let g = Grid::from_rows(&[[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
//! let left = g.shift(Move::Left).unwrap();
//! assert_eq!(left.rows().next().unwrap(), &[4, 4, 0, 0]);
//! assert!(GameConfig::default().validate().is_ok());
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use slide2048::ai::Ai;
//! use slide2048::engine::GameConfig;
//! use slide2048::game::Game;
//! use slide2048::heuristic::StrategyKind;
//!
//! // 1) Seeded session and selector
//! let mut game = Game::seeded(GameConfig::default(), 123).unwrap();
//! let mut ai = Ai::seeded(StrategyKind::MaximizeEmpty, 123);
//!
//! // 2) Opening tile, then move + spawn until nothing is legal
//! game.start().unwrap();
//! let mut moves = 0u32;
//! while let Some(dir) = ai.best_move(&game).unwrap() {
//!     assert!(game.apply_move(dir));
//!     game.spawn_random_tile().unwrap();
//!     moves += 1;
//! }
//!
//! // 3) Inspect final state
//! assert!(game.is_terminal());
//! assert!(moves > 0 && game.max_tile_value() >= 8);
//! ```
//!
pub mod ai;
pub mod arena;
pub mod engine;
pub mod error;
pub mod game;
pub mod heuristic;

pub use error::{EngineError, Result};

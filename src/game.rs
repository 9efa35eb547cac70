//! A single mutable game session.
//!
//! [`Game`] owns the live [`Grid`], the spawn RNG and any registered observers.
//! Every accepted move and every spawn produces a [`GameEvent`] that is handed
//! to observers together with the grid as it stands after the change.
//!
//! ```
//! use slide2048::engine::{GameConfig, Move};
//! use slide2048::game::Game;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut game = Game::new(GameConfig::default(), StdRng::seed_from_u64(1)).unwrap();
//! game.start().unwrap();
//! for dir in Move::ALL {
//!     if game.apply_move(dir) {
//!         game.spawn_random_tile().unwrap();
//!         break;
//!     }
//! }
//! assert!(game.grid().count_empty() <= 14);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

use crate::engine::{self, GameConfig, Grid, LegalMoves, Move, Tile};
use crate::error::{EngineError, Result};

/// What changed in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Spawned { x: usize, y: usize, value: Tile },
    Moved(Move),
    Reset,
}

type Observer = Box<dyn FnMut(&GameEvent, &Grid) + Send>;

pub struct Game<R = StdRng> {
    config: GameConfig,
    grid: Grid,
    rng: R,
    observers: Vec<Observer>,
}

impl Game<StdRng> {
    /// Session with a deterministic spawn sequence.
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// An empty session. Call [`Game::start`] (or spawn once) before playing.
    pub fn new(config: GameConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, grid: Grid::new(config.size), rng, observers: Vec::new() })
    }

    /// A session resumed from an existing grid, which must match `config.size`.
    pub fn with_grid(config: GameConfig, grid: Grid, rng: R) -> Result<Self> {
        config.validate()?;
        if grid.size() != config.size {
            return Err(EngineError::InvalidGrid(format!(
                "grid is {0}x{0}, expected {1}x{1}",
                grid.size(),
                config.size
            )));
        }
        Ok(Self { config, grid, rng, observers: Vec::new() })
    }

    /// Register a callback fired after every accepted move, spawn and reset.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameEvent, &Grid) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.size
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Tile {
        self.grid.get(x, y)
    }

    /// Clear the grid to all zeros.
    pub fn reset(&mut self) {
        self.grid = Grid::new(self.config.size);
        self.notify(GameEvent::Reset);
    }

    /// Reset, then drop the opening tile.
    pub fn start(&mut self) -> Result<()> {
        self.reset();
        self.spawn_random_tile().map(|_| ())
    }

    /// Place a 2 or 4 on a random empty cell.
    ///
    /// Fails with `SpawnOnFullGrid` when there is no empty cell; a terminal
    /// check first avoids that.
    pub fn spawn_random_tile(&mut self) -> Result<GameEvent> {
        let (x, y, value) =
            self.grid.insert_random_tile(self.config.four_frequency, &mut self.rng)?;
        tracing::trace!(x, y, value, "spawned tile");
        let event = GameEvent::Spawned { x, y, value };
        self.notify(event);
        Ok(event)
    }

    /// Slide the live grid toward `dir`. Returns false, leaving the grid
    /// untouched, when the move is not legal.
    pub fn apply_move(&mut self, dir: Move) -> bool {
        match engine::apply_move(&self.grid, dir) {
            Some(next) => {
                self.grid = next;
                self.notify(GameEvent::Moved(dir));
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn legal_moves(&self) -> LegalMoves {
        engine::legal_moves(&self.grid)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !self.legal_moves().any()
    }

    /// Highest tile on the board; the score of a finished game.
    #[inline]
    pub fn max_tile_value(&self) -> Tile {
        self.grid.max_tile()
    }

    fn notify(&mut self, event: GameEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event, &self.grid);
        }
    }
}

impl<R> fmt::Debug for Game<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("grid", &self.grid)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn game_with(rows: &[[Tile; 4]]) -> Game {
        let grid = Grid::from_rows(rows).unwrap();
        Game::with_grid(GameConfig::default(), grid, StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn it_starts_with_one_tile() {
        let mut game = Game::seeded(GameConfig::default(), 42).unwrap();
        assert_eq!(game.grid().count_empty(), 16);
        assert!(game.is_terminal());
        game.start().unwrap();
        assert_eq!(game.grid().count_empty(), 15);
        assert!(matches!(game.max_tile_value(), 2 | 4));
        assert!(!game.is_terminal());
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = Game::seeded(GameConfig::default(), 99).unwrap();
        let mut b = Game::seeded(GameConfig::default(), 99).unwrap();
        for _ in 0..10 {
            assert_eq!(a.spawn_random_tile().unwrap(), b.spawn_random_tile().unwrap());
        }
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn test_apply_move_accepts_and_rejects() {
        let mut game = game_with(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!game.apply_move(Move::Up));
        assert_eq!(game.get(0, 0), 2);
        assert!(game.apply_move(Move::Right));
        assert_eq!(game.grid().rows().next().unwrap(), &[0, 0, 0, 4]);
        assert!(!game.apply_move(Move::Right));
    }

    #[test]
    fn test_spawn_on_full_grid_is_error() {
        let mut game = game_with(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(game.is_terminal());
        assert_eq!(game.spawn_random_tile(), Err(EngineError::SpawnOnFullGrid));
    }

    #[test]
    fn it_notifies_observers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let twos_only = GameConfig { four_frequency: 0.0, ..GameConfig::default() };
        let mut game = Game::seeded(twos_only, 3).unwrap();
        game.subscribe(move |event, grid| sink.lock().unwrap().push((*event, grid.max_tile())));
        game.start().unwrap();
        let accepted = Move::ALL.into_iter().find(|&dir| game.apply_move(dir));
        assert!(accepted.is_some());

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (GameEvent::Reset, 0));
        assert!(matches!(seen[1], (GameEvent::Spawned { value: 2, .. }, 2)));
        assert_eq!(seen[2].0, GameEvent::Moved(accepted.unwrap()));
    }

    #[test]
    fn it_rejects_bad_config() {
        let cfg = GameConfig { size: 0, four_frequency: 0.1 };
        assert!(matches!(Game::seeded(cfg, 0), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_with_grid_checks_size() {
        let grid = Grid::from_rows(&[[2, 0, 0], [0, 0, 0], [0, 0, 4]]).unwrap();
        let wrong = Game::with_grid(GameConfig::default(), grid.clone(), StdRng::seed_from_u64(1));
        assert!(matches!(wrong, Err(EngineError::InvalidGrid(_))));

        let cfg = GameConfig { size: 3, ..GameConfig::default() };
        let game = Game::with_grid(cfg, grid, StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(game.get(2, 2), 4);
        assert_eq!(game.max_tile_value(), 4);
    }

    #[test]
    fn it_plays_on_larger_grids() {
        let cfg = GameConfig { size: 6, four_frequency: 0.1 };
        let mut game = Game::seeded(cfg, 17).unwrap();
        game.start().unwrap();
        assert_eq!(game.grid().cells().len(), 36);
        assert_eq!(game.size(), 6);
    }
}

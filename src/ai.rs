use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{self, Grid, Move};
use crate::error::{EngineError, Result};
use crate::game::Game;
use crate::heuristic::{Heuristic, MoveScores, StrategyKind};

/// One-ply move selector driven by a [`Heuristic`].
///
/// Owns the RNG the heuristic draws its perturbations from, so a seeded
/// selector replays the same decisions.
pub struct Ai<R = StdRng> {
    heuristic: Box<dyn Heuristic>,
    rng: R,
}

impl Ai<StdRng> {
    /// Selector for a registered strategy with a deterministic RNG.
    ///
    /// ```
    /// use slide2048::ai::Ai;
    /// use slide2048::engine::{Grid, Move};
    /// use slide2048::heuristic::StrategyKind;
    ///
    /// let g = Grid::from_rows(&[[2, 0, 0, 2], [0; 4], [0; 4], [0, 2, 0, 0]]).unwrap();
    /// let mut ai = Ai::seeded(StrategyKind::DownRightLeft, 1);
    /// assert_eq!(ai.best_move_for_grid(&g).unwrap(), Some(Move::Down));
    /// ```
    pub fn seeded(kind: StrategyKind, seed: u64) -> Self {
        Self::new(kind.build(), StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Ai<R> {
    pub fn new(heuristic: Box<dyn Heuristic>, rng: R) -> Self {
        Self { heuristic, rng }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.heuristic.name()
    }

    /// Adjusted score of every legal direction from `grid`.
    pub fn move_scores(&mut self, grid: &Grid) -> Result<MoveScores> {
        let mut scores = MoveScores::default();
        for dir in engine::legal_moves(grid).iter() {
            if let Some(next) = engine::apply_move(grid, dir) {
                scores.insert(dir, self.heuristic.evaluate(&next, &mut self.rng));
            }
        }
        self.heuristic.adjust(&mut scores);
        if let Some((dir, _)) = scores.iter().find(|(_, s)| !s.is_finite()) {
            return Err(EngineError::NonFiniteScore { strategy: self.heuristic.name(), dir });
        }
        Ok(scores)
    }

    /// Best legal direction from `grid`, or `None` when the grid is terminal.
    pub fn best_move_for_grid(&mut self, grid: &Grid) -> Result<Option<Move>> {
        Ok(self.move_scores(grid)?.best())
    }

    /// Best legal direction for the session's current grid.
    #[inline]
    pub fn best_move<S: Rng>(&mut self, game: &Game<S>) -> Result<Option<Move>> {
        self.best_move_for_grid(game.grid())
    }
}

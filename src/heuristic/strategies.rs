use rand::{Rng, RngCore};

use super::{Heuristic, MoveScores, StrategyKind};
use crate::engine::{Grid, Move};

/// Score forced onto Down by [`PreferDown`] so it wins whenever legal.
const PREFERRED_DOWN_SCORE: f64 = 1000.0;

/// Uniform noise in [0, 1), used alone or to break ties without directional bias.
#[inline]
fn perturbation(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Every legal move is equally likely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMoves;

impl Heuristic for RandomMoves {
    fn name(&self) -> &'static str {
        StrategyKind::Random.name()
    }

    fn evaluate(&self, _grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        perturbation(rng)
    }
}

/// Random scoring with Up pushed to the bottom. Up is still taken when it is the only move.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvoidUp {
    base: RandomMoves,
}

impl Heuristic for AvoidUp {
    fn name(&self) -> &'static str {
        StrategyKind::AvoidUp.name()
    }

    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        self.base.evaluate(grid, rng)
    }

    fn adjust(&self, scores: &mut MoveScores) {
        self.base.adjust(scores);
        scores.set_if_candidate(Move::Up, 0.0);
    }
}

/// [`AvoidUp`], plus Down whenever it is legal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferDown {
    base: AvoidUp,
}

impl Heuristic for PreferDown {
    fn name(&self) -> &'static str {
        StrategyKind::PreferDown.name()
    }

    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        self.base.evaluate(grid, rng)
    }

    fn adjust(&self, scores: &mut MoveScores) {
        self.base.adjust(scores);
        scores.set_if_candidate(Move::Down, PREFERRED_DOWN_SCORE);
    }
}

/// Static preference Down > Right > Left > Up, ignoring the board.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownRightLeft;

impl DownRightLeft {
    const WEIGHTS: [(Move, f64); 4] =
        [(Move::Down, 4.0), (Move::Right, 3.0), (Move::Left, 2.0), (Move::Up, 1.0)];
}

impl Heuristic for DownRightLeft {
    fn name(&self) -> &'static str {
        StrategyKind::DownRightLeft.name()
    }

    fn evaluate(&self, _grid: &Grid, _rng: &mut dyn RngCore) -> f64 {
        0.0
    }

    fn adjust(&self, scores: &mut MoveScores) {
        for (dir, weight) in Self::WEIGHTS {
            scores.set_if_candidate(dir, weight);
        }
    }
}

/// Number of empty cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximizeEmpty;

impl Heuristic for MaximizeEmpty {
    fn name(&self) -> &'static str {
        StrategyKind::MaximizeEmpty.name()
    }

    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        grid.count_empty() as f64 + perturbation(rng)
    }
}

/// Penalise each neighbouring pair of tiles more than one doubling apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepNumbersClose;

impl KeepNumbersClose {
    fn far_apart(a: u32, b: u32) -> bool {
        if a == 0 || b == 0 {
            return false;
        }
        let ratio = a as f64 / b as f64;
        ratio > 2.0 || ratio < 0.5
    }
}

impl Heuristic for KeepNumbersClose {
    fn name(&self) -> &'static str {
        StrategyKind::KeepNumbersClose.name()
    }

    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        let n = grid.size();
        let mut penalty = 0u32;
        for a in 0..n {
            for b in 0..n.saturating_sub(1) {
                if Self::far_apart(grid.get(b, a), grid.get(b + 1, a)) {
                    penalty += 1;
                }
                if Self::far_apart(grid.get(a, b), grid.get(a, b + 1)) {
                    penalty += 1;
                }
            }
        }
        perturbation(rng) - penalty as f64
    }
}

/// Sum of tiles on the border; corners count twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigNumbersToEdge;

impl Heuristic for BigNumbersToEdge {
    fn name(&self) -> &'static str {
        StrategyKind::BigNumbersToEdge.name()
    }

    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64 {
        let last = grid.size().saturating_sub(1);
        let mut total = 0u64;
        for y in 0..grid.size() {
            for x in 0..grid.size() {
                let tile = grid.get(x, y) as u64;
                if x == 0 || x == last {
                    total += tile;
                }
                if y == 0 || y == last {
                    total += tile;
                }
            }
        }
        total as f64 + perturbation(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xC0FFEE)
    }

    fn all_candidates(score: f64) -> MoveScores {
        let mut scores = MoveScores::default();
        for dir in Move::ALL {
            scores.insert(dir, score);
        }
        scores
    }

    fn full_grid() -> Grid {
        Grid::from_rows(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]).unwrap()
    }

    #[test]
    fn it_random_is_unit_interval() {
        let mut rng = rng();
        for _ in 0..100 {
            let s = RandomMoves.evaluate(&Grid::new(4), &mut rng);
            assert!((0.0..1.0).contains(&s));
        }
    }

    #[test]
    fn test_avoid_up_zeroes_up() {
        let mut scores = all_candidates(0.7);
        AvoidUp::default().adjust(&mut scores);
        assert_eq!(scores.get(Move::Up), Some(0.0));
        assert_eq!(scores.get(Move::Left), Some(0.7));

        let mut only_up = MoveScores::default();
        only_up.insert(Move::Up, 0.4);
        AvoidUp::default().adjust(&mut only_up);
        assert_eq!(only_up.best(), Some(Move::Up));
    }

    #[test]
    fn test_prefer_down_layers_on_avoid_up() {
        let mut scores = all_candidates(0.7);
        PreferDown::default().adjust(&mut scores);
        assert_eq!(scores.get(Move::Up), Some(0.0));
        assert_eq!(scores.get(Move::Down), Some(PREFERRED_DOWN_SCORE));
        assert_eq!(scores.best(), Some(Move::Down));

        let mut no_down = all_candidates(0.7);
        no_down.0[Move::Down.index()] = None;
        PreferDown::default().adjust(&mut no_down);
        assert!(!no_down.contains(Move::Down));
        assert_eq!(no_down.best(), Some(Move::Left));
    }

    #[test]
    fn test_down_right_left_weights() {
        let mut scores = all_candidates(0.0);
        DownRightLeft.adjust(&mut scores);
        assert_eq!(scores.best(), Some(Move::Down));
        scores.0[Move::Down.index()] = None;
        assert_eq!(scores.best(), Some(Move::Right));
        scores.0[Move::Right.index()] = None;
        assert_eq!(scores.best(), Some(Move::Left));
    }

    #[test]
    fn it_maximize_empty_counts_empties() {
        let g = Grid::from_rows(&[[2, 0, 0, 0], [0, 4, 0, 0], [0; 4], [0; 4]]).unwrap();
        let s = MaximizeEmpty.evaluate(&g, &mut rng());
        assert_eq!(s.floor(), 14.0);
    }

    #[test]
    fn it_keep_numbers_close_penalises_gaps() {
        // 2-8 and 16-4 across, 2-16 down. 8-4 down is a single doubling.
        let g = Grid::from_rows(&[[2, 8, 0, 0], [16, 4, 0, 0], [0; 4], [0; 4]]).unwrap();
        let s = KeepNumbersClose.evaluate(&g, &mut rng());
        assert_eq!(s.floor(), -3.0);

        let close = Grid::from_rows(&[[2, 4, 8, 16], [4, 2, 4, 8], [0; 4], [0; 4]]).unwrap();
        assert_eq!(KeepNumbersClose.evaluate(&close, &mut rng()).floor(), 0.0);
    }

    #[test]
    fn it_big_numbers_to_edge_double_counts_corners() {
        let g = Grid::from_rows(&[[2; 4]; 4]).unwrap();
        assert_eq!(BigNumbersToEdge.evaluate(&g, &mut rng()).floor(), 32.0);

        let centre = Grid::from_rows(&[[0; 4], [0, 64, 0, 0], [0; 4], [0; 4]]).unwrap();
        assert_eq!(BigNumbersToEdge.evaluate(&centre, &mut rng()).floor(), 0.0);

        let corner = Grid::from_rows(&[[0; 4], [0; 4], [0; 4], [0, 0, 0, 8]]).unwrap();
        assert_eq!(BigNumbersToEdge.evaluate(&corner, &mut rng()).floor(), 16.0);
    }

    #[test]
    fn it_scores_are_finite_on_extremes() {
        let mut rng = rng();
        for (_, h) in crate::heuristic::registry() {
            for g in [Grid::new(4), full_grid(), Grid::from_rows(&[[65536; 4]; 4]).unwrap()] {
                assert!(h.evaluate(&g, &mut rng).is_finite(), "{}", h.name());
            }
        }
    }
}

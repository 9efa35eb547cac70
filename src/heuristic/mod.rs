//! One-ply heuristic scorers and the named strategy registry.
//!
//! A [`Heuristic`] scores each grid reachable by one legal move, then may
//! rewrite the per-direction scores in [`Heuristic::adjust`]. Layered
//! strategies (e.g. [`PreferDown`] on top of [`AvoidUp`]) hold their base
//! strategy and call it explicitly before applying their own adjustment.
//!
//! ```
//! use slide2048::engine::Grid;
//! use slide2048::heuristic::StrategyKind;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let h = StrategyKind::MaximizeEmpty.build();
//! let mut rng = StdRng::seed_from_u64(0);
//! let score = h.evaluate(&Grid::new(4), &mut rng);
//! assert!((16.0..17.0).contains(&score));
//! ```

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{Grid, Move};
use crate::error::{EngineError, Result};

mod strategies;

pub use strategies::{
    AvoidUp, BigNumbersToEdge, DownRightLeft, KeepNumbersClose, MaximizeEmpty, PreferDown,
    RandomMoves,
};

/// A pluggable move-ranking policy.
pub trait Heuristic: Send + Sync {
    /// Human-readable name, as shown in selection menus.
    fn name(&self) -> &'static str;

    /// Desirability of `grid`, the result of a candidate move. Must be finite.
    fn evaluate(&self, grid: &Grid, rng: &mut dyn RngCore) -> f64;

    /// Rewrite direction scores after every candidate has been evaluated.
    fn adjust(&self, _scores: &mut MoveScores) {}
}

/// Score per candidate direction. Absent entries are illegal moves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveScores([Option<f64>; 4]);

impl MoveScores {
    #[inline]
    pub fn get(&self, dir: Move) -> Option<f64> {
        self.0[dir.index()]
    }

    #[inline]
    pub fn contains(&self, dir: Move) -> bool {
        self.0[dir.index()].is_some()
    }

    #[inline]
    pub fn insert(&mut self, dir: Move, score: f64) {
        self.0[dir.index()] = Some(score);
    }

    /// Overwrite the score of `dir` only when it is already a candidate.
    pub fn set_if_candidate(&mut self, dir: Move, score: f64) {
        if let Some(slot) = self.0[dir.index()].as_mut() {
            *slot = score;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Candidates in [`Move::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Move, f64)> + '_ {
        Move::ALL.into_iter().filter_map(move |dir| self.get(dir).map(|s| (dir, s)))
    }

    /// Highest-scoring candidate; on ties the earliest in [`Move::ALL`] wins.
    pub fn best(&self) -> Option<Move> {
        let mut best: Option<(Move, f64)> = None;
        for (dir, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((dir, score)),
            }
        }
        best.map(|(dir, _)| dir)
    }
}

/// Every registered strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    Random,
    AvoidUp,
    PreferDown,
    DownRightLeft,
    MaximizeEmpty,
    KeepNumbersClose,
    BigNumbersToEdge,
}

impl StrategyKind {
    /// Registry order, as presented to users.
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Random,
        StrategyKind::AvoidUp,
        StrategyKind::PreferDown,
        StrategyKind::DownRightLeft,
        StrategyKind::MaximizeEmpty,
        StrategyKind::KeepNumbersClose,
        StrategyKind::BigNumbersToEdge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Random => "Random Moves",
            StrategyKind::AvoidUp => "Avoid Up",
            StrategyKind::PreferDown => "Prefer Down",
            StrategyKind::DownRightLeft => "Down-right-left",
            StrategyKind::MaximizeEmpty => "Maximize empty tiles",
            StrategyKind::KeepNumbersClose => "Keep numbers close",
            StrategyKind::BigNumbersToEdge => "Big numbers to edge",
        }
    }

    /// Command-line identifier.
    pub fn slug(self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::AvoidUp => "avoid-up",
            StrategyKind::PreferDown => "prefer-down",
            StrategyKind::DownRightLeft => "down-right-left",
            StrategyKind::MaximizeEmpty => "maximize-empty",
            StrategyKind::KeepNumbersClose => "keep-numbers-close",
            StrategyKind::BigNumbersToEdge => "big-numbers-to-edge",
        }
    }

    /// Look up by display name or slug, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        StrategyKind::ALL
            .into_iter()
            .find(|k| {
                k.name().eq_ignore_ascii_case(wanted) || k.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| EngineError::UnknownStrategy(name.to_string()))
    }

    pub fn build(self) -> Box<dyn Heuristic> {
        match self {
            StrategyKind::Random => Box::new(RandomMoves),
            StrategyKind::AvoidUp => Box::new(AvoidUp::default()),
            StrategyKind::PreferDown => Box::new(PreferDown::default()),
            StrategyKind::DownRightLeft => Box::new(DownRightLeft),
            StrategyKind::MaximizeEmpty => Box::new(MaximizeEmpty),
            StrategyKind::KeepNumbersClose => Box::new(KeepNumbersClose),
            StrategyKind::BigNumbersToEdge => Box::new(BigNumbersToEdge),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::from_name(s)
    }
}

/// Fresh instances of every strategy, keyed by display name, in registry order.
pub fn registry() -> Vec<(&'static str, Box<dyn Heuristic>)> {
    StrategyKind::ALL.into_iter().map(|k| (k.name(), k.build())).collect()
}

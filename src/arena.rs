//! Batch simulation: play complete games with one strategy and tally how far each got.
//!
//! Every game owns its own [`Game`] and [`Ai`]; the only state shared across a
//! batch is the arena's [`ScoreTally`], which is updated on the arena itself
//! once a game has finished. Per-game seeds are drawn from the arena's RNG
//! before a batch starts, so sequential and parallel batches from the same
//! arena seed produce the same records.
//!
//! ```
//! use slide2048::arena::Arena;
//! use slide2048::engine::GameConfig;
//! use slide2048::heuristic::StrategyKind;
//!
//! let mut arena = Arena::new(GameConfig::default()).unwrap().with_seed(2048);
//! arena.run_batch(StrategyKind::MaximizeEmpty, 2).unwrap();
//! assert_eq!(arena.scores().total_games(), 2);
//! arena.reset_scores();
//! assert!(arena.scores().is_empty());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ai::Ai;
use crate::engine::{GameConfig, Tile};
use crate::error::Result;
use crate::game::Game;
use crate::heuristic::StrategyKind;

/// Keeps a game's selector RNG stream apart from its spawn stream.
const AI_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Occurrences of each final max tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    counts: BTreeMap<Tile, u64>,
}

impl ScoreTally {
    pub fn record(&mut self, max_tile: Tile) {
        *self.counts.entry(max_tile).or_insert(0) += 1;
    }

    pub fn count(&self, max_tile: Tile) -> u64 {
        self.counts.get(&max_tile).copied().unwrap_or(0)
    }

    pub fn total_games(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(max_tile, games)` in ascending tile order.
    pub fn iter(&self) -> impl Iterator<Item = (Tile, u64)> + '_ {
        self.counts.iter().map(|(&tile, &n)| (tile, n))
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

impl fmt::Display for ScoreTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_games().max(1) as f64;
        writeln!(f, "{:>8} | {:>8} | {:>7}", "max tile", "games", "share")?;
        writeln!(f, "{}", "-".repeat(30))?;
        for (tile, n) in self.iter() {
            writeln!(f, "{:>8} | {:>8} | {:>6.2}%", tile, n, 100.0 * n as f64 / total)?;
        }
        Ok(())
    }
}

/// Summary of one finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Session seed, when the arena created the session.
    pub seed: Option<u64>,
    pub max_tile: Tile,
    pub moves: u64,
    pub tile_sum: u64,
    /// False when the game was cut off by a move limit.
    pub game_over: bool,
}

/// Drive `game` with `ai` until no move is legal or `move_limit` moves were made.
///
/// The session should already hold its opening tile.
pub fn play_to_completion<R: Rng, S: Rng>(
    game: &mut Game<R>,
    ai: &mut Ai<S>,
    move_limit: Option<u64>,
) -> Result<GameRecord> {
    let mut moves = 0u64;
    let mut game_over = true;
    while !game.is_terminal() {
        if move_limit.is_some_and(|limit| moves >= limit) {
            game_over = false;
            break;
        }
        let Some(dir) = ai.best_move(game)? else { break };
        let accepted = game.apply_move(dir);
        debug_assert!(accepted, "selector chose illegal move {dir}");
        moves += 1;
        game.spawn_random_tile()?;
    }
    Ok(GameRecord {
        seed: None,
        max_tile: game.max_tile_value(),
        moves,
        tile_sum: game.grid().tile_sum(),
        game_over,
    })
}

fn play_seeded(
    config: GameConfig,
    kind: StrategyKind,
    seed: u64,
    move_limit: Option<u64>,
) -> Result<GameRecord> {
    let mut game = Game::seeded(config, seed)?;
    let mut ai = Ai::seeded(kind, seed ^ AI_SEED_SALT);
    game.start()?;
    let record = play_to_completion(&mut game, &mut ai, move_limit)?;
    Ok(GameRecord { seed: Some(seed), ..record })
}

type CompletionListener = Box<dyn FnMut(&GameRecord, &ScoreTally) + Send>;

/// Batch simulator accumulating a [`ScoreTally`] across runs until reset.
pub struct Arena {
    config: GameConfig,
    rng: StdRng,
    move_limit: Option<u64>,
    tally: ScoreTally,
    listeners: Vec<CompletionListener>,
}

impl Arena {
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::from_entropy(),
            move_limit: None,
            tally: ScoreTally::default(),
            listeners: Vec::new(),
        })
    }

    /// Make the sequence of game seeds reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Stop each game after this many moves; such games are still tallied.
    pub fn with_move_limit(mut self, limit: Option<u64>) -> Self {
        self.move_limit = limit;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scores(&self) -> &ScoreTally {
        &self.tally
    }

    pub fn reset_scores(&mut self) {
        self.tally.reset();
    }

    /// Register a callback fired after every tallied game.
    pub fn on_game_completed<F>(&mut self, listener: F)
    where
        F: FnMut(&GameRecord, &ScoreTally) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Play one game with a caller-provided selector.
    pub fn run_game<S: Rng>(&mut self, ai: &mut Ai<S>) -> Result<GameRecord> {
        let seed = self.rng.gen::<u64>();
        let mut game = Game::seeded(self.config, seed)?;
        game.start()?;
        let record = play_to_completion(&mut game, ai, self.move_limit)?;
        let record = GameRecord { seed: Some(seed), ..record };
        self.complete(ai.name(), record);
        Ok(record)
    }

    /// Play one game with a fresh selector for `kind`.
    pub fn run_strategy(&mut self, kind: StrategyKind) -> Result<GameRecord> {
        let seed = self.rng.gen::<u64>();
        let record = play_seeded(self.config, kind, seed, self.move_limit)?;
        self.complete(kind.name(), record);
        Ok(record)
    }

    /// Play `games` games one after another.
    pub fn run_batch(&mut self, kind: StrategyKind, games: usize) -> Result<Vec<GameRecord>> {
        tracing::info!(strategy = kind.name(), games, "starting batch");
        let seeds = self.draw_seeds(games);
        let mut records = Vec::with_capacity(games);
        for seed in seeds {
            let record = play_seeded(self.config, kind, seed, self.move_limit)?;
            self.complete(kind.name(), record);
            records.push(record);
        }
        tracing::info!(strategy = kind.name(), total = self.tally.total_games(), "batch finished");
        Ok(records)
    }

    /// Play `games` games on the rayon pool.
    ///
    /// `on_finish` is called from worker threads as each game ends. The tally
    /// and completion listeners are updated afterwards, in game order.
    pub fn run_batch_par<F>(
        &mut self,
        kind: StrategyKind,
        games: usize,
        on_finish: F,
    ) -> Result<Vec<GameRecord>>
    where
        F: Fn(&GameRecord) + Sync,
    {
        tracing::info!(
            strategy = kind.name(),
            games,
            threads = rayon::current_num_threads(),
            "starting parallel batch"
        );
        let seeds = self.draw_seeds(games);
        let (config, move_limit) = (self.config, self.move_limit);
        let records = seeds
            .par_iter()
            .map(|&seed| {
                let record = play_seeded(config, kind, seed, move_limit)?;
                on_finish(&record);
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;
        for &record in &records {
            self.complete(kind.name(), record);
        }
        tracing::info!(
            strategy = kind.name(),
            total = self.tally.total_games(),
            "parallel batch finished"
        );
        Ok(records)
    }

    fn draw_seeds(&mut self, games: usize) -> Vec<u64> {
        (0..games).map(|_| self.rng.gen::<u64>()).collect()
    }

    fn complete(&mut self, strategy: &str, record: GameRecord) {
        if record.game_over {
            tracing::debug!(
                strategy,
                max_tile = record.max_tile,
                moves = record.moves,
                "game finished"
            );
        } else {
            tracing::warn!(
                strategy,
                max_tile = record.max_tile,
                moves = record.moves,
                "game stopped at move limit"
            );
        }
        self.tally.record(record.max_tile);
        for listener in self.listeners.iter_mut() {
            listener(&record, &self.tally);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn arena(seed: u64) -> Arena {
        Arena::new(GameConfig::default()).unwrap().with_seed(seed)
    }

    #[test]
    fn it_tally_counts() {
        let mut tally = ScoreTally::default();
        for tile in [128, 256, 128, 512] {
            tally.record(tile);
        }
        assert_eq!(tally.count(128), 2);
        assert_eq!(tally.count(1024), 0);
        assert_eq!(tally.total_games(), 4);
        assert_eq!(tally.iter().collect::<Vec<_>>(), vec![(128, 2), (256, 1), (512, 1)]);
        let table = tally.to_string();
        assert!(table.contains("50.00%"));
        tally.reset();
        assert!(tally.is_empty());
    }

    #[test]
    fn test_maximize_empty_games_terminate() {
        let mut arena = arena(7);
        let records = arena.run_batch(StrategyKind::MaximizeEmpty, 3).unwrap();
        assert_eq!(records.len(), 3);
        for r in &records {
            assert!(r.game_over);
            assert!(r.moves > 0);
            assert!(r.max_tile >= 8);
            assert!(arena.scores().count(r.max_tile) > 0);
        }
        assert_eq!(arena.scores().total_games(), 3);
    }

    #[test]
    fn test_same_seed_same_tally() {
        let mut a = arena(99);
        let mut b = arena(99);
        let ra = a.run_batch(StrategyKind::KeepNumbersClose, 4).unwrap();
        let rb = b.run_batch(StrategyKind::KeepNumbersClose, 4).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.scores(), b.scores());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let finished = AtomicUsize::new(0);
        let mut seq = arena(123);
        let mut par = arena(123);
        let rs = seq.run_batch(StrategyKind::BigNumbersToEdge, 6).unwrap();
        let rp = par
            .run_batch_par(StrategyKind::BigNumbersToEdge, 6, |_| {
                finished.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(finished.load(Ordering::Relaxed), 6);
        assert_eq!(rs, rp);
        assert_eq!(seq.scores(), par.scores());
    }

    #[test]
    fn it_accumulates_until_reset() {
        let mut arena = arena(5);
        arena.run_strategy(StrategyKind::Random).unwrap();
        arena.run_strategy(StrategyKind::PreferDown).unwrap();
        assert_eq!(arena.scores().total_games(), 2);
        arena.reset_scores();
        assert_eq!(arena.scores().total_games(), 0);
        arena.run_strategy(StrategyKind::DownRightLeft).unwrap();
        assert_eq!(arena.scores().total_games(), 1);
    }

    #[test]
    fn it_notifies_on_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut arena = arena(11);
        arena.on_game_completed(move |record, tally| {
            sink.lock().unwrap().push((record.max_tile, tally.total_games()))
        });
        arena.run_batch(StrategyKind::AvoidUp, 3).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().map(|&(_, total)| total).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_limit_cuts_games_short() {
        let mut arena = arena(3).with_move_limit(Some(5));
        let record = arena.run_strategy(StrategyKind::Random).unwrap();
        assert_eq!(record.moves, 5);
        assert!(!record.game_over);
        assert_eq!(arena.scores().total_games(), 1);
    }

    #[test]
    fn it_runs_with_a_caller_selector() {
        let mut arena = arena(8);
        let mut ai = Ai::seeded(StrategyKind::MaximizeEmpty, 8);
        let record = arena.run_game(&mut ai).unwrap();
        assert!(record.game_over);
        assert!(record.seed.is_some());
        assert_eq!(arena.scores().count(record.max_tile), 1);
    }

    #[test]
    fn it_play_to_completion_leaves_terminal_grid() {
        let mut game = Game::seeded(GameConfig { size: 3, four_frequency: 0.1 }, 4).unwrap();
        let mut ai = Ai::seeded(StrategyKind::Random, 4);
        game.start().unwrap();
        let record = play_to_completion(&mut game, &mut ai, None).unwrap();
        assert!(game.is_terminal());
        assert_eq!(game.grid().count_empty(), 0);
        assert_eq!(record.max_tile, game.max_tile_value());
        assert_eq!(record.seed, None);
    }
}

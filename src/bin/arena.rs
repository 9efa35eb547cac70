use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use slide2048::arena::{Arena, GameRecord, ScoreTally};
use slide2048::engine::GameConfig;
use slide2048::heuristic::StrategyKind;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "arena", about = "Play many 2048 games with one strategy and tally the max tiles")]
struct Args {
    /// Strategy to run (display name or slug, see --list)
    #[arg(long, default_value = "maximize-empty")]
    strategy: StrategyKind,

    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 100)]
    games: usize,

    /// Seed for the whole batch (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Run games on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Stop each game after this many moves
    #[arg(long)]
    max_moves: Option<u64>,

    /// Grid side length
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Probability that a spawned tile is a 4
    #[arg(long, default_value_t = 0.1)]
    four_frequency: f64,

    /// Write a JSON report of the batch to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,

    /// List the registered strategies and exit
    #[arg(long)]
    list: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    strategy: &'static str,
    seed: u64,
    config: &'a GameConfig,
    elapsed_s: f64,
    tally: &'a ScoreTally,
    games: &'a [GameRecord],
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    if args.list {
        for kind in StrategyKind::ALL {
            println!("{:<22} {}", kind.slug(), kind.name());
        }
        return Ok(());
    }
    if args.games == 0 {
        anyhow::bail!("--games must be at least 1");
    }

    let config = GameConfig { size: args.size, four_frequency: args.four_frequency };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut arena = Arena::new(config)?.with_seed(seed).with_move_limit(args.max_moves);

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                 {pos}/{len} games ({eta}) {msg}",
            )?
            .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let records = if args.parallel {
        arena.run_batch_par(args.strategy, args.games, |record| {
            pb.inc(1);
            pb.set_message(format!("last max tile: {}", record.max_tile));
        })?
    } else {
        let bar = pb.clone();
        arena.on_game_completed(move |record, tally| {
            bar.inc(1);
            let best = tally.iter().last().map_or(0, |(tile, _)| tile);
            bar.set_message(format!(
                "last max tile: {} | best so far: {}",
                record.max_tile, best
            ));
        });
        arena.run_batch(args.strategy, args.games)?
    };
    pb.finish_and_clear();
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);

    let total_moves: u64 = records.iter().map(|r| r.moves).sum();
    println!("Strategy: {} | seed: {} | games: {}", args.strategy, seed, records.len());
    println!(
        "Elapsed: {:.2}s | games/sec: {:.1} | moves/sec: {:.1}",
        elapsed,
        records.len() as f64 / elapsed,
        total_moves as f64 / elapsed
    );
    let cut_off = records.iter().filter(|r| !r.game_over).count();
    if cut_off > 0 {
        println!("Stopped at move limit: {}", cut_off);
    }
    print!("{}", arena.scores());

    if let Some(path) = args.json {
        let report = Report {
            strategy: args.strategy.name(),
            seed,
            config: arena.config(),
            elapsed_s: elapsed,
            tally: arena.scores(),
            games: &records,
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
        eprintln!("Wrote report to {}", path.display());
    }
    Ok(())
}

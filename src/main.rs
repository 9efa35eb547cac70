use clap::Parser;
use slide2048::ai::Ai;
use slide2048::engine::{GameConfig, Grid, Move};
use slide2048::game::{Game, GameEvent};
use slide2048::heuristic::StrategyKind;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "slide2048", about = "Play 2048 in the terminal, or watch a strategy play")]
struct Args {
    /// Let this strategy play instead of reading moves from stdin (name or slug)
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Seed for tile spawns and strategy noise (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Grid side length
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Probability that a spawned tile is a 4
    #[arg(long, default_value_t = 0.1)]
    four_frequency: f64,

    /// List the registered strategies and exit
    #[arg(long)]
    list: bool,
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

    let config = GameConfig { size: args.size, four_frequency: args.four_frequency };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut game = Game::seeded(config, seed)?;
    game.subscribe(|event, grid| {
        if let Some(view) = render_event(event, grid) {
            println!("{}", view);
        }
    });
    game.start()?;

    match args.strategy {
        Some(kind) => autoplay(&mut game, kind, seed),
        None => interactive(&mut game),
    }
}

/// Board view after a change; nothing for a reset since a spawn follows it.
fn render_event(event: &GameEvent, grid: &Grid) -> Option<String> {
    match event {
        GameEvent::Moved(dir) => Some(format!("{}\n{}", dir, grid)),
        GameEvent::Spawned { x, y, value } => {
            Some(format!("+{} at ({}, {})\n{}", value, x, y, grid))
        }
        GameEvent::Reset => None,
    }
}

fn autoplay(game: &mut Game, kind: StrategyKind, seed: u64) -> anyhow::Result<()> {
    let mut ai = Ai::seeded(kind, seed.wrapping_add(1));
    let mut move_count = 0u64;
    while !game.is_terminal() {
        let Some(direction) = ai.best_move(game)? else { break };
        game.apply_move(direction);
        game.spawn_random_tile()?;
        move_count += 1;
    }
    println!(
        "Strategy: {}, Moves made: {}, Max tile: {}, Tile sum: {}",
        kind,
        move_count,
        game.max_tile_value(),
        game.grid().tile_sum()
    );
    Ok(())
}

fn interactive(game: &mut Game) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("move [l/r/u/d, q to quit]> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        let direction = match line.parse::<Move>() {
            Ok(d) => d,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if !game.legal_moves().is_legal(direction) {
            println!("Invalid move!");
            continue;
        }
        game.apply_move(direction);
        game.spawn_random_tile()?;
        if game.is_terminal() {
            println!("Game over. Max tile: {}", game.max_tile_value());
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_redraws_after_moves_and_spawns() {
        let grid = Grid::from_rows(&[[0, 4], [0, 2]]).unwrap();
        let moved = render_event(&GameEvent::Moved(Move::Right), &grid).unwrap();
        assert!(moved.starts_with("right\n"));
        assert!(moved.ends_with(&grid.to_string()));
        let spawned = render_event(&GameEvent::Spawned { x: 1, y: 1, value: 2 }, &grid).unwrap();
        assert!(spawned.starts_with("+2 at (1, 1)\n"));
        assert!(render_event(&GameEvent::Reset, &grid).is_none());
    }
}

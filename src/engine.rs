use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Cell value. Zero is an empty cell, anything else is a power of two >= 2.
pub type Tile = u32;

/// Largest tile a grid may hold. Two of these never merge.
pub const MAX_TILE: Tile = 1 << 30;

pub const DEFAULT_SIZE: usize = 4;
/// Chance that a spawned tile is a 4 rather than a 2.
pub const DEFAULT_FOUR_FREQUENCY: f64 = 0.1;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// All directions in enumeration order. Move selection breaks ties in
    /// favour of the earliest entry.
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    /// Position in [`Move::ALL`], also the numeric direction code.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Left => 0,
            Move::Right => 1,
            Move::Up => 2,
            Move::Down => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Move {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self> {
        Move::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| EngineError::InvalidDirection(code.to_string()))
    }
}

impl FromStr for Move {
    type Err = EngineError;

    /// Accepts `left|right|up|down` or their first letter, in any case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Move::Left),
            "right" | "r" => Ok(Move::Right),
            "up" | "u" => Ok(Move::Up),
            "down" | "d" => Ok(Move::Down),
            _ => Err(EngineError::InvalidDirection(s.to_string())),
        }
    }
}

/// Board dimensions and spawn odds shared by every session of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square grid.
    pub size: usize,
    /// Probability that a spawned tile is a 4.
    pub four_frequency: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { size: DEFAULT_SIZE, four_frequency: DEFAULT_FOUR_FREQUENCY }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if self.size < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "grid size must be at least 2, got {}",
                self.size
            )));
        }
        if !(0.0..=1.0).contains(&self.four_frequency) {
            return Err(EngineError::InvalidConfig(format!(
                "four_frequency must be within [0, 1], got {}",
                self.four_frequency
            )));
        }
        Ok(())
    }
}

/// Square grid of tiles, stored row-major.
///
/// Coordinates are `(x, y)`: `x` is the column, `y` the row, origin top-left.
/// Grids are plain values; a clone shares nothing with its source.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    size: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// An all-empty grid of the given side length.
    pub fn new(size: usize) -> Self {
        Grid { size, cells: vec![0; size * size] }
    }

    /// Build a grid from rows (top to bottom), validating shape and tile values.
    ///
    /// ```
    /// use slide2048::engine::{Grid, Move};
    /// let g = Grid::from_rows(&[[2, 2], [0, 4]]).unwrap();
    /// let left = g.shift(Move::Left).unwrap();
    /// assert_eq!(left.get(0, 0), 4);
    /// assert_eq!(left.get(0, 1), 4);
    /// ```
    pub fn from_rows<R: AsRef<[Tile]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(EngineError::InvalidGrid("grid has no rows".into()));
        }
        let mut cells = Vec::with_capacity(size * size);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return Err(EngineError::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    size
                )));
            }
            for (x, &tile) in row.iter().enumerate() {
                if tile != 0 && (tile < 2 || !tile.is_power_of_two()) {
                    return Err(EngineError::InvalidGrid(format!(
                        "tile {} at ({}, {}) is not a power of two",
                        tile, x, y
                    )));
                }
                if tile > MAX_TILE {
                    return Err(EngineError::InvalidGrid(format!(
                        "tile {} at ({}, {}) exceeds {}",
                        tile, x, y, MAX_TILE
                    )));
                }
            }
            cells.extend_from_slice(row);
        }
        Ok(Grid { size, cells })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tile at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// When `x` or `y` is not below [`Grid::size`].
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Tile {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, tile: Tile) {
        let idx = self.index(x, y);
        self.cells[idx] = tile;
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.size && y < self.size,
            "cell ({}, {}) is outside a {}x{} grid",
            x,
            y,
            self.size,
            self.size
        );
        y * self.size + x
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        self.cells.chunks(self.size.max(1))
    }

    /// Coordinates of empty cells in raster order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == 0)
            .map(|(i, _)| (i % self.size, i / self.size))
            .collect()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&t| t == 0).count()
    }

    /// Highest tile on the grid, 0 when empty.
    pub fn max_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tiles. Moves never change it; only spawns do.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().map(|&t| t as u64).sum()
    }

    #[inline]
    pub fn legal_moves(&self) -> LegalMoves {
        legal_moves(self)
    }

    /// The grid after sliding/merging toward `dir`, or `None` if nothing would change.
    #[inline]
    pub fn shift(&self, dir: Move) -> Option<Grid> {
        apply_move(self, dir)
    }

    /// True if no direction would change the grid.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !legal_moves(self).any()
    }

    /// Write a 2 (or a 4 with probability `four_frequency`) into a uniformly
    /// chosen empty cell, returning where and what was placed.
    ///
    /// ```
    /// use slide2048::engine::Grid;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let mut g = Grid::new(4);
    /// let (x, y, value) = g.insert_random_tile(0.1, &mut rng).unwrap();
    /// assert_eq!(g.get(x, y), value);
    /// assert_eq!(g.count_empty(), 15);
    /// ```
    pub fn insert_random_tile<R: Rng + ?Sized>(
        &mut self,
        four_frequency: f64,
        rng: &mut R,
    ) -> Result<(usize, usize, Tile)> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return Err(EngineError::SpawnOnFullGrid);
        }
        let value = if rng.gen::<f64>() < four_frequency { 4 } else { 2 };
        let (x, y) = empty[rng.gen_range(0..empty.len())];
        self.set(x, y, value);
        Ok((x, y, value))
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat((self.size * 8).saturating_sub(1));
        for (y, row) in self.rows().enumerate() {
            if y > 0 {
                writeln!(f, "{}", rule)?;
            }
            let cells: Vec<String> = row.iter().map(|&t| format_val(t)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(tile: Tile) -> String {
    match tile {
        0 => " ".repeat(7),
        t => format!("{:>6} ", t),
    }
}

/// Which directions would change a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegalMoves([bool; 4]);

impl LegalMoves {
    #[inline]
    pub fn is_legal(self, dir: Move) -> bool {
        self.0[dir.index()]
    }

    #[inline]
    pub fn any(self) -> bool {
        self.0.iter().any(|&b| b)
    }

    pub fn count(self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// Legal directions in [`Move::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Move> {
        Move::ALL.into_iter().filter(move |&m| self.is_legal(m))
    }

    #[inline]
    fn allow(&mut self, dir: Move) {
        self.0[dir.index()] = true;
    }
}

/// Probe each direction for legality by scanning adjacent pairs, without sliding anything.
///
/// For a pair `(near, far)` along a row (near = left) or column (near = top):
/// the move toward `near` is enabled by `near == 0 < far`, the move toward
/// `far` by `near > 0 == far`, and both by `near == far != 0` below [`MAX_TILE`].
pub fn legal_moves(grid: &Grid) -> LegalMoves {
    let n = grid.size;
    let mut legal = LegalMoves::default();
    for a in 0..n {
        for b in 0..n.saturating_sub(1) {
            let (left, right) = (grid.get(b, a), grid.get(b + 1, a));
            let row_merge = mergeable(left, right);
            if (left == 0 && right > 0) || row_merge {
                legal.allow(Move::Left);
            }
            if (left > 0 && right == 0) || row_merge {
                legal.allow(Move::Right);
            }

            let (up, down) = (grid.get(a, b), grid.get(a, b + 1));
            let col_merge = mergeable(up, down);
            if (up == 0 && down > 0) || col_merge {
                legal.allow(Move::Up);
            }
            if (up > 0 && down == 0) || col_merge {
                legal.allow(Move::Down);
            }
        }
    }
    legal
}

/// Slide and merge every line toward `dir` on a copy of `grid`.
///
/// Returns `None` when no cell changes; `grid` itself is never touched.
///
/// ```
/// use slide2048::engine::{apply_move, Grid, Move};
/// let g = Grid::from_rows(&[[2, 0, 2, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
/// let moved = apply_move(&g, Move::Left).unwrap();
/// assert_eq!(moved.rows().next().unwrap(), &[4, 0, 0, 0]);
/// assert!(apply_move(&moved, Move::Left).is_none());
/// ```
pub fn apply_move(grid: &Grid, dir: Move) -> Option<Grid> {
    let n = grid.size;
    let mut next = grid.clone();
    let mut line = Vec::with_capacity(n);
    let mut moved = false;
    for lane in 0..n {
        line.clear();
        line.extend((0..n).map(|step| line_cell(n, dir, lane, step)));
        moved |= slide_line(&mut next.cells, &line);
    }
    moved.then_some(next)
}

#[inline]
fn mergeable(a: Tile, b: Tile) -> bool {
    a != 0 && a == b && a < MAX_TILE
}

/// Flat index of the `step`-th cell of `lane`, counting from the edge tiles slide toward.
#[inline]
fn line_cell(n: usize, dir: Move, lane: usize, step: usize) -> usize {
    let (x, y) = match dir {
        Move::Left => (step, lane),
        Move::Right => (n - 1 - step, lane),
        Move::Up => (lane, step),
        Move::Down => (lane, n - 1 - step),
    };
    y * n + x
}

/// Single-pass compaction with merge over one line, `line[0]` being the destination edge.
///
/// Each position pulls the nearest tile behind it. Pulling into an empty cell
/// keeps scanning from the same position so a second tile can still merge
/// into it; a merge or a mismatch ends the position. A tile merges at most once.
fn slide_line(cells: &mut [Tile], line: &[usize]) -> bool {
    let mut moved = false;
    for (i, &dst) in line.iter().enumerate() {
        let mut j = i + 1;
        while j < line.len() {
            let src = line[j];
            let (cur, other) = (cells[dst], cells[src]);
            if other == 0 {
                j += 1;
                continue;
            }
            if cur == 0 {
                cells[dst] = other;
                cells[src] = 0;
                moved = true;
                continue;
            }
            if mergeable(cur, other) {
                cells[dst] = cur + other;
                cells[src] = 0;
                moved = true;
            }
            break;
        }
    }
    moved
}

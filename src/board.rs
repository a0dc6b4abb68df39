use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::{Coord, Grid};

/// Step cost of an ordinary cell.
pub const STEP_REWARD: f64 = -0.04;

/// What a solver does with a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// Utility pinned to 0, moves into it bounce back.
    Wall,
    /// Utility pinned to the reward, no lookahead.
    Terminal,
    Open,
}

/// Reward grid plus wall and terminal sets. Immutable once built; solvers
/// only ever borrow it.
#[derive(Clone, Debug)]
pub struct Board {
    rewards: Grid<f64>,
    walls: HashSet<Coord>,
    terminals: HashSet<Coord>,
}

/// Plain serialisable form of a board, as read from board files and
/// request bodies. `walls` need not include the border ring.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoardSpec {
    pub rewards: Vec<Vec<f64>>,
    #[serde(default)]
    pub walls: Vec<Coord>,
    #[serde(default)]
    pub terminals: Vec<Coord>,
}

impl Board {
    /// Validate the inputs and build a board. The virtual one-cell border
    /// around the grid is added to the wall set, so callers may pass it or not.
    pub fn new(
        rewards: Vec<Vec<f64>>,
        walls: impl IntoIterator<Item = Coord>,
        terminals: impl IntoIterator<Item = Coord>,
    ) -> Result<Self> {
        let rows = rewards.len();
        let cols = rewards.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyGrid);
        }
        let mut grid = Grid::new(rows, cols);
        for (r, row) in rewards.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::NonRectangular {
                    row: r,
                    expected: cols,
                    got: row.len(),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(Error::NonFiniteReward {
                        coord: Coord::new(r as i32, c as i32),
                        value,
                    });
                }
                grid.set(r, c, value);
            }
        }

        let mut wall_set = HashSet::new();
        for w in walls {
            let in_ring = (-1..=rows as i32).contains(&w.row) && (-1..=cols as i32).contains(&w.col);
            if !in_ring {
                return Err(Error::CoordinateOutOfBounds { set: "wall", coord: w });
            }
            wall_set.insert(w);
        }
        wall_set.extend(border_ring(rows, cols));

        let mut terminal_set = HashSet::new();
        for t in terminals {
            if !grid.contains(t) {
                return Err(Error::CoordinateOutOfBounds { set: "terminal", coord: t });
            }
            if wall_set.contains(&t) {
                return Err(Error::TerminalIsWall { coord: t });
            }
            terminal_set.insert(t);
        }

        Ok(Self {
            rewards: grid,
            walls: wall_set,
            terminals: terminal_set,
        })
    }

    /// The 6x6 reference board: no terminals, five interior walls.
    pub fn demo() -> Self {
        let s = STEP_REWARD;
        let rewards = vec![
            vec![1.0, 0.0, 1.0, s, s, 1.0],
            vec![s, -1.0, s, 1.0, 0.0, -1.0],
            vec![s, s, -1.0, s, 1.0, s],
            vec![s, s, s, -1.0, s, 1.0],
            vec![s, 0.0, 0.0, 0.0, -1.0, s],
            vec![s, s, s, s, s, s],
        ];
        let walls = [(0, 1), (1, 4), (4, 1), (4, 2), (4, 3)].map(Coord::from);
        Self {
            rewards: Grid {
                data: rewards.concat(),
                rows: 6,
                cols: 6,
            },
            walls: walls.into_iter().chain(border_ring(6, 6)).collect(),
            terminals: HashSet::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rewards.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.rewards.cols
    }

    pub fn rewards(&self) -> &Grid<f64> {
        &self.rewards
    }

    /// Reward at an in-grid coordinate.
    #[inline]
    pub fn reward(&self, c: Coord) -> f64 {
        self.rewards.at(c).unwrap_or(0.0)
    }

    #[inline]
    pub fn is_wall(&self, c: Coord) -> bool {
        self.walls.contains(&c)
    }

    #[inline]
    pub fn is_terminal(&self, c: Coord) -> bool {
        self.terminals.contains(&c)
    }

    /// Walls take precedence over terminals; `new` rejects the overlap anyway.
    #[inline]
    pub fn kind(&self, c: Coord) -> CellKind {
        if self.is_wall(c) {
            CellKind::Wall
        } else if self.is_terminal(c) {
            CellKind::Terminal
        } else {
            CellKind::Open
        }
    }

    /// Every in-grid coordinate, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        self.rewards.coords()
    }

    /// In-grid coordinates that are not walls, row-major.
    pub fn states(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords().filter(|c| !self.is_wall(*c))
    }

    /// Interior walls only; the border ring is implied.
    pub fn interior_walls(&self) -> Vec<Coord> {
        let mut walls: Vec<Coord> = self
            .walls
            .iter()
            .copied()
            .filter(|w| self.rewards.contains(*w))
            .collect();
        walls.sort();
        walls
    }

    pub fn terminals(&self) -> Vec<Coord> {
        let mut t: Vec<Coord> = self.terminals.iter().copied().collect();
        t.sort();
        t
    }

    /// Parse and validate a JSON board (`rewards`, optional `walls` and `terminals`).
    pub fn from_json(text: &str) -> Result<Self> {
        let spec: BoardSpec = serde_json::from_str(text)?;
        Board::try_from(spec)
    }

    pub fn to_spec(&self) -> BoardSpec {
        BoardSpec {
            rewards: self.rewards.to_rows(),
            walls: self.interior_walls(),
            terminals: self.terminals(),
        }
    }
}

impl TryFrom<BoardSpec> for Board {
    type Error = Error;

    fn try_from(spec: BoardSpec) -> Result<Self> {
        Board::new(spec.rewards, spec.walls, spec.terminals)
    }
}

/// The cells one step outside each edge.
pub fn border_ring(rows: usize, cols: usize) -> impl Iterator<Item = Coord> {
    let (r, c) = (rows as i32, cols as i32);
    let horizontal = (0..c).flat_map(move |j| [Coord::new(-1, j), Coord::new(r, j)]);
    let vertical = (0..r).flat_map(move |i| [Coord::new(i, -1), Coord::new(i, c)]);
    horizontal.chain(vertical)
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (row, col) cell address. Signed so the virtual border one cell beyond
/// each edge (-1 and `rows`/`cols`) is representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl From<Coord> for (i32, i32) {
    fn from(c: Coord) -> Self {
        (c.row, c.col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Row-major flat grid. No per-cell objects.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub rows: usize,
    pub cols: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Copy> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: T) {
        let i = self.idx(row, col);
        self.data[i] = v;
    }

    /// Value at `c`, or `None` when `c` lies outside the grid.
    #[inline]
    pub fn at(&self, c: Coord) -> Option<T> {
        self.index_of(c).map(|i| self.data[i])
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        self.index_of(c).is_some()
    }

    #[inline]
    pub fn index_of(&self, c: Coord) -> Option<usize> {
        if c.row < 0 || c.col < 0 {
            return None;
        }
        let (r, col) = (c.row as usize, c.col as usize);
        if r >= self.rows || col >= self.cols {
            return None;
        }
        Some(r * self.cols + col)
    }

    /// Every in-grid coordinate in row-major order. Solvers sweep in this order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<T> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Coord::new((i / cols) as i32, (i % cols) as i32))
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }
}

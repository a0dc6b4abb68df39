use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::Board;
use crate::grid::Coord;
use crate::utility::UtilityGrid;

/// Utility trajectory per state, one value per outer iteration. Owned by a
/// single solver run and handed back with its result; solvers never read it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History {
    series: BTreeMap<Coord, Vec<f64>>,
}

/// One state's trajectory, in serialisable form.
#[derive(Clone, Debug, Serialize)]
pub struct Series {
    pub coord: Coord,
    pub values: Vec<f64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the current utility of every non-wall cell.
    pub fn record(&mut self, board: &Board, u: &UtilityGrid) {
        for c in board.states() {
            let value = u.at(c).unwrap_or(0.0);
            self.series.entry(c).or_default().push(value);
        }
    }

    pub fn get(&self, c: Coord) -> Option<&[f64]> {
        self.series.get(&c).map(Vec::as_slice)
    }

    /// Number of recorded iterations (length of every series).
    pub fn len(&self) -> usize {
        self.series.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn states(&self) -> usize {
        self.series.len()
    }

    /// Trajectories in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &[f64])> {
        self.series.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn to_series(&self) -> Vec<Series> {
        self.iter()
            .map(|(coord, values)| Series {
                coord,
                values: values.to_vec(),
            })
            .collect()
    }

    /// Smallest and largest recorded value, or `None` when nothing was recorded.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.series
            .values()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::zeros;

    #[test]
    fn records_non_wall_cells_only() {
        let board = Board::new(vec![vec![0.0, 0.0, 0.0]], [Coord::new(0, 1)], []).unwrap();
        let mut u = zeros(&board);
        let mut history = History::new();
        history.record(&board, &u);
        u.set(0, 0, 2.0);
        history.record(&board, &u);

        assert_eq!(history.states(), 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(Coord::new(0, 0)), Some(&[0.0, 2.0][..]));
        assert_eq!(history.get(Coord::new(0, 1)), None);
        assert_eq!(history.bounds(), Some((0.0, 2.0)));
    }
}

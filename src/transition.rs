use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::Coord;

/// Probability of moving in the intended direction.
pub const P_INTENDED: f64 = 0.8;
/// Probability of each right-angle drift.
pub const P_DRIFT: f64 = 0.1;

/// Cardinal movement intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// Preference order for exact ties in greedy lookahead.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// (d_row, d_col) of one step in this direction.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// The two right-angle directions. Vertical moves drift right then left,
    /// horizontal moves drift down then up.
    #[inline]
    pub fn drifts(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Right, Action::Left],
            Action::Left | Action::Right => [Action::Down, Action::Up],
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Action::Up => "u",
            Action::Down => "d",
            Action::Left => "l",
            Action::Right => "r",
        }
    }

    #[inline]
    pub fn step(self, from: Coord) -> Coord {
        let (dr, dc) = self.delta();
        from.offset(dr, dc)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One nominal outcome of an action. `to` may be a wall; wall resolution is
/// the utility layer's job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outcome {
    pub to: Coord,
    pub p: f64,
}

/// The three outcomes of taking `action` from `from`: intended move first,
/// then the two drifts. The opposite direction never occurs.
#[inline]
pub fn outcomes(action: Action, from: Coord) -> [Outcome; 3] {
    let [a, b] = action.drifts();
    [
        Outcome { to: action.step(from), p: P_INTENDED },
        Outcome { to: a.step(from), p: P_DRIFT },
        Outcome { to: b.step(from), p: P_DRIFT },
    ]
}

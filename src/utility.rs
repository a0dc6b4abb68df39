//! Utility store and the Bellman backups shared by both engines.
//!
//! Utilities live in a plain `Grid<f64>` that the solving loop mutates in
//! place. Reads during a sweep see whatever the sweep has already written
//! (Gauss-Seidel order), which is part of the contract.

use crate::board::{Board, CellKind};
use crate::grid::{Coord, Grid};
use crate::transition::{Action, outcomes};

pub type UtilityGrid = Grid<f64>;

/// Fresh all-zero utilities shaped like `board`.
pub fn zeros(board: &Board) -> UtilityGrid {
    Grid::new(board.rows(), board.cols())
}

/// Utility charged for landing on `to` after moving from `from`. A wall
/// bounces the agent back, so it is charged the origin's current utility.
#[inline]
pub fn effective_utility(board: &Board, u: &UtilityGrid, to: Coord, from: Coord) -> f64 {
    let c = if board.is_wall(to) { from } else { to };
    u.at(c).unwrap_or(0.0)
}

/// Q(a): expected next-state utility of `action` from `c`, no reward or
/// discount applied.
#[inline]
pub fn expected_utility(board: &Board, u: &UtilityGrid, c: Coord, action: Action) -> f64 {
    outcomes(action, c)
        .iter()
        .fold(0.0, |acc, o| acc + o.p * effective_utility(board, u, o.to, c))
}

/// max_a Q(a) over the four actions.
#[inline]
pub fn best_expected_utility(board: &Board, u: &UtilityGrid, c: Coord) -> f64 {
    Action::ALL
        .iter()
        .map(|&a| expected_utility(board, u, c, a))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Result of backing up one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backup {
    pub value: f64,
    /// |U_old - value|, before any convergence scaling.
    pub delta: f64,
}

/// The per-cell update applied by either engine. `lookahead` supplies the
/// expectation term for open cells (max over actions, or the fixed policy's
/// action). Walls pin to 0, terminals pin to their reward.
#[inline]
pub fn backup<F>(board: &Board, u: &mut UtilityGrid, c: Coord, gamma: f64, lookahead: F) -> Backup
where
    F: FnOnce(&Board, &UtilityGrid, Coord) -> f64,
{
    let old = u.at(c).unwrap_or(0.0);
    let (value, delta) = match board.kind(c) {
        CellKind::Wall => (0.0, 0.0),
        CellKind::Terminal => (board.reward(c), 0.0),
        CellKind::Open => {
            let v = gamma * lookahead(board, &*u, c) + board.reward(c);
            (v, (old - v).abs())
        }
    };
    if let Some(i) = u.index_of(c) {
        u.data[i] = value;
    }
    Backup { value, delta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    fn corridor() -> Board {
        // One row: open, open, open. Border walls all round.
        Board::new(vec![vec![-0.04, -0.04, 1.0]], [], [Coord::new(0, 2)]).unwrap()
    }

    #[test]
    fn wall_bounce_charges_origin_utility() {
        let board = corridor();
        let mut u = zeros(&board);
        u.set(0, 0, 0.5);
        // Moving up from (0,0) hits the border: charged U[(0,0)], not zero.
        assert_float_eq!(
            effective_utility(&board, &u, Coord::new(-1, 0), Coord::new(0, 0)),
            0.5,
            abs <= 0.0
        );
    }

    #[test]
    fn expectation_weights_outcomes() {
        let board = corridor();
        let mut u = zeros(&board);
        u.set(0, 0, 0.2);
        u.set(0, 1, 0.4);
        u.set(0, 2, 1.0);
        // Right from (0,1): 0.8 * U(0,2) + 0.1 * bounce + 0.1 * bounce.
        let q = expected_utility(&board, &u, Coord::new(0, 1), Action::Right);
        assert_float_eq!(q, 0.8 * 1.0 + 0.1 * 0.4 + 0.1 * 0.4, abs <= 1e-12);
        // Up from (0,1): 0.8 bounce + drift right to (0,2) + drift left to (0,0).
        let q = expected_utility(&board, &u, Coord::new(0, 1), Action::Up);
        assert_float_eq!(q, 0.8 * 0.4 + 0.1 * 1.0 + 0.1 * 0.2, abs <= 1e-12);
    }

    #[test]
    fn pins_terminals_and_walls() {
        let board = Board::new(vec![vec![1.0, 5.0]], [Coord::new(0, 1)], [Coord::new(0, 0)]).unwrap();
        let mut u = zeros(&board);
        u.set(0, 1, 3.0);
        let t = backup(&board, &mut u, Coord::new(0, 0), 0.9, best_expected_utility);
        let w = backup(&board, &mut u, Coord::new(0, 1), 0.9, best_expected_utility);
        assert_eq!(t.value, 1.0);
        assert_eq!(w.value, 0.0);
        assert_eq!(u.get(0, 0), 1.0);
        assert_eq!(u.get(0, 1), 0.0);
    }
}

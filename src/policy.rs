//! Policy grid and greedy one-step lookahead.

use crate::board::{Board, CellKind};
use crate::grid::{Coord, Grid};
use crate::transition::Action;
use crate::utility::{UtilityGrid, expected_utility};

/// One action per open cell; `None` on walls and terminals.
pub type PolicyGrid = Grid<Option<Action>>;

/// Symbol for a policy cell: `u`, `d`, `l`, `r`, or `na`.
pub fn symbol(cell: Option<Action>) -> &'static str {
    cell.map_or("na", Action::symbol)
}

/// Greedy action at `c` and its Q value. The highest Q wins; exact ties go
/// to the earlier action in up, down, left, right.
pub fn best_action(board: &Board, u: &UtilityGrid, c: Coord) -> (Action, f64) {
    let mut best = (Action::Up, expected_utility(board, u, c, Action::Up));
    for &a in &Action::ALL[1..] {
        let q = expected_utility(board, u, c, a);
        if q > best.1 {
            best = (a, q);
        }
    }
    best
}

/// Greedy policy for every open cell of `board` under utilities `u`.
pub fn extract(board: &Board, u: &UtilityGrid) -> PolicyGrid {
    let mut policy = Grid::new(board.rows(), board.cols());
    for c in board.coords() {
        if board.kind(c) == CellKind::Open {
            let (a, _) = best_action(board, u, c);
            policy.set(c.row as usize, c.col as usize, Some(a));
        }
    }
    policy
}

/// Policy as rows of symbols, for reports and JSON.
pub fn symbols(policy: &PolicyGrid) -> Vec<Vec<&'static str>> {
    (0..policy.rows)
        .map(|r| policy.row(r).iter().map(|&a| symbol(a)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::zeros;
    use rstest::rstest;

    #[test]
    fn all_equal_prefers_up() {
        let board = Board::new(vec![vec![0.0; 3]; 3], [], []).unwrap();
        let u = zeros(&board);
        assert_eq!(best_action(&board, &u, Coord::new(1, 1)).0, Action::Up);
    }

    // A single high-utility neighbour pulls the greedy action toward it.
    #[rstest]
    #[case((0, 1), Action::Up)]
    #[case((2, 1), Action::Down)]
    #[case((1, 0), Action::Left)]
    #[case((1, 2), Action::Right)]
    fn follows_the_best_neighbour(#[case] hot: (i32, i32), #[case] expected: Action) {
        let board = Board::new(vec![vec![0.0; 3]; 3], [], []).unwrap();
        let mut u = zeros(&board);
        u.set(hot.0 as usize, hot.1 as usize, 1.0);
        assert_eq!(best_action(&board, &u, Coord::new(1, 1)).0, expected);
    }

    #[test]
    fn left_right_tie_goes_left() {
        // Left and right neighbours equal, up and down worse: left wins.
        let board = Board::new(vec![vec![0.0; 3]; 3], [], []).unwrap();
        let mut u = zeros(&board);
        u.set(1, 0, 1.0);
        u.set(1, 2, 1.0);
        assert_eq!(best_action(&board, &u, Coord::new(1, 1)).0, Action::Left);
    }

    #[test]
    fn walls_and_terminals_are_not_applicable() {
        let board = Board::new(vec![vec![0.0, 1.0, 0.0]], [Coord::new(0, 2)], [Coord::new(0, 1)]).unwrap();
        let policy = extract(&board, &zeros(&board));
        assert_eq!(symbols(&policy), vec![vec!["u", "na", "na"]]);
    }
}

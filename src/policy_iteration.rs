use tracing::{debug, info, warn};

use crate::Solution;
use crate::board::{Board, CellKind};
use crate::config::{EvaluationMode, SolverParams};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::history::History;
use crate::policy::{PolicyGrid, best_action};
use crate::transition::Action;
use crate::utility::{self, UtilityGrid, backup, expected_utility};

/// Starting policy: move left from every open cell.
pub fn initial_policy(board: &Board) -> PolicyGrid {
    let mut policy = Grid::new(board.rows(), board.cols());
    for c in board.coords() {
        if board.kind(c) == CellKind::Open {
            policy.set(c.row as usize, c.col as usize, Some(Action::Left));
        }
    }
    policy
}

/// One in-place sweep of the fixed-policy update. Returns the largest
/// change |U_old - gamma * Q(policy) - R| over open cells.
pub fn evaluation_sweep(board: &Board, policy: &PolicyGrid, u: &mut UtilityGrid, gamma: f64) -> f64 {
    let mut max_delta = 0.0f64;
    for c in board.coords() {
        let action = policy.at(c).flatten();
        let b = backup(board, u, c, gamma, |board, u, c| {
            action.map_or(0.0, |a| expected_utility(board, u, c, a))
        });
        max_delta = max_delta.max(b.delta);
    }
    max_delta
}

/// Policy evaluation. In `Error` mode sweeps until the largest change is at
/// most the threshold; in `Sweeps` mode performs exactly that many sweeps.
/// Returns the last sweep's largest change.
pub fn evaluate(
    board: &Board,
    policy: &PolicyGrid,
    u: &mut UtilityGrid,
    gamma: f64,
    mode: EvaluationMode,
    max_sweeps: usize,
) -> Result<f64> {
    let mut sweeps = 0;
    loop {
        let residual = evaluation_sweep(board, policy, u, gamma);
        sweeps += 1;
        let done = match mode {
            EvaluationMode::Error(threshold) => residual <= threshold,
            EvaluationMode::Sweeps(n) => sweeps >= n,
        };
        if done {
            return Ok(residual);
        }
        if sweeps >= max_sweeps {
            warn!(sweeps, residual, "policy evaluation hit the sweep cap");
            return Err(Error::NonConvergence {
                stage: "policy evaluation",
                iterations: sweeps,
                residual,
            });
        }
    }
}

/// Greedy improvement. A cell switches only when the greedy action's Q is
/// strictly greater than the current action's Q recomputed on `u`.
/// Returns the number of cells that switched.
pub fn improve(board: &Board, policy: &mut PolicyGrid, u: &UtilityGrid) -> usize {
    let mut changed = 0;
    for c in board.coords() {
        let Some(current) = policy.at(c).flatten() else {
            continue;
        };
        let (greedy, greedy_q) = best_action(board, u, c);
        if greedy_q > expected_utility(board, u, c, current) {
            policy.set(c.row as usize, c.col as usize, Some(greedy));
            changed += 1;
        }
    }
    changed
}

/// Policy iteration: alternate evaluation and improvement until an
/// improvement pass changes nothing. `iterations` counts rounds.
pub fn policy_iteration(board: &Board, params: &SolverParams) -> Result<Solution> {
    params.validate_policy_iteration()?;
    let gamma = params.gamma;

    let mut u = utility::zeros(board);
    let mut policy = initial_policy(board);
    let mut history = History::new();
    let mut residuals = Vec::new();

    loop {
        let residual = evaluate(board, &policy, &mut u, gamma, params.evaluation, params.max_sweeps)?;
        residuals.push(residual);
        history.record(board, &u);

        let changed = improve(board, &mut policy, &u);
        let round = residuals.len();
        debug!(round, changed, residual, "policy iteration round");
        if changed == 0 {
            break;
        }
        if round >= params.max_policy_iterations {
            warn!(round, changed, "policy iteration hit the round cap");
            return Err(Error::NonConvergence {
                stage: "policy iteration",
                iterations: round,
                residual,
            });
        }
    }

    let iterations = residuals.len();
    info!(iterations, evaluation = ?params.evaluation, gamma, "policy iteration stable");
    Ok(Solution {
        iterations,
        utilities: u,
        policy,
        history,
        residuals,
    })
}

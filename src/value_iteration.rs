use tracing::{debug, info, warn};

use crate::Solution;
use crate::board::Board;
use crate::config::SolverParams;
use crate::error::{Error, Result};
use crate::history::History;
use crate::policy;
use crate::utility::{self, UtilityGrid, backup, best_expected_utility};

/// One in-place sweep of the Bellman optimality update over every cell in
/// row-major order. Returns the largest unscaled change |U_old - U_new|.
pub fn sweep(board: &Board, u: &mut UtilityGrid, gamma: f64) -> f64 {
    let mut max_delta = 0.0f64;
    for c in board.coords() {
        let b = backup(board, u, c, gamma, best_expected_utility);
        max_delta = max_delta.max(b.delta);
    }
    max_delta
}

/// Scale applied to the raw residual so that stopping at `epsilon` bounds
/// the greedy policy's loss by `epsilon`.
#[inline]
pub fn residual_scale(gamma: f64) -> f64 {
    (1.0 - gamma) / gamma
}

/// Value iteration: sweep until the scaled Bellman residual is at most
/// `params.epsilon`, then read the greedy policy off the utilities.
pub fn value_iteration(board: &Board, params: &SolverParams) -> Result<Solution> {
    params.validate_value_iteration()?;
    let gamma = params.gamma;
    let scale = residual_scale(gamma);

    let mut u = utility::zeros(board);
    let mut history = History::new();
    let mut residuals = Vec::new();

    loop {
        let residual = sweep(board, &mut u, gamma) * scale;
        residuals.push(residual);
        history.record(board, &u);
        let sweeps = residuals.len();
        debug!(sweep = sweeps, residual, "value iteration sweep");

        if residual <= params.epsilon {
            break;
        }
        if sweeps >= params.max_sweeps {
            warn!(sweeps, residual, "value iteration hit the sweep cap");
            return Err(Error::NonConvergence {
                stage: "value iteration",
                iterations: sweeps,
                residual,
            });
        }
    }

    let iterations = residuals.len();
    info!(iterations, epsilon = params.epsilon, gamma, "value iteration converged");
    let policy = policy::extract(board, &u);
    Ok(Solution {
        iterations,
        utilities: u,
        policy,
        history,
        residuals,
    })
}

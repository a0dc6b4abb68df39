//! Value iteration and policy iteration on grid-world MDPs.
//!
//! The agent moves in the intended direction with probability 0.8 and drifts
//! at a right angle with probability 0.1 each way. Walls bounce it back,
//! terminal cells are absorbing. Both solvers sweep in place in row-major
//! order.

pub mod board;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod history;
pub mod policy;
pub mod policy_iteration;
pub mod render;
pub mod rng;
pub mod sweep;
pub mod transition;
pub mod utility;
pub mod value_iteration;

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use board::{Board, BoardSpec};
pub use config::{BoardParams, EvaluationMode, SolverParams};
pub use error::{Error, Result};
pub use grid::{Coord, Grid};
pub use history::History;
pub use policy::PolicyGrid;
pub use policy_iteration::policy_iteration;
pub use transition::Action;
pub use utility::UtilityGrid;
pub use value_iteration::value_iteration;

/// What a solver run hands back. Nothing here is shared with the board.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Sweeps for value iteration, evaluate+improve rounds for policy iteration.
    pub iterations: usize,
    pub utilities: UtilityGrid,
    pub policy: PolicyGrid,
    pub history: History,
    /// Per outer iteration: the scaled Bellman residual (value iteration) or
    /// the last evaluation sweep's largest change (policy iteration).
    pub residuals: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    ValueIteration,
    /// Policy iteration with evaluation run to the error threshold.
    PolicyIteration,
    /// Policy iteration with a fixed number of evaluation sweeps.
    ModifiedPolicyIteration,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::ValueIteration,
        Algorithm::PolicyIteration,
        Algorithm::ModifiedPolicyIteration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::ValueIteration => "value_iteration",
            Algorithm::PolicyIteration => "policy_iteration",
            Algorithm::ModifiedPolicyIteration => "modified_policy_iteration",
        }
    }

    /// Evaluation mode this algorithm implies. Plain policy iteration
    /// evaluates to `epsilon`; the modified variant keeps the configured sweep
    /// count, falling back to the default count if the params carry an error
    /// threshold instead.
    fn evaluation(self, params: &SolverParams) -> EvaluationMode {
        match (self, params.evaluation) {
            (Algorithm::PolicyIteration, EvaluationMode::Error(t)) => EvaluationMode::Error(t),
            (Algorithm::PolicyIteration, EvaluationMode::Sweeps(_)) => {
                EvaluationMode::Error(params.epsilon)
            }
            (_, EvaluationMode::Sweeps(n)) => EvaluationMode::Sweeps(n),
            (_, EvaluationMode::Error(_)) => SolverParams::default().evaluation,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run one algorithm on `board`.
pub fn solve(board: &Board, algorithm: Algorithm, params: &SolverParams) -> Result<Solution> {
    match algorithm {
        Algorithm::ValueIteration => value_iteration(board, params),
        _ => {
            let params = SolverParams {
                evaluation: algorithm.evaluation(params),
                ..params.clone()
            };
            policy_iteration(board, &params)
        }
    }
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Run all three algorithms on the same board, timing each.
pub fn solve_all(board: &Board, params: &SolverParams) -> Result<(Vec<(Algorithm, Solution)>, Vec<Timing>)> {
    let mut timings = Vec::new();
    let mut solutions = Vec::new();
    let total_start = Instant::now();

    for algorithm in Algorithm::ALL {
        let t = Instant::now();
        let solution = solve(board, algorithm, params)?;
        timings.push(Timing {
            name: algorithm.name(),
            ms: t.elapsed().as_secs_f64() * 1000.0,
        });
        solutions.push((algorithm, solution));
    }

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    Ok((solutions, timings))
}

/// `(row,col):value` lines, row-major.
pub fn format_cells<T: fmt::Display + Copy>(grid: &Grid<T>) -> String {
    grid.coords()
        .filter_map(|c| grid.at(c).map(|v| format!("{c}:{v}\n")))
        .collect()
}

/// `(row,col):symbol` lines for a policy.
pub fn format_policy(policy: &PolicyGrid) -> String {
    policy
        .coords()
        .filter_map(|c| policy.at(c).map(|a| format!("{c}:{}\n", policy::symbol(a))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_all_times_every_algorithm() {
        let (solutions, timings) = solve_all(&Board::demo(), &SolverParams::default()).unwrap();
        assert_eq!(solutions.len(), 3);
        assert_eq!(timings.len(), 4);
        assert_eq!(timings.last().unwrap().name, "TOTAL");
        for (_, sol) in &solutions {
            assert!(sol.iterations > 0);
        }
    }

    #[test]
    fn algorithm_picks_evaluation_mode() {
        let params = SolverParams::default();
        assert_eq!(
            Algorithm::PolicyIteration.evaluation(&params),
            EvaluationMode::Error(params.epsilon)
        );
        assert_eq!(
            Algorithm::ModifiedPolicyIteration.evaluation(&params),
            EvaluationMode::Sweeps(10)
        );
    }

    #[test]
    fn formats_cells_row_major() {
        let mut g: Grid<f64> = Grid::new(1, 2);
        g.set(0, 1, 0.5);
        assert_eq!(format_cells(&g), "(0,0):0\n(0,1):0.5\n");
        let mut p: PolicyGrid = Grid::new(1, 2);
        p.set(0, 0, Some(Action::Down));
        assert_eq!(format_policy(&p), "(0,0):d\n(0,1):na\n");
    }
}

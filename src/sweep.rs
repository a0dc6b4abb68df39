//! Parameter sweeps: how iteration counts grow with board size, wall
//! density and reward density.
//!
//! Each point averages `trials` random boards. Boards are solved in
//! parallel; every individual solve stays single-threaded.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::{BoardParams, EvaluationMode, SolverParams};
use crate::error::Result;
use crate::generator::generate;
use crate::policy_iteration::policy_iteration;
use crate::rng::splitmix64;
use crate::value_iteration::value_iteration;

/// Which board parameter a sweep varies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Size,
    WallProbability,
    RewardProbability,
}

impl Axis {
    /// Sample points used by the reference experiments.
    pub fn default_values(self) -> Vec<f64> {
        match self {
            Axis::Size => (5..30).map(f64::from).collect(),
            Axis::WallProbability | Axis::RewardProbability => {
                (1..=9).map(|i| f64::from(i) / 10.0).collect()
            }
        }
    }

    fn apply(self, base: &BoardParams, value: f64) -> BoardParams {
        let mut p = base.clone();
        match self {
            Axis::Size => p.size = value.round() as usize,
            Axis::WallProbability => p.wall_probability = value,
            Axis::RewardProbability => p.reward_probability = value,
        }
        p
    }
}

/// Base board for sweeps over the probabilities: 30x30, 0.2 / 0.2.
pub fn sweep_base() -> BoardParams {
    BoardParams {
        size: 30,
        ..Default::default()
    }
}

/// Solver settings of the reference sweeps.
pub fn sweep_solver() -> SolverParams {
    SolverParams {
        gamma: 0.99,
        epsilon: 0.001,
        evaluation: EvaluationMode::Sweeps(10),
        ..Default::default()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SweepPoint {
    pub value: f64,
    /// Mean value-iteration sweep count.
    pub value_iteration: f64,
    /// Mean policy-iteration round count.
    pub policy_iteration: f64,
}

/// Average iteration counts of value iteration and of policy iteration
/// (with `solver.evaluation`) over `trials` boards per sample point.
pub fn run(
    axis: Axis,
    values: &[f64],
    base: &BoardParams,
    solver: &SolverParams,
    trials: usize,
) -> Result<Vec<SweepPoint>> {
    let trials = trials.max(1);
    values
        .iter()
        .enumerate()
        .map(|(k, &value)| -> Result<SweepPoint> {
            let params = axis.apply(base, value);
            let counts = (0..trials)
                .into_par_iter()
                .map(|t| -> Result<(usize, usize)> {
                    let seed = splitmix64(base.seed ^ ((k as u64) << 32 | t as u64));
                    let board = generate(&BoardParams { seed, ..params.clone() })?;
                    let vi = value_iteration(&board, solver)?.iterations;
                    let pi = policy_iteration(&board, solver)?.iterations;
                    Ok((vi, pi))
                })
                .collect::<Result<Vec<(usize, usize)>>>()?;

            let n = counts.len() as f64;
            let point = SweepPoint {
                value,
                value_iteration: counts.iter().map(|c| c.0 as f64).sum::<f64>() / n,
                policy_iteration: counts.iter().map(|c| c.1 as f64).sum::<f64>() / n,
            };
            info!(
                axis = ?axis,
                value,
                value_iteration = point.value_iteration,
                policy_iteration = point.policy_iteration,
                "sweep point"
            );
            Ok(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_axes() {
        assert_eq!(Axis::Size.default_values().len(), 25);
        assert_eq!(Axis::WallProbability.default_values()[0], 0.1);
        assert_eq!(Axis::RewardProbability.default_values().len(), 9);
    }

    #[test]
    fn small_size_sweep_is_deterministic() {
        let base = BoardParams::default();
        let solver = sweep_solver();
        let a = run(Axis::Size, &[4.0, 5.0], &base, &solver, 2).unwrap();
        let b = run(Axis::Size, &[4.0, 5.0], &base, &solver, 2).unwrap();
        assert_eq!(a.len(), 2);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.value_iteration, y.value_iteration);
            assert_eq!(x.policy_iteration, y.policy_iteration);
            assert!(x.value_iteration >= 1.0);
            assert!(x.policy_iteration >= 1.0);
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How policy iteration evaluates a fixed policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum EvaluationMode {
    /// Sweep until every open cell changes by at most this much.
    Error(f64),
    /// Exactly this many sweeps per round (modified policy iteration).
    Sweeps(usize),
}

/// Solver parameters. Defaults are the reference experiment's settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub gamma: f64,
    /// Value-iteration threshold on the scaled Bellman residual.
    pub epsilon: f64,
    pub evaluation: EvaluationMode,

    // Guards
    pub max_sweeps: usize,
    pub max_policy_iterations: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon: 0.001,
            evaluation: EvaluationMode::Sweeps(10),
            max_sweeps: 1_000_000,
            max_policy_iterations: 10_000,
        }
    }
}

impl SolverParams {
    /// Checks shared by both engines.
    pub fn validate_gamma(&self) -> Result<()> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 || self.gamma >= 1.0 {
            return Err(Error::InvalidDiscount { gamma: self.gamma });
        }
        Ok(())
    }

    pub fn validate_value_iteration(&self) -> Result<()> {
        self.validate_gamma()?;
        check_threshold("value iteration", self.epsilon)
    }

    pub fn validate_policy_iteration(&self) -> Result<()> {
        self.validate_gamma()?;
        match self.evaluation {
            EvaluationMode::Error(threshold) => check_threshold("policy evaluation", threshold),
            EvaluationMode::Sweeps(0) => Err(Error::InvalidSweepCount),
            EvaluationMode::Sweeps(_) => Ok(()),
        }
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidThreshold { name, value });
    }
    Ok(())
}

/// Random board parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardParams {
    pub size: usize,
    pub wall_probability: f64,
    pub reward_probability: f64,
    pub seed: u64,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            size: 6,
            wall_probability: 0.2,
            reward_probability: 0.2,
            seed: 42,
        }
    }
}

impl BoardParams {
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::EmptyGrid);
        }
        for (name, value) in [
            ("wall", self.wall_probability),
            ("reward", self.reward_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidProbability { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn rejects_bad_discount(#[case] gamma: f64) {
        let params = SolverParams { gamma, ..Default::default() };
        assert!(matches!(
            params.validate_value_iteration(),
            Err(Error::InvalidDiscount { .. })
        ));
        assert!(matches!(
            params.validate_policy_iteration(),
            Err(Error::InvalidDiscount { .. })
        ));
    }

    #[rstest]
    #[case(EvaluationMode::Error(0.0), false)]
    #[case(EvaluationMode::Error(1e-3), true)]
    #[case(EvaluationMode::Sweeps(0), false)]
    #[case(EvaluationMode::Sweeps(1), true)]
    fn evaluation_mode_validation(#[case] evaluation: EvaluationMode, #[case] ok: bool) {
        let params = SolverParams { evaluation, ..Default::default() };
        assert_eq!(params.validate_policy_iteration().is_ok(), ok);
    }

    #[test]
    fn rejects_zero_epsilon() {
        let params = SolverParams { epsilon: 0.0, ..Default::default() };
        assert!(matches!(
            params.validate_value_iteration(),
            Err(Error::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: SolverParams =
            serde_json::from_str(r#"{"gamma": 0.9, "evaluation": {"mode": "error", "value": 0.01}}"#).unwrap();
        assert_eq!(params.gamma, 0.9);
        assert_eq!(params.evaluation, EvaluationMode::Error(0.01));
        assert_eq!(params.epsilon, 0.001);
    }

    #[test]
    fn board_params_probabilities() {
        let bad = BoardParams { wall_probability: 1.5, ..Default::default() };
        assert!(matches!(bad.validate(), Err(Error::InvalidProbability { name: "wall", .. })));
        assert!(BoardParams::default().validate().is_ok());
    }
}

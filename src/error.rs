//! Error types for the grid MDP solvers

use thiserror::Error;

use crate::grid::Coord;

/// Main error type for the crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("discount factor {gamma} must lie strictly between 0 and 1")]
    InvalidDiscount { gamma: f64 },

    #[error("{name} threshold {value} must be positive and finite")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("fixed-sweep policy evaluation needs at least one sweep")]
    InvalidSweepCount,

    #[error("{name} probability {value} must lie in [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("reward grid is empty")]
    EmptyGrid,

    #[error("reward grid is not rectangular: row {row} has {got} cells, expected {expected}")]
    NonRectangular {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("reward {value} at {coord} is not finite")]
    NonFiniteReward { coord: Coord, value: f64 },

    #[error("{set} coordinate {coord} is outside the grid")]
    CoordinateOutOfBounds { set: &'static str, coord: Coord },

    #[error("coordinate {coord} cannot be both a wall and a terminal")]
    TerminalIsWall { coord: Coord },

    #[error("{stage} did not converge after {iterations} iterations (last residual {residual})")]
    NonConvergence {
        stage: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

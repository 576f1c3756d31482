//! Error types for potential_astar

use thiserror::Error;

/// Which endpoint of a query failed a bounds check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Goal,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::Goal => write!(f, "goal"),
        }
    }
}

/// Main error type for planning queries
#[derive(Debug, Error)]
pub enum PlanningError {
    /// No obstacle points were given, so the map bounds cannot be derived
    #[error("Empty obstacle set: map bounds are undefined")]
    EmptyObstacleSet,
    /// Start or goal lies outside the derived map bounds
    #[error("Out of bounds: {which} ({x}, {y}) is outside the map")]
    OutOfBounds { which: Endpoint, x: f64, y: f64 },
    /// The open set was exhausted before reaching the goal
    #[error("No path found")]
    NoPathFound,
    /// The potential field is uniform and could not be rescaled
    #[error("Degenerate potential field: min equals max ({value})")]
    DegenerateField { value: f64 },
    /// A parent key was missing from the closed set during reconstruction
    #[error("Inconsistent parent link: key {key} is not in the closed set")]
    InconsistentParentLink { key: usize },
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for PlanningError {
    fn from(e: std::io::Error) -> Self {
        PlanningError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for PlanningError {
    fn from(e: serde_yaml::Error) -> Self {
        PlanningError::Config(e.to_string())
    }
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanningError::NoPathFound;
        assert_eq!(format!("{}", err), "No path found");

        let err = PlanningError::OutOfBounds { which: Endpoint::Goal, x: 1.5, y: -2.0 };
        assert_eq!(format!("{}", err), "Out of bounds: goal (1.5, -2) is outside the map");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlanningError = io_err.into();
        assert!(matches!(err, PlanningError::Config(_)));
    }
}

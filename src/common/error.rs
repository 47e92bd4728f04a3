//! Error types for tl_rrt_star

use std::fmt;

/// Main error type for the planner
#[derive(Debug)]
pub enum PlanningError {
    /// Tree construction or path extraction failed
    Planning(String),
    /// Caller contract violation (empty team, bad step size, ...)
    InvalidParameter(String),
    /// I/O error
    Io(std::io::Error),
    /// Visualization error
    Visualization(String),
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::Planning(msg) => write!(f, "Planning error: {}", msg),
            PlanningError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlanningError::Io(e) => write!(f, "I/O error: {}", e),
            PlanningError::Visualization(msg) => write!(f, "Visualization error: {}", msg),
        }
    }
}

impl std::error::Error for PlanningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanningError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlanningError {
    fn from(e: std::io::Error) -> Self {
        PlanningError::Io(e)
    }
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanningError::InvalidParameter("step size must be positive".to_string());
        assert_eq!(format!("{}", err), "Invalid parameter: step size must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlanningError = io_err.into();
        assert!(matches!(err, PlanningError::Io(_)));
    }
}

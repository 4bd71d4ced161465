use thiserror::Error;

use crate::models::grid::GridSource;

/// Failure of a single remote call. `operation` names the call and its target,
/// e.g. `place soloon at (3, 4)`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} failed: {source}")]
    Transport {
        operation: String,
        source: reqwest::Error,
    },

    #[error("{operation} returned an undecodable body: {source}")]
    Decode {
        operation: String,
        source: serde_json::Error,
    },

    #[error("{operation} did not complete: {message}")]
    Task { operation: String, message: String },
}

impl ApiError {
    pub fn http(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        ApiError::Status {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// HTTP status of the failure, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting (429) and transient server faults (500) are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status(), Some(429 | 500))
    }

    pub fn operation(&self) -> &str {
        match self {
            ApiError::Status { operation, .. }
            | ApiError::Transport { operation, .. }
            | ApiError::Decode { operation, .. }
            | ApiError::Task { operation, .. } => operation,
        }
    }
}

/// Validation inputs are absent or malformed. Distinct from "grids differ".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} grid is missing")]
    MissingGrid(GridSource),

    #[error("{grid} grid is not rectangular: row {row} has {found} cells, expected {expected}")]
    NonRectangular {
        grid: GridSource,
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0} in environment variables")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Failure of a service-level operation: fetching failed, or a grid was malformed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ApiError::http("op", 429, "").is_retryable());
        assert!(ApiError::http("op", 500, "").is_retryable());
        assert!(!ApiError::http("op", 502, "").is_retryable());
        assert!(!ApiError::http("op", 404, "").is_retryable());
        let task = ApiError::Task {
            operation: "op".into(),
            message: "panicked".into(),
        };
        assert!(!task.is_retryable());
    }

    #[test]
    fn test_message_names_operation() {
        let err = ApiError::http("place polyanet at (1, 2)", 404, "not found");
        assert_eq!(
            err.to_string(),
            "place polyanet at (1, 2) failed with HTTP 404: not found"
        );
        assert_eq!(err.operation(), "place polyanet at (1, 2)");
    }
}

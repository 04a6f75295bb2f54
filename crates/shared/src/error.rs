use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AlgorithmId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameterSet,
    BackendUnavailable,
    MalformedResponse,
}

/// Failure attached to a dataset channel next to its last good value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DatasetError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum EvaluationError {
    #[error("invalid parameter set for {algorithm}: {reason}")]
    InvalidParameterSet {
        algorithm: AlgorithmId,
        reason: String,
    },
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

impl EvaluationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluationError::InvalidParameterSet { .. } => ErrorKind::InvalidParameterSet,
            EvaluationError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            EvaluationError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }
}

impl From<&EvaluationError> for DatasetError {
    fn from(value: &EvaluationError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<EvaluationError> for DatasetError {
    fn from(value: EvaluationError) -> Self {
        Self::from(&value)
    }
}

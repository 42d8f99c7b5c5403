use crate::services::{ApiError, GeocodingError};
use thiserror::Error;

/// Failure kinds surfaced by the matching core
///
/// `AlreadyDecidedConflict` and `LocationUnset` are absorbed by the session
/// and never reach the current-error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Request rejected: {message}")]
    RemoteRejected { status: Option<u16>, message: String },

    #[error("Candidate was already decided")]
    AlreadyDecidedConflict,

    #[error("No location stored on profile")]
    LocationUnset,

    #[error("Location lookup failed: {0}")]
    GeocodingFailure(String),
}

impl MatchingError {
    /// Kinds that drive normal-path UI instead of an error banner
    pub fn is_absorbed(&self) -> bool {
        matches!(self, MatchingError::AlreadyDecidedConflict | MatchingError::LocationUnset)
    }
}

impl From<ApiError> for MatchingError {
    fn from(error: ApiError) -> Self {
        if error.is_already_decided() {
            return MatchingError::AlreadyDecidedConflict;
        }

        match error {
            ApiError::RequestError(e) => MatchingError::NetworkUnavailable(e.to_string()),
            ApiError::Timeout => MatchingError::NetworkUnavailable("request timed out".to_string()),
            ApiError::Rejected { status, message, .. } => MatchingError::RemoteRejected {
                status: Some(status),
                message,
            },
            ApiError::InvalidRequest(message) | ApiError::InvalidResponse(message) => {
                MatchingError::RemoteRejected { status: None, message }
            }
        }
    }
}

impl From<GeocodingError> for MatchingError {
    fn from(error: GeocodingError) -> Self {
        MatchingError::GeocodingFailure(error.to_string())
    }
}

/// The single current-error value of a matching session
///
/// Each new failure overwrites the previous one; only the consumer clears it.
#[derive(Debug, Default, Clone)]
pub struct ErrorSlot {
    current: Option<MatchingError>,
}

impl ErrorSlot {
    pub fn set(&mut self, error: MatchingError) {
        if error.is_absorbed() {
            tracing::debug!("Not surfacing absorbed error: {}", error);
            return;
        }
        tracing::debug!("Current error set: {}", error);
        self.current = Some(error);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&MatchingError> {
        self.current.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }
}

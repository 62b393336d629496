//! Error types for a settled request.
//!
//! # Design
//! Transport-originated failures share one record, `TransportError`, with a
//! `kind` to tell them apart. Only `HttpStatus` failures carry the response.
//! Cancellation is not a transport failure: the caller's `Cancel` reason is
//! handed back as-is in `RequestError::Cancelled`.

use thiserror::Error;

use crate::cancel::Cancel;
use crate::config::RequestDescriptor;
use crate::response::{ResponseRecord, TransportInfo};

/// Code attached to timeout failures.
pub const ECONNABORTED: &str = "ECONNABORTED";

pub(crate) const NETWORK_ERROR: &str = "Network Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The exchange completed with a status outside the success set.
    HttpStatus,
    /// Failure below HTTP; no status is available.
    Network,
    /// The configured timeout elapsed first.
    Timeout,
}

/// A classified transport failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
    pub config: RequestDescriptor,
    pub code: Option<&'static str>,
    pub request: TransportInfo,
    pub response: Option<ResponseRecord>,
}

/// Why a request did not resolve with a response.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(Box<TransportError>),

    #[error(transparent)]
    Cancelled(Cancel),
}

impl RequestError {
    pub fn is_cancel(&self) -> bool {
        matches!(self, RequestError::Cancelled(_))
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RequestError::Transport(err) => Some(err.kind),
            RequestError::Cancelled(_) => None,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            RequestError::Transport(err) => err.code,
            RequestError::Cancelled(_) => None,
        }
    }

    pub fn response(&self) -> Option<&ResponseRecord> {
        match self {
            RequestError::Transport(err) => err.response.as_ref(),
            RequestError::Cancelled(_) => None,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        RequestError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ReadyState;
    use uuid::Uuid;

    fn timeout_error() -> TransportError {
        TransportError {
            kind: ErrorKind::Timeout,
            message: "Timeout of 500 ms exceeded".to_string(),
            config: RequestDescriptor::new("/slow").timeout(500),
            code: Some(ECONNABORTED),
            request: TransportInfo {
                id: Uuid::nil(),
                method: "GET".to_string(),
                url: "/slow".to_string(),
                ready_state: ReadyState::Opened,
                status: 0,
            },
            response: None,
        }
    }

    #[test]
    fn transport_error_displays_message() {
        let err = RequestError::from(timeout_error());
        assert_eq!(err.to_string(), "Timeout of 500 ms exceeded");
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));
        assert_eq!(err.code(), Some(ECONNABORTED));
        assert!(err.response().is_none());
        assert!(!err.is_cancel());
    }

    #[test]
    fn cancel_is_passed_through() {
        let err = RequestError::Cancelled(Cancel::new("stop"));
        assert!(err.is_cancel());
        assert_eq!(err.to_string(), "stop");
        assert_eq!(err.kind(), None);
        assert_eq!(err.code(), None);
    }
}

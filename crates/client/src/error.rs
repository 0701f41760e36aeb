//! Error taxonomy for backend calls.
//!
//! Every failed request lands in exactly one [`ErrorKind`]:
//! transport (`Network`, `Timeout`), server rejection (`Duplicate`,
//! `NotFound`, `Rejected`), or a 2xx whose body could not be decoded
//! (`Malformed`). Validation happens before a request is built and is
//! not represented here.

use std::time::Duration;

/// Maximum number of body characters kept in an error for debugging.
const MAX_BODY_SNIPPET: usize = 300;

/// Body fragments that identify a duplicate-link rejection.
const DUPLICATE_MARKERS: &[&str] = &["already saved", "already exists", "duplicate"];

/// Body fragments that identify a missing-resource rejection.
const NOT_FOUND_MARKERS: &[&str] = &["not found"];

/// Why the server rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The resource already exists (e.g. the trip is already saved).
    Duplicate,
    /// The addressed resource does not exist.
    NotFound,
    /// Any other non-2xx response.
    Other,
}

impl Rejection {
    /// Classify a non-2xx response from its status code and body.
    ///
    /// The backend reports some conflicts as `400` with a plain-text
    /// message, so the body is consulted when the status alone is not
    /// conclusive.
    pub fn classify(status: u16, body: &str) -> Self {
        match status {
            409 => return Rejection::Duplicate,
            404 => return Rejection::NotFound,
            _ => {}
        }
        let lower = body.to_ascii_lowercase();
        if DUPLICATE_MARKERS.iter().any(|m| lower.contains(m)) {
            Rejection::Duplicate
        } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
            Rejection::NotFound
        } else {
            Rejection::Other
        }
    }
}

/// Coarse category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Duplicate,
    NotFound,
    Rejected,
    Malformed,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The request did not complete within the configured bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated) for debugging.
        body: String,
        /// Classification of the rejection.
        rejection: Rejection,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Convenience alias for backend call results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build a [`ApiError::Rejected`] from a status code and raw body.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        let body = snippet(&body.into());
        let rejection = Rejection::classify(status, &body);
        ApiError::Rejected {
            status,
            body,
            rejection,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Request(_) => ErrorKind::Network,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::Rejected { rejection, .. } => match rejection {
                Rejection::Duplicate => ErrorKind::Duplicate,
                Rejection::NotFound => ErrorKind::NotFound,
                Rejection::Other => ErrorKind::Rejected,
            },
            ApiError::Malformed(_) => ErrorKind::Malformed,
        }
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind() == ErrorKind::Duplicate
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether the request may have failed before reaching the server.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Timeout)
    }
}

/// Truncate a body to [`MAX_BODY_SNIPPET`] characters.
pub(crate) fn snippet(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_SNIPPET {
        body.to_string()
    } else {
        let mut s: String = body.chars().take(MAX_BODY_SNIPPET).collect();
        s.push('…');
        s
    }
}

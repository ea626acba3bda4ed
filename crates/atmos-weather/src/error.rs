//! Error types for remote calls and local persistence.

use thiserror::Error;

/// Stable error codes surfaced to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Network,
    RateLimit,
    Server,
    Geolocation,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::Server => "SERVER_ERROR",
            Self::Geolocation => "GEOLOCATION_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geolocation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Errors from the remote weather/geocoding collaborator.
///
/// These are the only errors propagated to callers; persistence never fails loudly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("Server error: HTTP {status}")]
    Server { status: u16 },

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::Network,
            Self::RateLimited { .. } => ErrorCode::RateLimit,
            Self::Server { .. } => ErrorCode::Server,
            Self::Geolocation(_) => ErrorCode::Geolocation,
            Self::Unknown(_) => ErrorCode::Unknown,
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Unable to connect. Please check your internet connection.",
            Self::RateLimited { .. } => "Too many requests. Please wait a moment and try again.",
            Self::Server { .. } => {
                "Weather service is temporarily unavailable. Please try again later."
            }
            Self::Geolocation(_) => "Unable to detect your location. Please search for a city.",
            Self::Unknown(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, retry_after: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            500..=599 => Self::Server { status },
            _ => Self::Unknown(format!("HTTP {}", status)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Network(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), None)
        } else if e.is_decode() {
            Self::Unknown(format!("Invalid response: {}", e))
        } else if e.is_request() {
            Self::Network(e.to_string())
        } else {
            Self::Unknown(e.to_string())
        }
    }
}

/// Errors raised by `Store` backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

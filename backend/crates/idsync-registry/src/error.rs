use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors from registry calls made with a token
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("HTTP request error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry returned {status}: {message} {location}")]
    Status {
        status: u16,
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON parse error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    #[track_caller]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        RegistryError::Http {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn from_json(err: serde_json::Error) -> Self {
        RegistryError::Json {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        RegistryError::Status {
            status,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        RegistryError::from_reqwest(err)
    }
}

impl From<serde_json::Error> for RegistryError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        RegistryError::from_json(err)
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Why an authentication attempt was refused.
///
/// Callers show different messages for the two cases, so transport problems
/// must never be reported as bad credentials.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("registry unavailable")]
    ServiceUnavailable,
}

impl AuthFailure {
    /// Stable key for user-facing messages.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "registry.auth.invalid.credentials",
            Self::ServiceUnavailable => "registry.auth.service.unavailable",
        }
    }
}

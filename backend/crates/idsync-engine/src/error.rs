use idsync_core::CoreError;
use idsync_registry::{AuthFailure, RegistryError};
use idsync_store::StoreError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {source} {location}")]
    Store {
        #[source]
        source: StoreError,
        location: ErrorLocation,
    },

    #[error("No free alias for {attribute} after {attempts} attempts {location}")]
    AliasSpaceExhausted {
        attribute: String,
        attempts: u32,
        location: ErrorLocation,
    },
}

impl SyncError {
    #[track_caller]
    pub fn alias_space_exhausted(attribute: impl Into<String>, attempts: u32) -> Self {
        Self::AliasSpaceExhausted {
            attribute: attribute.into(),
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store { source, .. } if source.is_conflict())
    }
}

impl From<StoreError> for SyncError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::Store {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Reasons a login is refused. Sync failures are not among them.
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Identifier and secret are required {location}")]
    MissingCredentials { location: ErrorLocation },

    #[error("Invalid credentials {location}")]
    InvalidCredentials { location: ErrorLocation },

    #[error("Registry unavailable: {message} {location}")]
    ServiceUnavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Profile unavailable: {source} {location}")]
    ProfileFetch {
        #[source]
        source: RegistryError,
        location: ErrorLocation,
    },

    #[error("Profile unreadable: {source} {location}")]
    ProfileParse {
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },

    #[error("Store error: {source} {location}")]
    Store {
        #[source]
        source: SyncError,
        location: ErrorLocation,
    },
}

impl LoginError {
    #[track_caller]
    pub fn missing_credentials() -> Self {
        Self::MissingCredentials {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Stable key for user-facing messages.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::MissingCredentials { .. } => "registry.auth.missing.credentials",
            Self::InvalidCredentials { .. } => AuthFailure::InvalidCredentials.message_key(),
            Self::ServiceUnavailable { .. } => AuthFailure::ServiceUnavailable.message_key(),
            Self::ProfileFetch { .. } | Self::ProfileParse { .. } => {
                "registry.auth.profile.unavailable"
            }
            Self::Store { .. } => "registry.auth.store.unavailable",
        }
    }
}

impl From<AuthFailure> for LoginError {
    #[track_caller]
    fn from(failure: AuthFailure) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match failure {
            AuthFailure::InvalidCredentials => Self::InvalidCredentials { location },
            AuthFailure::ServiceUnavailable => Self::ServiceUnavailable {
                message: failure.to_string(),
                location,
            },
        }
    }
}

impl From<RegistryError> for LoginError {
    #[track_caller]
    fn from(source: RegistryError) -> Self {
        Self::ProfileFetch {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for LoginError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        Self::ProfileParse {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SyncError> for LoginError {
    #[track_caller]
    fn from(source: SyncError) -> Self {
        Self::Store {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StoreError> for LoginError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::from(SyncError::from(source))
    }
}

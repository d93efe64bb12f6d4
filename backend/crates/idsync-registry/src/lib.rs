//! Client for the upstream member registry.
//!
//! [`RegistryApi`] is the seam the sync engine depends on; [`RegistryClient`] is
//! the HTTP implementation.

pub(crate) mod client;
pub(crate) mod error;
pub(crate) mod error_response;
pub(crate) mod registry_api;

#[cfg(test)]
mod tests;

pub use client::RegistryClient;
pub use error::{AuthFailure, RegistryError, Result};
pub use error_response::ErrorResponse;
pub use registry_api::RegistryApi;

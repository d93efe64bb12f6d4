use crate::{AuthFailure, ErrorResponse, RegistryApi, RegistryError, Result};

use idsync_config::RegistryConfig;
use idsync_core::AuthResponse;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client as ReqwestClient, Method, StatusCode, header};
use serde::Serialize;

const AUTHENTICATE_PATH: &str = "/api/authenticate";
const PROFILE_PATH: &str = "/api/get/profile";
const ROLES_PATH: &str = "/api/get/user_roles";
const PROFILE_IMAGE_PATH: &str = "/api/get/profile_image";

/// HTTP client for the member registry REST API
pub struct RegistryClient {
    pub base_url: String,
    client: ReqwestClient,
}

impl RegistryClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Registry URL (e.g., "https://registry.example.org")
    /// * `timeout` - Applied to every request, connect and read included
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .header(header::ACCEPT, "application/json")
    }

    fn authorized(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.request(Method::GET, path).bearer_auth(token)
    }

    /// Execute a token-authenticated GET and return the body text.
    ///
    /// `Ok(None)` on 404.
    async fn fetch_text(&self, path: &str, token: &str) -> Result<Option<String>> {
        let response = self.authorized(path, token).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Registry has no document at {path}");
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = ErrorResponse::summarize(&body);
            warn!("Registry fetch {path} failed. Status: {status}, Error: {message}");
            return Err(RegistryError::status(status.as_u16(), message));
        }

        Ok(Some(body))
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> std::result::Result<AuthResponse, AuthFailure> {
        #[derive(Serialize)]
        struct AuthenticateRequest<'a> {
            username: &'a str,
            password: &'a str,
        }

        let body = AuthenticateRequest {
            username: identifier,
            password: secret,
        };

        let response = match self
            .request(Method::POST, AUTHENTICATE_PATH)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to reach registry for authentication: {e}");
                return Err(AuthFailure::ServiceUnavailable);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read registry authentication response: {e}");
                return Err(AuthFailure::ServiceUnavailable);
            }
        };

        if !status.is_success() {
            let message = ErrorResponse::summarize(&text);
            return match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    debug!("Registry rejected credentials. Status: {status}, Error: {message}");
                    Err(AuthFailure::InvalidCredentials)
                }
                _ => {
                    warn!("Registry authentication failed. Status: {status}, Error: {message}");
                    Err(AuthFailure::ServiceUnavailable)
                }
            };
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!("Malformed registry authentication response: {e}");
            AuthFailure::ServiceUnavailable
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<String> {
        self.fetch_text(PROFILE_PATH, token)
            .await?
            .ok_or_else(|| RegistryError::status(StatusCode::NOT_FOUND.as_u16(), "No profile"))
    }

    async fn fetch_roles(&self, token: &str) -> Result<Option<String>> {
        self.fetch_text(ROLES_PATH, token).await
    }

    async fn fetch_image(&self, token: &str) -> Result<Option<Vec<u8>>> {
        let response = self.authorized(PROFILE_IMAGE_PATH, token).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("No profile image found for member");
            return Ok(None);
        }
        if !status.is_success() {
            warn!("Registry profile image fetch failed. Status: {status}");
            return Err(RegistryError::status(status.as_u16(), "Profile image fetch failed"));
        }

        let bytes = response.bytes().await?;
        Ok((!bytes.is_empty()).then(|| bytes.to_vec()))
    }
}

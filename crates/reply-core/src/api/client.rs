//! API client for communicating with the Reply.sh REST API.
//!
//! This module provides the `ApiClient` struct. Every method performs exactly
//! one HTTP round trip: no retries, no backoff. Non-success responses become
//! an `ApiError` carrying the backend's `{"error": ...}` message or a fixed
//! per-operation fallback.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{AuthResult, Credential, Message, User, Website};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const OAUTH_FAILED: &str = "Authentication failed";
const LOGIN_FAILED: &str = "Login failed";
const OTP_REQUEST_FAILED: &str = "Failed to send OTP";
const OTP_VERIFY_FAILED: &str = "OTP verification failed";
const GET_USER_FAILED: &str = "Failed to get user info";
const LIST_WEBSITES_FAILED: &str = "Failed to get websites";
const ADD_WEBSITE_FAILED: &str = "Failed to add website";
const DELETE_WEBSITE_FAILED: &str = "Failed to delete website";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OAuthExchangeRequest<'a> {
    code: &'a str,
    #[serde(rename = "redirectUri")]
    redirect_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordLoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpVerifyRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateWebsiteRequest<'a> {
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct WebsitesResponse {
    websites: Vec<Website>,
}

#[derive(Debug, Deserialize)]
struct WebsiteResponse {
    website: Website,
}

/// API client for the Reply.sh backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the backend named in `config`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_url)
    }

    /// Create a client for an explicit backend base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot be used as a base: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&Credential>) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(method = %method, path = url.path(), "Sending request");
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error built from the body if not.
    async fn check_response(response: Response, fallback: &str) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            path = %path,
            body = %ApiError::truncate_body(&body),
            "API request failed"
        );
        Err(ApiError::from_status(status, &body, fallback))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let path = response.url().path().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} ({})", e, path)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = Self::check_response(response, fallback).await?;
        Self::parse(response).await
    }

    // ===== Authentication =====

    /// Exchange a Google OAuth authorization code for a session.
    /// `redirect_uri` must match the one used to obtain the code.
    pub async fn exchange_oauth_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AuthResult, ApiError> {
        let body = OAuthExchangeRequest { code, redirect_uri };
        let builder = self.request(Method::POST, &["auth", "google"], None).json(&body);
        self.send(builder, OAUTH_FAILED).await
    }

    /// Authenticate with email and password
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, ApiError> {
        let body = PasswordLoginRequest { email, password };
        let builder = self.request(Method::POST, &["auth", "login"], None).json(&body);
        self.send(builder, LOGIN_FAILED).await
    }

    /// Ask the backend to email a one-time code
    pub async fn request_one_time_code(&self, email: &str) -> Result<Message, ApiError> {
        let body = OtpRequest { email };
        let builder = self
            .request(Method::POST, &["auth", "otp", "request"], None)
            .json(&body);
        self.send(builder, OTP_REQUEST_FAILED).await
    }

    /// Verify an emailed one-time code and authenticate
    pub async fn verify_one_time_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<AuthResult, ApiError> {
        let body = OtpVerifyRequest { email, otp: code };
        let builder = self
            .request(Method::POST, &["auth", "otp", "verify"], None)
            .json(&body);
        self.send(builder, OTP_VERIFY_FAILED).await
    }

    /// Fetch the user the credential belongs to.
    /// An expired or revoked credential yields `ApiError::Unauthorized`.
    pub async fn fetch_current_user(&self, token: &Credential) -> Result<User, ApiError> {
        let builder = self.request(Method::GET, &["auth", "me"], Some(token));
        let response: UserResponse = self.send(builder, GET_USER_FAILED).await?;
        Ok(response.user)
    }

    // ===== Websites =====

    /// List the websites owned by the authenticated user, in backend order
    pub async fn list_websites(&self, token: &Credential) -> Result<Vec<Website>, ApiError> {
        let builder = self.request(Method::GET, &["websites"], Some(token));
        let response: WebsitesResponse = self.send(builder, LIST_WEBSITES_FAILED).await?;
        debug!(count = response.websites.len(), "Fetched websites");
        Ok(response.websites)
    }

    /// Register a new website domain
    pub async fn create_website(
        &self,
        token: &Credential,
        domain: &str,
    ) -> Result<Website, ApiError> {
        let body = CreateWebsiteRequest { domain };
        let builder = self
            .request(Method::POST, &["websites"], Some(token))
            .json(&body);
        let response: WebsiteResponse = self.send(builder, ADD_WEBSITE_FAILED).await?;
        Ok(response.website)
    }

    /// Delete a website. The success body is ignored.
    pub async fn delete_website(&self, token: &Credential, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &["websites", id], Some(token));
        let response = builder.send().await?;
        Self::check_response(response, DELETE_WEBSITE_FAILED).await?;
        Ok(())
    }
}

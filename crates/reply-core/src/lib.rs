//! Core library for the Reply.sh client.
//!
//! - `auth`: the session credential store and its backends
//! - `api`: typed client for the Reply.sh backend
//! - `views`: login, OAuth callback and dashboard flow state
//! - `oauth`: Google authorization URL and redirect handling
//! - `snippet`: chat widget embed code

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod oauth;
pub mod snippet;
pub mod utils;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use auth::SessionStore;
pub use config::Config;
pub use models::{AuthResult, Credential, User, Website};

//! REST API client module for the Reply.sh backend.
//!
//! This module provides the `ApiClient` for authenticating (Google OAuth,
//! email/password, emailed one-time code), looking up the current user and
//! managing the websites a user has registered.
//!
//! Authenticated endpoints take a bearer `Credential` obtained from one of
//! the login entry points.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

//! Data models for Reply.sh entities.
//!
//! This module contains the records exchanged with the backend:
//!
//! - `User`: account snapshot returned by authentication and `/auth/me`
//! - `Website`: a registered domain used for chatbot embedding
//! - `Credential`, `AuthResult`: bearer token and the user it authenticates

pub mod auth;
pub mod user;
pub mod website;

pub use auth::{AuthResult, Credential, Message};
pub use user::User;
pub use website::Website;

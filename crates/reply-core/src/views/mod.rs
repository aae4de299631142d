//! Flow state for the login, OAuth callback and dashboard screens.
//!
//! Each view is a small state enum moved only by API outcomes. Views hold a
//! cheap clone of the `ApiClient` and the `SessionStore` they were given, and
//! are the only place a credential gets written after login or cleared after
//! the backend rejects it.

pub mod callback;
pub mod dashboard;
pub mod login;

pub use callback::{CallbackState, CallbackView};
pub use dashboard::{DashboardError, DashboardState, DashboardView};
pub use login::{LoginMode, LoginStatus, LoginView};

//! Session credential storage.
//!
//! This module provides:
//! - `SessionStore`: the single credential slot every authenticated call reads
//! - `CredentialBackend`: where that slot is persisted
//! - `KeyringBackend`, `FileBackend`, `MemoryBackend`: the available backends
//!
//! The store never fails: a backend error is logged and treated as "no
//! credential". Presence of a token is all `is_authenticated` checks; the
//! backend decides whether it is still valid.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringBackend;
pub use session::{FileBackend, SessionData};
pub use store::{CredentialBackend, MemoryBackend, SessionStore};

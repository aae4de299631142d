use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::SessionStore;
use crate::models::User;
use crate::oauth::CallbackParams;

const CANCELLED: &str = "Authentication was cancelled or failed";
const NO_CODE: &str = "No authorization code received";
const EXCHANGE_FAILED: &str = "Failed to complete authentication";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackState {
    Pending,
    Authenticated(User),
    Failed(String),
}

/// Completes a Google sign-in from the redirect parameters.
pub struct CallbackView {
    api: ApiClient,
    store: SessionStore,
    redirect_uri: String,
    state: CallbackState,
}

impl CallbackView {
    pub fn new(api: ApiClient, store: SessionStore, redirect_uri: impl Into<String>) -> Self {
        Self {
            api,
            store,
            redirect_uri: redirect_uri.into(),
            state: CallbackState::Pending,
        }
    }

    pub fn state(&self) -> &CallbackState {
        &self.state
    }

    /// Exchange the redirect's code and store the resulting credential
    pub async fn complete(&mut self, params: &CallbackParams) -> &CallbackState {
        self.state = if let Some(ref error) = params.error {
            warn!(error = %error, "OAuth provider returned an error");
            CallbackState::Failed(CANCELLED.to_string())
        } else if let Some(ref code) = params.code {
            match self.api.exchange_oauth_code(code, &self.redirect_uri).await {
                Ok(result) => {
                    self.store.set_credential(&result.token);
                    info!(user = %result.user.email, "Signed in with Google");
                    CallbackState::Authenticated(result.user)
                }
                Err(e) => {
                    warn!(error = %e, "OAuth code exchange failed");
                    CallbackState::Failed(EXCHANGE_FAILED.to_string())
                }
            }
        } else {
            CallbackState::Failed(NO_CODE.to_string())
        };
        &self.state
    }
}

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionStore;
use crate::models::{Credential, User, Website};
use crate::snippet::embed_snippet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardState {
    Loading,
    Ready { user: User, websites: Vec<Website> },
    /// Data could not be loaded but the credential was kept
    Failed(String),
    LoggedOut,
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Domain is required")]
    EmptyDomain,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The signed-in user's websites.
pub struct DashboardView {
    api: ApiClient,
    store: SessionStore,
    state: DashboardState,
}

impl DashboardView {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        Self {
            api,
            store,
            state: DashboardState::Loading,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match self.state {
            DashboardState::Ready { ref user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn websites(&self) -> &[Website] {
        match self.state {
            DashboardState::Ready { ref websites, .. } => websites.as_slice(),
            _ => &[],
        }
    }

    /// Embed snippet for one of the loaded websites
    pub fn snippet(&self, website_id: &str) -> Option<String> {
        self.websites()
            .iter()
            .find(|w| w.id == website_id)
            .map(|w| embed_snippet(&w.id))
    }

    /// Fetch the user and their websites together.
    /// A rejected credential is cleared; other failures keep it and end in `Failed`.
    pub async fn load(&mut self) -> &DashboardState {
        let Some(token) = self.store.get_credential() else {
            self.state = DashboardState::LoggedOut;
            return &self.state;
        };

        self.state = DashboardState::Loading;
        let (user, websites) = futures::future::join(
            self.api.fetch_current_user(&token),
            self.api.list_websites(&token),
        )
        .await;

        self.state = match (user, websites) {
            (Ok(user), Ok(websites)) => {
                info!(count = websites.len(), "Dashboard loaded");
                DashboardState::Ready { user, websites }
            }
            (Err(e), _) | (_, Err(e)) if e.is_unauthorized() => {
                warn!(error = %e, "Credential rejected while loading dashboard, signing out");
                self.store.clear_credential();
                DashboardState::LoggedOut
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to load dashboard");
                DashboardState::Failed(e.to_string())
            }
        };
        &self.state
    }

    /// Register `domain` and put it at the top of the list
    pub async fn add_website(&mut self, domain: &str) -> Result<&Website, DashboardError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(DashboardError::EmptyDomain);
        }
        let token = self.token()?;

        let result = self.api.create_website(&token, domain).await;
        let website = result.map_err(|e| self.on_api_error(e))?;
        info!(domain = %website.domain, "Website added");

        match self.state {
            DashboardState::Ready { ref mut websites, .. } => {
                websites.insert(0, website);
                Ok(&websites[0])
            }
            _ => Err(DashboardError::NotSignedIn),
        }
    }

    pub async fn delete_website(&mut self, id: &str) -> Result<(), DashboardError> {
        let token = self.token()?;
        let result = self.api.delete_website(&token, id).await;
        result.map_err(|e| self.on_api_error(e))?;
        info!(id = %id, "Website deleted");

        if let DashboardState::Ready { ref mut websites, .. } = self.state {
            websites.retain(|w| w.id != id);
        }
        Ok(())
    }

    pub fn logout(&mut self) {
        self.store.clear_credential();
        self.state = DashboardState::LoggedOut;
    }

    fn token(&self) -> Result<Credential, DashboardError> {
        if !matches!(self.state, DashboardState::Ready { .. }) {
            return Err(DashboardError::NotSignedIn);
        }
        self.store.get_credential().ok_or(DashboardError::NotSignedIn)
    }

    /// A rejected credential forces logout; anything else is reported inline
    fn on_api_error(&mut self, err: ApiError) -> DashboardError {
        if err.is_unauthorized() {
            warn!(error = %err, "Credential rejected, signing out");
            self.logout();
            DashboardError::SessionExpired
        } else {
            DashboardError::Api(err)
        }
    }
}

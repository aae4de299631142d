use serde::{Deserialize, Serialize};

use crate::utils::format_date;

/// A domain registered for chatbot embedding.
///
/// Timestamps are kept as the backend sends them; use `created_date()`
/// for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub user_id: String,
    pub domain: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Website {
    pub fn created_date(&self) -> String {
        format_date(&self.created_at)
    }
}

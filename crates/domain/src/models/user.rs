//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked user. Created on the first location write for an unseen username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Short handle, also used as the owner prefix of invoice identifiers
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

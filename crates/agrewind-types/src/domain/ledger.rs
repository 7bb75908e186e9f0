use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted marker that a change has been reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRecord {
    pub change_id: String,
    pub reverted_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for `POST /api/results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub text_ref: String,
    pub wpm: f64,
    pub accuracy: f64,
}

/// A stored typing result. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub user_id: String,
    pub text_ref: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub created_at: DateTime<Utc>,
}

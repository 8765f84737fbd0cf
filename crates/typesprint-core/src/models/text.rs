use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A passage of source text to be typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Text {
    /// Number of whitespace-separated words in the passage.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

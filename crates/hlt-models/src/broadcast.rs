//! Broadcast descriptors supplied by the listing collaborator.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A recorded broadcast that may be turned into highlights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Broadcast {
    /// Opaque recording id.
    pub id: String,

    /// Broadcast title.
    #[serde(default)]
    pub title: String,

    /// Publication time.
    pub published_at: DateTime<Utc>,

    /// Local path of the recording, when it differs from the default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Broadcast {
    /// Calendar day the broadcast was published on (UTC).
    pub fn day(&self) -> NaiveDate {
        self.published_at.date_naive()
    }

    /// Publication day as `dd.mm.yyyy`.
    pub fn formatted_date(&self) -> String {
        self.published_at.format("%d.%m.%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_date() {
        let broadcast: Broadcast = serde_json::from_str(
            r#"{"id": "v1", "title": "Late night", "published_at": "2024-03-07T23:10:00Z"}"#,
        )
        .unwrap();

        assert_eq!(broadcast.formatted_date(), "07.03.2024");
        assert_eq!(broadcast.day(), NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert!(broadcast.path.is_none());
    }
}

//! Upload metadata for one output video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Video visibility on the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl std::str::FromStr for PrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown privacy status: {}", other)),
        }
    }
}

/// Metadata record written next to the final clip, consumed by the uploader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub title: String,

    /// Header, chapter lines and footer separated by newlines.
    pub description: String,

    /// Insertion-ordered, de-duplicated tags.
    pub tags: Vec<String>,

    pub privacy_status: PrivacyStatus,

    pub embeddable: bool,

    /// Platform category id, string-encoded.
    pub category_id: String,

    /// Channel playlist first, then one per distinct known label.
    pub playlist_ids: Vec<String>,

    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let metadata = BatchMetadata {
            title: "t".into(),
            description: "d".into(),
            tags: vec!["highlights".into()],
            privacy_status: PrivacyStatus::Unlisted,
            embeddable: true,
            category_id: "20".into(),
            playlist_ids: vec!["PL1".into()],
            language: "en".into(),
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["privacyStatus"], "unlisted");
        assert_eq!(json["categoryId"], "20");
        assert_eq!(json["playlistIds"][0], "PL1");
        assert_eq!(json["embeddable"], true);
        assert_eq!(json["language"], "en");
    }

    #[test]
    fn test_privacy_from_str() {
        assert_eq!("Public".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Public);
        assert_eq!(" private".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Private);
        assert!("secret".parse::<PrivacyStatus>().is_err());
    }
}

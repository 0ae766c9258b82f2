//! Chapter markers of an assembled highlight video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::format_clock;

/// A labeled offset in the final video marking a change of topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    /// Offset into the final video, in seconds.
    pub offset: f64,
    /// Topic label (never empty).
    pub label: String,
}

impl Chapter {
    pub fn new(offset: f64, label: impl Into<String>) -> Self {
        Self {
            offset,
            label: label.into(),
        }
    }

    /// Description line, e.g. `"03:07 - BossFight"`.
    pub fn description_line(&self) -> String {
        format!("{} - {}", format_clock(self.offset), self.label)
    }
}

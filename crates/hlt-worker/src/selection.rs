//! Batch selection.
//!
//! A batch is the oldest unprocessed broadcast plus every other unprocessed
//! broadcast published on the same UTC day.

use std::path::Path;

use chrono::NaiveDate;

use hlt_models::Broadcast;

use crate::error::WorkerResult;
use crate::ledger::ProcessedLedger;

/// Broadcasts rendered into one output video.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    broadcasts: Vec<Broadcast>,
}

impl Batch {
    /// The broadcast the batch is named after.
    pub fn primary(&self) -> &Broadcast {
        &self.broadcasts[0]
    }

    pub fn broadcasts(&self) -> &[Broadcast] {
        &self.broadcasts
    }

    pub fn day(&self) -> NaiveDate {
        self.primary().day()
    }

    /// Batch date as `dd.mm.yyyy`; also used as the batch id in logs.
    pub fn formatted_date(&self) -> String {
        self.primary().formatted_date()
    }

    pub fn ids(&self) -> Vec<String> {
        self.broadcasts.iter().map(|b| b.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.broadcasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.broadcasts.is_empty()
    }
}

/// Pick the next batch, or `None` when everything is processed.
///
/// Ties on publication time keep manifest order.
pub fn select_batch(candidates: &[Broadcast], ledger: &ProcessedLedger) -> Option<Batch> {
    let mut pending: Vec<&Broadcast> = candidates
        .iter()
        .filter(|b| !ledger.is_processed(&b.id))
        .collect();
    pending.sort_by_key(|b| b.published_at);

    let day = pending.first()?.day();
    let mut broadcasts: Vec<Broadcast> = Vec::new();
    for broadcast in pending.into_iter().filter(|b| b.day() == day) {
        if !broadcasts.iter().any(|b| b.id == broadcast.id) {
            broadcasts.push(broadcast.clone());
        }
    }

    Some(Batch { broadcasts })
}

/// Read candidate broadcasts from a JSON array.
pub async fn load_manifest(path: impl AsRef<Path>) -> WorkerResult<Vec<Broadcast>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

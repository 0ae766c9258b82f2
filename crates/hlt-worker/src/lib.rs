//! Highlight batch worker.
//!
//! This crate provides:
//! - Environment configuration
//! - Processed-broadcast ledger and batch selection
//! - Recording acquisition with bounded re-fetching
//! - Metadata building, rendering and upload hand-off
//! - Structured batch logging

pub mod acquire;
pub mod config;
pub mod error;
pub mod external;
pub mod ledger;
pub mod logging;
pub mod metadata;
pub mod retry;
pub mod runner;
pub mod selection;
pub mod upload;

pub use config::{DetectorKind, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use ledger::ProcessedLedger;
pub use logging::BatchLogger;
pub use runner::{BatchOutcome, BatchRunner};
pub use selection::{load_manifest, select_batch, Batch};

//! Ingestion module
//!
//! Turns provider snapshots into time-bucketed price samples and keeps the
//! history within its retention window.

mod ingestor;
mod types;

pub use ingestor::{sample_from_snapshot, Ingestor};
pub use types::{IngestError, IngestSummary};

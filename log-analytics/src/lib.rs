pub mod analytics;
pub mod error;
pub mod ingest;
pub mod invariants;
pub mod logging;
pub mod models;
pub mod partition;
pub mod prometheus;
pub mod report;

pub use analytics::{AnalysisOptions, CountTable, LogAnalyticsPipeline};
pub use error::{Error, IngestError, MalformedReason, OptionsError, PartitionError, Result};
pub use ingest::{IngestStats, Ingested, MalformedPolicy};
pub use models::LogRecord;
pub use partition::{PartitionIndex, PartitionMode, PartitionPolicy};
pub use report::{AnalysisReport, OutputFormat, Section};

//! Configuration loading, ingestion orchestration, question answering and
//! answer evaluation.

pub mod bootstrap;
pub mod config;
pub mod eval;
pub mod ingest;
pub mod query;

pub use config::Config;
pub use eval::{EvalCase, EvalError, EvalOutcome, Evaluator};
pub use ingest::{IngestReport, Ingestor, Stage, StageFailure};
pub use query::{QueryError, QueryResponse, RagPipeline};

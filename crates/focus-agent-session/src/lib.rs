//! Session state and the periodic analysis worker.
//!
//! Provides:
//! - `SessionStore` - Holds the one active session
//! - `AnalysisWorker` - Background loop that analyzes and broadcasts

pub mod store;
pub mod worker;

pub use store::SessionStore;
pub use worker::{AnalysisWorker, TickOutcome, WorkerConfig, WorkerError, WorkerHandle};

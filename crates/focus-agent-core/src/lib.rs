//! Core abstractions for focus tracking.
//!
//! This crate provides the fundamental building blocks:
//! - `Session` / `AnalysisResult` / `FocusState` - Domain types
//! - `StatusUpdate` - Message pushed to live subscribers
//! - `BroadcastHub` - Fan-out to live subscribers with self-pruning
//! - `Analyzer` and `Subscriber` traits

pub mod hub;
pub mod message;
pub mod traits;
pub mod types;

pub use hub::{BroadcastHub, SubscriberId};
pub use message::StatusUpdate;
pub use traits::{Analyzer, AnalyzerError, Subscriber, SubscriberError};
pub use types::{AnalysisResult, FocusState, Session};

//! Vision-model analyzer.
//!
//! Provides:
//! - Screen capture through an external command
//! - JPEG thumbnail encoding
//! - OpenAI-compatible chat completions client
//! - `VisionAnalyzer` - the `Analyzer` implementation tying them together

pub mod analyzer;
pub mod capture;
pub mod client;
pub mod encode;
pub mod prompt;
pub mod response;

pub use analyzer::VisionAnalyzer;
pub use capture::{CaptureCommand, CaptureError};
pub use client::{ChatClient, ChatConfig, ClientError};
pub use response::ResponseError;

//! AI response pipeline for English Tutor.
//!
//! This module provides:
//! * [`ResponsePipeline`] — the orchestrator; one entry point per feature.
//! * [`TextGenerator`] / [`ApiBackend`] — async backend trait and its REST
//!   implementation.
//! * [`select_backend`] / [`BackendCandidate`] — prioritized best-effort
//!   backend selection.
//! * [`PromptBuilder`] — feature-specific JSON-schema prompts.
//! * [`ResponseParser`] — tiered recovery of structure from model output.
//! * [`FallbackSynthesizer`] — deterministic schema-valid synthesis.
//! * [`schema`] — request/response types and the `Provenance` tag.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use english_tutor::config::AppConfig;
//! use english_tutor::pipeline::{ResponsePipeline, schema::ChatRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap();
//!
//!     // Construct once; with no API key the pipeline still answers every
//!     // request via the deterministic synthesizer.
//!     let pipeline = ResponsePipeline::from_config(&config);
//!
//!     let request = ChatRequest::new("How do I order coffee?", vec![]).unwrap();
//!     let reply = pipeline.generate_chat_reply(&request).await;
//!     println!("{}", reply.response_text);
//! }
//! ```

pub mod backend;
pub mod fallback;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod schema;
pub mod selector;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backend::{ApiBackend, BackendError, TextGenerator};
pub use fallback::FallbackSynthesizer;
pub use orchestrator::ResponsePipeline;
pub use parser::ResponseParser;
pub use prompt::PromptBuilder;
pub use schema::Provenance;
pub use selector::{select_backend, BackendCandidate, CANDIDATES};

//! Configuration module for English Tutor.
//!
//! Provides `AppConfig` (top-level settings), the `ModelConfig` sub-config
//! for the generative backend, `AppPaths` for cross-platform data
//! directories, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ModelConfig, TutorConfig};

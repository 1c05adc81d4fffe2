//! English Tutor — AI response pipeline for English tutoring aimed at
//! Amharic-speaking learners.
//!
//! The crate's core is the [`pipeline`] module: it turns a tutoring request
//! (chat reply, grammar correction, pronunciation evaluation) into a
//! schema-valid structured result. A generative model backend is used when
//! one can be constructed from configuration; a deterministic synthesizer
//! covers every other case, so callers always receive a complete result and
//! never an error.
//!
//! Supporting modules:
//! * [`config`] — `AppConfig` with TOML persistence and platform paths.

pub mod config;
pub mod pipeline;

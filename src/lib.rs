#![deny(missing_docs)]

//! Core library for the Rusty Roster student registry.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Registry activity counters.
pub mod metrics;
/// Student records, validation, and the in-memory store.
pub mod roster;
/// Natural-language student summaries.
pub mod summarization;

//! Infrastructure layer module
//!
//! Cross-cutting concerns that sit outside the domain:
//! - Configuration management (figment, hierarchical merging)
//! - Logging infrastructure (tracing subscriber setup)
//!
//! Database adapters implementing the domain ports live in `adapters`.

pub mod config;
pub mod logging;

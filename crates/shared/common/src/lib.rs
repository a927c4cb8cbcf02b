//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling with gRPC status mapping
//! - Configuration structures and environment parsing
//! - Scoped deadlines

pub mod config;
pub mod deadline;
pub mod error;

pub use config::*;
pub use deadline::Deadline;
pub use error::{AppError, AppResult, OptionExt};

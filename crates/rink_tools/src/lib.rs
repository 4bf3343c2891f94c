//! # Rink Development Tools
//!
//! Command-line helpers for server operators:
//! - Rule config validation
//! - Feed recording replay and summaries

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod replay;
pub mod validate;

pub use error::{Result, ToolError};

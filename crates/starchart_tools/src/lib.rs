//! # Starchart Tools
//!
//! Command-line tools for operators:
//! - Configuration validation
//! - Tick dump ingestion into an archive
//! - Archive inspection and lookups
//! - Attack metrics between two planets

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod report;
pub mod validate;

pub use error::{Result, ToolError};

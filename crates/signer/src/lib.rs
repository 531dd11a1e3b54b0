//! External signing tool invocation for the emboss resigning service.
//!
//! This crate provides:
//! - Argument-vector construction for the zsign binary
//! - Async child-process execution with captured diagnostics
//! - Output confirmation after a successful exit
//! - The `--version` availability probe

pub mod error;
pub mod zsign;

pub use error::{SignerError, SignerResult};
pub use zsign::{SignJob, SignOutcome, ZsignTool};

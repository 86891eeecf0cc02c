//! # Join Sound Common Library
//!
//! Shared plumbing for the join-sound crates:
//! - Error and result types
//! - Configuration resolution (environment, TOML, compiled defaults)
//! - Logging bootstrap
//! - Database bootstrap and persisted row models

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

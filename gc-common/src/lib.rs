//! # Guesscasso Common Library
//!
//! Shared code for the Guesscasso services:
//! - Error and result types
//! - Bootstrap configuration (TOML file discovery, folder resolution)
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

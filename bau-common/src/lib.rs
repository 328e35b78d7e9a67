//! # Baustelle Common Library
//!
//! Shared code for the Baustelle services including:
//! - Error type shared across crates
//! - Bootstrap configuration (TOML, root folder resolution)
//! - Database initialization and row models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

//! Data models for the voice pipeline

pub mod command;
pub mod summary;

pub use command::*;
pub use summary::*;

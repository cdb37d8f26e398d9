//! # Nestegg Common Library
//!
//! Shared code for the Nestegg finance services including:
//! - Error and result types
//! - Configuration loading (TOML + environment + compiled defaults)
//! - Database initialization, finance record models and read-only queries
//! - Time and calendar helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use db::models::GroupId;
pub use error::{Error, Result};

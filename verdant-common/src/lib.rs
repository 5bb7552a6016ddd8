//! # Verdant Common Library
//!
//! Shared code for the Verdant plant-diagnosis service:
//! - Error type shared by the stores
//! - Configuration loading and root folder resolution
//! - SQLite pool initialization and schema
//! - Persisted record models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

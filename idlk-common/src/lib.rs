//! # idlk Common Library
//!
//! Shared code for the idlk identity services including:
//! - Contact data model
//! - Database bootstrap (pool, schema, migrations)
//! - Configuration loading
//! - Error type and timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};

//! Persisted storage abstraction.
//!
//! This module provides the `MovieStore` trait (movies, torrent
//! metadata, TTL'd key-value cache) with a SQLite implementation.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

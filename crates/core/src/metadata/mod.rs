//! External metadata abstraction.
//!
//! This module provides a `MetadataProvider` trait for canonical movie
//! metadata keyed by IMDB id, with a Cinemeta implementation.

mod cinemeta;
mod types;

pub use cinemeta::CinemetaClient;
pub use types::*;

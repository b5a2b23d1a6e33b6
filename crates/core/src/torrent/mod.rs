//! Torrent inspection abstraction.
//!
//! This module provides a `TorrentInspector` trait for turning magnet
//! URIs into structured torrent metadata, with an implementation built
//! on librqbit-core's magnet parsing.

mod magnet;
mod types;

pub use magnet::{MagnetInspector, NameTags};
pub use types::*;

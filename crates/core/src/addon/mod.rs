//! Stremio addon protocol surface.
//!
//! Wire types for the three resources this addon serves (catalog, meta,
//! stream) plus the manifest describing them. Everything here serializes
//! camelCase, and optional fields are omitted rather than sent as null:
//! Stremio clients treat a present-but-null field as a value.

mod manifest;
mod types;

pub use manifest::*;
pub use types::*;

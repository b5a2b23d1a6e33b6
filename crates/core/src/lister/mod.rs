//! Release listing abstraction.
//!
//! This module provides a `ReleaseLister` trait for discovering movie
//! releases on the source site (listing pages, search, detail scraping),
//! with a CineCalidad scraping implementation.

mod cinecalidad;
mod types;

pub use cinecalidad::CineCalidadLister;
pub use types::*;

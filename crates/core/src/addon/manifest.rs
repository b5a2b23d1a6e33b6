use serde::{Deserialize, Serialize};

/// Catalog id for the site's front-page listing.
pub const CATALOG_MOVIES: &str = "cinecalidad-movies";
/// Catalog id for search-driven listings.
pub const CATALOG_SEARCH: &str = "cinecalidad-search";

/// Addon manifest served at `/manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub catalogs: Vec<ManifestCatalog>,
    pub id_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub media_type: String,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ManifestExtra>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExtra {
    pub name: String,
    #[serde(default)]
    pub is_required: bool,
}

impl Manifest {
    /// The manifest this addon advertises: two movie catalogs, meta and
    /// stream resources, ids prefixed `tt` or `cc_`.
    pub fn addon() -> Self {
        Self {
            id: "org.cartelera.addon".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: "Cartelera".to_string(),
            description: "Movies from CineCalidad with torrent and direct streams".to_string(),
            resources: vec![
                "catalog".to_string(),
                "meta".to_string(),
                "stream".to_string(),
            ],
            types: vec!["movie".to_string()],
            catalogs: vec![
                ManifestCatalog {
                    media_type: "movie".to_string(),
                    id: CATALOG_MOVIES.to_string(),
                    name: "CineCalidad".to_string(),
                    extra: vec![ManifestExtra {
                        name: "skip".to_string(),
                        is_required: false,
                    }],
                },
                ManifestCatalog {
                    media_type: "movie".to_string(),
                    id: CATALOG_SEARCH.to_string(),
                    name: "CineCalidad Search".to_string(),
                    extra: vec![ManifestExtra {
                        name: "search".to_string(),
                        is_required: true,
                    }],
                },
            ],
            id_prefixes: vec!["tt".to_string(), "cc_".to_string()],
        }
    }
}

//! Stremio addon resource handlers.
//!
//! Every handler returns a well-formed protocol body regardless of what
//! failed internally: `{"meta": null}`, `{"streams": []}`, or
//! `{"metas": []}`. Callers cannot distinguish "not found" from "every
//! source failed", and don't need to.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use cartelera_core::{
    CatalogExtra, CatalogResponse, Manifest, MetaResponse, StreamsResponse,
};

use crate::state::AppState;

/// GET /manifest.json
pub async fn manifest() -> Json<Manifest> {
    Json(Manifest::addon())
}

/// GET /catalog/{type}/{id}.json
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<CatalogResponse> {
    catalog_response(&state, &media_type, &id, CatalogExtra::default()).await
}

/// GET /catalog/{type}/{id}/{extra}.json
///
/// The extra segment is URL-encoded `search=...&skip=...` props.
pub async fn catalog_with_extra(
    State(state): State<Arc<AppState>>,
    Path((media_type, id, extra)): Path<(String, String, String)>,
) -> Json<CatalogResponse> {
    let extra = CatalogExtra::parse(strip_json_suffix(&extra));
    catalog_response(&state, &media_type, &id, extra).await
}

async fn catalog_response(
    state: &AppState,
    media_type: &str,
    id: &str,
    extra: CatalogExtra,
) -> Json<CatalogResponse> {
    if media_type != "movie" {
        return Json(CatalogResponse { metas: Vec::new() });
    }
    let id = strip_json_suffix(id);
    let metas = state.resolver().resolve_catalog(id, &extra).await;
    Json(CatalogResponse { metas })
}

/// GET /meta/{type}/{id}.json
pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<MetaResponse> {
    let id = strip_json_suffix(&id);
    let meta = state.resolver().resolve_meta(&media_type, id).await;
    Json(MetaResponse { meta })
}

/// GET /stream/{type}/{id}.json
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    let id = strip_json_suffix(&id);
    let streams = state.resolver().resolve_streams(&media_type, id).await;
    Json(StreamsResponse { streams })
}

/// Stremio request paths end in `.json`; the id itself never does.
fn strip_json_suffix(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

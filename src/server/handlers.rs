//! HTTP request handlers for the control page and the batch API.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{info, warn};

use super::{assets, templates, AppState};
use crate::config::default_base_dir;
use crate::services::{parse_batch, runner};

/// Body of the start request, as posted by the page script. Both
/// fields are optional; the base directory falls back to the default.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(rename = "diretorio_base", default)]
    pub base_dir: Option<String>,
    #[serde(rename = "lista", default)]
    pub list: Option<String>,
}

/// Serve the control page with the configured base directory.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let base_dir = state.config.read().await.base_dir.clone();
    Html(templates::index_page(&base_dir))
}

/// Validate the pasted list, persist the base directory and kick off
/// the batch in the background. Domain failures come back as
/// `success: false` with the message the page alerts, never as an
/// HTTP error.
pub async fn start_batch(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Json<serde_json::Value> {
    let base_dir = req.base_dir.unwrap_or_else(default_base_dir);
    let list = req.list.unwrap_or_default();

    let items = match parse_batch(&list, Path::new(&base_dir)) {
        Ok(items) => items,
        Err(e) => {
            warn!("Batch rejected: {e}");
            return Json(json!({ "success": false, "error": e.to_string() }));
        }
    };
    let count = items.len();

    {
        let mut config = state.config.write().await;
        config.base_dir = base_dir;
        if let Err(e) = config.save(&state.config_path) {
            warn!("Could not save configuration: {e}");
        }
    }

    let generation = state.registry.replace_all(items).await;
    runner::spawn_batch(
        state.registry.clone(),
        state.settings.clone(),
        generation,
        state.parked.clone(),
    );
    info!("Batch accepted: {count} item(s)");

    Json(json!({ "success": true, "count": count }))
}

/// Current state of every item, for the 2s polling loop.
pub async fn batch_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let items = state.registry.snapshot().await;
    Json(json!({ "itens": items }))
}

/// Serve CSS.
pub async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], assets::CSS)
}

/// Serve JavaScript.
pub async fn serve_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], assets::JS)
}

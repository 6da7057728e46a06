//! Embedded static assets
//!
//! Falls back to the `ui/` directory on disk when an asset is missing from
//! the binary.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

const UI_DIR: &str = "ui";

/// Serve embedded static files, with filesystem fallback
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    if let Some(content) = Assets::get(path) {
        return (
            [(header::CONTENT_TYPE, mime.as_ref().to_string())],
            content.data.into_owned(),
        )
            .into_response();
    }

    if !path.contains("..") {
        if let Ok(content) = std::fs::read(PathBuf::from(UI_DIR).join(path)) {
            return ([(header::CONTENT_TYPE, mime.as_ref().to_string())], content).into_response();
        }
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    if let Some(content) = Assets::get("index.html") {
        return String::from_utf8(content.data.into_owned()).ok();
    }

    std::fs::read_to_string(PathBuf::from(UI_DIR).join("index.html")).ok()
}

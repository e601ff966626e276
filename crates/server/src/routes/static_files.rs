//! Static frontend responder.
//!
//! Serves single files from the static root. Backend files that may sit next
//! to the bundle are refused.

use std::convert::Infallible;
use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::state::AppState;

/// Document served for `/`.
pub const INDEX_DOCUMENT: &str = "index.html";

/// File names that are never served.
const DENYLIST: &[&str] = &[
    "main.py",
    "requirements.txt",
    "start.sh",
    ".env",
    "Cargo.toml",
    "Cargo.lock",
];

/// How a requested name is handled.
#[derive(Debug, PartialEq, Eq)]
enum Access {
    Allowed,
    Forbidden,
    Missing,
}

fn classify(filename: &str) -> Access {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Access::Missing;
    }
    if DENYLIST.contains(&filename) || filename.starts_with('.') {
        return Access::Forbidden;
    }
    Access::Allowed
}

/// `GET /`
#[instrument(skip(state, request))]
pub async fn index(State(state): State<AppState>, request: Request) -> Result<Response, AppError> {
    serve(&state.static_dir().join(INDEX_DOCUMENT), request).await
}

/// `GET /{filename}`
#[instrument(skip(state, request))]
pub async fn file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    match classify(&filename) {
        Access::Missing => Err(AppError::NotFound(filename)),
        Access::Forbidden => Err(AppError::Forbidden(filename)),
        Access::Allowed => serve(&state.static_dir().join(&filename), request).await,
    }
}

async fn serve(path: &FsPath, request: Request) -> Result<Response, AppError> {
    let is_file = tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file());
    if !is_file {
        debug!(path = %path.display(), "Static file not found");
        return Err(AppError::NotFound(display_name(path)));
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|e: Infallible| match e {});

    Ok(response.map(Body::new))
}

fn display_name(path: &FsPath) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

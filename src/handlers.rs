use std::path::Path as FsPath;

use axum::{
    Form, Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::AppState;
use crate::auth::RequestContext;
use crate::error::ShareError;
use crate::listing::{self, Entry, LinkBase};
use crate::opener;
use crate::qr;
use crate::resolve::{self, ResolvedTarget, TargetKind};
use crate::settings::Settings;

/// Directory view payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryView {
    /// Logical path of the listed directory
    pub cwd: String,
    pub is_admin: bool,
    pub username: String,
    pub entries: Vec<Entry>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub root: String,
}

/// Response for successful operations
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QrForm {
    /// Text to encode, normally a shareable link
    pub filepath: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenDirQuery {
    /// Logical path of the directory to open
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub username: String,
}

// ============================================================================
// Helper functions
// ============================================================================

fn blocking_error(err: tokio::task::JoinError) -> ShareError {
    ShareError::Io(std::io::Error::other(err.to_string()))
}

fn require_admin(state: &AppState, ctx: &RequestContext, action: &str) -> Result<(), ShareError> {
    if state.authorizer.is_authorized(ctx) {
        Ok(())
    } else {
        info!("Refused {} for {:?}", action, ctx.peer);
        Err(ShareError::Forbidden(format!("only the host may {}", action)))
    }
}

/// Ensure a user-supplied logical path starts with `/`.
fn logical(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Quote a filename for Content-Disposition, with an RFC 5987 variant for
/// non-ASCII names.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' => '\'',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if ascii == file_name {
        format!("attachment; filename=\"{}\"", ascii)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            urlencoding::encode(file_name)
        )
    }
}

async fn stream_file(native_path: &FsPath, file_name: &str) -> Result<Response, ShareError> {
    debug!("Streaming file: {}", native_path.display());

    // Missing here means it vanished after classification.
    let file = fs::File::open(native_path).await.map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ShareError::NotFound(file_name.to_string()),
        _ => ShareError::Io(err),
    })?;
    let file_size = file.metadata().await?.len();

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, file_size.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(file_name)),
        ],
        body,
    )
        .into_response())
}

async fn directory_view(
    state: &AppState,
    ctx: &RequestContext,
    target: ResolvedTarget,
) -> Result<Response, ShareError> {
    let is_admin = state.authorizer.is_authorized(ctx);
    let username = state.settings.load().await?.username;
    let cwd = state.root.logical_path(&target.native_path);

    let root = state.root.clone();
    let port = state.port;
    let entries = tokio::task::spawn_blocking(move || {
        let base = LinkBase::resolve(port);
        listing::list_directory(&target.native_path, &root, &base)
    })
    .await
    .map_err(blocking_error)??;

    debug!("Listed {} ({} entries)", cwd, entries.len());

    Ok(Json(DirectoryView {
        cwd,
        is_admin,
        username,
        entries,
    })
    .into_response())
}

/// Resolve off the async workers; canonicalize and stat block.
async fn resolve_target(
    state: &AppState,
    request_path: &str,
) -> Result<ResolvedTarget, ShareError> {
    let root = state.root.clone();
    let request_path = request_path.to_string();
    tokio::task::spawn_blocking(move || resolve::resolve(&root, &request_path))
        .await
        .map_err(blocking_error)?
}

async fn serve_path(
    state: AppState,
    ctx: RequestContext,
    request_path: String,
) -> Result<Response, ShareError> {
    let target = resolve_target(&state, &request_path).await?;

    match target.kind {
        TargetKind::Missing => Err(ShareError::NotFound(request_path)),
        TargetKind::Directory => directory_view(&state, &ctx, target).await,
        TargetKind::File => {
            // Canonical basename: `.`/`..` segments and symlinks never leak into it.
            let file_name = target
                .native_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "download".to_string());
            stream_file(&target.native_path, &file_name).await
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Redirect to the root listing
pub async fn index() -> Redirect {
    Redirect::permanent("/files/")
}

/// GET /files - Redirect to the canonical root listing URL
pub async fn files_redirect() -> Redirect {
    Redirect::permanent("/files/")
}

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        root: state.root.path().display().to_string(),
    })
}

/// GET /files/ - List the served root
pub async fn list_root(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ShareError> {
    serve_path(state, ctx, "/".to_string()).await
}

/// GET /files/{*path} - Download a file or list a directory
pub async fn get_path(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(path): Path<String>,
) -> Result<Response, ShareError> {
    serve_path(state, ctx, logical(&path)).await
}

/// GET /settings - Current settings (host only)
pub async fn get_settings(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Settings>, ShareError> {
    require_admin(&state, &ctx, "view settings")?;
    Ok(Json(state.settings.load().await?))
}

/// POST /settings - Change the username (host only)
pub async fn update_settings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>, ShareError> {
    require_admin(&state, &ctx, "change settings")?;
    Ok(Json(state.settings.set_username(&request.username).await?))
}

/// POST /qr - Render a QR code for the submitted link
pub async fn qr_code(
    State(state): State<AppState>,
    Form(form): Form<QrForm>,
) -> Result<Response, ShareError> {
    let size = state.config.qr_size;
    let png = tokio::task::spawn_blocking(move || qr::render_png(&form.filepath, size))
        .await
        .map_err(blocking_error)??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        png,
    )
        .into_response())
}

/// GET /opendir - Open a served directory in the host's file manager (host only)
pub async fn open_dir(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<OpenDirQuery>,
) -> Result<Json<SuccessResponse>, ShareError> {
    require_admin(&state, &ctx, "open folders")?;

    let request_path = logical(&query.dir);
    let target = resolve_target(&state, &request_path).await?;

    match target.kind {
        TargetKind::Missing => return Err(ShareError::NotFound(request_path)),
        TargetKind::File => return Err(ShareError::NotADirectory),
        TargetKind::Directory => {}
    }

    opener::open_folder(&target.native_path).await?;
    info!("Opened {}", target.native_path.display());

    Ok(Json(SuccessResponse {
        success: true,
        message: "Folder opened".to_string(),
        path: Some(request_path),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_adds_leading_slash() {
        assert_eq!(logical("docs/report.pdf"), "/docs/report.pdf");
        assert_eq!(logical("/docs"), "/docs");
        assert_eq!(logical(""), "/");
    }

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_quotes() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say 'hi'.txt\"; filename*=UTF-8''say%20%22hi%22.txt"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("résumé.pdf"),
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }
}

//! Static file server behind `autoserve serve`.
//!
//! Files are served by `tower_http::services::ServeDir`. Directories without
//! an `index.html` get an HTML listing, or 403 when listings are disabled.
//! Every response carries `Access-Control-Allow-Origin: *`.

use std::fmt::Write as _;
use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Router;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// First port tried by [`find_free_port`]
pub const DEFAULT_START_PORT: u16 = 8000;
/// Ports tried by [`find_free_port`]
pub const DEFAULT_PORT_TRIES: u16 = 100;

#[derive(Debug, Clone)]
pub struct FileServerOptions {
    /// Canonical root directory
    pub root: PathBuf,
    pub directory_listing: bool,
}

struct FileServerState {
    options: FileServerOptions,
    files: ServeDir,
}

/// Builds the router for `options.root`.
pub fn router(options: FileServerOptions) -> Router {
    let files = ServeDir::new(&options.root).append_index_html_on_directories(true);
    let state = Arc::new(FileServerState { options, files });

    Router::new()
        .fallback(handle)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// First port in `start..start + tries` that can be bound on all interfaces.
pub fn find_free_port(start: u16, tries: u16) -> Option<u16> {
    (0..tries)
        .filter_map(|offset| start.checked_add(offset))
        .find(|&port| StdTcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).is_ok())
}

async fn handle(State(state): State<Arc<FileServerState>>, request: Request) -> Response {
    let raw_path = request.uri().path().to_string();
    let Some(relative) = sanitize_path(&raw_path) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };
    let target = state.options.root.join(&relative);

    let is_dir = tokio::fs::metadata(&target)
        .await
        .is_ok_and(|m| m.is_dir());
    if is_dir && !target.join("index.html").is_file() {
        if !raw_path.ends_with('/') {
            return Redirect::permanent(&format!("{raw_path}/")).into_response();
        }
        if !state.options.directory_listing {
            return (StatusCode::FORBIDDEN, "Directory listing forbidden").into_response();
        }
        return match render_listing(&target, &raw_path).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::warn!("Failed to list {}: {e}", target.display());
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read directory").into_response()
            }
        };
    }

    match state.files.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(e) => {
            tracing::warn!("Failed to serve {raw_path}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// 把请求路径解码为相对路径；包含 `..` 或根路径成分时返回 `None`
fn sanitize_path(uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

async fn render_listing(dir: &Path, uri_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort_by_key(|(name, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(uri_path));
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (name, is_dir) in entries {
        let suffix = if is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>",
            urlencoding::encode(&name),
            escape_html(&name)
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

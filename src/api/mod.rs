// API module entry
// Routes course requests to their handlers and writes the access log

mod docs;
mod handlers;
mod response;
mod types;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

const ROOT_ALLOW: &str = "GET, HEAD, POST, OPTIONS";
const READ_ONLY_ALLOW: &str = "GET, HEAD, OPTIONS";

/// Routes known to the API
#[derive(Debug, PartialEq, Eq)]
enum Route {
    /// `/`
    Root,
    /// `/{id}`, with the id percent-decoded
    Course(String),
    /// Swagger UI page
    DocsPage,
    /// OpenAPI document
    DocsSpec,
    /// `/{id}` whose percent-encoding does not decode
    BadId,
    NotFound,
}

impl Route {
    fn resolve(path: &str, state: &AppState) -> Self {
        let path = http::normalize_path(path);
        let docs = &state.config.docs;

        if docs.enabled {
            if path == http::normalize_path(&docs.path) {
                return Self::DocsPage;
            }
            if path == docs.spec_path() {
                return Self::DocsSpec;
            }
        }

        if path == "/" {
            return Self::Root;
        }

        match path.strip_prefix('/') {
            Some(segment) if !segment.is_empty() && !segment.contains('/') => {
                decode_segment(segment).map_or(Self::BadId, Self::Course)
            }
            _ => Self::NotFound,
        }
    }

    const fn allow(&self) -> &'static str {
        match self {
            Self::Root => ROOT_ALLOW,
            _ => READ_ONLY_ALLOW,
        }
    }
}

/// Percent-decode one path segment.
///
/// `None` when a `%` is not followed by two hex digits or the decoded bytes
/// are not UTF-8.
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let malformed = bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    });
    if malformed {
        return None;
    }
    urlencoding::decode(segment).ok().map(std::borrow::Cow::into_owned)
}

/// Main entry point for HTTP request handling
///
/// Generic over the body type so the same path serves hyper connections
/// and in-process requests.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let entry = access_log_enabled(&state).then(|| start_entry(&req, remote_addr));

    let response = dispatch(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = http::body_len(&response);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Access lines are info-level, so a stricter log level suppresses them too
fn access_log_enabled(state: &AppState) -> bool {
    state.config.logging.access_log && logger::enabled(logger::Level::Info)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let http_config = &state.config.http;
    let route = Route::resolve(req.uri().path(), state);
    let method = req.method().clone();
    let is_head = method == Method::HEAD;

    let mut response = match (&method, &route) {
        (_, Route::NotFound) => http::build_404_response(),
        (_, Route::BadId) => {
            logger::log_warning(&format!("Undecodable id in path: {}", req.uri().path()));
            http::build_400_response()
        }
        (&Method::OPTIONS, _) => {
            http::build_options_response(route.allow(), http_config.enable_cors)
        }
        (&Method::GET | &Method::HEAD, Route::Root) => handlers::handle_list(&state.store),
        (&Method::GET | &Method::HEAD, Route::Course(id)) => handlers::handle_get(&state.store, id),
        (&Method::GET | &Method::HEAD, Route::DocsPage) => docs::serve_docs_page(),
        (&Method::GET | &Method::HEAD, Route::DocsSpec) => docs::serve_openapi(),
        (&Method::POST, Route::Root) => {
            let (parts, body) = req.into_parts();
            match read_body(&parts.headers, body, http_config.max_body_size).await {
                Ok(bytes) => handlers::handle_create(&parts.headers, &bytes),
                Err(resp) => resp,
            }
        }
        _ => {
            logger::log_warning(&format!(
                "Method not allowed: {method} {}",
                req.uri().path()
            ));
            http::build_405_response(route.allow())
        }
    };

    http::apply_common_headers(
        &mut response,
        &http_config.server_name,
        http_config.enable_cors,
    );
    if is_head {
        response = http::strip_body_for_head(response);
    }
    response
}

/// Buffer a request body, enforcing the configured size limit
async fn read_body<B>(
    headers: &HeaderMap,
    body: B,
    max_body_size: u64,
) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(size) = http::content_length(headers) {
        if size > max_body_size {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(http::build_413_response());
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response())
        }
    }
}

fn start_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(req.headers(), REFERER);
    entry.user_agent = header_string(req.headers(), USER_AGENT);
    entry
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

/// `Cache-Control` value forced onto every auth response.
pub const NO_CACHE_DIRECTIVES: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// CDN-targeted cache control (RFC 9213).
static CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

/// Return `response` with its caching headers replaced by the no-cache set.
///
/// Status, extensions and body are untouched; any caching headers already
/// present are overridden, not merged.
#[must_use]
pub fn add_no_cache_headers(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let headers = &mut parts.headers;
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE_DIRECTIVES));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers.insert(CDN_CACHE_CONTROL.clone(), HeaderValue::from_static("no-store"));
    Response::from_parts(parts, body)
}

/// Middleware applying [`add_no_cache_headers`] to whatever the inner handler returns.
pub async fn no_store(request: Request, next: Next) -> Response {
    add_no_cache_headers(next.run(request).await)
}

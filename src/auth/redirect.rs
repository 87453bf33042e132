//! Helpers for redirect URLs during authentication flows.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Only local paths are allowed, and never the log-in page itself.
fn is_safe_redirect_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW
}

/// Parse a redirect URL sent by the client, keeping its path and query.
///
/// Returns `None` for absolute URLs and unsafe paths.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    is_safe_redirect_path(path_and_query).then(|| path_and_query.to_owned())
}

/// Build the log-in URL that sends the user back to where they were.
///
/// For API requests the page the user was on comes from the HTMX
/// `HX-Current-URL` header, which is an absolute URL.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path_and_query| is_safe_redirect_path(path_and_query));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use crate::auth::redirect::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_local_paths() {
        assert_eq!(
            normalize_redirect_url("/transactions?kind=expense"),
            Some("/transactions?kind=expense".to_owned())
        );
    }

    #[test]
    fn rejects_external_and_log_in_urls() {
        assert_eq!(normalize_redirect_url("https://example.com/"), None);
        assert_eq!(normalize_redirect_url("//example.com"), None);
        assert_eq!(normalize_redirect_url("/log_in?redirect_url=%2F"), None);
    }

    #[test]
    fn api_request_uses_current_url() {
        let request = Request::builder()
            .uri("/api/transactions")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/categories")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some("/log_in?redirect_url=%2Fcategories".to_owned())
        );
    }

    #[test]
    fn api_request_without_htmx_has_no_target() {
        let request = Request::builder()
            .uri("/api/transactions")
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}

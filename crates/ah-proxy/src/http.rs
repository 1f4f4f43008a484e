// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP Reverse Proxy (spec §4.7).
//!
//! Strips hop-by-hop headers in both directions, injects the
//! `X-Forwarded-*` family plus `Accept-Encoding: identity`, never follows
//! upstream redirects, and rewrites an upstream `Location` back to the
//! externally observed scheme/host/port when it points at the upstream
//! origin itself.

use crate::origin::UpstreamOrigin;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

/// Connect/read timeout for the upstream request (spec §5).
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that apply only to a single connection and must never be
/// forwarded by a proxy (spec §4.7 step 2).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[derive(Clone)]
pub struct HttpProxy {
    client: Client<HttpConnector, Body>,
}

impl Default for HttpProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpProxy {
    pub fn new() -> Self {
        Self { client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()) }
    }

    /// Forward `method path?query` with `headers`/`body` to `origin`,
    /// relaying the upstream response back filtered and with its
    /// `Location` rewritten. `external_host`/`external_scheme` are what
    /// the caller reaching the proxy used to get here.
    pub async fn forward(
        &self,
        origin: &UpstreamOrigin,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Body,
        external_host: &str,
        external_scheme: &str,
    ) -> Response {
        let upstream_uri: Uri = match format!("{}{}", origin.http_base(), path_and_query).parse() {
            Ok(uri) => uri,
            Err(err) => return bad_gateway(format!("invalid upstream URI: {err}")),
        };

        let mut request = hyper::Request::builder().method(method).uri(upstream_uri);
        for (name, value) in headers.iter() {
            if should_strip_request_header(name.as_str()) {
                continue;
            }
            request = request.header(name, value);
        }
        request = request
            .header("host", external_host)
            .header("x-forwarded-host", external_host)
            .header("x-forwarded-proto", external_scheme)
            .header("accept-encoding", "identity");
        if let Some(port) = external_host.rsplit_once(':').map(|(_, p)| p) {
            request = request.header("x-forwarded-port", port);
        }

        let request = match request.body(body) {
            Ok(req) => req,
            Err(err) => return bad_gateway(format!("failed to build upstream request: {err}")),
        };

        let response = match tokio::time::timeout(UPSTREAM_TIMEOUT, self.client.request(request)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => return bad_gateway(format!("upstream connect/read failed: {err}")),
            Err(_) => return bad_gateway("upstream request timed out".to_string()),
        };

        relay_response(response, origin, external_host, external_scheme)
    }
}

fn relay_response(
    response: hyper::Response<hyper::body::Incoming>,
    origin: &UpstreamOrigin,
    external_host: &str,
    external_scheme: &str,
) -> Response {
    let status = response.status();
    let mut headers = HeaderMap::new();
    for (name, value) in response.headers().iter() {
        if is_hop_by_hop(name.as_str()) || name.as_str().eq_ignore_ascii_case("content-encoding") {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(location) = headers.get(axum::http::header::LOCATION).cloned() {
        if let Ok(rewritten) = rewrite_location(&location, origin, external_host, external_scheme) {
            headers.insert(axum::http::header::LOCATION, rewritten);
        }
    }

    let body = Body::new(response.into_body());
    let mut out = Response::new(body);
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

/// If `location` is an absolute URL whose host:port matches the upstream
/// origin, rewrite scheme/host/port to the externally observed ones;
/// otherwise return it unchanged.
fn rewrite_location(
    location: &HeaderValue,
    origin: &UpstreamOrigin,
    external_host: &str,
    external_scheme: &str,
) -> Result<HeaderValue, ()> {
    let location_str = location.to_str().map_err(|_| ())?;
    let Ok(uri) = location_str.parse::<Uri>() else {
        return Ok(location.clone());
    };
    let Some(authority) = uri.authority() else {
        // Relative location: nothing to rewrite.
        return Ok(location.clone());
    };

    let upstream_authority = format!("{}:{}", origin.host, origin.port);
    if authority.as_str() != upstream_authority {
        return Ok(location.clone());
    }

    let rest = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let rewritten = format!("{external_scheme}://{external_host}{rest}");
    HeaderValue::from_str(&rewritten).map_err(|_| ())
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Headers dropped from the client's request before forwarding upstream:
/// the hop-by-hop list, plus `accept-encoding` — that one is replaced
/// wholesale with `identity` rather than merged with whatever the client
/// offered, so the upstream can't compress a body whose `Content-Encoding`
/// we then strip without touching the bytes.
fn should_strip_request_header(name: &str) -> bool {
    is_hop_by_hop(name) || name.eq_ignore_ascii_case("accept-encoding")
}

fn bad_gateway(msg: String) -> Response {
    tracing::warn!(error = %msg, "proxy: upstream unavailable");
    (StatusCode::BAD_GATEWAY, format!("upstream app is not reachable: {msg}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_by_hop_list_matches_spec_exactly() {
        for h in [
            "connection",
            "keep-alive",
            "proxy-authenticate",
            "proxy-authorization",
            "te",
            "trailers",
            "transfer-encoding",
            "upgrade",
            "host",
            "content-length",
        ] {
            assert!(is_hop_by_hop(h));
            assert!(is_hop_by_hop(&h.to_ascii_uppercase()));
        }
        assert!(!is_hop_by_hop("accept"));
        assert!(!is_hop_by_hop("cookie"));
    }

    #[test]
    fn client_accept_encoding_is_stripped_so_identity_is_never_doubled() {
        assert!(should_strip_request_header("accept-encoding"));
        assert!(should_strip_request_header("Accept-Encoding"));
        assert!(!should_strip_request_header("accept"));
        assert!(!should_strip_request_header("cookie"));
    }

    #[test]
    fn rewrites_location_pointing_at_the_upstream_origin() {
        let origin = UpstreamOrigin { host: "127.0.0.1".to_string(), port: 8501 };
        let location = HeaderValue::from_static("http://127.0.0.1:8501/apps/app-x/foo?bar=1");
        let rewritten = rewrite_location(&location, &origin, "example.com", "https").expect("rewrite");
        assert_eq!(rewritten.to_str().expect("ascii"), "https://example.com/apps/app-x/foo?bar=1");
    }

    #[test]
    fn leaves_unrelated_locations_untouched() {
        let origin = UpstreamOrigin { host: "127.0.0.1".to_string(), port: 8501 };
        let location = HeaderValue::from_static("https://other.example.com/elsewhere");
        let rewritten = rewrite_location(&location, &origin, "example.com", "https").expect("rewrite");
        assert_eq!(rewritten, location);
    }

    #[test]
    fn leaves_relative_locations_untouched() {
        let origin = UpstreamOrigin { host: "127.0.0.1".to_string(), port: 8501 };
        let location = HeaderValue::from_static("/apps/app-x/next");
        let rewritten = rewrite_location(&location, &origin, "example.com", "https").expect("rewrite");
        assert_eq!(rewritten, location);
    }
}

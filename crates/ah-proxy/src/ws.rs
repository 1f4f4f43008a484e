// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket Reverse Proxy (spec §4.8).
//!
//! Filters the client's handshake headers down to `Cookie`/`Authorization`
//! only — the serving framework on the other end generates its own
//! `Sec-WebSocket-*` keys and refuses a handshake where those are
//! clobbered. Echoes back whichever subprotocol the upstream actually
//! picked; accepting with a different one (or silently dropping it) makes
//! browsers disconnect immediately after the upgrade completes.

use crate::origin::UpstreamOrigin;
use axum::extract::ws::{CloseFrame as AxumCloseFrame, Message as AxumMessage, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::handshake::client::generate_key;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as TungsteniteCloseFrame;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

/// Client request headers forwarded upstream verbatim. Everything else,
/// including every `Sec-WebSocket-*` handshake header, is dropped — the
/// WebSocket client library mints its own.
const FORWARDED_CLIENT_HEADERS: &[&str] = &["cookie", "authorization"];

pub struct WsProxy;

impl WsProxy {
    /// Handle one client upgrade request end to end: connect upstream,
    /// negotiate the subprotocol, accept the client, and relay frames
    /// bidirectionally until either side closes.
    pub async fn proxy(
        ws: WebSocketUpgrade,
        origin: &UpstreamOrigin,
        uri: &Uri,
        client_headers: &HeaderMap,
    ) -> Response {
        let offered = offered_protocols(client_headers);
        let client_origin = client_headers.get(axum::http::header::ORIGIN).cloned();

        let upstream_url = format!(
            "{}{}",
            origin.ws_base(),
            uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
        );

        let mut request_builder = hyper::Request::builder()
            .uri(&upstream_url)
            .header("connection", "Upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", generate_key());
        for name in FORWARDED_CLIENT_HEADERS {
            if let Some(value) = client_headers.get(*name) {
                request_builder = request_builder.header(*name, value);
            }
        }
        if let Some(origin_header) = client_origin {
            request_builder = request_builder.header(axum::http::header::ORIGIN, origin_header);
        }
        if !offered.is_empty() {
            request_builder = request_builder.header("sec-websocket-protocol", offered.join(", "));
        }

        let request = match request_builder.body(()) {
            Ok(req) => req,
            Err(err) => return bad_gateway(format!("invalid upstream websocket request: {err}")),
        };

        let (upstream, handshake_response) = match tokio_tungstenite::connect_async(request).await {
            Ok(pair) => pair,
            Err(err) => return bad_gateway(format!("upstream websocket unavailable: {err}")),
        };

        let negotiated = handshake_response
            .headers()
            .get("sec-websocket-protocol")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|p| !p.is_empty() && offered.iter().any(|o| o == p));

        let mut upgrade = ws;
        if let Some(proto) = negotiated {
            upgrade = upgrade.protocols([proto]);
        }

        upgrade.on_upgrade(move |socket| relay(socket, upstream))
    }
}

fn offered_protocols(headers: &HeaderMap) -> Vec<String> {
    headers
        .get("sec-websocket-protocol")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
        .unwrap_or_default()
}

/// Two concurrent relay loops; either side finishing cancels the other and
/// closes both sockets.
async fn relay(
    client: WebSocket,
    upstream: tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(msg)) = client_rx.next().await {
            let done = matches!(msg, AxumMessage::Close(_));
            if upstream_tx.send(to_tungstenite(msg)).await.is_err() || done {
                break;
            }
        }
    };

    let upstream_to_client = async {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let done = matches!(msg, TungsteniteMessage::Close(_));
            if client_tx.send(to_axum(msg)).await.is_err() || done {
                break;
            }
        }
    };

    tokio::select! {
        _ = client_to_upstream => {}
        _ = upstream_to_client => {}
    }
}

fn to_tungstenite(msg: AxumMessage) -> TungsteniteMessage {
    match msg {
        AxumMessage::Text(t) => TungsteniteMessage::Text(t.to_string().into()),
        AxumMessage::Binary(b) => TungsteniteMessage::Binary(b.to_vec().into()),
        AxumMessage::Ping(b) => TungsteniteMessage::Ping(b.to_vec().into()),
        AxumMessage::Pong(b) => TungsteniteMessage::Pong(b.to_vec().into()),
        AxumMessage::Close(frame) => TungsteniteMessage::Close(frame.map(|f| TungsteniteCloseFrame {
            code: f.code.into(),
            reason: f.reason.to_string().into(),
        })),
    }
}

fn to_axum(msg: TungsteniteMessage) -> AxumMessage {
    match msg {
        TungsteniteMessage::Text(t) => AxumMessage::Text(t.to_string().into()),
        TungsteniteMessage::Binary(b) => AxumMessage::Binary(b.to_vec().into()),
        TungsteniteMessage::Ping(b) => AxumMessage::Ping(b.to_vec().into()),
        TungsteniteMessage::Pong(b) => AxumMessage::Pong(b.to_vec().into()),
        TungsteniteMessage::Close(frame) => AxumMessage::Close(frame.map(|f| AxumCloseFrame {
            code: u16::from(f.code),
            reason: f.reason.to_string().into(),
        })),
        // Raw frames surface only at a lower protocol layer than `read`/`next`
        // ever hand back; nothing to relay.
        TungsteniteMessage::Frame(_) => AxumMessage::Ping(Vec::new().into()),
    }
}

fn bad_gateway(msg: String) -> Response {
    tracing::warn!(error = %msg, "ws proxy: upstream unavailable");
    (StatusCode::BAD_GATEWAY, format!("upstream websocket unavailable: {msg}")).into_response()
}

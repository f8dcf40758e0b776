//! Caller address and user agent.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Extensions, HeaderMap, header::USER_AGENT, request::Parts},
};
use chefshare::auth::ClientInfo;
use std::{convert::Infallible, net::SocketAddr};

use super::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Best-effort client IP.
///
/// With `trust_proxy_headers` the first hop of `X-Forwarded-For` wins, then
/// `X-Real-IP`. The socket peer address (present when the server runs with
/// connect info) is the fallback, and the only source when proxy headers
/// are not trusted.
pub fn client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy_headers: bool,
) -> Option<String> {
    let peer = || {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    if !trust_proxy_headers {
        return peer();
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header(FORWARDED_FOR)
        .or_else(|| header(REAL_IP))
        .or_else(peer)
}

/// Extractor for [`ClientInfo`]. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub ClientInfo);

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(ClientMeta(ClientInfo::new(
            client_ip(&parts.headers, &parts.extensions, state.trust_proxy_headers),
            user_agent,
        )))
    }
}

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Resolves the client address for logging.
///
/// Proxy headers (`X-Forwarded-For`, then `X-Real-IP`) are consulted only when
/// `trust_forwarded` is set; otherwise the peer address of the connection is used.
/// Without either, the loopback address is returned.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded: bool) -> IpAddr {
    if trust_forwarded {
        if let Some(h) = headers.get("x-forwarded-for").and_then(|hv| hv.to_str().ok()) {
            if let Some(first) = h.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
        if let Some(h) = headers.get("x-real-ip").and_then(|hv| hv.to_str().ok()) {
            if let Ok(ip) = h.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }
    peer.unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

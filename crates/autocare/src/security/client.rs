use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client IP: proxy headers first, then the socket peer.
pub fn client_identifier<B>(request: &Request<B>) -> String {
    let headers = request.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn prefers_first_forwarded_address() {
        let request = Request::get("/")
            .header("x-forwarded-for", " 198.51.100.7 , 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(())
            .expect("request builds");
        assert_eq!(client_identifier(&request), "198.51.100.7");
    }

    #[test]
    fn falls_back_to_peer_address_then_unknown() {
        let mut request = Request::get("/").body(()).expect("request builds");
        assert_eq!(client_identifier(&request), "unknown");

        let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 44)), 51000);
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_identifier(&request), "192.0.2.44");
    }
}

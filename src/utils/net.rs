use std::net::UdpSocket;

use nanoid::nanoid;

/// Best-effort local address discovery, used as the announce payload on
/// created directories and as the host part of the instance fingerprint.
///
/// Connecting a UDP socket sends no packets; it only makes the OS pick the
/// outbound route and local address.
pub(crate) fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Unique identity of this client instance, published as the name of the
/// ephemeral presence node under every watched key. Two processes on the
/// same host must not collide, so the host address alone is not enough.
pub(crate) fn instance_fingerprint() -> String {
    format!("{}_{}", local_ip(), nanoid!(10))
}

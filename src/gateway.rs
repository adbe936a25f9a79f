// ===============================
// src/gateway.rs (UDP endpoints)
// ===============================
//
// One datagram = one message. No sequencing, no connection.
// - UdpReceiver: bound listen socket, waits for the next datagram.
// - UdpSender: unbound socket aimed at a fixed peer, fire-and-forget.
//
use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tracing::info;

pub const RECV_BUFFER: usize = 1024;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bind {addr} failed: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("cannot resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    #[error("send to {peer} failed: {source}")]
    Send { peer: SocketAddr, source: io::Error },
}

pub struct UdpReceiver {
    sock: UdpSocket,
    buf: Vec<u8>,
}

impl UdpReceiver {
    pub async fn bind(addr: &str) -> Result<Self, GatewayError> {
        let sock = UdpSocket::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr: addr.to_string(), source })?;
        info!(%addr, "receiver listening");
        Ok(Self { sock, buf: vec![0u8; RECV_BUFFER] })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.sock.local_addr() }

    /// Waits for the next datagram and returns its payload. Anything past
    /// the receive buffer is truncated by the OS.
    pub async fn recv(&mut self) -> Result<Vec<u8>, GatewayError> {
        let (n, _from) = self.sock.recv_from(&mut self.buf).await.map_err(GatewayError::Receive)?;
        Ok(self.buf[..n].to_vec())
    }
}

pub struct UdpSender {
    sock: UdpSocket,
    peer: SocketAddr,
}

impl UdpSender {
    pub async fn open(peer: &str) -> Result<Self, GatewayError> {
        let resolve_err = |source: io::Error| GatewayError::Resolve { addr: peer.to_string(), source };
        let peer_addr = lookup_host(peer)
            .await
            .map_err(resolve_err)?
            .next()
            .ok_or_else(|| resolve_err(io::Error::new(io::ErrorKind::NotFound, "no address")))?;

        let local = if peer_addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let sock = UdpSocket::bind(local)
            .await
            .map_err(|source| GatewayError::Bind { addr: local.to_string(), source })?;
        info!(peer = %peer_addr, "sender ready");
        Ok(Self { sock, peer: peer_addr })
    }

    pub fn peer(&self) -> SocketAddr { self.peer }

    pub async fn send(&self, data: &[u8]) -> Result<(), GatewayError> {
        self.sock
            .send_to(data, self.peer)
            .await
            .map(|_| ())
            .map_err(|source| GatewayError::Send { peer: self.peer, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn datagram_round_trip_on_loopback() {
        let mut rx = UdpReceiver::bind("127.0.0.1:0").await.unwrap();
        let port = rx.local_addr().unwrap().port();
        let tx = UdpSender::open(&format!("127.0.0.1:{port}")).await.unwrap();

        tx.send(b"35=0\x01").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), b"35=0\x01".to_vec());
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let first = UdpReceiver::bind("127.0.0.1:0").await.unwrap();
        let addr = first.local_addr().unwrap().to_string();
        match UdpReceiver::bind(&addr).await {
            Err(GatewayError::Bind { addr: a, .. }) => assert_eq!(a, addr),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("second bind on {addr} succeeded"),
        }
    }

    #[tokio::test]
    async fn unparsable_peer_is_resolve_error() {
        let res = UdpSender::open("not-an-address").await;
        assert!(matches!(res, Err(GatewayError::Resolve { .. })));
    }
}

use crate::error::{ParkmeansError, Result};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Listens for incoming TCP connections on a bound address.
pub struct TransportListener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl TransportListener {
    /// Bind a listener on the given address. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let inner = TcpListener::bind(addr)
            .await
            .map_err(|e| ParkmeansError::transport_with_source(format!("bind {addr}"), e))?;
        let local_addr = inner
            .local_addr()
            .map_err(|e| ParkmeansError::transport_with_source("local_addr", e))?;
        Ok(Self { inner, local_addr })
    }

    /// Accept the next incoming connection with Nagle disabled.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, addr) = self
            .inner
            .accept()
            .await
            .map_err(|e| ParkmeansError::transport_with_source("accept", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| ParkmeansError::transport_with_source("set_nodelay", e))?;
        Ok((stream, addr))
    }

    /// The local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Connect to a remote listener with Nagle disabled.
pub(crate) async fn connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ParkmeansError::transport_with_source(format!("connect {addr}"), e))?;
    stream
        .set_nodelay(true)
        .map_err(|e| ParkmeansError::transport_with_source("set_nodelay", e))?;
    Ok(stream)
}

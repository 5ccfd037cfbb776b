use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected stream socket — implements Read + Write.
///
/// This is the fundamental I/O type the protocol layer runs on. It wraps
/// either a TCP stream or (on Unix) a Unix domain socket stream; the
/// protocol only requires reliable, ordered byte delivery.
pub struct WireStream {
    inner: WireStreamInner,
}

enum WireStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for WireStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            WireStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for WireStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            WireStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            WireStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl WireStream {
    /// Connect to a TCP endpoint (blocking, single attempt).
    ///
    /// Retry policy, if any, belongs to the caller.
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        debug!(?addr, "connected to tcp endpoint");
        Ok(Self::from_tcp(stream))
    }

    /// Connect to a listening Unix domain socket (blocking, single attempt).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                addr: path.display().to_string(),
                source: e,
            })?;
        debug!(?path, "connected to unix domain socket");
        Ok(Self::from_unix(stream))
    }

    /// Wrap an already-established TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: WireStreamInner::Tcp(stream),
        }
    }

    /// Wrap an already-established Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: WireStreamInner::Unix(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            WireStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            WireStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            WireStreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_tcp(cloned))
            }
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }

    /// Shut down both directions of the stream.
    ///
    /// A repeated shutdown reporting `NotConnected` is treated as success,
    /// so callers may invoke this more than once.
    pub fn shutdown(&self) -> Result<()> {
        let result = match &self.inner {
            WireStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match result {
            Ok(()) => {
                debug!("stream shut down");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Whether the stream still has a reachable peer endpoint.
    ///
    /// Side-effect-free: probes the peer address rather than the wire.
    pub fn is_connected(&self) -> bool {
        match &self.inner {
            WireStreamInner::Tcp(stream) => stream.peer_addr().is_ok(),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream.peer_addr().is_ok(),
        }
    }

    /// Human-readable peer description for diagnostics.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            WireStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "tcp:<unknown>".to_string()),
            #[cfg(unix)]
            WireStreamInner::Unix(stream) => stream
                .peer_addr()
                .map(|a| format!("{a:?}"))
                .unwrap_or_else(|_| "unix:<unknown>".to_string()),
        }
    }
}

impl std::fmt::Debug for WireStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            WireStreamInner::Tcp(_) => f.debug_struct("WireStream").field("type", &"tcp").finish(),
            #[cfg(unix)]
            WireStreamInner::Unix(_) => {
                f.debug_struct("WireStream").field("type", &"unix").finish()
            }
        }
    }
}

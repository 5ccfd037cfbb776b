use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;
use recwire_transport::WireStream;
use tracing::{debug, warn};

use crate::codec::{decode_message, encode_message, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Diagnostics carried by in-band ERROR frames.
const DIAG_MISSING_START: &str = "invalid frame (expected START byte)";
const DIAG_TRUNCATED: &str = "invalid frame: stream ended before END byte was read";
const DIAG_TOO_LARGE: &str = "invalid frame: maximum frame size exceeded";

/// Exchanges messages over any `Read + Write` stream.
///
/// Owns the stream, the per-connection accumulation buffer the decoder
/// runs against, and the framing configuration. Handles partial reads
/// internally — callers always get complete messages.
///
/// One connection is half-duplex: one reader and one writer in flight at a
/// time. There is no internal locking; concurrent callers must serialize
/// access themselves.
pub struct MessageConnection<T> {
    stream: T,
    /// Accumulation buffer for incoming bytes; grows as needed.
    rbuf: BytesMut,
    /// Scratch buffer for outgoing frames.
    wbuf: BytesMut,
    config: FrameConfig,
    closed: bool,
}

impl<T: Read + Write> MessageConnection<T> {
    /// Wrap an already-established stream with default configuration.
    pub fn new(stream: T) -> Self {
        Self::with_config(stream, FrameConfig::default())
    }

    /// Wrap an already-established stream with explicit configuration.
    pub fn with_config(stream: T, config: FrameConfig) -> Self {
        Self {
            stream,
            rbuf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            wbuf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            closed: false,
        }
    }

    /// Encode and send one message (blocking).
    ///
    /// A message with zero positional parts is a no-op: nothing is sent and
    /// no error is raised. Underlying write failures propagate as
    /// [`FrameError::Io`].
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        if self.closed {
            return Err(FrameError::Closed);
        }
        if message.is_empty() {
            debug!("skipping message with no positional parts");
            return Ok(());
        }

        self.wbuf.clear();
        encode_message(message, &mut self.wbuf);
        debug!(%message, bytes = self.wbuf.len(), "writing message");
        self.write_buffered()?;
        self.flush()
    }

    /// Read the next complete message (blocking).
    ///
    /// On a protocol violation — missing START, stream end before END, or an
    /// oversized frame — a best-effort ERROR frame is sent to the peer and
    /// the violation is returned to the caller. Transport failures propagate
    /// unchanged and never produce an in-band ERROR frame.
    pub fn read_message(&mut self) -> Result<Message> {
        if self.closed {
            return Err(FrameError::Closed);
        }

        loop {
            match decode_message(&mut self.rbuf, self.config.max_frame_size) {
                Ok(Some(message)) => {
                    debug!(%message, "read message");
                    return Ok(message);
                }
                Ok(None) => {}
                Err(err) => return Err(self.report_protocol_error(err)),
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(self.report_protocol_error(FrameError::Truncated));
            }

            self.rbuf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Send the in-band ERROR frame for a protocol violation, then hand the
    /// violation back for the caller to surface. Delivery is best-effort:
    /// the peer may already be gone.
    fn report_protocol_error(&mut self, err: FrameError) -> FrameError {
        let diagnostic = match &err {
            FrameError::MissingStart => DIAG_MISSING_START,
            FrameError::Truncated => DIAG_TRUNCATED,
            FrameError::FrameTooLarge { .. } => DIAG_TOO_LARGE,
            _ => return err,
        };

        self.wbuf.clear();
        encode_message(&Message::error(diagnostic), &mut self.wbuf);
        if let Err(send_err) = self.write_buffered().and_then(|()| self.flush()) {
            warn!(%send_err, "could not deliver in-band ERROR frame");
        }
        err
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.wbuf.len() {
            match self.stream.write(&self.wbuf[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Whether the connection has been closed locally. Closed is terminal.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    /// Consume the connection and return the inner stream.
    pub fn into_inner(self) -> T {
        self.stream
    }

    /// Update maximum frame size for subsequent messages.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current connection configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl MessageConnection<WireStream> {
    /// Create a connection for a `WireStream` and apply the configured
    /// read/write timeouts to the socket.
    pub fn with_config_wire(stream: WireStream, config: FrameConfig) -> Result<Self> {
        stream
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        stream
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(stream, config))
    }

    /// Close the connection, shutting the socket down in both directions.
    ///
    /// Safe to call more than once; a second call is a successful no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.stream.flush();
        self.stream.shutdown().map_err(transport_to_frame_error)?;
        debug!("connection closed");
        Ok(())
    }

    /// Whether the socket still has a reachable peer. Side-effect-free.
    pub fn is_connected(&self) -> bool {
        !self.closed && self.stream.is_connected()
    }
}

fn transport_to_frame_error(err: recwire_transport::TransportError) -> FrameError {
    match err {
        recwire_transport::TransportError::Io(io) => FrameError::Io(io),
        recwire_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}

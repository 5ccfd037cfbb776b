/// Errors that can occur while encoding, decoding, or exchanging messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream did not begin a frame with the START byte.
    ///
    /// The stream is desynchronized at this point; the connection should be
    /// closed by the caller.
    #[error("missing START byte (0x01) at frame boundary")]
    MissingStart,

    /// The stream ended before the END byte of the current frame.
    #[error("stream ended before END byte (0x04) was read")]
    Truncated,

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The connection has been closed locally; no further operations are valid.
    #[error("connection closed")]
    Closed,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether this is a protocol-level failure (malformed or truncated
    /// framing) as opposed to a transport-level or lifecycle failure.
    ///
    /// Protocol-level failures are reported in-band to the peer as an
    /// ERROR frame; transport failures never are.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            FrameError::MissingStart | FrameError::Truncated | FrameError::FrameTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

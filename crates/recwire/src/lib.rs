//! Delimited-record message protocol over stream sockets.
//!
//! recwire exchanges messages — ordered positional fields plus named
//! key/value parameters — inside control-byte-delimited frames over any
//! reliable byte stream (TCP, Unix domain sockets).
//!
//! # Crate Structure
//!
//! - [`transport`] — Stream socket abstraction ([`transport::WireStream`])
//! - [`frame`] — Message data model, frame codec, and
//!   [`frame::MessageConnection`]

/// Re-export transport types.
pub mod transport {
    pub use recwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use recwire_frame::*;
}

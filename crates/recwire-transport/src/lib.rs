//! Stream socket transport abstraction.
//!
//! Provides a unified interface over the stream transports the protocol can
//! run on:
//! - TCP sockets
//! - Unix domain sockets (Unix platforms)
//!
//! This is the lowest layer of recwire. Everything else builds on top of
//! the [`WireStream`] type provided here.

pub mod error;
pub mod stream;

pub use error::{Result, TransportError};
pub use stream::WireStream;

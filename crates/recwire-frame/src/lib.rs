//! Delimited-record message framing for recwire.
//!
//! This is the core value-add layer of recwire. A message is an ordered
//! list of positional string fields plus named key/value parameters,
//! framed between control bytes:
//! - START (0x01) opens a frame, END (0x04) closes it
//! - RECORD SEPARATOR (0x1E) delimits fields
//! - FIELD SEPARATOR (0x1F) splits a parameter name from its value
//!
//! Field content is US-ASCII and must not contain the four control bytes.
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod connection;
pub mod error;
pub mod message;

pub use codec::{
    decode_message, encode_message, is_control_byte, FrameConfig, DEFAULT_MAX_FRAME, END,
    FIELD_SEPARATOR, RECORD_SEPARATOR, START,
};
pub use connection::MessageConnection;
pub use error::{FrameError, Result};
pub use message::{Message, ERROR_COMMAND};

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::Message;

/// Marks the beginning of a frame (ASCII SOH).
pub const START: u8 = 0x01;
/// Marks the end of a frame (ASCII EOT).
pub const END: u8 = 0x04;
/// Separates fields within a frame (ASCII RS).
pub const RECORD_SEPARATOR: u8 = 0x1E;
/// Separates a parameter name from its value (ASCII US).
pub const FIELD_SEPARATOR: u8 = 0x1F;

/// Default maximum frame size: 1 MiB.
pub const DEFAULT_MAX_FRAME: usize = 1024 * 1024;

/// Returns true for the four bytes reserved by the framing grammar.
///
/// Field content containing any of these corrupts framing; the codec does
/// not escape or reject them.
pub fn is_control_byte(byte: u8) -> bool {
    matches!(byte, START | END | RECORD_SEPARATOR | FIELD_SEPARATOR)
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬─────────┬──────────────────────────────────────┬───────┐
/// │ START │ part[0] │ (RS part | RS name FS value)*        │ END   │
/// │ 0x01  │         │ RS = 0x1E, FS = 0x1F                 │ 0x04  │
/// └───────┴─────────┴──────────────────────────────────────┴───────┘
/// ```
///
/// All text is encoded as US-ASCII; a non-ASCII character becomes `?`.
/// A message with zero positional parts encodes to nothing at all — the
/// degenerate no-op case, not an error.
pub fn encode_message(message: &Message, dst: &mut BytesMut) {
    let Some(command) = message.parts.first() else {
        return;
    };

    let text_len: usize = message.parts.iter().map(String::len).sum::<usize>()
        + message
            .named
            .iter()
            .map(|(name, value)| name.len() + value.len() + 1)
            .sum::<usize>();
    dst.reserve(2 + text_len + message.parts.len() + message.named.len());

    dst.put_u8(START);
    put_ascii(dst, command);
    for part in &message.parts[1..] {
        dst.put_u8(RECORD_SEPARATOR);
        put_ascii(dst, part);
    }
    for (name, value) in &message.named {
        dst.put_u8(RECORD_SEPARATOR);
        put_ascii(dst, name);
        dst.put_u8(FIELD_SEPARATOR);
        put_ascii(dst, value);
    }
    dst.put_u8(END);
}

/// Decode one message from an accumulation buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame's bytes from the buffer; bytes
/// after END stay put for the next call.
///
/// A first byte other than START fails with [`FrameError::MissingStart`]
/// without consuming anything: once framing is lost there is no reliable
/// resynchronization point in this grammar, so the connection should be
/// closed. A buffer that outgrows `max_frame` without an END byte fails
/// with [`FrameError::FrameTooLarge`].
pub fn decode_message(src: &mut BytesMut, max_frame: usize) -> Result<Option<Message>> {
    let Some(&first) = src.first() else {
        return Ok(None); // Need more data
    };
    if first != START {
        return Err(FrameError::MissingStart);
    }

    let Some(end_offset) = src[1..].iter().position(|&b| b == END) else {
        if src.len() > max_frame {
            return Err(FrameError::FrameTooLarge {
                size: src.len(),
                max: max_frame,
            });
        }
        return Ok(None); // Need more data
    };

    let end = 1 + end_offset;
    if end + 1 > max_frame {
        return Err(FrameError::FrameTooLarge {
            size: end + 1,
            max: max_frame,
        });
    }

    let frame = src.split_to(end + 1);
    Ok(Some(parse_fields(&frame[1..end])))
}

/// Split a frame body into positional parts and named parameters.
fn parse_fields(body: &[u8]) -> Message {
    let mut message = Message::default();
    let mut pending_name: Option<String> = None;
    let mut field_start = 0;

    for (i, &byte) in body.iter().enumerate() {
        match byte {
            // The accumulated bytes are a parameter name; the value follows.
            FIELD_SEPARATOR => {
                pending_name = Some(ascii_to_string(&body[field_start..i]));
                field_start = i + 1;
            }
            // The accumulated bytes are a completed field, named or positional.
            RECORD_SEPARATOR => {
                let field = ascii_to_string(&body[field_start..i]);
                commit_field(&mut message, &mut pending_name, field);
                field_start = i + 1;
            }
            _ => {}
        }
    }

    // A non-empty residue at END is one final field. An empty residue is
    // dropped, discarding any pending parameter name with it.
    if field_start < body.len() {
        let field = ascii_to_string(&body[field_start..]);
        commit_field(&mut message, &mut pending_name, field);
    }

    message
}

fn commit_field(message: &mut Message, pending_name: &mut Option<String>, field: String) {
    match pending_name.take() {
        Some(name) => {
            message.named.insert(name, field);
        }
        None => message.parts.push(field),
    }
}

/// US-ASCII encode: any non-ASCII character becomes `?`, as the historical
/// charset encoder did.
fn put_ascii(dst: &mut BytesMut, text: &str) {
    for ch in text.chars() {
        dst.put_u8(if ch.is_ascii() { ch as u8 } else { b'?' });
    }
}

/// US-ASCII decode: any byte above 0x7F becomes U+FFFD.
fn ascii_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b < 0x80 { b as char } else { '\u{FFFD}' })
        .collect()
}

/// Configuration for message framing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum frame size in bytes (START through END). Default: 1 MiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(wire: &[u8]) -> Message {
        let mut buf = BytesMut::from(wire);
        decode_message(&mut buf, DEFAULT_MAX_FRAME).unwrap().unwrap()
    }

    #[test]
    fn roundtrip_parts_and_params() {
        let msg = Message::from_parts(["task", "run", "now"])
            .with_param("priority", "high")
            .with_param("owner", "jo");

        let mut wire = BytesMut::new();
        encode_message(&msg, &mut wire);
        let decoded = decode_message(&mut wire, DEFAULT_MAX_FRAME)
            .unwrap()
            .unwrap();

        assert_eq!(decoded, msg);
        assert!(wire.is_empty());
    }

    #[test]
    fn zero_parts_encode_to_nothing() {
        let mut wire = BytesMut::new();
        encode_message(&Message::default(), &mut wire);
        assert!(wire.is_empty());

        // Named parameters alone do not make a transmittable message.
        let msg = Message {
            parts: vec![],
            named: [("k".to_string(), "v".to_string())].into(),
        };
        encode_message(&msg, &mut wire);
        assert!(wire.is_empty());
    }

    #[test]
    fn named_vs_positional_disambiguation() {
        let decoded = decode_one(b"\x01cmd\x1ename\x1fvalue\x04");
        assert_eq!(decoded.parts, vec!["cmd"]);
        assert_eq!(decoded.param("name"), Some("value"));
        assert_eq!(decoded.named.len(), 1);
    }

    #[test]
    fn multiple_positional_parts() {
        let decoded = decode_one(b"\x01a\x1eb\x1ec\x04");
        assert_eq!(decoded.parts, vec!["a", "b", "c"]);
        assert!(decoded.named.is_empty());
    }

    #[test]
    fn leading_named_parameter() {
        // Only a field closed without FS is positional; a FS in the first
        // field still makes it a parameter name.
        let decoded = decode_one(b"\x01k\x1fv\x04");
        assert!(decoded.parts.is_empty());
        assert_eq!(decoded.param("k"), Some("v"));
    }

    #[test]
    fn empty_frame_decodes_to_empty_message() {
        let decoded = decode_one(b"\x01\x04");
        assert!(decoded.parts.is_empty());
        assert!(decoded.named.is_empty());
    }

    #[test]
    fn intermediate_empty_field_kept_trailing_dropped() {
        // RS with nothing accumulated commits an empty positional part;
        // an empty residue at END commits nothing.
        let decoded = decode_one(b"\x01a\x1e\x1eb\x1e\x04");
        assert_eq!(decoded.parts, vec!["a", "", "b"]);
    }

    #[test]
    fn pending_name_with_empty_value_is_discarded() {
        let decoded = decode_one(b"\x01cmd\x1ename\x1f\x04");
        assert_eq!(decoded.parts, vec!["cmd"]);
        assert!(decoded.named.is_empty());
    }

    #[test]
    fn missing_start_fails() {
        let mut buf = BytesMut::from(&b"xcmd\x04"[..]);
        let err = decode_message(&mut buf, DEFAULT_MAX_FRAME).unwrap_err();
        assert!(matches!(err, FrameError::MissingStart));
    }

    #[test]
    fn incomplete_frame_needs_more_data() {
        let mut buf = BytesMut::new();
        assert!(decode_message(&mut buf, DEFAULT_MAX_FRAME)
            .unwrap()
            .is_none());

        buf.extend_from_slice(b"\x01partial");
        assert!(decode_message(&mut buf, DEFAULT_MAX_FRAME)
            .unwrap()
            .is_none());
        // Nothing consumed while waiting.
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn two_frames_back_to_back() {
        let mut buf = BytesMut::from(&b"\x01one\x04\x01two\x04"[..]);

        let first = decode_message(&mut buf, DEFAULT_MAX_FRAME)
            .unwrap()
            .unwrap();
        assert_eq!(first.parts, vec!["one"]);

        let second = decode_message(&mut buf, DEFAULT_MAX_FRAME)
            .unwrap()
            .unwrap();
        assert_eq!(second.parts, vec!["two"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn unterminated_frame_over_limit_is_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u8(START);
        buf.extend_from_slice(&vec![b'a'; 64]);

        let err = decode_message(&mut buf, 32).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { max: 32, .. }));
    }

    #[test]
    fn complete_frame_over_limit_is_too_large() {
        let mut wire = BytesMut::new();
        encode_message(&Message::new("a".repeat(64)), &mut wire);

        let err = decode_message(&mut wire, 32).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
    }

    #[test]
    fn long_field_grows_the_buffer() {
        // Far beyond the historical 2048-byte fixed buffer.
        let long = "x".repeat(512 * 1024);
        let msg = Message::new("blob").with_part(long.clone());

        let mut wire = BytesMut::new();
        encode_message(&msg, &mut wire);
        let decoded = decode_message(&mut wire, DEFAULT_MAX_FRAME)
            .unwrap()
            .unwrap();

        assert_eq!(decoded.parts[1], long);
    }

    #[test]
    fn non_ascii_encodes_as_question_mark() {
        let mut wire = BytesMut::new();
        encode_message(&Message::new("caf\u{e9}"), &mut wire);
        assert_eq!(&wire[..], b"\x01caf?\x04");
    }

    #[test]
    fn high_bytes_decode_as_replacement_char() {
        let decoded = decode_one(b"\x01a\xffb\x04");
        assert_eq!(decoded.parts, vec!["a\u{fffd}b"]);
    }

    #[test]
    fn control_byte_predicate() {
        for byte in [START, END, RECORD_SEPARATOR, FIELD_SEPARATOR] {
            assert!(is_control_byte(byte));
        }
        assert!(!is_control_byte(b'A'));
        assert!(!is_control_byte(0x00));
    }
}

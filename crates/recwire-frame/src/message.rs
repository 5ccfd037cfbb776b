use std::collections::HashMap;

/// First positional part of an in-band error report.
pub const ERROR_COMMAND: &str = "ERROR";

/// A protocol message: ordered positional parts plus named parameters.
///
/// `parts[0]` is by convention the message's logical command. Field content
/// must not contain any of the four reserved control bytes and is expected
/// to be 7-bit ASCII; the codec performs no validation (see
/// [`Message::is_wire_safe`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Ordered positional fields; order is semantically significant.
    pub parts: Vec<String>,
    /// Named parameters; keys unique, iteration order insignificant.
    pub named: HashMap<String, String>,
}

impl Message {
    /// Create a message with a single positional part (the command).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            parts: vec![command.into()],
            named: HashMap::new(),
        }
    }

    /// Create a message from an ordered sequence of positional parts.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            named: HashMap::new(),
        }
    }

    /// Create the in-band error report sent to a peer on protocol violations.
    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self::from_parts([ERROR_COMMAND.to_string(), diagnostic.into()])
    }

    /// Append a positional part.
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Set a named parameter, replacing any previous value for the name.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// The logical command, i.e. the first positional part.
    pub fn command(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }

    /// Look up a named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Whether this message has zero positional parts.
    ///
    /// Such a message is a transmission no-op: encoding it produces no
    /// bytes and writing it sends nothing.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether this message is an in-band error report from the peer.
    pub fn is_error(&self) -> bool {
        self.command() == Some(ERROR_COMMAND)
    }

    /// Whether every part, parameter name, and parameter value is 7-bit
    /// ASCII and free of the four reserved control bytes.
    ///
    /// The codec does not enforce this; content that fails this check
    /// corrupts framing or is mis-encoded on the wire.
    pub fn is_wire_safe(&self) -> bool {
        let field_ok = |s: &String| {
            s.bytes()
                .all(|b| b.is_ascii() && !crate::codec::is_control_byte(b))
        };
        self.parts.iter().all(field_ok)
            && self.named.keys().all(field_ok)
            && self.named.values().all(field_ok)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.parts.join(", "))?;
        if !self.named.is_empty() {
            // Sort for a stable rendering; map order is insignificant.
            let mut params: Vec<_> = self.named.iter().collect();
            params.sort();
            write!(f, " {{")?;
            for (i, (name, value)) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{name}={value}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_shape() {
        let msg = Message::new("status")
            .with_part("detailed")
            .with_param("verbosity", "3");

        assert_eq!(msg.command(), Some("status"));
        assert_eq!(msg.parts, vec!["status", "detailed"]);
        assert_eq!(msg.param("verbosity"), Some("3"));
        assert_eq!(msg.param("missing"), None);
        assert!(!msg.is_empty());
    }

    #[test]
    fn with_param_replaces_previous_value() {
        let msg = Message::new("cmd")
            .with_param("key", "old")
            .with_param("key", "new");
        assert_eq!(msg.param("key"), Some("new"));
        assert_eq!(msg.named.len(), 1);
    }

    #[test]
    fn default_message_is_empty() {
        let msg = Message::default();
        assert!(msg.is_empty());
        assert_eq!(msg.command(), None);
    }

    #[test]
    fn error_helper() {
        let msg = Message::error("bad frame");
        assert!(msg.is_error());
        assert_eq!(msg.parts, vec!["ERROR", "bad frame"]);
        assert!(!Message::new("OK").is_error());
    }

    #[test]
    fn wire_safety() {
        assert!(Message::new("ping").with_param("seq", "42").is_wire_safe());
        assert!(!Message::new("bad\u{1}part").is_wire_safe());
        assert!(!Message::new("cmd").with_param("k", "v\u{1e}w").is_wire_safe());
        assert!(!Message::new("caf\u{e9}").is_wire_safe());
    }

    #[test]
    fn display_is_stable() {
        let msg = Message::new("get")
            .with_param("b", "2")
            .with_param("a", "1");
        assert_eq!(msg.to_string(), "[get] {a=1, b=2}");
        assert_eq!(Message::new("ping").to_string(), "[ping]");
    }
}

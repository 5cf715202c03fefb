//! Socket server protocol message types
//!
//! Defines the JSON message format exchanged with the desktop client. Every
//! frame carries one [`Message`]; requests and responses share the envelope.
//!
//! Command and status travel as integers on the wire. Unknown integers decode
//! to [`CommandKind::Unknown`] / [`StatusKind::Failed`] instead of failing the
//! whole frame, so the client always gets an answer for a well-formed object.

use serde::{Deserialize, Serialize};

use crate::fonts::FontRecord;

/// The only protocol version this agent speaks. Stamped on every response.
pub const PROTOCOL_VERSION: u32 = 1;

/// Command carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "i64", into = "i64")]
pub enum CommandKind {
    /// Install the font at the supplied path
    AddFont,
    /// Remove a previously installed font by id
    DelFont,
    /// List installed fonts
    GetFont,
    /// Keepalive
    Heartbeat,
    /// Anything else
    #[default]
    Unknown,
}

impl CommandKind {
    pub fn code(self) -> i64 {
        match self {
            Self::AddFont => 0,
            Self::DelFont => 1,
            Self::GetFont => 2,
            Self::Heartbeat => 3,
            Self::Unknown => 4,
        }
    }
}

impl From<i64> for CommandKind {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::AddFont,
            1 => Self::DelFont,
            2 => Self::GetFont,
            3 => Self::Heartbeat,
            _ => Self::Unknown,
        }
    }
}

impl From<CommandKind> for i64 {
    fn from(kind: CommandKind) -> Self {
        kind.code()
    }
}

/// Outcome carried by a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "i64", into = "i64")]
pub enum StatusKind {
    /// Request completed; payload is in `message`/`fonts`
    #[default]
    Ok,
    /// Request still in progress
    Wait,
    /// Request failed; reason is in `message`
    Failed,
}

impl StatusKind {
    pub fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::Wait => 1,
            Self::Failed => 2,
        }
    }
}

impl From<i64> for StatusKind {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Wait,
            _ => Self::Failed,
        }
    }
}

impl From<StatusKind> for i64 {
    fn from(status: StatusKind) -> Self {
        status.code()
    }
}

/// Wire envelope shared by requests and responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Message {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde(rename = "message")]
    pub text: String,
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontRecord>,
}

impl Message {
    /// Build a request, mostly useful for clients and tests
    pub fn request(kind: CommandKind, fonts: Vec<FontRecord>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind,
            fonts,
            ..Self::default()
        }
    }

    /// Successful response
    pub fn ok(kind: CommandKind, text: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind,
            text: text.into(),
            status: StatusKind::Ok,
            fonts: Vec::new(),
        }
    }

    /// Failed response
    pub fn failed(kind: CommandKind, text: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind,
            text: text.into(),
            status: StatusKind::Failed,
            fonts: Vec::new(),
        }
    }

    pub fn with_fonts(mut self, fonts: Vec<FontRecord>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusKind::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parse() {
        let json = r#"{"version":1,"type":0,"message":"","status":0,"fonts":[{"id":"","path":"/tmp/Inter.ttf","name":"Inter.ttf"}]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, CommandKind::AddFont);
        assert_eq!(msg.fonts.len(), 1);
        assert_eq!(msg.fonts[0].path, "/tmp/Inter.ttf");
        assert_eq!(msg.fonts[0].display_name, "Inter.ttf");
    }

    #[test]
    fn test_unknown_type_code_decodes() {
        let msg: Message = serde_json::from_str(r#"{"type":99}"#).unwrap();
        assert_eq!(msg.kind, CommandKind::Unknown);
        assert_eq!(msg.version, 0);
        assert!(msg.fonts.is_empty());
    }

    #[test]
    fn test_missing_font_fields_default() {
        let msg: Message = serde_json::from_str(r#"{"type":1,"fonts":[{"id":"abc"}]}"#).unwrap();
        assert_eq!(msg.kind, CommandKind::DelFont);
        assert_eq!(msg.fonts[0].id, "abc");
        assert!(msg.fonts[0].path.is_empty());
    }

    #[test]
    fn test_response_shape() {
        let value = serde_json::to_value(Message::failed(CommandKind::Unknown, "nope")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"version": 1, "type": 4, "message": "nope", "status": 2})
        );

        let listed = Message::ok(CommandKind::GetFont, "").with_fonts(vec![FontRecord {
            id: "1".to_string(),
            path: "/f/a.ttf".to_string(),
            display_name: "a.ttf".to_string(),
        }]);
        let value = serde_json::to_value(listed).unwrap();
        assert_eq!(value["fonts"][0]["name"], "a.ttf");
        assert_eq!(value["status"], 0);
    }

    #[test]
    fn test_wrong_field_type_is_decode_error() {
        assert!(serde_json::from_str::<Message>(r#"{"type":"add"}"#).is_err());
        assert!(serde_json::from_str::<Message>("not json").is_err());
    }
}

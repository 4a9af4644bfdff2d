use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// One inbound control line, as it appears on the wire:
/// `{"target":"MCU","cmd_type":"GET"|"CMD","cmd":"<verb [args...]>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub target: String,
    pub cmd_type: String,
    pub cmd: String,
}

/// The two recognized command classes. Anything else on the wire is left to
/// the dispatcher, which answers `Unknown command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    Query,
    Action,
}

impl CommandClass {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Self::Query),
            "CMD" => Some(Self::Action),
            _ => None,
        }
    }
}

/// Vehicle-state snapshot returned for `STATE` queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub armed: bool,
    pub mode: String,
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
    pub battery_v: Option<f32>,
}

/// Everything the dispatcher may answer with. Encoded responses are single
/// lines; the transport appends the newline.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    UnknownCommand,
    InvalidTarget,
    InvalidFormat,
    Error(String),
    State(StateRecord),
}

pub fn decode_request(line: &str) -> Result<Request, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(line.trim())
        .map_err(|e| DecodeError::MalformedSyntax(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedSyntax("not a JSON object".into()))?;

    let field = |name: &'static str| {
        obj.get(name)
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or(DecodeError::MissingField(name))
    };

    Ok(Request {
        target: field("target")?,
        cmd_type: field("cmd_type")?,
        cmd: field("cmd")?,
    })
}

pub fn encode_response(resp: &Response) -> String {
    match resp {
        Response::Ok => "OK".into(),
        Response::UnknownCommand => "Unknown command".into(),
        Response::InvalidTarget => "Invalid target".into(),
        Response::InvalidFormat => "Invalid command format".into(),
        Response::Error(msg) => format!("Error: {msg}"),
        Response::State(st) => serde_json::to_string(st)
            .unwrap_or_else(|e| format!("Error: state serialization: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_request() {
        let req = decode_request(r#"{"target":"MCU","cmd_type":"CMD","cmd":"ARM"}"#).unwrap();
        assert_eq!(
            req,
            Request {
                target: "MCU".into(),
                cmd_type: "CMD".into(),
                cmd: "ARM".into()
            }
        );
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            decode_request("ARM please"),
            Err(DecodeError::MalformedSyntax(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            decode_request(r#"{"target":"MCU","cmd":"ARM"}"#),
            Err(DecodeError::MissingField("cmd_type"))
        ));
        assert!(matches!(
            decode_request(r#"{"cmd_type":"CMD","cmd":"ARM"}"#),
            Err(DecodeError::MissingField("target"))
        ));
        // present but not a string counts as missing
        assert!(matches!(
            decode_request(r#"{"target":"MCU","cmd_type":7,"cmd":"ARM"}"#),
            Err(DecodeError::MissingField("cmd_type"))
        ));
    }

    #[test]
    fn command_class_wire_names() {
        assert_eq!(CommandClass::parse("GET"), Some(CommandClass::Query));
        assert_eq!(CommandClass::parse("CMD"), Some(CommandClass::Action));
        assert_eq!(CommandClass::parse("PUT"), None);
    }

    #[test]
    fn encodes_status_tokens() {
        assert_eq!(encode_response(&Response::Ok), "OK");
        assert_eq!(encode_response(&Response::UnknownCommand), "Unknown command");
        assert_eq!(encode_response(&Response::InvalidTarget), "Invalid target");
        assert_eq!(
            encode_response(&Response::Error("boom".into())),
            "Error: boom"
        );
    }

    #[test]
    fn encodes_state_record_as_json() {
        let st = StateRecord {
            armed: true,
            mode: "GUIDED".into(),
            lat: 1.0,
            lon: 2.0,
            alt_m: 3.5,
            battery_v: Some(11.1),
        };
        let line = encode_response(&Response::State(st.clone()));
        let back: StateRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, st);
    }
}

use crate::DecodeError;

/// Compact per-vehicle command, encoded as `{T:<target>;C:<command>;P:<payload>}`.
///
/// The payload is carried opaquely and never escaped: callers must not put
/// `;`, `{` or `}` in it. The ground side only writes this form; the decoder
/// exists for symmetry and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCommand {
    pub target: String,
    pub command: String,
    pub payload: String,
}

impl WireCommand {
    pub fn new(
        target: impl Into<String>,
        command: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            command: command.into(),
            payload: payload.into(),
        }
    }
}

pub fn encode_wire_command(cmd: &WireCommand) -> String {
    debug_assert!(
        !cmd.payload.contains([';', '{', '}']),
        "payload must not contain delimiter characters"
    );
    format!("{{T:{};C:{};P:{}}}", cmd.target, cmd.command, cmd.payload)
}

pub fn decode_wire_command(line: &str) -> Result<WireCommand, DecodeError> {
    let inner = line
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| DecodeError::MalformedSyntax("missing braces".into()))?;

    let mut target = None;
    let mut command = None;
    let mut payload = None;
    for part in inner.splitn(3, ';') {
        match part.split_once(':') {
            Some(("T", v)) => target = Some(v.to_owned()),
            Some(("C", v)) => command = Some(v.to_owned()),
            Some(("P", v)) => payload = Some(v.to_owned()),
            _ => {
                return Err(DecodeError::MalformedSyntax(format!(
                    "unrecognized segment {part:?}"
                )))
            }
        }
    }

    Ok(WireCommand {
        target: target.ok_or(DecodeError::MissingField("T"))?,
        command: command.ok_or(DecodeError::MissingField("C"))?,
        payload: payload.ok_or(DecodeError::MissingField("P"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_exact_wire_form() {
        let cmd = WireCommand::new("D1", "MTL", "1.0,2.0,90");
        assert_eq!(encode_wire_command(&cmd), "{T:D1;C:MTL;P:1.0,2.0,90}");
    }

    #[test]
    fn round_trips() {
        let cmd = WireCommand::new("D1", "MTL", "1.0,2.0,90");
        let back = decode_wire_command(&encode_wire_command(&cmd)).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn decode_requires_braces_and_fields() {
        assert!(matches!(
            decode_wire_command("T:D1;C:MTL;P:1"),
            Err(DecodeError::MalformedSyntax(_))
        ));
        assert!(matches!(
            decode_wire_command("{T:D1;C:MTL}"),
            Err(DecodeError::MissingField("P"))
        ));
        assert!(matches!(
            decode_wire_command("{T:D1;X:MTL;P:1}"),
            Err(DecodeError::MalformedSyntax(_))
        ));
    }

    #[test]
    fn payload_with_colon_survives() {
        let back = decode_wire_command("{T:CD2;C:MSG;P:a:b}").unwrap();
        assert_eq!(back.payload, "a:b");
    }
}

use thiserror::Error;

use gcs_proto::request::CommandClass;

/// The closed verb set the controller understands. Argument arity and types
/// live in the variants, so a parsed action is always invocable as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleAction {
    QueryState,
    Arm,
    Disarm,
    SetMode(String),
    Takeoff(f64),
    Land,
    Goto { lat: f64, lon: f64, alt: f64 },
    Velocity { vx: f64, vy: f64, vz: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// Protocol outcome, not a fault: the line was valid but the verb is not
    /// in the table. Answered with `Unknown command`.
    #[error("unknown verb")]
    UnknownVerb,
    #[error("{verb}: {reason}")]
    BadArgument { verb: &'static str, reason: String },
}

impl VehicleAction {
    /// Parses a command body (`"GOTO 1.0 2.0 3.0"`) under the given class.
    /// Query verbs are only valid under `GET`, action verbs under `CMD`.
    pub fn parse(class: CommandClass, body: &str) -> Result<Self, ParseError> {
        let mut tokens = body.split_whitespace();
        let verb = tokens.next().ok_or(ParseError::UnknownVerb)?;
        let args: Vec<&str> = tokens.collect();

        match (class, verb) {
            (CommandClass::Query, "STATE") => {
                expect_arity("STATE", &args, 0)?;
                Ok(Self::QueryState)
            }
            (CommandClass::Action, "ARM") => {
                expect_arity("ARM", &args, 0)?;
                Ok(Self::Arm)
            }
            (CommandClass::Action, "DISARM") => {
                expect_arity("DISARM", &args, 0)?;
                Ok(Self::Disarm)
            }
            (CommandClass::Action, "MODE") => {
                expect_arity("MODE", &args, 1)?;
                Ok(Self::SetMode(args[0].to_owned()))
            }
            (CommandClass::Action, "TAKEOFF") => {
                expect_arity("TAKEOFF", &args, 1)?;
                Ok(Self::Takeoff(parse_float("TAKEOFF", args[0])?))
            }
            (CommandClass::Action, "LAND") => {
                expect_arity("LAND", &args, 0)?;
                Ok(Self::Land)
            }
            (CommandClass::Action, "GOTO") => {
                expect_arity("GOTO", &args, 3)?;
                Ok(Self::Goto {
                    lat: parse_float("GOTO", args[0])?,
                    lon: parse_float("GOTO", args[1])?,
                    alt: parse_float("GOTO", args[2])?,
                })
            }
            (CommandClass::Action, "VEL") => {
                expect_arity("VEL", &args, 3)?;
                Ok(Self::Velocity {
                    vx: parse_float("VEL", args[0])?,
                    vy: parse_float("VEL", args[1])?,
                    vz: parse_float("VEL", args[2])?,
                })
            }
            _ => Err(ParseError::UnknownVerb),
        }
    }
}

fn expect_arity(verb: &'static str, args: &[&str], want: usize) -> Result<(), ParseError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(ParseError::BadArgument {
            verb,
            reason: format!("expected {} argument(s), got {}", want, args.len()),
        })
    }
}

fn parse_float(verb: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.parse().map_err(|_| ParseError::BadArgument {
        verb,
        reason: format!("not a number: {raw:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_proto::request::CommandClass::{Action, Query};

    #[test]
    fn parses_every_verb() {
        assert_eq!(VehicleAction::parse(Query, "STATE"), Ok(VehicleAction::QueryState));
        assert_eq!(VehicleAction::parse(Action, "ARM"), Ok(VehicleAction::Arm));
        assert_eq!(VehicleAction::parse(Action, "DISARM"), Ok(VehicleAction::Disarm));
        assert_eq!(
            VehicleAction::parse(Action, "MODE flip"),
            Ok(VehicleAction::SetMode("flip".into()))
        );
        assert_eq!(
            VehicleAction::parse(Action, "TAKEOFF 12.5"),
            Ok(VehicleAction::Takeoff(12.5))
        );
        assert_eq!(VehicleAction::parse(Action, "LAND"), Ok(VehicleAction::Land));
        assert_eq!(
            VehicleAction::parse(Action, "GOTO 1.0 2.0 3.0"),
            Ok(VehicleAction::Goto { lat: 1.0, lon: 2.0, alt: 3.0 })
        );
        assert_eq!(
            VehicleAction::parse(Action, "VEL 0.1 0.2 0.3"),
            Ok(VehicleAction::Velocity { vx: 0.1, vy: 0.2, vz: 0.3 })
        );
    }

    #[test]
    fn class_gates_the_verb() {
        // STATE is a query, not an action, and vice versa.
        assert_eq!(VehicleAction::parse(Action, "STATE"), Err(ParseError::UnknownVerb));
        assert_eq!(VehicleAction::parse(Query, "ARM"), Err(ParseError::UnknownVerb));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(matches!(
            VehicleAction::parse(Action, "TAKEOFF abc"),
            Err(ParseError::BadArgument { verb: "TAKEOFF", .. })
        ));
        assert!(matches!(
            VehicleAction::parse(Action, "GOTO 1.0 x 3.0"),
            Err(ParseError::BadArgument { verb: "GOTO", .. })
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(matches!(
            VehicleAction::parse(Action, "GOTO 1.0 2.0"),
            Err(ParseError::BadArgument { verb: "GOTO", .. })
        ));
        assert!(matches!(
            VehicleAction::parse(Action, "ARM now"),
            Err(ParseError::BadArgument { verb: "ARM", .. })
        ));
    }

    #[test]
    fn unknown_verbs_are_a_protocol_outcome() {
        assert_eq!(VehicleAction::parse(Action, "DANCE"), Err(ParseError::UnknownVerb));
        assert_eq!(VehicleAction::parse(Action, ""), Err(ParseError::UnknownVerb));
    }
}

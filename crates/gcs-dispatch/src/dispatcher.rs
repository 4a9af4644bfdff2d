use anyhow::Result;
use tracing::{debug, warn};

use gcs_proto::request::{decode_request, encode_response, CommandClass, Response, StateRecord};

use crate::action::{ParseError, VehicleAction};

/// Reserved identifier for the flight controller itself; inbound requests
/// addressed to anything else are refused before any action runs.
pub const CONTROLLER_ID: &str = "MCU";

/// Capability set the dispatcher drives. Implementations own all cross-line
/// state; the dispatcher keeps none.
pub trait VehicleActor {
    fn arm(&mut self) -> Result<()>;
    fn disarm(&mut self) -> Result<()>;
    fn set_mode(&mut self, mode: &str) -> Result<()>;
    fn takeoff(&mut self, alt: f64) -> Result<()>;
    fn land(&mut self) -> Result<()>;
    fn goto(&mut self, lat: f64, lon: f64, alt: f64) -> Result<()>;
    fn set_velocity(&mut self, vx: f64, vy: f64, vz: f64) -> Result<()>;
    fn state(&self) -> Result<StateRecord>;
}

pub struct Dispatcher<A: VehicleActor> {
    actor: A,
}

impl<A: VehicleActor> Dispatcher<A> {
    pub fn new(actor: A) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    /// Handles one received line and returns the encoded response line.
    /// Every failure is converted to a response here; a bad line must never
    /// take the session down.
    pub fn handle_line(&mut self, line: &str) -> String {
        let resp = self.respond(line);
        let encoded = encode_response(&resp);
        debug!(line, resp = %encoded, "dispatched");
        encoded
    }

    fn respond(&mut self, line: &str) -> Response {
        let req = match decode_request(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("bad request line: {e}");
                return Response::InvalidFormat;
            }
        };

        if req.target != CONTROLLER_ID {
            return Response::InvalidTarget;
        }

        // Unrecognized class falls through to `Unknown command`, same as an
        // unrecognized verb.
        let Some(class) = CommandClass::parse(&req.cmd_type) else {
            return Response::UnknownCommand;
        };

        match VehicleAction::parse(class, &req.cmd) {
            Ok(action) => self.invoke(action),
            Err(ParseError::UnknownVerb) => Response::UnknownCommand,
            Err(e @ ParseError::BadArgument { .. }) => Response::Error(e.to_string()),
        }
    }

    fn invoke(&mut self, action: VehicleAction) -> Response {
        let outcome = match action {
            VehicleAction::QueryState => {
                return match self.actor.state() {
                    Ok(st) => Response::State(st),
                    Err(e) => Response::Error(format!("{e:#}")),
                }
            }
            VehicleAction::Arm => self.actor.arm(),
            VehicleAction::Disarm => self.actor.disarm(),
            VehicleAction::SetMode(mode) => self.actor.set_mode(&mode),
            VehicleAction::Takeoff(alt) => self.actor.takeoff(alt),
            VehicleAction::Land => self.actor.land(),
            VehicleAction::Goto { lat, lon, alt } => self.actor.goto(lat, lon, alt),
            VehicleAction::Velocity { vx, vy, vz } => self.actor.set_velocity(vx, vy, vz),
        };

        match outcome {
            Ok(()) => Response::Ok,
            Err(e) => {
                warn!("vehicle action failed: {e:#}");
                Response::Error(format!("{e:#}"))
            }
        }
    }
}

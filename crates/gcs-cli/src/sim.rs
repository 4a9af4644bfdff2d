use anyhow::{bail, Result};
use tracing::info;

use gcs_dispatch::VehicleActor;
use gcs_proto::request::StateRecord;

/// Bench-test vehicle: tracks arm/mode/position state and logs every action,
/// so `gcsd serve` can be exercised against a real radio without a flight
/// controller attached.
pub struct SimVehicle {
    armed: bool,
    mode: String,
    lat: f64,
    lon: f64,
    alt_m: f64,
}

impl Default for SimVehicle {
    fn default() -> Self {
        Self {
            armed: false,
            mode: "STABILIZE".into(),
            lat: 0.0,
            lon: 0.0,
            alt_m: 0.0,
        }
    }
}

impl VehicleActor for SimVehicle {
    fn arm(&mut self) -> Result<()> {
        info!("sim: arm");
        self.armed = true;
        Ok(())
    }

    fn disarm(&mut self) -> Result<()> {
        info!("sim: disarm");
        self.armed = false;
        Ok(())
    }

    fn set_mode(&mut self, mode: &str) -> Result<()> {
        info!(mode, "sim: set mode");
        self.mode = mode.to_owned();
        Ok(())
    }

    fn takeoff(&mut self, alt: f64) -> Result<()> {
        if !self.armed {
            bail!("takeoff refused: not armed");
        }
        info!(alt, "sim: takeoff");
        self.alt_m = alt;
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        info!("sim: land");
        self.alt_m = 0.0;
        Ok(())
    }

    fn goto(&mut self, lat: f64, lon: f64, alt: f64) -> Result<()> {
        info!(lat, lon, alt, "sim: goto");
        self.lat = lat;
        self.lon = lon;
        self.alt_m = alt;
        Ok(())
    }

    fn set_velocity(&mut self, vx: f64, vy: f64, vz: f64) -> Result<()> {
        info!(vx, vy, vz, "sim: velocity");
        Ok(())
    }

    fn state(&self) -> Result<StateRecord> {
        Ok(StateRecord {
            armed: self.armed,
            mode: self.mode.clone(),
            lat: self.lat,
            lon: self.lon,
            alt_m: self.alt_m,
            battery_v: Some(12.6),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takeoff_requires_arming() {
        let mut v = SimVehicle::default();
        assert!(v.takeoff(10.0).is_err());
        v.arm().unwrap();
        v.takeoff(10.0).unwrap();
        assert_eq!(v.state().unwrap().alt_m, 10.0);
    }
}

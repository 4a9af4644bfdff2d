use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use gcs_proto::wire::WireCommand;

use crate::SYNC_TRACK_ID;

/// Delay applied when the synchronization track is shorter than the mission.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 1000;

/// Movement verb understood by every vehicle: move-to-location.
pub const MOVE_COMMAND: &str = "MTL";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read mission file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse mission: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mission has no `MCU` synchronization track")]
    MissingSyncTrack,
}

/// Raw mission file as the planner saves it. Unknown fields (timestamps,
/// editor metadata) are accepted and ignored. `BTreeMap` fixes the
/// per-vehicle iteration order to ascending identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MissionData {
    #[serde(default)]
    playback_speed: Option<u64>,
    drones: BTreeMap<String, Track>,
    #[serde(default)]
    custom_commands: Vec<(usize, Vec<CustomCommand>)>,
}

#[derive(Debug, Clone, Deserialize)]
struct Track {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, Deserialize)]
struct Frame {
    position: Position,
    heading: f64,
    #[serde(default = "default_delay")]
    delay: u64,
}

fn default_delay() -> u64 {
    DEFAULT_FRAME_DELAY_MS
}

/// Planner positions are authored in 3D; only the ground-plane `x`/`z` pair
/// and the heading go on the wire.
#[derive(Debug, Clone, Deserialize)]
struct Position {
    x: f64,
    #[serde(default)]
    #[allow(dead_code)]
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomCommand {
    drone_id: String,
    command: String,
    payload: String,
}

/// One synchronized instant of the choreography: every due movement command,
/// then the custom commands authored for this index, plus the frame delay.
/// Immutable once compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFrame {
    pub frame_index: usize,
    pub commands: Vec<WireCommand>,
    pub delay_ms: u64,
}

/// A validated, compiled mission. Compilation happens once at load; the
/// scheduler only ever reads the result.
#[derive(Debug, Clone, Default)]
pub struct Mission {
    vehicles: Vec<String>,
    frames: Vec<CompiledFrame>,
}

impl Mission {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let mission = Self::from_json(&raw)?;
        info!(
            path = %path.as_ref().display(),
            vehicles = mission.vehicles.len(),
            frames = mission.frames.len(),
            "mission loaded"
        );
        Ok(mission)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let data: MissionData = serde_json::from_str(raw)?;
        if !data.drones.contains_key(SYNC_TRACK_ID) {
            return Err(LoadError::MissingSyncTrack);
        }
        Ok(Self::compile(&data))
    }

    /// All vehicle identifiers in the mission, ascending, sync track included.
    pub fn vehicles(&self) -> &[String] {
        &self.vehicles
    }

    pub fn frames(&self) -> &[CompiledFrame] {
        &self.frames
    }

    fn compile(data: &MissionData) -> Self {
        // The sync track supplies delay only; frame count comes from the
        // longest real vehicle track.
        let max_frames = data
            .drones
            .iter()
            .filter(|(id, _)| id.as_str() != SYNC_TRACK_ID)
            .map(|(_, t)| t.frames.len())
            .max()
            .unwrap_or(0);

        let custom_by_frame: HashMap<usize, &Vec<CustomCommand>> = data
            .custom_commands
            .iter()
            .map(|(idx, cmds)| (*idx, cmds))
            .collect();
        let dropped = data
            .custom_commands
            .iter()
            .filter(|(idx, _)| *idx >= max_frames)
            .count();
        if dropped > 0 {
            debug!(dropped, max_frames, "custom commands beyond last frame dropped");
        }

        let sync = &data.drones[SYNC_TRACK_ID];
        let mut frames = Vec::with_capacity(max_frames);
        for frame_index in 0..max_frames {
            let mut commands = Vec::new();
            for (drone_id, track) in &data.drones {
                if drone_id == SYNC_TRACK_ID {
                    continue;
                }
                // Shorter tracks are skipped for this frame, not padded.
                if let Some(frame) = track.frames.get(frame_index) {
                    commands.push(WireCommand::new(
                        drone_id.clone(),
                        MOVE_COMMAND,
                        format!("{},{},{}", frame.position.x, frame.position.z, frame.heading),
                    ));
                }
            }
            if let Some(extra) = custom_by_frame.get(&frame_index) {
                for cmd in extra.iter() {
                    commands.push(WireCommand::new(
                        cmd.drone_id.clone(),
                        cmd.command.clone(),
                        cmd.payload.clone(),
                    ));
                }
            }

            let delay_ms = sync
                .frames
                .get(frame_index)
                .map(|f| f.delay)
                .unwrap_or_else(|| data.playback_speed.unwrap_or(DEFAULT_FRAME_DELAY_MS));

            frames.push(CompiledFrame {
                frame_index,
                commands,
                delay_ms,
            });
        }

        Self {
            vehicles: data.drones.keys().cloned().collect(),
            frames,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Lists `*.json` mission files in `dir`, ascending by name. A missing
/// directory is an empty list, not an error.
pub fn available_missions(dir: impl AsRef<Path>) -> Vec<MissionEntry> {
    let mut entries = Vec::new();
    let Ok(read) = std::fs::read_dir(dir.as_ref()) else {
        return entries;
    };
    for ent in read.flatten() {
        let path = ent.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                entries.push(MissionEntry {
                    name: name.to_owned(),
                    path,
                });
            }
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

use tracing::info;

use gcs_proto::wire::WireCommand;

use crate::mission::{CompiledFrame, Mission};

/// Linearizes a compiled mission into a pausable, strictly ordered frame
/// stream. Owns the compiled frames and the cursor; `build` swaps in a new
/// mission atomically, invalidating any in-flight cursor.
#[derive(Debug, Default)]
pub struct Scheduler {
    mission: Mission,
    cursor: usize,
    paused: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a mission and rewinds to frame 0. The pause flag is left
    /// alone, matching `reset`.
    pub fn build(&mut self, mission: Mission) {
        info!(frames = mission.frames().len(), "scheduler rebuilt");
        self.mission = mission;
        self.cursor = 0;
    }

    /// Returns the frame at the cursor and advances. `None` means the mission
    /// is exhausted, not that something failed.
    pub fn next(&mut self) -> Option<CompiledFrame> {
        let frame = self.mission.frames().get(self.cursor)?.clone();
        self.cursor += 1;
        Some(frame)
    }

    /// Random access without touching the cursor.
    pub fn peek(&self, frame_index: usize) -> Option<&CompiledFrame> {
        self.mission.frames().get(frame_index)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn total_frames(&self) -> usize {
        self.mission.frames().len()
    }

    /// Advisory only: the driving loop must stop calling `next()` while
    /// paused; the scheduler does not enforce it.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Emergency stop: one LAND per mission vehicle, then rewind. The only
    /// commands produced outside the compiled frames.
    pub fn abort_to_landing(&mut self) -> Vec<WireCommand> {
        let commands = self
            .mission
            .vehicles()
            .iter()
            .map(|id| WireCommand::new(id.clone(), "LAND", "1"))
            .collect();
        self.reset();
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission() -> Mission {
        Mission::from_json(
            r#"{
              "drones": {
                "MCU": { "frames": [
                  {"position":{"x":0,"z":0},"heading":0,"delay":100},
                  {"position":{"x":0,"z":0},"heading":0,"delay":200}
                ]},
                "CD1": { "frames": [
                  {"position":{"x":1,"z":1},"heading":0,"delay":1000},
                  {"position":{"x":2,"z":2},"heading":0,"delay":1000}
                ]},
                "CD2": { "frames": [
                  {"position":{"x":5,"z":5},"heading":0,"delay":1000}
                ]}
              }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn next_walks_frames_in_order_then_exhausts() {
        let mut s = Scheduler::new();
        s.build(mission());
        assert_eq!(s.total_frames(), 2);
        assert_eq!(s.next().unwrap().frame_index, 0);
        assert_eq!(s.next().unwrap().frame_index, 1);
        assert!(s.next().is_none());
        assert!(s.next().is_none());
    }

    #[test]
    fn peek_does_not_advance() {
        let mut s = Scheduler::new();
        s.build(mission());
        assert_eq!(s.peek(1).unwrap().frame_index, 1);
        assert!(s.peek(7).is_none());
        assert_eq!(s.next().unwrap().frame_index, 0);
    }

    #[test]
    fn reset_rewinds_cursor_only() {
        let mut s = Scheduler::new();
        s.build(mission());
        s.pause();
        s.next();
        s.reset();
        assert_eq!(s.next().unwrap().frame_index, 0);
        assert!(s.is_paused());
    }

    #[test]
    fn pause_is_advisory_and_resume_continues_in_place() {
        let mut s = Scheduler::new();
        s.build(mission());

        // a driver that honors the flag
        let mut tick = |s: &mut Scheduler| if s.is_paused() { None } else { s.next() };

        assert_eq!(tick(&mut s).unwrap().frame_index, 0);
        s.pause();
        assert!(tick(&mut s).is_none());
        assert!(tick(&mut s).is_none());
        s.resume();
        assert_eq!(tick(&mut s).unwrap().frame_index, 1);
    }

    #[test]
    fn abort_lands_every_vehicle_and_rewinds() {
        let mut s = Scheduler::new();
        s.build(mission());
        s.next();

        let cmds = s.abort_to_landing();
        assert_eq!(cmds.len(), 3);
        for cmd in &cmds {
            assert_eq!(cmd.command, "LAND");
            assert_eq!(cmd.payload, "1");
        }
        let targets: Vec<&str> = cmds.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(targets, vec!["CD1", "CD2", "MCU"]);

        assert_eq!(s.next().unwrap().frame_index, 0);
    }

    #[test]
    fn build_replaces_mission_and_rewinds() {
        let mut s = Scheduler::new();
        s.build(mission());
        s.next();
        s.next();
        s.build(mission());
        assert_eq!(s.next().unwrap().frame_index, 0);
    }
}

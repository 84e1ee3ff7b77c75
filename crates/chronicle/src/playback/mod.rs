mod report;

use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::actor::{ActorId, ActorKind, ActorSnapshot, VehicleWheels};
use crate::config::PlaybackConfig;
use crate::episode::Episode;
use crate::error::RecorderError;
use crate::packet::{ActorAdded, FrameHeader, Packet};
use crate::recording::{Frame, LogReader};

pub use report::{EntityIssue, PlaybackReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Scanning,
}

pub struct Replayer<R: Read> {
    config: PlaybackConfig,
    reader: Option<LogReader<R>>,
    /// Recorded database id to live actor.
    actors: HashMap<u32, ActorId>,
    /// Recorded actors deliberately not replayed.
    ignored: HashSet<u32>,
    report: PlaybackReport,
}

impl<R: Read> Replayer<R> {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            reader: None,
            actors: HashMap::new(),
            ignored: HashSet::new(),
            report: PlaybackReport::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.reader.is_some() {
            PlaybackState::Scanning
        } else {
            PlaybackState::Idle
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Starts a session. The report and id mapping of any previous
    /// session are discarded.
    pub fn open(&mut self, reader: LogReader<R>) -> Result<(), RecorderError> {
        if self.reader.is_some() {
            return Err(RecorderError::SessionActive);
        }
        log::info!(
            "replaying session on map '{}' started at {}",
            reader.session().map_name,
            reader.session().started_at
        );
        self.actors.clear();
        self.ignored.clear();
        self.report = PlaybackReport::default();
        self.reader = Some(reader);
        Ok(())
    }

    /// Applies the next frame. Returns `Ok(None)` once the log is
    /// exhausted or the time limit is passed; the session is then closed.
    pub fn step(&mut self, episode: &mut dyn Episode) -> Result<Option<FrameHeader>, RecorderError> {
        let reader = self.reader.as_mut().ok_or(RecorderError::NotScanning)?;
        let frame = match reader.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.close("end of log");
                return Ok(None);
            }
            Err(e) => {
                log::error!("playback aborted: {e}");
                self.reader = None;
                return Err(e);
            }
        };

        if let Some(limit) = self.config.time_limit {
            if frame.header.elapsed > limit {
                self.close("time limit reached");
                return Ok(None);
            }
        }

        self.apply(episode, &frame);
        Ok(Some(frame.header))
    }

    pub fn play_to_end(&mut self, episode: &mut dyn Episode) -> Result<&PlaybackReport, RecorderError> {
        while self.step(episode)?.is_some() {}
        Ok(&self.report)
    }

    /// Ends the session between frames and returns the source.
    pub fn stop(&mut self) -> Option<R> {
        let reader = self.reader.take()?;
        log::info!("playback stopped after {} frames", self.report.frames);
        Some(reader.into_inner())
    }

    pub fn report(&self) -> &PlaybackReport {
        &self.report
    }

    pub fn take_report(&mut self) -> PlaybackReport {
        std::mem::take(&mut self.report)
    }

    /// Live actor currently standing in for a recorded one.
    pub fn live_actor(&self, database_id: u32) -> Option<ActorId> {
        self.actors.get(&database_id).copied()
    }

    fn close(&mut self, reason: &str) {
        if self.reader.take().is_some() {
            log::info!(
                "playback finished ({reason}): {} frames, {} issues",
                self.report.frames,
                self.report.issues.len()
            );
        }
    }

    fn apply(&mut self, episode: &mut dyn Episode, frame: &Frame) {
        let frame_id = frame.header.frame_id;
        for packet in &frame.packets {
            match packet {
                Packet::ActorAdded(records) => {
                    for record in records {
                        self.add_actor(episode, frame_id, record);
                    }
                }
                Packet::ActorRemoved(ids) => {
                    for &database_id in ids {
                        self.remove_actor(episode, frame_id, database_id);
                    }
                }
                Packet::Snapshots { kind, records } => {
                    if *kind == ActorKind::Sensor && !self.config.replay_sensors {
                        self.report.packets_skipped += 1;
                        continue;
                    }
                    for record in records {
                        self.restore(episode, frame_id, record.database_id, &record.snapshot);
                    }
                }
                Packet::VehicleWheels(vehicles) => {
                    for wheels in vehicles {
                        self.pose_wheels(episode, frame_id, wheels);
                    }
                }
            }
            self.report.packets_applied += 1;
        }
        self.report.packets_skipped += frame.skipped as u64;
        self.report.frames += 1;
        self.report.elapsed = frame.header.elapsed;
    }

    fn add_actor(&mut self, episode: &mut dyn Episode, frame_id: u64, record: &ActorAdded) {
        let database_id = record.database_id;
        if record.snapshot.kind() == ActorKind::Sensor && !self.config.replay_sensors {
            self.ignored.insert(database_id);
            return;
        }

        match record.snapshot.respawn(episode, &record.info) {
            Ok(id) => {
                if let Some(previous) = self.actors.insert(database_id, id) {
                    log::warn!("actor {database_id} added twice, {previous} is no longer tracked");
                }
                self.report.actors_spawned += 1;
                if let Err(e) = record.snapshot.restore(episode, id) {
                    self.issue(EntityIssue::from_restore(frame_id, database_id, e));
                }
            }
            Err(error) => self.issue(EntityIssue::SpawnFailed {
                frame_id,
                database_id,
                class: record.info.class.clone(),
                error,
            }),
        }
    }

    fn remove_actor(&mut self, episode: &mut dyn Episode, frame_id: u64, database_id: u32) {
        if self.ignored.remove(&database_id) {
            return;
        }
        match self.actors.remove(&database_id) {
            Some(id) if episode.destroy(id) => self.report.actors_destroyed += 1,
            _ => self.issue(EntityIssue::MissingEntity {
                frame_id,
                database_id,
            }),
        }
    }

    fn restore(
        &mut self,
        episode: &mut dyn Episode,
        frame_id: u64,
        database_id: u32,
        snapshot: &ActorSnapshot,
    ) {
        let Some(id) = self.tracked(frame_id, database_id) else {
            return;
        };
        if let Err(e) = snapshot.restore(episode, id) {
            self.issue(EntityIssue::from_restore(frame_id, database_id, e));
        }
    }

    fn pose_wheels(&mut self, episode: &mut dyn Episode, frame_id: u64, wheels: &VehicleWheels) {
        let database_id = wheels.database_id;
        let Some(id) = self.tracked(frame_id, database_id) else {
            return;
        };
        let posed = match episode.actor_mut(id) {
            None => Err(EntityIssue::MissingEntity {
                frame_id,
                database_id,
            }),
            Some(actor) => match actor.vehicle_mut() {
                Some(vehicle) => {
                    vehicle.pose_wheels(&wheels.wheels);
                    Ok(())
                }
                None => Err(EntityIssue::KindMismatch {
                    frame_id,
                    database_id,
                    expected: ActorKind::Vehicle.name(),
                }),
            },
        };
        if let Err(issue) = posed {
            self.issue(issue);
        }
    }

    /// Resolves a recorded id, reporting it when no live actor stands in
    /// for it. Ignored actors resolve to `None` silently.
    fn tracked(&mut self, frame_id: u64, database_id: u32) -> Option<ActorId> {
        if let Some(&id) = self.actors.get(&database_id) {
            return Some(id);
        }
        if !self.ignored.contains(&database_id) {
            self.issue(EntityIssue::MissingEntity {
                frame_id,
                database_id,
            });
        }
        None
    }

    fn issue(&mut self, issue: EntityIssue) {
        log::warn!("{issue}");
        self.report.issues.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::actor::{SpawnClass, Transform};
    use crate::codec::{self, Encode};
    use crate::config::RecorderConfig;
    use crate::episode::{LiveActor, World};
    use crate::error::StructuralError;
    use crate::packet::{self, PacketKind};
    use crate::recorder::Recorder;
    use crate::recording::{LogWriter, SessionInfo};

    fn recorded(world: &mut World, frames: u32) -> Vec<u8> {
        let mut recorder = Recorder::create(Vec::new(), RecorderConfig::default(), 0).unwrap();
        for i in 0..frames {
            recorder.record_frame(&*world, i as f64 * 0.1).unwrap();
            for id in world.actor_ids() {
                let actor = world.actor_mut(id).unwrap();
                let t = actor.transform();
                actor.set_transform(Transform::from_translation(t.translation + Vec3::X));
            }
        }
        recorder.finish().unwrap()
    }

    #[test]
    fn session_state_machine() {
        let bytes = recorded(&mut World::new(), 1);
        let mut replayer = Replayer::new(PlaybackConfig::default());
        let mut world = World::new();

        assert_eq!(replayer.state(), PlaybackState::Idle);
        assert!(matches!(
            replayer.step(&mut world),
            Err(RecorderError::NotScanning)
        ));

        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
        assert_eq!(replayer.state(), PlaybackState::Scanning);
        assert!(matches!(
            replayer.open(LogReader::open(bytes.as_slice()).unwrap()),
            Err(RecorderError::SessionActive)
        ));

        assert!(replayer.step(&mut world).unwrap().is_some());
        assert!(replayer.step(&mut world).unwrap().is_none());
        assert_eq!(replayer.state(), PlaybackState::Idle);
    }

    #[test]
    fn replays_motion_into_fresh_world() {
        let mut source = World::new();
        source
            .spawn(&SpawnClass::new("vehicle.audi.tt"), &Transform::IDENTITY)
            .unwrap();
        let bytes = recorded(&mut source, 3);

        let mut target = World::new();
        let mut replayer = Replayer::new(PlaybackConfig::default());
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
        let report = replayer.play_to_end(&mut target).unwrap().clone();

        assert!(report.is_clean(), "{report}");
        assert_eq!(report.frames, 3);
        assert_eq!(report.actors_spawned, 1);
        let live = replayer.live_actor(1).unwrap();
        assert_eq!(target.get(live).unwrap().transform.translation, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn sensors_can_be_left_out() {
        let mut source = World::new();
        source
            .spawn(&SpawnClass::new("sensor.lidar.ray_cast"), &Transform::IDENTITY)
            .unwrap();
        let bytes = recorded(&mut source, 2);

        let mut target = World::new();
        let mut replayer = Replayer::new(PlaybackConfig {
            replay_sensors: false,
            ..Default::default()
        });
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
        let report = replayer.play_to_end(&mut target).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.packets_skipped, 2);
        assert_eq!(target.actor_count(), 0);
    }

    #[test]
    fn time_limit_stops_early() {
        let bytes = recorded(&mut World::new(), 10);
        let mut replayer = Replayer::new(PlaybackConfig {
            time_limit: Some(0.35),
            ..Default::default()
        });
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
        let report = replayer.play_to_end(&mut World::new()).unwrap();
        assert_eq!(report.frames, 4);
    }

    #[test]
    fn entity_failures_do_not_abort() {
        let mut writer = LogWriter::create(Vec::new(), &SessionInfo::default()).unwrap();
        writer.begin_frame(0.0).unwrap();
        writer.write_packet(PacketKind::ActorRemoved, &[9u32]).unwrap();
        writer.end_frame().unwrap();
        writer.begin_frame(0.1).unwrap();
        writer.end_frame().unwrap();
        let bytes = writer.into_inner();

        let mut replayer = Replayer::new(PlaybackConfig::default());
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();
        let report = replayer.play_to_end(&mut World::new()).unwrap();

        assert_eq!(report.frames, 2);
        assert_eq!(
            report.issues,
            vec![EntityIssue::MissingEntity {
                frame_id: 0,
                database_id: 9
            }]
        );
    }

    #[test]
    fn structural_error_ends_session_without_partial_frame() {
        let mut source = World::new();
        source
            .spawn(&SpawnClass::new("walker.pedestrian.0001"), &Transform::IDENTITY)
            .unwrap();
        let mut bytes = recorded(&mut source, 2);
        bytes.truncate(bytes.len() - 2);

        let mut target = World::new();
        let mut replayer = Replayer::new(PlaybackConfig::default());
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();

        assert!(replayer.step(&mut target).unwrap().is_some());
        let after_first = target.clone();
        assert!(matches!(
            replayer.step(&mut target),
            Err(RecorderError::Structural(StructuralError::Truncated { .. }))
        ));
        assert_eq!(replayer.state(), PlaybackState::Idle);
        assert_eq!(target.get(ActorId(1)), after_first.get(ActorId(1)));
    }

    #[test]
    fn overrunning_count_aborts_before_applying_frame() {
        let mut source = World::new();
        source
            .spawn(&SpawnClass::new("static.prop.bench"), &Transform::IDENTITY)
            .unwrap();
        let mut bytes = recorded(&mut source, 1);

        let mut header = Vec::new();
        FrameHeader {
            frame_id: 1,
            delta: 0.1,
            elapsed: 0.1,
        }
        .encode(&mut header)
        .unwrap();
        packet::write_raw_packet(&mut bytes, PacketKind::FrameStart.tag(), &header).unwrap();
        let mut removal = Vec::new();
        codec::write_seq(&mut removal, &[1u32]).unwrap();
        packet::write_raw_packet(&mut bytes, PacketKind::ActorRemoved.tag(), &removal).unwrap();
        // Count claims three ids, the payload holds one.
        packet::write_raw_packet(&mut bytes, PacketKind::ActorRemoved.tag(), &[3, 0, 1, 0, 0, 0])
            .unwrap();

        let mut target = World::new();
        let mut replayer = Replayer::new(PlaybackConfig::default());
        replayer.open(LogReader::open(bytes.as_slice()).unwrap()).unwrap();

        assert!(replayer.step(&mut target).unwrap().is_some());
        assert!(matches!(
            replayer.step(&mut target),
            Err(RecorderError::Structural(StructuralError::Malformed { tag: 2, .. }))
        ));
        assert_eq!(replayer.state(), PlaybackState::Idle);
        assert_eq!(target.actor_count(), 1);
        assert_eq!(replayer.report().frames, 1);
        assert_eq!(replayer.report().actors_destroyed, 0);
    }
}

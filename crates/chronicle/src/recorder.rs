use std::collections::BTreeSet;
use std::io::Write;

use crate::actor::{ActorId, ActorKind, ActorSnapshot, VehicleWheels};
use crate::config::RecorderConfig;
use crate::episode::Episode;
use crate::error::RecorderError;
use crate::packet::{ActorAdded, PacketKind, RecordBatch, SnapshotRecord};
use crate::recording::{LogWriter, SessionInfo};

pub struct Recorder<W: Write> {
    writer: LogWriter<W>,
    config: RecorderConfig,
    known: BTreeSet<ActorId>,
    added: RecordBatch<ActorAdded>,
    removed: RecordBatch<u32>,
    /// Indexed by `ActorKind as usize`.
    snapshots: Vec<RecordBatch<SnapshotRecord>>,
    wheels: RecordBatch<VehicleWheels>,
    poisoned: bool,
}

impl<W: Write> Recorder<W> {
    pub fn create(sink: W, config: RecorderConfig, started_at: i64) -> Result<Self, RecorderError> {
        let session = SessionInfo::new(config.map_name.clone(), started_at);
        let writer = LogWriter::create(sink, &session)?;
        log::info!("recording session on map '{}'", session.map_name);

        Ok(Self {
            writer,
            config,
            known: BTreeSet::new(),
            added: RecordBatch::new(PacketKind::ActorAdded),
            removed: RecordBatch::new(PacketKind::ActorRemoved),
            snapshots: ActorKind::ALL
                .iter()
                .map(|&kind| RecordBatch::new(PacketKind::for_actor(kind)))
                .collect(),
            wheels: RecordBatch::new(PacketKind::VehicleWheels),
            poisoned: false,
        })
    }

    /// Records the episode's current state as one frame and returns its id.
    ///
    /// A failed write leaves the log with a partial frame, so the recorder
    /// refuses every later frame with [`RecorderError::Poisoned`].
    pub fn record_frame(&mut self, episode: &dyn Episode, elapsed: f64) -> Result<u64, RecorderError> {
        if self.poisoned {
            return Err(RecorderError::Poisoned);
        }
        let result = self.write_frame(episode, elapsed);
        self.clear_batches();
        if let Err(e) = &result {
            log::error!("recording stopped: {e}");
            self.poisoned = true;
        }
        result
    }

    fn write_frame(&mut self, episode: &dyn Episode, elapsed: f64) -> Result<u64, RecorderError> {
        let frame_id = self.writer.begin_frame(elapsed)?;

        let live: BTreeSet<ActorId> = episode.actor_ids().into_iter().collect();
        for gone in self.known.difference(&live) {
            self.removed.add(gone.id());
        }

        for &id in &live {
            let Some(actor) = episode.actor(id) else {
                continue;
            };
            let Some(snapshot) = ActorSnapshot::record(episode, id) else {
                continue;
            };
            if !self.known.contains(&id) {
                self.added.add(ActorAdded {
                    database_id: id.id(),
                    info: actor.info(),
                    snapshot: snapshot.clone(),
                });
            }
            if self.config.capture_wheels {
                if let Some(vehicle) = actor.vehicle() {
                    self.wheels.add(VehicleWheels {
                        database_id: id.id(),
                        wheels: vehicle.wheels(),
                    });
                }
            }
            self.snapshots[snapshot.kind() as usize].add(SnapshotRecord {
                database_id: id.id(),
                snapshot,
            });
        }

        self.flush_batches()?;
        self.writer.end_frame()?;
        self.known = live;
        Ok(frame_id)
    }

    // Tag order: added, removed, per-kind snapshots, wheels.
    fn flush_batches(&mut self) -> Result<(), RecorderError> {
        let limit = self.config.records_per_packet();
        self.added.write_to(&mut self.writer, limit)?;
        self.removed.write_to(&mut self.writer, limit)?;
        for batch in &self.snapshots {
            batch.write_to(&mut self.writer, limit)?;
        }
        self.wheels.write_to(&mut self.writer, limit)?;
        Ok(())
    }

    fn clear_batches(&mut self) {
        self.added.clear();
        self.removed.clear();
        for batch in &mut self.snapshots {
            batch.clear();
        }
        self.wheels.clear();
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn frames_recorded(&self) -> u64 {
        self.writer.frames_written()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Flushes the sink and hands it back.
    pub fn finish(mut self) -> Result<W, RecorderError> {
        self.writer.flush()?;
        log::info!(
            "recording closed after {} frames ({} bytes)",
            self.writer.frames_written(),
            self.writer.position()
        );
        Ok(self.writer.into_inner())
    }
}

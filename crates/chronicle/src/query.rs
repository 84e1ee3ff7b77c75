use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;

use crate::actor::{ActorData, ActorInfo, ActorKind, ControllerId};
use crate::error::RecorderError;
use crate::packet::{Packet, PacketKind};
use crate::recording::{LogReader, PacketEvent, SessionInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum ActorChange {
    Added { info: ActorInfo, kind: ActorKind },
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorEvent {
    pub frame_id: u64,
    pub database_id: u32,
    pub change: ActorChange,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileInfo {
    pub session: SessionInfo,
    pub frames: u64,
    /// Elapsed time of the last frame.
    pub duration: f64,
    pub packets: BTreeMap<PacketKind, u64>,
    pub unknown_tags: BTreeMap<u8, u64>,
    pub events: Vec<ActorEvent>,
    /// Traffic-light controllers referenced by added lights.
    pub controllers: BTreeSet<ControllerId>,
    pub bytes: u64,
}

impl FileInfo {
    /// Walks the remainder of the log once.
    pub fn scan<R: Read>(reader: &mut LogReader<R>) -> Result<Self, RecorderError> {
        let mut info = Self {
            session: reader.session().clone(),
            ..Self::default()
        };
        let mut frame_id = 0;

        while let Some(event) = reader.next_packet()? {
            match event {
                PacketEvent::Frame(header) => {
                    frame_id = header.frame_id;
                    info.frames += 1;
                    info.duration = header.elapsed;
                    *info.packets.entry(PacketKind::FrameStart).or_default() += 1;
                }
                PacketEvent::Skipped { tag, .. } => {
                    *info.unknown_tags.entry(tag).or_default() += 1;
                }
                PacketEvent::Packet(packet) => {
                    *info.packets.entry(packet.kind()).or_default() += 1;
                    match packet {
                        Packet::ActorAdded(records) => {
                            for record in records {
                                if let ActorData::TrafficLight(light) = &record.snapshot.data {
                                    info.controllers.extend(light.controller.clone());
                                }
                                info.events.push(ActorEvent {
                                    frame_id,
                                    database_id: record.database_id,
                                    change: ActorChange::Added {
                                        kind: record.snapshot.kind(),
                                        info: record.info,
                                    },
                                });
                            }
                        }
                        Packet::ActorRemoved(ids) => {
                            info.events.extend(ids.into_iter().map(|database_id| ActorEvent {
                                frame_id,
                                database_id,
                                change: ActorChange::Removed,
                            }));
                        }
                        _ => {}
                    }
                }
            }
        }
        info.bytes = reader.position();
        Ok(info)
    }

    pub fn packet_count(&self, kind: PacketKind) -> u64 {
        self.packets.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Map: {}", self.session.map_name)?;
        writeln!(f, "Started at: {}", self.session.started_at)?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(f, "Duration: {:.3} s", self.duration)?;
        writeln!(f, "Size: {} bytes", self.bytes)?;
        writeln!(f, "Controllers: {}", self.controllers.len())?;

        writeln!(f, "Packets:")?;
        for (kind, count) in &self.packets {
            writeln!(f, "  {:<16} {count}", kind.name())?;
        }
        for (tag, count) in &self.unknown_tags {
            writeln!(f, "  {:<16} {count}", format!("tag {tag}"))?;
        }

        write!(f, "Events: {}", self.events.len())?;
        for event in &self.events {
            match &event.change {
                ActorChange::Added { info, kind } => write!(
                    f,
                    "\n  frame {}: add {} {} ({}{})",
                    event.frame_id,
                    event.database_id,
                    info.class,
                    kind.name(),
                    if info.role_name.is_empty() {
                        String::new()
                    } else {
                        format!(", role {}", info.role_name)
                    }
                )?,
                ActorChange::Removed => {
                    write!(f, "\n  frame {}: remove {}", event.frame_id, event.database_id)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorData, ActorSnapshot, Kinematics};
    use crate::packet::ActorAdded;
    use crate::recording::LogWriter;

    #[test]
    fn scan_counts_everything() {
        let mut writer = LogWriter::create(Vec::new(), &SessionInfo::new("Town10HD", 99)).unwrap();
        writer.begin_frame(0.0).unwrap();
        writer
            .write_packet(
                PacketKind::ActorAdded,
                &[ActorAdded {
                    database_id: 4,
                    info: ActorInfo::new("walker.pedestrian.0002").with_role("crowd"),
                    snapshot: ActorSnapshot::new(
                        Kinematics::default(),
                        ActorData::Walker(Default::default()),
                    ),
                }],
            )
            .unwrap();
        writer.write_raw(31, &[1, 2, 3]).unwrap();
        writer.end_frame().unwrap();
        writer.begin_frame(1.25).unwrap();
        writer.write_packet(PacketKind::ActorRemoved, &[4u32]).unwrap();
        writer.write_raw(31, &[]).unwrap();
        writer.end_frame().unwrap();
        let bytes = writer.into_inner();

        let mut reader = LogReader::open(bytes.as_slice()).unwrap();
        let info = FileInfo::scan(&mut reader).unwrap();

        assert_eq!(info.session.map_name, "Town10HD");
        assert_eq!(info.frames, 2);
        assert_eq!(info.duration, 1.25);
        assert_eq!(info.bytes as usize, bytes.len());
        assert_eq!(info.packet_count(PacketKind::FrameStart), 2);
        assert_eq!(info.packet_count(PacketKind::ActorAdded), 1);
        assert_eq!(info.packet_count(PacketKind::Vehicles), 0);
        assert_eq!(info.unknown_tags.get(&31), Some(&2));
        assert_eq!(
            info.events.iter().map(|e| (e.frame_id, e.database_id)).collect::<Vec<_>>(),
            vec![(0, 4), (1, 4)]
        );

        let text = info.to_string();
        assert!(text.contains("frame 0: add 4 walker.pedestrian.0002 (walker, role crowd)"));
        assert!(text.contains("frame 1: remove 4"));
    }
}

//! `[u8 tag][u32 length][payload]`; `length` counts payload bytes only.

mod batch;
mod framing;

use std::io::{Read, Write};

use crate::actor::{ActorInfo, ActorKind, ActorSnapshot, VehicleWheels};
use crate::codec::{self, CodecError, Decode, Encode};
use crate::error::StructuralError;

pub use batch::RecordBatch;
pub use framing::{
    decode_exact, write_packet_buffered, write_packet_patched, write_raw_packet, HEADER_LEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PacketKind {
    FrameStart = 0,
    ActorAdded = 1,
    ActorRemoved = 2,
    Actors = 3,
    Vehicles = 4,
    Walkers = 5,
    TrafficSigns = 6,
    TrafficLights = 7,
    Sensors = 8,
    VehicleWheels = 9,
}

impl PacketKind {
    pub const ALL: [PacketKind; 10] = [
        Self::FrameStart,
        Self::ActorAdded,
        Self::ActorRemoved,
        Self::Actors,
        Self::Vehicles,
        Self::Walkers,
        Self::TrafficSigns,
        Self::TrafficLights,
        Self::Sensors,
        Self::VehicleWheels,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Snapshot packet carrying actors of `kind`.
    pub fn for_actor(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Actor => Self::Actors,
            ActorKind::Vehicle => Self::Vehicles,
            ActorKind::Walker => Self::Walkers,
            ActorKind::TrafficSign => Self::TrafficSigns,
            ActorKind::TrafficLight => Self::TrafficLights,
            ActorKind::Sensor => Self::Sensors,
        }
    }

    pub fn actor_kind(self) -> Option<ActorKind> {
        match self {
            Self::Actors => Some(ActorKind::Actor),
            Self::Vehicles => Some(ActorKind::Vehicle),
            Self::Walkers => Some(ActorKind::Walker),
            Self::TrafficSigns => Some(ActorKind::TrafficSign),
            Self::TrafficLights => Some(ActorKind::TrafficLight),
            Self::Sensors => Some(ActorKind::Sensor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FrameStart => "frame start",
            Self::ActorAdded => "actor added",
            Self::ActorRemoved => "actor removed",
            Self::Actors => "actors",
            Self::Vehicles => "vehicles",
            Self::Walkers => "walkers",
            Self::TrafficSigns => "traffic signs",
            Self::TrafficLights => "traffic lights",
            Self::Sensors => "sensors",
            Self::VehicleWheels => "vehicle wheels",
        }
    }
}

/// Payload of a FrameStart packet. Not count-prefixed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameHeader {
    pub frame_id: u64,
    /// Seconds since the previous frame.
    pub delta: f64,
    /// Seconds since the recording started.
    pub elapsed: f64,
}

impl FrameHeader {
    pub const ENCODED_LEN: usize = 24;
}

impl Encode for FrameHeader {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.frame_id.encode(w)?;
        self.delta.encode(w)?;
        self.elapsed.encode(w)
    }
}

impl Decode for FrameHeader {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            frame_id: u64::decode(r)?,
            delta: f64::decode(r)?,
            elapsed: f64::decode(r)?,
        })
    }
}

/// An actor appearing, with everything needed to respawn it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorAdded {
    pub database_id: u32,
    pub info: ActorInfo,
    pub snapshot: ActorSnapshot,
}

impl Encode for ActorAdded {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.database_id.encode(w)?;
        self.info.encode(w)?;
        self.snapshot.encode(w)
    }
}

impl Decode for ActorAdded {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            database_id: u32::decode(r)?,
            info: ActorInfo::decode(r)?,
            snapshot: ActorSnapshot::decode(r)?,
        })
    }
}

/// One record of a per-kind snapshot packet. The tag implies the kind, so
/// only the snapshot body follows the id.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub database_id: u32,
    pub snapshot: ActorSnapshot,
}

impl SnapshotRecord {
    pub fn decode_as(kind: ActorKind, r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            database_id: u32::decode(r)?,
            snapshot: ActorSnapshot::decode_body(kind, r)?,
        })
    }
}

impl Encode for SnapshotRecord {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.database_id.encode(w)?;
        self.snapshot.encode_body(w)
    }
}

/// A decoded packet other than FrameStart.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    ActorAdded(Vec<ActorAdded>),
    ActorRemoved(Vec<u32>),
    Snapshots {
        kind: ActorKind,
        records: Vec<SnapshotRecord>,
    },
    VehicleWheels(Vec<VehicleWheels>),
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::ActorAdded(_) => PacketKind::ActorAdded,
            Self::ActorRemoved(_) => PacketKind::ActorRemoved,
            Self::Snapshots { kind, .. } => PacketKind::for_actor(*kind),
            Self::VehicleWheels(_) => PacketKind::VehicleWheels,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::ActorAdded(records) => records.len(),
            Self::ActorRemoved(ids) => ids.len(),
            Self::Snapshots { records, .. } => records.len(),
            Self::VehicleWheels(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes a complete payload. Records must consume it exactly.
    pub fn decode(kind: PacketKind, payload: &[u8]) -> Result<Self, StructuralError> {
        let tag = kind.tag();
        match kind {
            PacketKind::FrameStart => Err(StructuralError::Malformed {
                tag,
                source: CodecError::InvalidDiscriminant {
                    type_name: "Packet",
                    value: tag as u32,
                },
            }),
            PacketKind::ActorAdded => {
                decode_exact(tag, payload, |r| codec::read_seq(r)).map(Self::ActorAdded)
            }
            PacketKind::ActorRemoved => {
                decode_exact(tag, payload, |r| codec::read_seq(r)).map(Self::ActorRemoved)
            }
            PacketKind::VehicleWheels => {
                decode_exact(tag, payload, |r| codec::read_seq(r)).map(Self::VehicleWheels)
            }
            PacketKind::Actors
            | PacketKind::Vehicles
            | PacketKind::Walkers
            | PacketKind::TrafficSigns
            | PacketKind::TrafficLights
            | PacketKind::Sensors => {
                let actor_kind = kind.actor_kind().unwrap_or_default();
                let records = decode_exact(tag, payload, |r| {
                    let count = u16::decode(r)? as usize;
                    let mut records = Vec::with_capacity(count);
                    for _ in 0..count {
                        records.push(SnapshotRecord::decode_as(actor_kind, r)?);
                    }
                    Ok(records)
                })?;
                Ok(Self::Snapshots {
                    kind: actor_kind,
                    records,
                })
            }
        }
    }
}

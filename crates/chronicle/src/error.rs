use std::io;

use crate::actor::{ActorId, ActorKind, ControllerId, SpawnClass};
use crate::codec::CodecError;
use crate::packet::PacketKind;

/// The stream cannot be trusted past this point. Always aborts the session.
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("stream ended inside a packet header")]
    TruncatedHeader,
    #[error("packet tag {tag} declares {declared} bytes but only {read} remain")]
    Truncated { tag: u8, declared: u32, read: u64 },
    #[error("malformed record in packet tag {tag}: {source}")]
    Malformed {
        tag: u8,
        #[source]
        source: CodecError,
    },
    #[error("packet tag {tag} has {remaining} bytes left after its last record")]
    TrailingBytes { tag: u8, remaining: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic bytes (expected b\"CHRN\")")]
    InvalidMagic,
    #[error("unsupported format version {found}")]
    UnsupportedVersion { found: u16 },
    #[error("malformed session header: {0}")]
    Header(CodecError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("{count} {kind:?} records do not fit one packet count field")]
    CountOverflow { kind: PacketKind, count: usize },
    #[error("record failed to encode: {0}")]
    Encode(CodecError),
    #[error("no frame is open")]
    NoOpenFrame,
    #[error("a frame is already open")]
    FrameAlreadyOpen,
    #[error("{kind:?} cannot be written as a record list")]
    ReservedKind { kind: PacketKind },
    #[error("recorder stopped after an earlier write failure")]
    Poisoned,
    #[error("a playback session is already active")]
    SessionActive,
    #[error("no playback session is active")]
    NotScanning,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("spawn class is empty")]
    EmptyClass,
    #[error("spawn of {class} rejected: {reason}")]
    Rejected { class: SpawnClass, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("actor {id} is not present in the episode")]
    MissingEntity { id: ActorId },
    #[error("actor {id} has no {expected} surface")]
    KindMismatch { id: ActorId, expected: &'static str },
    #[error("traffic-light controller {controller} is not registered")]
    UnknownController { controller: ControllerId },
}

impl RestoreError {
    pub(crate) fn kind_mismatch(id: ActorId, expected: ActorKind) -> Self {
        Self::KindMismatch {
            id,
            expected: expected.name(),
        }
    }
}

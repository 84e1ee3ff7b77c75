use std::fmt;

use crate::actor::{ControllerId, SpawnClass};
use crate::error::{RestoreError, SpawnError};

/// A per-actor failure during playback. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntityIssue {
    #[error("frame {frame_id}: could not spawn {class} for actor {database_id}: {error}")]
    SpawnFailed {
        frame_id: u64,
        database_id: u32,
        class: SpawnClass,
        error: SpawnError,
    },
    #[error("frame {frame_id}: recorded actor {database_id} has no live counterpart")]
    MissingEntity { frame_id: u64, database_id: u32 },
    #[error("frame {frame_id}: recorded actor {database_id} is not a {expected}")]
    KindMismatch {
        frame_id: u64,
        database_id: u32,
        expected: &'static str,
    },
    #[error("frame {frame_id}: recorded actor {database_id} refers to unknown controller {controller}")]
    UnknownController {
        frame_id: u64,
        database_id: u32,
        controller: ControllerId,
    },
}

impl EntityIssue {
    pub(crate) fn from_restore(frame_id: u64, database_id: u32, error: RestoreError) -> Self {
        match error {
            RestoreError::MissingEntity { .. } => Self::MissingEntity {
                frame_id,
                database_id,
            },
            RestoreError::KindMismatch { expected, .. } => Self::KindMismatch {
                frame_id,
                database_id,
                expected,
            },
            RestoreError::UnknownController { controller } => Self::UnknownController {
                frame_id,
                database_id,
                controller,
            },
        }
    }

    pub fn frame_id(&self) -> u64 {
        match self {
            Self::SpawnFailed { frame_id, .. }
            | Self::MissingEntity { frame_id, .. }
            | Self::KindMismatch { frame_id, .. }
            | Self::UnknownController { frame_id, .. } => *frame_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    pub frames: u64,
    pub packets_applied: u64,
    pub packets_skipped: u64,
    pub actors_spawned: u64,
    pub actors_destroyed: u64,
    /// Elapsed time of the last applied frame.
    pub elapsed: f64,
    pub issues: Vec<EntityIssue>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for PlaybackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames replayed: {} ({:.3} s)", self.frames, self.elapsed)?;
        writeln!(
            f,
            "Packets: {} applied, {} skipped",
            self.packets_applied, self.packets_skipped
        )?;
        writeln!(
            f,
            "Actors: {} spawned, {} destroyed",
            self.actors_spawned, self.actors_destroyed
        )?;
        write!(f, "Issues: {}", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

pub mod actor;
pub mod codec;
pub mod config;
pub mod episode;
pub mod error;
pub mod packet;
pub mod playback;
pub mod query;
pub mod recorder;
pub mod recording;

pub use actor::{
    ActorData, ActorId, ActorInfo, ActorKind, ActorSnapshot, ControllerId, Kinematics,
    SpawnClass, Transform, VehicleWheels, WheelLocation, WheelSample,
};
pub use codec::{CodecError, Decode, Encode};
pub use config::{PlaybackConfig, RecorderConfig};
pub use episode::{ControllerRegistry, Episode, LiveActor, World};
pub use error::{RecorderError, RestoreError, SpawnError, StructuralError};
pub use packet::{ActorAdded, FrameHeader, Packet, PacketKind, RecordBatch, SnapshotRecord};
pub use playback::{EntityIssue, PlaybackReport, PlaybackState, Replayer};
pub use query::{ActorChange, ActorEvent, FileInfo};
pub use recorder::Recorder;
pub use recording::{
    Frame, FrameIndex, FrameIndexEntry, LogReader, LogWriter, PacketEvent, SessionInfo,
};

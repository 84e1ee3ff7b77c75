mod index;
mod reader;
mod writer;

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, Decode, Encode};
use crate::error::RecorderError;

pub use index::{FrameIndex, FrameIndexEntry};
pub use reader::{Frame, LogReader, PacketEvent};
pub use writer::LogWriter;

pub const MAGIC: [u8; 4] = *b"CHRN";
pub const FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    pub map_name: String,
    /// Unix seconds at which the recording started.
    pub started_at: i64,
}

impl SessionInfo {
    pub fn new(map_name: impl Into<String>, started_at: i64) -> Self {
        Self {
            map_name: map_name.into(),
            started_at,
        }
    }
}

impl Encode for SessionInfo {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.map_name.encode(w)?;
        self.started_at.encode(w)
    }
}

impl Decode for SessionInfo {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Self {
            map_name: String::decode(r)?,
            started_at: i64::decode(r)?,
        })
    }
}

/// Writes the file header and returns its length in bytes.
pub(crate) fn write_header(w: &mut dyn Write, session: &SessionInfo) -> Result<u64, RecorderError> {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    session.encode(&mut bytes).map_err(RecorderError::Encode)?;
    w.write_all(&bytes)?;
    Ok(bytes.len() as u64)
}

/// Reads and validates the file header. Returns the session and the
/// header length in bytes.
pub(crate) fn read_header(r: &mut dyn Read) -> Result<(SessionInfo, u64), RecorderError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(RecorderError::InvalidMagic);
    }
    let version = u16::decode(r).map_err(RecorderError::Header)?;
    if version != FORMAT_VERSION {
        return Err(RecorderError::UnsupportedVersion { found: version });
    }
    let session = SessionInfo::decode(r).map_err(RecorderError::Header)?;
    let len = (MAGIC.len() + 2 + 4 + session.map_name.len() + 8) as u64;
    Ok((session, len))
}

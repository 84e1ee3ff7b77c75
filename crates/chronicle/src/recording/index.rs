use std::io::Read;

use crate::codec::Decode;
use crate::error::RecorderError;
use crate::packet::{self, FrameHeader, PacketKind};

use super::LogReader;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameIndexEntry {
    pub frame_id: u64,
    pub elapsed: f64,
    /// Byte offset of the frame's FrameStart packet.
    pub offset: u64,
}

/// Offsets of every frame in a log, built in one linear pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameIndex {
    entries: Vec<FrameIndexEntry>,
}

impl FrameIndex {
    /// Walks the rest of the log, decoding only FrameStart payloads.
    pub fn build<R: Read>(reader: &mut LogReader<R>) -> Result<Self, RecorderError> {
        let mut entries = Vec::new();
        if let Some((offset, header)) = reader.pending_frame() {
            entries.push(FrameIndexEntry {
                frame_id: header.frame_id,
                elapsed: header.elapsed,
                offset,
            });
            reader.clear_pending();
        }

        loop {
            let offset = reader.position();
            let Some((tag, length)) = reader.read_packet_header()? else {
                break;
            };
            if tag == PacketKind::FrameStart.tag() {
                let payload = reader.read_payload(tag, length)?;
                let header = packet::decode_exact(tag, &payload, |r| FrameHeader::decode(r))?;
                entries.push(FrameIndexEntry {
                    frame_id: header.frame_id,
                    elapsed: header.elapsed,
                    offset,
                });
            } else {
                reader.skip_payload(tag, length)?;
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FrameIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, frame_id: u64) -> Option<&FrameIndexEntry> {
        self.entries.iter().find(|e| e.frame_id == frame_id)
    }

    /// Last frame starting at or before `elapsed`.
    pub fn frame_at(&self, elapsed: f64) -> Option<&FrameIndexEntry> {
        let after = self.entries.partition_point(|e| e.elapsed <= elapsed);
        after.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Elapsed time of the last frame.
    pub fn duration(&self) -> f64 {
        self.entries.last().map_or(0.0, |e| e.elapsed)
    }
}

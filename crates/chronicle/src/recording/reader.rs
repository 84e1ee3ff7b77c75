use std::io::{self, Read, Seek, SeekFrom};

use crate::codec::Decode;
use crate::error::{RecorderError, StructuralError};
use crate::packet::{self, FrameHeader, Packet, PacketKind};

use super::index::FrameIndexEntry;
use super::{read_header, SessionInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum PacketEvent {
    Frame(FrameHeader),
    Packet(Packet),
    /// A packet with a tag this reader does not know. Its payload was
    /// skipped unread.
    Skipped { tag: u8, length: u32 },
}

/// The packets of one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub header: FrameHeader,
    pub packets: Vec<Packet>,
    /// Unknown-tag packets passed over inside this frame.
    pub skipped: usize,
}

/// Reads a frame log from a byte stream.
///
/// Lengths are never trusted: a stream that ends before a declared
/// payload does is reported as [`StructuralError::Truncated`].
pub struct LogReader<R: Read> {
    source: R,
    session: SessionInfo,
    position: u64,
    /// Start of the next frame, read while assembling the previous one.
    pending: Option<(u64, FrameHeader)>,
}

impl<R: Read> LogReader<R> {
    /// Open a log, reading and validating the header.
    pub fn open(mut source: R) -> Result<Self, RecorderError> {
        let (session, position) = read_header(&mut source)?;
        Ok(Self {
            source,
            session,
            position,
            pending: None,
        })
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Bytes consumed from the source, header included.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn next_packet(&mut self) -> Result<Option<PacketEvent>, RecorderError> {
        if let Some((_, header)) = self.pending.take() {
            return Ok(Some(PacketEvent::Frame(header)));
        }
        let Some((tag, length)) = self.read_packet_header()? else {
            return Ok(None);
        };
        let event = match PacketKind::from_tag(tag) {
            None => {
                self.skip_payload(tag, length)?;
                log::debug!("skipped unknown packet tag {tag} ({length} bytes)");
                PacketEvent::Skipped { tag, length }
            }
            Some(PacketKind::FrameStart) => {
                let payload = self.read_payload(tag, length)?;
                PacketEvent::Frame(packet::decode_exact(tag, &payload, |r| {
                    FrameHeader::decode(r)
                })?)
            }
            Some(kind) => {
                let payload = self.read_payload(tag, length)?;
                PacketEvent::Packet(Packet::decode(kind, &payload)?)
            }
        };
        Ok(Some(event))
    }

    /// Reads a whole frame. Packets found before the first frame start
    /// belong to no frame and are dropped.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, RecorderError> {
        let header = loop {
            match self.next_packet()? {
                None => return Ok(None),
                Some(PacketEvent::Frame(header)) => break header,
                Some(other) => log::warn!("dropping packet outside any frame: {other:?}"),
            }
        };

        let mut frame = Frame {
            header,
            ..Frame::default()
        };
        loop {
            let start = self.position;
            match self.next_packet()? {
                None => break,
                Some(PacketEvent::Frame(next)) => {
                    self.pending = Some((start, next));
                    break;
                }
                Some(PacketEvent::Packet(packet)) => frame.packets.push(packet),
                Some(PacketEvent::Skipped { .. }) => frame.skipped += 1,
            }
        }
        Ok(Some(frame))
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Byte offset of a frame start already read ahead, if any.
    pub(crate) fn pending_frame(&self) -> Option<(u64, FrameHeader)> {
        self.pending
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Reads `[tag][u32 length]`. A clean end of stream before the tag
    /// is the end of the log.
    pub(crate) fn read_packet_header(&mut self) -> Result<Option<(u8, u32)>, RecorderError> {
        let mut tag = [0u8; 1];
        loop {
            match self.source.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let mut length = [0u8; 4];
        self.source.read_exact(&mut length).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                RecorderError::Structural(StructuralError::TruncatedHeader)
            } else {
                RecorderError::Io(e)
            }
        })?;
        self.position += packet::HEADER_LEN as u64;
        Ok(Some((tag[0], u32::from_le_bytes(length))))
    }

    pub(crate) fn read_payload(&mut self, tag: u8, declared: u32) -> Result<Vec<u8>, RecorderError> {
        let mut payload = Vec::new();
        let read = (&mut self.source)
            .take(declared as u64)
            .read_to_end(&mut payload)? as u64;
        self.position += read;
        if read < declared as u64 {
            return Err(StructuralError::Truncated { tag, declared, read }.into());
        }
        Ok(payload)
    }

    pub(crate) fn skip_payload(&mut self, tag: u8, declared: u32) -> Result<(), RecorderError> {
        let read = io::copy(&mut (&mut self.source).take(declared as u64), &mut io::sink())?;
        self.position += read;
        if read < declared as u64 {
            return Err(StructuralError::Truncated { tag, declared, read }.into());
        }
        Ok(())
    }
}

impl<R: Read + Seek> LogReader<R> {
    /// Resumes reading at the start of an indexed frame.
    pub fn seek_to_frame(&mut self, entry: &FrameIndexEntry) -> Result<(), RecorderError> {
        self.source.seek(SeekFrom::Start(entry.offset))?;
        self.position = entry.offset;
        self.pending = None;
        Ok(())
    }
}

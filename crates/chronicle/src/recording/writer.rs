use std::io::Write;

use crate::codec::Encode;
use crate::error::RecorderError;
use crate::packet::{self, FrameHeader, PacketKind};

use super::{write_header, SessionInfo};

/// Writes a frame log to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production code
/// a `BufWriter<File>`. Packets are built in a reusable scratch buffer, so
/// the sink never needs to seek.
pub struct LogWriter<W: Write> {
    sink: W,
    scratch: Vec<u8>,
    next_frame_id: u64,
    last_elapsed: Option<f64>,
    frame_open: bool,
    frames_written: u64,
    bytes_written: u64,
}

impl<W: Write> LogWriter<W> {
    /// Create a writer, immediately writing the file header.
    pub fn create(mut sink: W, session: &SessionInfo) -> Result<Self, RecorderError> {
        let bytes_written = write_header(&mut sink, session)?;
        Ok(Self {
            sink,
            scratch: Vec::with_capacity(1024),
            next_frame_id: 0,
            last_elapsed: None,
            frame_open: false,
            frames_written: 0,
            bytes_written,
        })
    }

    /// Opens frame `n`, where `n` counts frames from zero. The first
    /// frame has a zero delta.
    pub fn begin_frame(&mut self, elapsed: f64) -> Result<u64, RecorderError> {
        if self.frame_open {
            return Err(RecorderError::FrameAlreadyOpen);
        }
        let header = FrameHeader {
            frame_id: self.next_frame_id,
            delta: self.last_elapsed.map_or(0.0, |last| elapsed - last),
            elapsed,
        };
        self.scratch.clear();
        header.encode(&mut self.scratch).map_err(RecorderError::Encode)?;
        packet::write_raw_packet(&mut self.sink, PacketKind::FrameStart.tag(), &self.scratch)?;
        self.bytes_written += (packet::HEADER_LEN + self.scratch.len()) as u64;

        self.next_frame_id += 1;
        self.last_elapsed = Some(elapsed);
        self.frame_open = true;
        Ok(header.frame_id)
    }

    /// Writes one list packet into the open frame.
    pub fn write_packet<T: Encode>(
        &mut self,
        kind: PacketKind,
        records: &[T],
    ) -> Result<(), RecorderError> {
        if !self.frame_open {
            return Err(RecorderError::NoOpenFrame);
        }
        if kind == PacketKind::FrameStart {
            return Err(RecorderError::ReservedKind { kind });
        }
        packet::write_packet_buffered(&mut self.sink, &mut self.scratch, kind, records)?;
        self.bytes_written += (packet::HEADER_LEN + self.scratch.len()) as u64;
        Ok(())
    }

    /// Writes an already encoded payload under any tag, including tags
    /// this crate does not know.
    pub fn write_raw(&mut self, tag: u8, payload: &[u8]) -> Result<(), RecorderError> {
        if !self.frame_open {
            return Err(RecorderError::NoOpenFrame);
        }
        packet::write_raw_packet(&mut self.sink, tag, payload)?;
        self.bytes_written += (packet::HEADER_LEN + payload.len()) as u64;
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<(), RecorderError> {
        if !self.frame_open {
            return Err(RecorderError::NoOpenFrame);
        }
        self.frame_open = false;
        self.frames_written += 1;
        Ok(())
    }

    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes handed to the sink so far, header included.
    pub fn position(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> Result<(), RecorderError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

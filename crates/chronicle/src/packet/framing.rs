use std::io::{Read, Seek, SeekFrom, Write};

use crate::codec::{self, CodecError, Encode, MAX_SEQ_LEN};
use crate::error::{RecorderError, StructuralError};

use super::PacketKind;

/// Tag byte plus `u32` length.
pub const HEADER_LEN: usize = 5;

fn check_count(kind: PacketKind, count: usize) -> Result<(), RecorderError> {
    if count > MAX_SEQ_LEN {
        return Err(RecorderError::CountOverflow { kind, count });
    }
    Ok(())
}

fn payload_len(len: usize) -> Result<u32, RecorderError> {
    u32::try_from(len).map_err(|_| RecorderError::Encode(CodecError::CountOverflow { count: len }))
}

/// Writes `[tag][len][payload]` for an already encoded payload.
pub fn write_raw_packet(w: &mut dyn Write, tag: u8, payload: &[u8]) -> Result<(), RecorderError> {
    let len = payload_len(payload.len())?;
    w.write_all(&[tag])?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Encodes the records into `scratch`, then writes the packet in one go.
///
/// Works on any sink. `scratch` is cleared first and keeps its capacity
/// for the next call.
pub fn write_packet_buffered<T: Encode>(
    w: &mut dyn Write,
    scratch: &mut Vec<u8>,
    kind: PacketKind,
    records: &[T],
) -> Result<(), RecorderError> {
    check_count(kind, records.len())?;
    scratch.clear();
    codec::write_seq(scratch, records).map_err(RecorderError::Encode)?;
    write_raw_packet(w, kind.tag(), scratch)
}

/// Streams the records straight into a seekable sink and patches the
/// length field afterwards. Produces the same bytes as
/// [`write_packet_buffered`].
pub fn write_packet_patched<W: Write + Seek, T: Encode>(
    w: &mut W,
    kind: PacketKind,
    records: &[T],
) -> Result<(), RecorderError> {
    check_count(kind, records.len())?;
    w.write_all(&[kind.tag()])?;
    let len_at = w.stream_position()?;
    w.write_all(&0u32.to_le_bytes())?;
    codec::write_seq(w, records).map_err(RecorderError::Encode)?;

    let end = w.stream_position()?;
    let len = payload_len((end - len_at) as usize - 4)?;
    w.seek(SeekFrom::Start(len_at))?;
    w.write_all(&len.to_le_bytes())?;
    w.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Runs `decode` over a whole payload and requires it to consume every
/// byte.
pub fn decode_exact<T>(
    tag: u8,
    payload: &[u8],
    decode: impl FnOnce(&mut dyn Read) -> Result<T, CodecError>,
) -> Result<T, StructuralError> {
    let mut cursor = payload;
    let value = decode(&mut cursor).map_err(|source| StructuralError::Malformed { tag, source })?;
    if !cursor.is_empty() {
        return Err(StructuralError::TrailingBytes {
            tag,
            remaining: cursor.len(),
        });
    }
    Ok(value)
}

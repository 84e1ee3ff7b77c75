use std::io::Write;

use crate::codec::{Encode, MAX_SEQ_LEN};
use crate::error::RecorderError;
use crate::recording::LogWriter;

use super::PacketKind;

/// Records of one packet kind gathered over a tick.
#[derive(Debug, Clone)]
pub struct RecordBatch<T> {
    kind: PacketKind,
    records: Vec<T>,
}

impl<T: Encode> RecordBatch<T> {
    pub fn new(kind: PacketKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn add(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops the records but keeps the allocation for the next tick.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Writes the batch as one packet per `max_per_packet` records and
    /// returns the number of packets written. An empty batch writes none.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut LogWriter<W>,
        max_per_packet: usize,
    ) -> Result<usize, RecorderError> {
        let chunk = max_per_packet.clamp(1, MAX_SEQ_LEN);
        let mut packets = 0;
        for records in self.records.chunks(chunk) {
            writer.write_packet(self.kind, records)?;
            packets += 1;
        }
        Ok(packets)
    }
}

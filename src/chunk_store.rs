//! Per-node chunk reassembly: tracks which packet sequence numbers of a chunk have arrived at a
//! node, and reports when a chunk becomes fully received.

use std::collections::HashMap;

use bitvec::vec::BitVec;

use crate::error::{Error, Result};
use crate::ids::{ChunkId, NodeId};

struct ChunkRecord {
    received: BitVec,
    total: u32,
    received_count: u32,
    first_arrival_time: f64,
}

/// Reassembly state for every chunk that has started arriving at one node.
#[derive(Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkId, ChunkRecord>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records packet `seq` of `total` for `chunk_id` as received at `now`. Returns `true` the
    /// first time this call makes the chunk fully received (every `seq` in `0..total` seen).
    pub fn deposit(
        &mut self,
        node: NodeId,
        chunk_id: ChunkId,
        seq: u32,
        total: u32,
        now: f64,
    ) -> Result<bool> {
        let record = self.chunks.entry(chunk_id.clone()).or_insert_with(|| ChunkRecord {
            received: BitVec::repeat(false, total as usize),
            total,
            received_count: 0,
            first_arrival_time: now,
        });

        let idx = seq as usize;
        if idx >= record.received.len() || *record.received.get(idx).as_deref().unwrap_or(&false) {
            return Err(Error::DuplicatePacket {
                chunk_id,
                seq,
                node,
                time: now,
            });
        }
        record.received.set(idx, true);
        record.received_count += 1;

        Ok(record.received_count == record.total)
    }

    pub fn is_complete(&self, chunk_id: &ChunkId) -> bool {
        self.chunks
            .get(chunk_id)
            .is_some_and(|r| r.received_count == r.total)
    }

    pub fn first_arrival_time(&self, chunk_id: &ChunkId) -> Option<f64> {
        self.chunks.get(chunk_id).map(|r| r.first_arrival_time)
    }

    pub fn received_count(&self, chunk_id: &ChunkId) -> u32 {
        self.chunks.get(chunk_id).map_or(0, |r| r.received_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_completion_exactly_once() {
        let mut store = ChunkStore::new();
        let node = NodeId(0);
        let id = ChunkId::Int(1);
        assert!(!store.deposit(node, id.clone(), 0, 2, 0.0).unwrap());
        assert!(store.deposit(node, id.clone(), 1, 2, 1.0).unwrap());
        assert!(store.is_complete(&id));
    }

    #[test]
    fn rejects_duplicate_seq() {
        let mut store = ChunkStore::new();
        let node = NodeId(0);
        let id = ChunkId::Int(1);
        store.deposit(node, id.clone(), 0, 2, 0.0).unwrap();
        let err = store.deposit(node, id.clone(), 0, 2, 2.0).unwrap_err();
        assert!(matches!(err, Error::DuplicatePacket { .. }));
    }

    #[test]
    fn tracks_first_arrival_time() {
        let mut store = ChunkStore::new();
        let node = NodeId(0);
        let id = ChunkId::Int(1);
        store.deposit(node, id.clone(), 1, 2, 5.0).unwrap();
        assert_eq!(store.first_arrival_time(&id), Some(5.0));
    }
}

//! The unit of forwarding: an immutable fragment of a chunk in flight.

use std::rc::Rc;

use crate::ids::{ChunkId, NodeId, QpId};

/// One packet-sized fragment of a chunk.
///
/// `path` is shared (via `Rc`) among every packet belonging to the same policy firing, since all
/// of them traverse the identical, already-resolved route.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    pub chunk_id: ChunkId,
    pub seq: u32,
    pub total: u32,
    pub size_bytes: u64,
    pub src_node: NodeId,
    pub dst_node: NodeId,
    pub path: Rc<[NodeId]>,
    pub path_idx: usize,
    pub qpid_at_source: QpId,
    pub rate_bps: f64,
}

impl Packet {
    /// The node this packet is currently destined for on this hop, i.e. `path[path_idx]`.
    pub fn current_hop(&self) -> NodeId {
        self.path[self.path_idx]
    }

    /// Whether `path_idx` is at the last index of `path`, i.e. the packet has reached `dst_node`.
    pub fn at_destination(&self) -> bool {
        self.path_idx == self.path.len() - 1
    }

    /// The next hop after the current one. Panics if already at the destination; callers must
    /// check [`Packet::at_destination`] first.
    pub fn next_hop(&self) -> NodeId {
        self.path[self.path_idx + 1]
    }

    /// The flow identity a packet carries end to end: `(src_node, qpid_at_source)`. Forwarding
    /// never changes this, so every hop places the packet into the same logical QP.
    pub fn flow_id(&self) -> (NodeId, QpId) {
        (self.src_node, self.qpid_at_source)
    }
}

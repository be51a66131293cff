//! Policy entries describe what to send; the [`PolicyEngine`] holds each one until its `src`
//! becomes fully owning of `chunk_id`, then turns it into concrete packets.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::ids::{ChunkId, NodeId, QpId};
use crate::packet::Packet;
use crate::topology::Topology;

/// How fast a policy entry's packets are paced onto the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rate {
    /// A fixed bits-per-second pacing rate.
    Fixed(f64),
    /// Send as fast as the first-hop link allows.
    Max,
}

/// One instruction to move a chunk from `src` to the end of `path`, waiting on `src` owning the
/// full chunk before it fires.
#[derive(Clone, Debug)]
pub struct PolicyEntry {
    pub chunk_id: ChunkId,
    pub src: NodeId,
    pub path: Rc<[NodeId]>,
    pub chunk_size_bytes: u64,
    pub payload_bytes_per_packet: u64,
    pub qpid: QpId,
    pub rate: Rate,
}

/// Installs policy entries and releases them once their dependency — `src` fully owning
/// `chunk_id` — is satisfied.
///
/// Every entry is held under the key `(src, chunk_id)`; a chunk "produced" at a node rather than
/// arriving by forwarding is bootstrapped by the caller injecting a synthetic completion for that
/// key at `t=0` (see [`crate::simulation::Simulation::build`]).
#[derive(Default)]
pub struct PolicyEngine {
    pending_by_dependency: HashMap<(NodeId, ChunkId), Vec<PolicyEntry>>,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `entry` against `topology` and holds it until
    /// [`PolicyEngine::on_chunk_complete`] releases it.
    pub fn install(&mut self, entry: PolicyEntry, topology: &Topology) -> Result<()> {
        self.validate(&entry, topology)?;
        let key = (entry.src, entry.chunk_id.clone());
        self.pending_by_dependency.entry(key).or_default().push(entry);
        Ok(())
    }

    fn validate(&self, entry: &PolicyEntry, topology: &Topology) -> Result<()> {
        let bad = |reason: String| Error::InvalidPolicy {
            chunk_id: entry.chunk_id.clone(),
            src: entry.src.to_string(),
            reason,
        };
        if entry.path.len() < 2 {
            return Err(bad("path must contain at least source and destination".to_string()));
        }
        if entry.path[0] != entry.src {
            return Err(bad("path[0] must equal src".to_string()));
        }
        if entry.payload_bytes_per_packet == 0 {
            return Err(bad("payload_bytes_per_packet must be positive".to_string()));
        }
        if let Rate::Fixed(r) = entry.rate {
            if r <= 0.0 {
                return Err(bad("fixed rate must be positive".to_string()));
            }
        }
        for &node in entry.path.iter() {
            if !topology.contains_node(node) {
                return Err(bad(format!("path references unknown node {node}")));
            }
        }
        for hop in entry.path.windows(2) {
            let (from, to) = (hop[0], hop[1]);
            if topology.link(from, to).is_none() {
                return Err(bad(format!("no link {from}->{to}")));
            }
        }
        Ok(())
    }

    /// Releases every entry waiting on `chunk_id` completing at `node`, in installation order,
    /// for the caller to schedule their firing at the current simulated time.
    pub fn on_chunk_complete(&mut self, node: NodeId, chunk_id: &ChunkId) -> Vec<PolicyEntry> {
        self.pending_by_dependency
            .remove(&(node, chunk_id.clone()))
            .unwrap_or_default()
    }

    /// Turns a ready entry into its packets. A `chunk_size_bytes` of zero yields an empty chunk
    /// (no packets, trivially "delivered").
    pub fn fire(entry: &PolicyEntry, topology: &Topology) -> Result<Vec<Packet>> {
        if entry.chunk_size_bytes == 0 {
            return Ok(Vec::new());
        }
        let total = entry
            .chunk_size_bytes
            .div_ceil(entry.payload_bytes_per_packet) as u32;

        let rate_bps = match entry.rate {
            Rate::Fixed(r) => r,
            Rate::Max => {
                let first_hop = topology
                    .link(entry.path[0], entry.path[1])
                    .ok_or_else(|| Error::InvalidPolicy {
                        chunk_id: entry.chunk_id.clone(),
                        src: entry.src.to_string(),
                        reason: format!("no link {}->{}", entry.path[0], entry.path[1]),
                    })?;
                first_hop.line_rate_bps
            }
        };

        let mut packets = Vec::with_capacity(total as usize);
        let mut remaining = entry.chunk_size_bytes;
        for seq in 0..total {
            let size_bytes = remaining.min(entry.payload_bytes_per_packet);
            remaining -= size_bytes;
            packets.push(Packet {
                chunk_id: entry.chunk_id.clone(),
                seq,
                total,
                size_bytes,
                src_node: entry.src,
                dst_node: *entry.path.last().expect("validated non-empty path"),
                path: Rc::clone(&entry.path),
                path_idx: 0,
                qpid_at_source: entry.qpid,
                rate_bps,
            });
        }
        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyBuilder;

    fn topology() -> (Topology, NodeId, NodeId) {
        let mut b = TopologyBuilder::new();
        let a = b.node("A");
        let c = b.node("B");
        b.edge_bidi(a, c, 8_000.0, 1e-6).unwrap();
        (b.build(), a, c)
    }

    fn entry(a: NodeId, c: NodeId, chunk_size_bytes: u64) -> PolicyEntry {
        PolicyEntry {
            chunk_id: ChunkId::Int(0),
            src: a,
            path: Rc::from(vec![a, c]),
            chunk_size_bytes,
            payload_bytes_per_packet: 1000,
            qpid: 0,
            rate: Rate::Fixed(8_000.0),
        }
    }

    #[test]
    fn fragments_into_whole_and_remainder_packets() {
        let (topo, a, c) = topology();
        let packets = PolicyEngine::fire(&entry(a, c, 2500), &topo).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].size_bytes, 1000);
        assert_eq!(packets[1].size_bytes, 1000);
        assert_eq!(packets[2].size_bytes, 500);
        assert_eq!(packets[2].total, 3);
    }

    #[test]
    fn zero_size_chunk_yields_no_packets() {
        let (topo, a, c) = topology();
        let packets = PolicyEngine::fire(&entry(a, c, 0), &topo).unwrap();
        assert!(packets.is_empty());
    }

    #[test]
    fn rejects_path_not_starting_at_src() {
        let mut engine = PolicyEngine::new();
        let (topo, a, c) = topology();
        let mut bad = entry(a, c, 1000);
        bad.path = Rc::from(vec![c, a]);
        assert!(engine.install(bad, &topo).is_err());
    }

    #[test]
    fn rejects_path_with_no_edge_between_consecutive_hops() {
        let mut engine = PolicyEngine::new();
        let mut b = TopologyBuilder::new();
        let a = b.node("A");
        b.node("D"); // interned but never linked to A
        let topo = b.build();
        let mut bad = entry(a, a, 1000);
        bad.path = Rc::from(vec![a, NodeId(1)]);
        assert!(engine.install(bad, &topo).is_err());
    }

    #[test]
    fn rejects_path_referencing_a_node_outside_the_topology() {
        let mut engine = PolicyEngine::new();
        let (topo, a, c) = topology();
        let mut bad = entry(a, c, 1000);
        bad.path = Rc::from(vec![a, NodeId(99)]);
        assert!(engine.install(bad, &topo).is_err());
    }

    #[test]
    fn entry_is_held_until_its_src_fully_owns_the_chunk() {
        let mut engine = PolicyEngine::new();
        let (topo, a, c) = topology();
        let mut e = entry(a, c, 1000);
        e.chunk_id = ChunkId::Int(7);
        engine.install(e, &topo).unwrap();
        let released = engine.on_chunk_complete(a, &ChunkId::Int(7));
        assert_eq!(released.len(), 1);
        assert!(engine.on_chunk_complete(a, &ChunkId::Int(7)).is_empty());
    }

    #[test]
    fn sibling_entries_release_in_install_order() {
        let mut engine = PolicyEngine::new();
        let (topo, a, c) = topology();
        let mut e1 = entry(a, c, 1000);
        e1.qpid = 0;
        let mut e2 = entry(a, c, 1000);
        e2.qpid = 1;
        engine.install(e1, &topo).unwrap();
        engine.install(e2, &topo).unwrap();
        let released = engine.on_chunk_complete(a, &ChunkId::Int(0));
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].qpid, 0);
        assert_eq!(released[1].qpid, 1);
    }
}

//! A network node: the egress ports it owns, and the arrival logic that either forwards a packet
//! one more hop or deposits it into the node's [`ChunkStore`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::chunk_store::ChunkStore;
use crate::error::{Error, Result};
use crate::event::EventScheduler;
use crate::ids::{ChunkId, NodeId};
use crate::packet::Packet;
use crate::port::Port;
use crate::topology::Topology;

/// What happened when a packet reached this node.
pub enum ArrivalOutcome {
    /// The packet was not at its destination and was re-enqueued on the next hop's port.
    Forwarded,
    /// The packet was at its destination; `newly_complete` is set the instant its chunk becomes
    /// fully received.
    Delivered { chunk_id: ChunkId, newly_complete: bool },
}

/// One node's local state: its outgoing ports and its chunk reassembly store.
pub struct Node {
    id: NodeId,
    ports: HashMap<NodeId, Port>,
    chunk_store: ChunkStore,
}

impl Node {
    /// Builds a node's ports from every outgoing edge `id -> peer` present in `topology`.
    pub fn new(id: NodeId, topology: &Topology, quantum: u32) -> Result<Self> {
        let mut ports = HashMap::new();
        for (&(from, to), &link) in topology.links() {
            if from == id {
                ports.insert(to, Port::new(from, to, link, quantum)?);
            }
        }
        Ok(Self {
            id,
            ports,
            chunk_store: ChunkStore::new(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn chunk_store(&self) -> &ChunkStore {
        &self.chunk_store
    }

    pub fn port_mut(&mut self, peer: NodeId) -> Option<&mut Port> {
        self.ports.get_mut(&peer)
    }

    pub fn ports(&self) -> impl Iterator<Item = (&NodeId, &Port)> {
        self.ports.iter()
    }

    pub fn ports_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.ports.values_mut()
    }

    /// Handles `packet` arriving physically at this node: advances `path_idx` to this node's
    /// position, then either deposits (destination reached) or forwards it.
    pub fn on_arrival(
        &mut self,
        mut packet: Packet,
        now: f64,
        scheduler: &mut EventScheduler,
    ) -> Result<ArrivalOutcome> {
        packet.path_idx += 1;
        debug_assert_eq!(packet.current_hop(), self.id, "arrival routed to the wrong node");

        if packet.at_destination() {
            let newly_complete = self.chunk_store.deposit(
                self.id,
                packet.chunk_id.clone(),
                packet.seq,
                packet.total,
                now,
            )?;
            log::debug!(
                "chunk {} seq {} delivered to {} (t={now})",
                packet.chunk_id,
                packet.seq,
                self.id
            );
            Ok(ArrivalOutcome::Delivered {
                chunk_id: packet.chunk_id,
                newly_complete,
            })
        } else {
            let next = packet.next_hop();
            let port = self.ports.get_mut(&next).ok_or_else(|| Error::RouteError {
                from: self.id,
                to: next,
                chunk_id: packet.chunk_id.clone(),
                seq: packet.seq,
                time: now,
            })?;
            port.enqueue(Rc::new(packet));
            port.request_arbitration(scheduler)?;
            Ok(ArrivalOutcome::Forwarded)
        }
    }
}

//! The top-level orchestrator: owns the topology, every node, the event scheduler, and the
//! policy engine, and drives them forward until the event queue drains.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::event::{Event, EventKind, EventScheduler};
use crate::ids::{ChunkId, NodeId};
use crate::node::{ArrivalOutcome, Node};
use crate::policy::{PolicyEngine, PolicyEntry};
use crate::topology::Topology;

/// Tunable knobs for a run, analogous in spirit to the teacher's plain-struct timing models:
/// a `Default` plus a small `with_*` builder, no external config file format.
#[derive(Clone, Debug)]
pub struct SimulationParams {
    /// Packets served per QP per visit to the round-robin arbiter before rotating.
    pub quantum: u32,
    /// Whether every `Arrival` is additionally appended to an in-memory trace for inspection.
    pub record_trace: bool,
    /// Hard cap on simulated time; `Simulation::run` stops draining the queue past this point.
    pub max_time: Option<f64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            quantum: 8,
            record_trace: false,
            max_time: None,
        }
    }
}

impl SimulationParams {
    pub fn with_quantum(mut self, quantum: u32) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }
}

/// One recorded event, kept when [`SimulationParams::record_trace`] is set.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    pub time: f64,
    pub node: NodeId,
    pub chunk_id: ChunkId,
    pub seq: u32,
}

/// Derived busy-time statistics for one egress port, computed after a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortUtilization {
    pub busy_time_seconds: f64,
    pub elapsed_seconds: f64,
}

impl PortUtilization {
    pub fn utilization(&self) -> f64 {
        if self.elapsed_seconds <= 0.0 {
            0.0
        } else {
            self.busy_time_seconds / self.elapsed_seconds
        }
    }
}

/// How a run concluded.
#[derive(Debug)]
pub enum EngineOutcome {
    /// The queue drained (or `max_time` was reached) with no unrecoverable error.
    Ok,
    /// A structural/config problem was detected while building or stepping the simulation.
    EngineError(crate::error::Error),
    /// A protocol-level invariant was violated while processing an event (e.g. a duplicate
    /// packet deposit, or routing to an undefined port).
    ProtocolError(crate::error::Error),
}

/// A fully built simulation, ready to run to completion.
pub struct Simulation {
    topology: Topology,
    nodes: HashMap<NodeId, Node>,
    scheduler: EventScheduler,
    policy_engine: PolicyEngine,
    params: SimulationParams,
    trace: Vec<TraceRecord>,
    completion_times: HashMap<ChunkId, HashMap<NodeId, f64>>,
}

impl Simulation {
    /// Builds every node from `topology`, installs `policies`, and bootstraps `produced` — the
    /// `(node, chunk_id)` pairs representing data originally available at `node` rather than
    /// arriving by forwarding — as synthetic chunk completions at `t=0`, releasing any policy
    /// entries keyed on them.
    pub fn build(
        topology: Topology,
        policies: Vec<PolicyEntry>,
        produced: Vec<(NodeId, ChunkId)>,
        params: SimulationParams,
    ) -> Result<Self> {
        let mut nodes = HashMap::new();
        for idx in 0..topology.num_nodes() {
            let id = NodeId(idx as u32);
            nodes.insert(id, Node::new(id, &topology, params.quantum)?);
        }

        let mut sim = Self {
            topology,
            nodes,
            scheduler: EventScheduler::new(),
            policy_engine: PolicyEngine::new(),
            params,
            trace: Vec::new(),
            completion_times: HashMap::new(),
        };

        for entry in policies {
            sim.policy_engine.install(entry, &sim.topology)?;
        }
        for (node, chunk_id) in produced {
            for entry in sim.policy_engine.on_chunk_complete(node, &chunk_id) {
                sim.schedule_policy_fire(entry)?;
            }
        }
        Ok(sim)
    }

    fn schedule_policy_fire(&mut self, entry: PolicyEntry) -> Result<()> {
        self.scheduler.schedule(
            0.0,
            EventKind::PolicyFire {
                entry: Box::new(entry),
            },
        )?;
        Ok(())
    }

    /// Runs every event to completion (or until `max_time`), returning the outcome. Structural
    /// errors raised while building packets or routing are classified per the error taxonomy.
    pub fn run(&mut self) -> EngineOutcome {
        loop {
            if let Some(max_time) = self.params.max_time {
                if self.scheduler.peek_time().map(|t| t > max_time).unwrap_or(false) {
                    return EngineOutcome::Ok;
                }
            }
            let Some(event) = self.scheduler.pop() else {
                return EngineOutcome::Ok;
            };
            if let Err(e) = self.process(event) {
                return Self::classify(e);
            }
        }
    }

    /// A [`crate::error::Error::DuplicatePacket`] is an impossible protocol state; everything
    /// else that can surface from `process` (a missing route, a malformed policy, a negative
    /// delay) traces back to the topology or policy configuration, not the wire protocol.
    fn classify(e: crate::error::Error) -> EngineOutcome {
        match e {
            crate::error::Error::DuplicatePacket { .. } => EngineOutcome::ProtocolError(e),
            _ => EngineOutcome::EngineError(e),
        }
    }

    fn process(&mut self, event: Event) -> Result<()> {
        match event.kind {
            EventKind::TxComplete { node, peer } => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    if let Some(port) = n.port_mut(peer) {
                        port.try_start_tx(&mut self.scheduler)?;
                    }
                }
                Ok(())
            }
            EventKind::Arbitrate { node, peer } => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    if let Some(port) = n.port_mut(peer) {
                        port.try_start_tx(&mut self.scheduler)?;
                    }
                }
                Ok(())
            }
            EventKind::Arrival { node, packet } => {
                let now = event.time;
                if self.params.record_trace {
                    self.trace.push(TraceRecord {
                        time: now,
                        node,
                        chunk_id: packet.chunk_id.clone(),
                        seq: packet.seq,
                    });
                }
                let n = self
                    .nodes
                    .get_mut(&node)
                    .expect("arrival targets a node outside the topology");
                let outcome = n.on_arrival((*packet).clone(), now, &mut self.scheduler)?;
                if let ArrivalOutcome::Delivered {
                    chunk_id,
                    newly_complete,
                } = outcome
                {
                    if newly_complete {
                        self.completion_times
                            .entry(chunk_id.clone())
                            .or_default()
                            .insert(node, now);
                        for entry in self.policy_engine.on_chunk_complete(node, &chunk_id) {
                            self.schedule_policy_fire(entry)?;
                        }
                    }
                }
                Ok(())
            }
            EventKind::PolicyFire { entry } => {
                let now = self.scheduler.now();
                let packets = PolicyEngine::fire(&entry, &self.topology)?;
                if packets.is_empty() {
                    // A zero-byte chunk is trivially complete with no packets in flight.
                    let dst = *entry.path.last().expect("validated non-empty path");
                    self.completion_times
                        .entry(entry.chunk_id.clone())
                        .or_default()
                        .entry(dst)
                        .or_insert(now);
                    for released in self.policy_engine.on_chunk_complete(dst, &entry.chunk_id) {
                        self.schedule_policy_fire(released)?;
                    }
                    return Ok(());
                }
                let src = entry.src;
                let first_hop = entry.path[1];
                let node = self.nodes.get_mut(&src).expect("entry.src must be a valid node");
                let port = node.port_mut(first_hop).ok_or_else(|| crate::error::Error::RouteError {
                    from: src,
                    to: first_hop,
                    chunk_id: entry.chunk_id.clone(),
                    seq: 0,
                    time: now,
                })?;
                for packet in packets {
                    port.enqueue(Rc::new(packet));
                }
                port.request_arbitration(&mut self.scheduler)?;
                Ok(())
            }
        }
    }

    pub fn completion_time(&self, chunk_id: &ChunkId, dst: NodeId) -> Option<f64> {
        self.completion_times.get(chunk_id).and_then(|m| m.get(&dst)).copied()
    }

    /// Every recorded completion time, keyed by chunk then by destination node.
    pub fn completion_times(&self) -> HashMap<ChunkId, HashMap<NodeId, f64>> {
        self.completion_times.clone()
    }

    pub fn trace(&self) -> &[TraceRecord] {
        &self.trace
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Busy-time utilization of every egress port, measured over `[0, now()]`.
    pub fn port_utilization(&self) -> HashMap<(NodeId, NodeId), PortUtilization> {
        let now = self.scheduler.now();
        let mut result = HashMap::new();
        for (&node_id, node) in &self.nodes {
            for (&peer, port) in node.ports() {
                result.insert(
                    (node_id, peer),
                    PortUtilization {
                        busy_time_seconds: port.total_busy_seconds(),
                        elapsed_seconds: now,
                    },
                );
            }
        }
        result
    }
}

//! Egress port arbitration: round-robin over per-flow [`QPQueue`]s with a serving quantum,
//! store-and-forward onto one physical [`Link`].

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::event::{EventKind, EventScheduler};
use crate::ids::{NodeId, QpId};
use crate::packet::Packet;
use crate::qp::QPQueue;
use crate::topology::Link;

type FlowId = (NodeId, QpId);

/// One directed egress port: `owner -> peer` over `link`, serving its flows round-robin.
pub struct Port {
    owner: NodeId,
    peer: NodeId,
    link: Link,
    quantum: u32,
    queues: HashMap<FlowId, QPQueue>,
    /// Flows with at least one packet queued, in round-robin service order.
    active: VecDeque<FlowId>,
    busy_until: f64,
    total_busy_seconds: f64,
}

impl Port {
    pub fn new(owner: NodeId, peer: NodeId, link: Link, quantum: u32) -> Result<Self> {
        if quantum == 0 {
            return Err(Error::InvalidConfig(format!(
                "port {owner}->{peer} quantum must be positive"
            )));
        }
        Ok(Self {
            owner,
            peer,
            link,
            quantum,
            queues: HashMap::new(),
            active: VecDeque::new(),
            busy_until: 0.0,
            total_busy_seconds: 0.0,
        })
    }

    pub fn peer(&self) -> NodeId {
        self.peer
    }

    pub fn is_idle(&self, now: f64) -> bool {
        now >= self.busy_until
    }

    pub fn busy_until(&self) -> f64 {
        self.busy_until
    }

    /// Cumulative time this port has spent serializing packets onto the wire.
    pub fn total_busy_seconds(&self) -> f64 {
        self.total_busy_seconds
    }

    /// Enqueues `packet` onto its flow's queue, activating the flow for round-robin service if it
    /// was previously empty.
    pub fn enqueue(&mut self, packet: Rc<Packet>) {
        let flow = packet.flow_id();
        let queue = self.queues.entry(flow).or_default();
        let was_empty = queue.is_empty();
        queue.push(packet);
        if was_empty && !self.active.contains(&flow) {
            self.active.push_back(flow);
        }
    }

    /// If this port is idle, schedules a zero-delay `Arbitrate` event rather than arbitrating
    /// immediately. Deferring lets several packets that land on this port at the same simulated
    /// instant (e.g. two chunks produced simultaneously) all finish enqueuing onto their QPs
    /// before round-robin selection runs once.
    pub fn request_arbitration(&self, scheduler: &mut EventScheduler) -> Result<()> {
        if self.is_idle(scheduler.now()) {
            scheduler.schedule(
                0.0,
                EventKind::Arbitrate {
                    node: self.owner,
                    peer: self.peer,
                },
            )?;
        }
        Ok(())
    }

    /// If idle and some flow has a packet ready, serves one packet: schedules its arrival at
    /// `peer` and a `TxComplete` that will re-invoke arbitration. Returns whether a packet was
    /// sent.
    pub fn try_start_tx(&mut self, scheduler: &mut EventScheduler) -> Result<bool> {
        let now = scheduler.now();
        if !self.is_idle(now) {
            return Ok(false);
        }
        let Some(&flow) = self.active.front() else {
            return Ok(false);
        };
        let queue = self
            .queues
            .get_mut(&flow)
            .expect("active flow must have a queue");
        let packet = queue.pop().expect("active flow must be non-empty");

        let effective_rate_bps = self.link.line_rate_bps.min(packet.rate_bps);
        let tx_time = (packet.size_bytes as f64 * 8.0) / effective_rate_bps;
        let prop_time = self.link.propagation_delay_seconds;

        scheduler.schedule(
            tx_time,
            EventKind::TxComplete {
                node: self.owner,
                peer: self.peer,
            },
        )?;
        scheduler.schedule(
            tx_time + prop_time,
            EventKind::Arrival {
                node: self.peer,
                packet: Rc::new((*packet).clone()),
            },
        )?;
        self.busy_until = now + tx_time;
        self.total_busy_seconds += tx_time;

        queue.record_service();
        if queue.is_empty() || queue.packets_served_in_current_visit() >= self.quantum {
            queue.reset_visit();
            self.active.pop_front();
            if !queue.is_empty() {
                self.active.push_back(flow);
            }
        }
        Ok(true)
    }

    pub fn has_pending(&self) -> bool {
        !self.active.is_empty()
    }
}

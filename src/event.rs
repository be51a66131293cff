//! Discrete-event scheduler: a monotonic-time priority queue driving simulation progress.
//!
//! Mirrors the `PriorityQueue<_, Reverse<NotNan<f64>>>` shape the teacher's
//! `timing_model::TimingModel` uses for its delivery/processing queues, generalized to a single
//! queue of strongly-typed simulation events with an explicit `seq` tiebreaker for determinism.

use std::cmp::Reverse;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ordered_float::NotNan;
use priority_queue::PriorityQueue;

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::packet::Packet;
use crate::policy::PolicyEntry;

/// The payload carried by a scheduled [`Event`].
#[derive(Clone, Debug)]
pub enum EventKind {
    /// A port has finished serializing a packet onto the wire; it may now arbitrate again.
    TxComplete { node: NodeId, peer: NodeId },
    /// A packet has finished propagating across a link and is now physically at `node`.
    Arrival { node: NodeId, packet: Rc<Packet> },
    /// A policy entry has become eligible (its trigger fired) and should be turned into packets.
    PolicyFire { entry: Box<PolicyEntry> },
    /// A port that was idle when a packet landed in one of its QPs should now pick a packet to
    /// serve. Deferred (rather than invoked synchronously from the enqueue) so that several
    /// enqueues landing at the same simulated instant all complete before arbitration runs,
    /// giving deterministic round-robin ordering among QPs that become active simultaneously.
    Arbitrate { node: NodeId, peer: NodeId },
}

/// A single entry in the event queue: a simulated time, a payload, and a monotonic tiebreaker.
#[derive(Clone, Debug)]
pub struct Event {
    pub time: f64,
    pub seq: u64,
    pub kind: EventKind,
}

// `seq` is assigned uniquely by `EventScheduler::schedule`, so it alone is sufficient (and
// necessary, since `EventKind` carries `f64` payloads that are not `Eq`/`Hash`) to give every
// scheduled event distinct identity inside the underlying `PriorityQueue`.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for Event {}
impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

/// Min-heap keyed by `(time, seq)`, equal-time events dequeuing in insertion order.
#[derive(Default)]
pub struct EventScheduler {
    queue: PriorityQueue<Event, Reverse<(NotNan<f64>, u64)>>,
    now: f64,
    next_seq: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of events still pending.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `kind` to fire `delay` seconds from `now`. Returns the assigned `seq`.
    pub fn schedule(&mut self, delay: f64, kind: EventKind) -> Result<u64> {
        if delay < 0.0 {
            return Err(Error::InvalidDelay(delay));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let time = self.now + delay;
        let priority = Reverse((
            NotNan::new(time).map_err(|_| Error::InvalidConfig("event time is NaN".into()))?,
            seq,
        ));
        self.queue.push(Event { time, seq, kind }, priority);
        Ok(seq)
    }

    /// Pop the earliest event and advance `now` to its time. `now` never decreases: if the queue
    /// is somehow behind `now` (it never should be, by construction), `now` simply stays put.
    pub fn pop(&mut self) -> Option<Event> {
        let (event, _) = self.queue.pop()?;
        if event.time > self.now {
            self.now = event.time;
        }
        Some(event)
    }

    /// Peek the time of the next event without dequeuing it.
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|(e, _)| e.time)
    }
}

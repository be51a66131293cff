//! Per-flow queue pair: a strict FIFO of packets awaiting transmission on one egress port.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::packet::Packet;

/// The FIFO queue backing one (source-node, source-QP) flow on a given egress port.
///
/// `packets_served_in_current_visit` is owned here rather than by the [`crate::port::Port`]
/// arbiter so that a QP's quantum accounting survives it being round-robin'd away from and back
/// to, matching the round-robin-with-quantum discipline described for egress scheduling.
#[derive(Default)]
pub struct QPQueue {
    packets: VecDeque<Rc<Packet>>,
    packets_served_in_current_visit: u32,
}

impl QPQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: Rc<Packet>) {
        self.packets.push_back(packet);
    }

    pub fn pop(&mut self) -> Option<Rc<Packet>> {
        self.packets.pop_front()
    }

    pub fn peek(&self) -> Option<&Rc<Packet>> {
        self.packets.front()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn packets_served_in_current_visit(&self) -> u32 {
        self.packets_served_in_current_visit
    }

    pub fn record_service(&mut self) {
        self.packets_served_in_current_visit += 1;
    }

    pub fn reset_visit(&mut self) {
        self.packets_served_in_current_visit = 0;
    }
}

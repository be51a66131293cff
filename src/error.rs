//! Error taxonomy for the simulation engine.

use crate::ids::{ChunkId, NodeId};

/// All ways the engine can refuse to build or run a simulation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A policy entry is malformed: bad path, unknown node, negative size, non-positive rate.
    #[error("invalid policy for chunk {chunk_id} at src {src}: {reason}")]
    InvalidPolicy {
        chunk_id: ChunkId,
        src: String,
        reason: String,
    },

    /// Nonsensical simulator parameters (quantum = 0, payload = 0, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A packet arrived at a node whose next hop has no local egress port.
    #[error("no route from {from} to {to} for chunk {chunk_id} packet #{seq} at t={time}")]
    RouteError {
        from: NodeId,
        to: NodeId,
        chunk_id: ChunkId,
        seq: u32,
        time: f64,
    },

    /// The same `(chunk_id, seq)` was delivered twice to the same chunk store.
    #[error("duplicate packet: chunk {chunk_id} seq {seq} already deposited at {node} (t={time})")]
    DuplicatePacket {
        chunk_id: ChunkId,
        seq: u32,
        node: NodeId,
        time: f64,
    },

    /// A negative delay was passed to the scheduler.
    #[error("invalid delay {0} seconds: delays must be non-negative")]
    InvalidDelay(f64),

    /// Catch-all wrapper surfaced to the caller for runtime failures that do not fit the
    /// taxonomy above (e.g. an adapter-level I/O error when exporting a trace).
    #[error("engine error: {0}")]
    EngineError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;

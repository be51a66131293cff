//! Opaque handle types used throughout the engine.
//!
//! Node identity is interned into a small `Copy` handle the same way `RouterId` is used
//! throughout the teacher's `bgpsim`-based stack: callers build a [`crate::topology::Topology`]
//! from human-readable names, and from then on the engine only ever manipulates cheap `NodeId`s.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A node in the resolved topology, interned to a dense index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A chunk identifier, either an integer or a string, matching the policy input contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkId {
    Int(u64),
    Str(String),
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for ChunkId {
    fn from(i: u64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for ChunkId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ChunkId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// A queue-pair identifier at the source of a flow; non-negative by contract.
pub type QpId = u32;

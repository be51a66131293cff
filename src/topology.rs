//! Network topology: nodes interned to [`NodeId`]s, directed links with rate and propagation
//! delay.
//!
//! Grounded on the teacher's `topology::Topology::build_network`, which validates links while
//! building and reports malformed topology input via `log::error!` plus a bubbled `Err`.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ids::NodeId;

/// A directed physical link between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub line_rate_bps: f64,
    pub propagation_delay_seconds: f64,
}

/// A resolved network: interned node names and the directed links between them.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    names: Vec<String>,
    edges: HashMap<(NodeId, NodeId), Link>,
}

impl Topology {
    pub fn node_name(&self, id: NodeId) -> &str {
        &self.names[id.index()]
    }

    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    /// Whether `id` was interned by this topology's builder.
    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.names.len()
    }

    /// The link to take to go from `from` directly to `to`, if one exists.
    pub fn link(&self, from: NodeId, to: NodeId) -> Option<&Link> {
        self.edges.get(&(from, to))
    }

    pub fn links(&self) -> impl Iterator<Item = (&(NodeId, NodeId), &Link)> {
        self.edges.iter()
    }
}

/// Incrementally builds a [`Topology`], interning node names and validating links as they are
/// added.
#[derive(Default)]
pub struct TopologyBuilder {
    name_to_id: HashMap<String, NodeId>,
    names: Vec<String>,
    edges: HashMap<(NodeId, NodeId), Link>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning its existing id if already known.
    pub fn node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = NodeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Adds a directed link `from -> to`. Rejects self-loops, non-positive rate/delay, and
    /// re-definition of an existing edge.
    pub fn edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        line_rate_bps: f64,
        propagation_delay_seconds: f64,
    ) -> Result<()> {
        if from == to {
            log::error!("rejecting self-loop at {from}");
            return Err(Error::InvalidConfig(format!("self-loop at {from}")));
        }
        if line_rate_bps <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "link {from}->{to} has non-positive rate {line_rate_bps}"
            )));
        }
        if propagation_delay_seconds < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "link {from}->{to} has negative propagation delay {propagation_delay_seconds}"
            )));
        }
        if self.edges.contains_key(&(from, to)) {
            log::error!("duplicate link definition {from}->{to}");
            return Err(Error::InvalidConfig(format!(
                "link {from}->{to} already defined"
            )));
        }
        self.edges.insert(
            (from, to),
            Link {
                line_rate_bps,
                propagation_delay_seconds,
            },
        );
        Ok(())
    }

    /// Adds a bidirectional link by inserting both directed edges with identical parameters.
    pub fn edge_bidi(
        &mut self,
        a: NodeId,
        b: NodeId,
        line_rate_bps: f64,
        propagation_delay_seconds: f64,
    ) -> Result<()> {
        self.edge(a, b, line_rate_bps, propagation_delay_seconds)?;
        self.edge(b, a, line_rate_bps, propagation_delay_seconds)
    }

    pub fn build(self) -> Topology {
        Topology {
            names: self.names,
            edges: self.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_repeated_names_to_the_same_id() {
        let mut b = TopologyBuilder::new();
        let a1 = b.node("A");
        let a2 = b.node("A");
        assert_eq!(a1, a2);
    }

    #[test]
    fn rejects_self_loop() {
        let mut b = TopologyBuilder::new();
        let a = b.node("A");
        assert!(b.edge(a, a, 1e9, 1e-6).is_err());
    }

    #[test]
    fn rejects_duplicate_edge() {
        let mut b = TopologyBuilder::new();
        let a = b.node("A");
        let c = b.node("B");
        b.edge(a, c, 1e9, 1e-6).unwrap();
        assert!(b.edge(a, c, 1e9, 1e-6).is_err());
    }

    #[test]
    fn bidi_inserts_both_directions() {
        let mut b = TopologyBuilder::new();
        let a = b.node("A");
        let c = b.node("B");
        b.edge_bidi(a, c, 1e9, 1e-6).unwrap();
        let topo = b.build();
        assert!(topo.link(a, c).is_some());
        assert!(topo.link(c, a).is_some());
    }
}

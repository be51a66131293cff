//! End-to-end scenarios exercising the engine as a whole: a small topology, a handful of policy
//! entries, a run to completion, and assertions on completion times and delivery order.
//!
//! One `#[test]` per named scenario, in the role `trix::test::{loop_free, waypoints,
//! hard_waypoints}` play for the teacher: each checks the engine's output against a hand-derived
//! expectation rather than a round-trip grid.

use std::rc::Rc;

use cclsim::prelude::*;

/// A straight line `A -> B -> ...`, every hop sharing the same rate and propagation delay.
fn line_topology(hops: &[&str], line_rate_bps: f64, propagation_delay_seconds: f64) -> (Topology, Vec<NodeId>) {
    let mut b = TopologyBuilder::new();
    let ids: Vec<NodeId> = hops.iter().map(|name| b.node(name)).collect();
    for pair in ids.windows(2) {
        b.edge_bidi(pair[0], pair[1], line_rate_bps, propagation_delay_seconds)
            .unwrap();
    }
    (b.build(), ids)
}

fn entry(
    chunk_id: impl Into<ChunkId>,
    qpid: QpId,
    chunk_size_bytes: u64,
    payload_bytes_per_packet: u64,
    rate: Rate,
    path: &[NodeId],
) -> PolicyEntry {
    PolicyEntry {
        chunk_id: chunk_id.into(),
        src: path[0],
        path: Rc::from(path.to_vec()),
        chunk_size_bytes,
        payload_bytes_per_packet,
        qpid,
        rate,
    }
}

/// S1: a single hop, one chunk fragmented into three packets serialized back to back.
#[test]
fn single_hop_three_packets_serialize_back_to_back() {
    let (topo, nodes) = line_topology(&["A", "B"], 10e9, 1e-6);
    let (a, b) = (nodes[0], nodes[1]);

    let e = entry(0u64, 0, 3000, 1000, Rate::Max, &[a, b]);
    let mut sim = Simulation::build(topo, vec![e], vec![(a, ChunkId::Int(0))], SimulationParams::default()).unwrap();
    assert!(matches!(sim.run(), EngineOutcome::Ok));

    // tx_time = 1000 B * 8 / 10e9 bps = 800 ns per packet; three back to back = 2400 ns, plus one
    // 1 us propagation delay for the last bit of the last packet to arrive.
    let completion = sim.completion_time(&ChunkId::Int(0), b).unwrap();
    assert!((completion - 3.4e-6).abs() < 1e-12, "got {completion}");
}

/// S2: two chunks produced simultaneously on distinct QPs, quantum 1 interleaves every packet.
#[test]
fn round_robin_quantum_one_interleaves_every_packet() {
    let (topo, nodes) = line_topology(&["A", "B"], 8_000.0, 0.0);
    let (a, b) = (nodes[0], nodes[1]);

    let c0 = entry("c0", 0, 2000, 1000, Rate::Fixed(8_000.0), &[a, b]);
    let c1 = entry("c1", 1, 2000, 1000, Rate::Fixed(8_000.0), &[a, b]);
    let mut sim = Simulation::build(
        topo,
        vec![c0, c1],
        vec![(a, ChunkId::from("c0")), (a, ChunkId::from("c1"))],
        SimulationParams::default().with_quantum(1).with_trace(true),
    )
    .unwrap();
    assert!(matches!(sim.run(), EngineOutcome::Ok));

    let order: Vec<(String, u32)> = sim
        .trace()
        .iter()
        .map(|r| (r.chunk_id.to_string(), r.seq))
        .collect();
    assert_eq!(
        order,
        vec![
            ("c0".into(), 0),
            ("c1".into(), 0),
            ("c0".into(), 1),
            ("c1".into(), 1),
        ]
    );
}

/// S3: same as S2 but quantum 2 drains each flow's visit before rotating.
#[test]
fn round_robin_quantum_two_drains_each_flow_before_rotating() {
    let (topo, nodes) = line_topology(&["A", "B"], 8_000.0, 0.0);
    let (a, b) = (nodes[0], nodes[1]);

    let c0 = entry("c0", 0, 2000, 1000, Rate::Fixed(8_000.0), &[a, b]);
    let c1 = entry("c1", 1, 2000, 1000, Rate::Fixed(8_000.0), &[a, b]);
    let mut sim = Simulation::build(
        topo,
        vec![c0, c1],
        vec![(a, ChunkId::from("c0")), (a, ChunkId::from("c1"))],
        SimulationParams::default().with_quantum(2).with_trace(true),
    )
    .unwrap();
    assert!(matches!(sim.run(), EngineOutcome::Ok));

    let order: Vec<(String, u32)> = sim
        .trace()
        .iter()
        .map(|r| (r.chunk_id.to_string(), r.seq))
        .collect();
    assert_eq!(
        order,
        vec![
            ("c0".into(), 0),
            ("c0".into(), 1),
            ("c1".into(), 0),
            ("c1".into(), 1),
        ]
    );
}

/// S4: a two-hop line. Each of the four packets is forwarded store-and-forward style, so the
/// last packet's completion time reflects a full pipeline rather than a single packet's latency.
#[test]
fn multi_hop_four_packets_pipeline_across_two_hops() {
    let (topo, nodes) = line_topology(&["A", "B", "C"], 10e9, 1e-6);
    let (a, b, c) = (nodes[0], nodes[1], nodes[2]);

    let e = entry(0u64, 0, 4000, 1000, Rate::Max, &[a, b, c]);
    let mut sim = Simulation::build(topo, vec![e], vec![(a, ChunkId::Int(0))], SimulationParams::default()).unwrap();
    assert!(matches!(sim.run(), EngineOutcome::Ok));

    // Each hop serializes at 800 ns/packet. On the first hop the four packets queue back to
    // back (3200 ns total) before the last one's bits finish propagating (+1 us). On the second
    // hop the packets keep arriving exactly as fast as B can re-serialize them (same line rate),
    // so B never sits idle between packets either: the last packet's own 800 ns serialization on
    // the B->C link, plus one more propagation delay, completes the pipeline.
    let completion = sim.completion_time(&ChunkId::Int(0), c).unwrap();
    let expected = 4.0 * 800e-9 + 1e-6 + 800e-9 + 1e-6;
    assert!((completion - expected).abs() < 1e-12, "got {completion}, expected {expected}");
}

/// S5: a chunk forwarded to B, where its arrival releases two sibling policies fanning out to C
/// and D. Both fire at the same simulated instant, in installation order, and neither contends
/// with the other for a port, so both complete at the identical time.
#[test]
fn fanout_arrival_at_b_releases_both_downstream_policies_at_once() {
    let mut b_builder = TopologyBuilder::new();
    let a = b_builder.node("A");
    let b = b_builder.node("B");
    let c = b_builder.node("C");
    let d = b_builder.node("D");
    b_builder.edge_bidi(a, b, 10e9, 1e-6).unwrap();
    b_builder.edge_bidi(b, c, 10e9, 1e-6).unwrap();
    b_builder.edge_bidi(b, d, 10e9, 1e-6).unwrap();
    let topo = b_builder.build();

    let to_b = entry(0u64, 0, 1000, 1000, Rate::Max, &[a, b]);
    let to_c = entry(0u64, 0, 1000, 1000, Rate::Max, &[b, c]);
    let to_d = entry(0u64, 1, 1000, 1000, Rate::Max, &[b, d]);

    let mut sim = Simulation::build(
        topo,
        vec![to_b, to_c, to_d],
        vec![(a, ChunkId::Int(0))],
        SimulationParams::default(),
    )
    .unwrap();
    assert!(matches!(sim.run(), EngineOutcome::Ok));

    let at_b = sim.completion_time(&ChunkId::Int(0), b).unwrap();
    let at_c = sim.completion_time(&ChunkId::Int(0), c).unwrap();
    let at_d = sim.completion_time(&ChunkId::Int(0), d).unwrap();

    assert!(at_b < at_c);
    assert!(at_b < at_d);
    assert!((at_c - at_d).abs() < 1e-12, "at_c={at_c}, at_d={at_d}");
}

/// S6: `Rate::Max` resolves against the source's egress link only, independent of how slow a
/// later hop on the path might be.
#[test]
fn max_rate_resolves_to_the_first_hop_line_rate() {
    let mut b = TopologyBuilder::new();
    let a = b.node("A");
    let mid = b.node("B");
    let c = b.node("C");
    b.edge_bidi(a, mid, 25e9, 1e-6).unwrap();
    b.edge_bidi(mid, c, 1e9, 1e-6).unwrap();
    let topo = b.build();

    let e = entry(0u64, 0, 1000, 1000, Rate::Max, &[a, mid, c]);
    let packets = PolicyEngine::fire(&e, &topo).unwrap();
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].rate_bps, 25e9);
}

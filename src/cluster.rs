// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Cluster Election & Formation

use rand::Rng;

use crate::node::SensorNode;
use crate::types::NodeRole;

/// Rotating election threshold `P / (1 - P * (r mod 1/P))`. Grows across the
/// `1/P`-round epoch and reaches certainty at the epoch's last slot, so every
/// eligible node is elected exactly once per full epoch.
fn election_threshold(p: f64, round: usize) -> f64 {
    p / (1.0 - p * (round as f64 % (1.0 / p)))
}

/// One Setup phase: reset roles, elect heads, form clusters. Returns elected
/// head ids in election order. Node ids index the registry directly.
///
/// Eligibility requires `1/P` rounds since the node last served; nodes that
/// never served count from round -1. One uniform draw is consumed per
/// eligible node and none for ineligible ones.
pub fn run_setup<R: Rng>(
    nodes: &mut [SensorNode],
    round: usize,
    head_probability: f64,
    rng: &mut R,
) -> Vec<u32> {
    for node in nodes.iter_mut() {
        node.reset_role();
    }

    if !nodes.iter().any(|n| n.alive) {
        return Vec::new();
    }

    // ─── Election ────────────────────────────────────────────────────────
    let mut heads: Vec<u32> = Vec::new();
    let epoch = 1.0 / head_probability;
    for node in nodes.iter_mut() {
        if !node.alive {
            continue;
        }
        let last = node.last_head_round.map(|r| r as f64).unwrap_or(-1.0);
        if round as f64 - last >= epoch {
            if election_threshold(head_probability, round) > rng.gen::<f64>() {
                node.become_head(round);
                heads.push(node.id);
            }
        }
    }

    // ─── Formation ───────────────────────────────────────────────────────
    // Non-heads cluster under the nearest head unless the sink is strictly
    // closer; with no heads at all, everyone goes direct.
    for i in 0..nodes.len() {
        if !nodes[i].alive || nodes[i].role.is_head() {
            continue;
        }
        if heads.is_empty() {
            nodes[i].role = NodeRole::Direct;
            continue;
        }

        let pos = nodes[i].pos;
        let (nearest, head_dist_sq) = heads
            .iter()
            .map(|&h| (h, pos.distance_sq(nodes[h as usize].pos)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();

        if pos.distance_sq(nodes[i].sink) < head_dist_sq {
            nodes[i].role = NodeRole::Direct;
        } else {
            nodes[i].role = NodeRole::Member { head: nearest };
            let member_id = nodes[i].id;
            nodes[nearest as usize].members.push(member_id);
        }
    }

    heads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INITIAL_ENERGY;
    use crate::types::Position;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn field(positions: &[(f64, f64)]) -> Vec<SensorNode> {
        let sink = Position::new(0.0, 0.0);
        positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                SensorNode::new(i as u32, Position::new(x, y), sink, INITIAL_ENERGY)
            })
            .collect()
    }

    #[test]
    fn test_threshold_grows_across_epoch_and_resets() {
        let t0 = election_threshold(0.2, 0);
        let t2 = election_threshold(0.2, 2);
        let t4 = election_threshold(0.2, 4);
        let t5 = election_threshold(0.2, 5);
        assert!((t0 - 0.2).abs() < 1e-12);
        assert!(t0 < t2 && t2 < t4);
        assert!(t4 >= 1.0, "epoch-final slot elects with certainty, got {}", t4);
        assert!((t5 - 0.2).abs() < 1e-12, "threshold resets at the next epoch");
    }

    #[test]
    fn test_fresh_network_elects_nobody_before_first_epoch() {
        // last_head_round starts one epoch shy: no node is eligible until
        // round >= 1/P - 1, whatever the draws say.
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for round in 0..3 {
            let mut nodes = field(&[(10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]);
            let heads = run_setup(&mut nodes, round, 0.3, &mut rng);
            assert!(heads.is_empty(), "round {} elected {:?}", round, heads);
            assert!(nodes.iter().all(|n| n.role.is_direct()));
        }
    }

    #[test]
    fn test_epoch_final_slot_elects_every_eligible_node() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut nodes = field(&[(10.0, 10.0), (20.0, 20.0)]);
        // P = 0.2, round 4: threshold is ~1.0 and both nodes are eligible.
        let heads = run_setup(&mut nodes, 4, 0.2, &mut rng);
        assert_eq!(heads, vec![0, 1]);
        assert!(nodes.iter().all(|n| n.role.is_head()));
        assert_eq!(nodes[0].last_head_round, Some(4));
    }

    #[test]
    fn test_recent_heads_are_ineligible() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut nodes = field(&[(10.0, 10.0), (60.0, 60.0)]);
        nodes[1].last_head_round = Some(2);
        // P = 0.2, round 4: node 0 is eligible with certainty, node 1 served
        // 2 rounds ago and must sit out the rest of its epoch.
        let heads = run_setup(&mut nodes, 4, 0.2, &mut rng);
        assert_eq!(heads, vec![0]);
        assert!(!nodes[1].role.is_head());
    }

    #[test]
    fn test_formation_clusters_under_nearest_head() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // Node 0 elected with certainty; 1 and 2 ineligible.
        let mut nodes = field(&[(10.0, 0.0), (12.0, 0.0), (1.0, 0.0)]);
        nodes[1].last_head_round = Some(3);
        nodes[2].last_head_round = Some(3);

        let heads = run_setup(&mut nodes, 4, 0.2, &mut rng);
        assert_eq!(heads, vec![0]);
        // Node 1: head at distance 2, sink at 12 -> clusters.
        assert_eq!(nodes[1].role, NodeRole::Member { head: 0 });
        // Node 2: sink at distance 1, head at 9 -> direct override.
        assert!(nodes[2].role.is_direct());
        assert_eq!(nodes[0].members, vec![1]);
    }

    #[test]
    fn test_equidistant_node_clusters_rather_than_going_direct() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // Node 1 sits exactly halfway: 5.0 to sink, 5.0 to the head. The
        // direct override requires the sink to be strictly closer.
        let mut nodes = field(&[(10.0, 0.0), (5.0, 0.0)]);
        nodes[1].last_head_round = Some(3);

        let heads = run_setup(&mut nodes, 4, 0.2, &mut rng);
        assert_eq!(heads, vec![0]);
        assert_eq!(nodes[1].role, NodeRole::Member { head: 0 });
    }

    #[test]
    fn test_dead_nodes_sit_out_election_and_formation() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut nodes = field(&[(10.0, 0.0), (11.0, 0.0), (12.0, 0.0)]);
        nodes[1].alive = false;
        nodes[1].energy = 0.0;
        nodes[2].last_head_round = Some(3);

        let heads = run_setup(&mut nodes, 4, 0.2, &mut rng);
        assert_eq!(heads, vec![0]);
        assert!(!nodes[0].members.contains(&1));
        assert!(nodes[2].role.head_id() == Some(0) || nodes[2].role.is_direct());
    }

    #[test]
    fn test_election_rate_tracks_probability() {
        // With every node perpetually eligible, the per-round election rate
        // at epoch slot 0 should sit near P.
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let mut elected = 0usize;
        let trials = 4000;
        for _ in 0..trials {
            let mut nodes = field(&[(10.0, 10.0)]);
            // Round 5 opens an epoch (5 mod 5 = 0) and the node is eligible.
            let heads = run_setup(&mut nodes, 5, 0.2, &mut rng);
            elected += heads.len();
        }
        let rate = elected as f64 / trials as f64;
        assert!((rate - 0.2).abs() < 0.03, "election rate {} too far from P", rate);
    }
}

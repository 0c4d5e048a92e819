// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Sensor Node

use crate::config::EnergyConfig;
use crate::energy::{aggregate_cost, receive_cost, transmit_cost};
use crate::station::BaseStation;
use crate::types::{NodeRole, Position};

// ─── Sensor Node ─────────────────────────────────────────────────────────────

/// One energy-constrained sensor. Death is terminal: `energy == 0.0` and
/// `alive == false` are set together and never revert.
#[derive(Debug, Clone)]
pub struct SensorNode {
    pub id: u32,
    pub pos: Position,
    /// Sink position, copied in at construction so cost math needs no lookup.
    pub sink: Position,
    pub energy: f64,
    /// Readings sensed but not yet delivered. Survives failed sends and is
    /// drained whole on a successful one.
    pub data: Vec<f64>,
    pub alive: bool,
    pub role: NodeRole,
    /// Member ids registered at cluster formation. Determines the head's
    /// aggregation surcharge even if some members fail to deliver.
    pub members: Vec<u32>,
    /// Round in which this node last served as head. `None` = never.
    pub last_head_round: Option<usize>,
    pub rounds_alive: u32,
}

impl SensorNode {
    pub fn new(id: u32, pos: Position, sink: Position, initial_energy: f64) -> Self {
        Self {
            id,
            pos,
            sink,
            energy: initial_energy,
            data: Vec::new(),
            alive: true,
            role: NodeRole::Unassigned,
            members: Vec::new(),
            last_head_round: None,
            rounds_alive: 0,
        }
    }

    pub fn distance_to_sink(&self) -> f64 {
        self.pos.distance_to(self.sink)
    }

    /// Deducts `cost`, killing the node when the balance reaches zero. Every
    /// costed operation funnels through here so the death rule stays uniform.
    fn debit(&mut self, cost: f64) {
        self.energy -= cost;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            self.alive = false;
        }
    }

    /// Clears role state ahead of re-election. No-op for dead nodes.
    pub fn reset_role(&mut self) {
        if !self.alive {
            return;
        }
        self.role = NodeRole::Unassigned;
        self.members.clear();
    }

    /// Promotes the node to cluster head for `round` and stamps the rotation
    /// memory that gates future eligibility.
    pub fn become_head(&mut self, round: usize) {
        self.role = NodeRole::Head;
        self.members.clear();
        self.last_head_round = Some(round);
    }

    /// Takes one reading. A node that cannot afford the sensing cycle dies
    /// and the reading is lost; a node drained to zero by it also dies,
    /// likewise losing the reading.
    pub fn sense(&mut self, reading: f64, cfg: &EnergyConfig) {
        if !self.alive {
            return;
        }
        if self.energy < cfg.sense_cost {
            self.energy = 0.0;
            self.alive = false;
            return;
        }
        self.debit(cfg.sense_cost);
        if self.alive {
            self.data.push(reading);
        }
    }

    /// Sends the whole buffer straight to the sink. Only legal in the direct
    /// role with a non-empty buffer. A sender that cannot afford the hop dies
    /// without delivering; one that exactly exhausts itself delivers first.
    pub fn send_direct(&mut self, station: &mut BaseStation, cfg: &EnergyConfig) -> bool {
        if !self.alive || !self.role.is_direct() || self.data.is_empty() {
            return false;
        }
        let cost = transmit_cost(cfg, cfg.packet_bits, self.distance_to_sink());
        if self.energy < cost {
            self.energy = 0.0;
            self.alive = false;
            return false;
        }
        self.debit(cost);
        station.receive_data(self.id, std::mem::take(&mut self.data));
        true
    }

    /// Appends a member's batch to the aggregation buffer. Dropped silently
    /// if this node is dead or no longer a head.
    pub fn receive_from_member(&mut self, batch: Vec<f64>) {
        if !self.alive || !self.role.is_head() {
            return;
        }
        self.data.extend(batch);
    }

    /// Head duty: fuse the buffer and forward it to the sink. The aggregation
    /// surcharge for the registered member count is folded into the *bit
    /// count* handed to the transmit model, which shifts the effective cost
    /// curve rather than billing a separate line item.
    pub fn aggregate_and_forward(&mut self, station: &mut BaseStation, cfg: &EnergyConfig) -> bool {
        if !self.alive || !self.role.is_head() || self.data.is_empty() {
            return false;
        }
        let bits = cfg.packet_bits + aggregate_cost(cfg, self.members.len());
        let cost = transmit_cost(cfg, bits, self.distance_to_sink());
        if self.energy < cost {
            self.energy = 0.0;
            self.alive = false;
            return false;
        }
        self.debit(cost);
        station.receive_data(self.id, std::mem::take(&mut self.data));
        true
    }

    /// End-of-round sleep debit. Kills the node when it drains the balance.
    pub fn idle(&mut self, cfg: &EnergyConfig) {
        if !self.alive {
            return;
        }
        self.debit(cfg.idle_cost);
    }
}

// ─── Cluster Transfer ────────────────────────────────────────────────────────

/// Moves the sender's buffer to its assigned head. Free function because the
/// transfer mutates two entries of the registry; node ids index the slice
/// directly. Failure modes, in order:
/// - sender dead, unclustered, or empty buffer: plain failure
/// - head died since assignment: sender's role clears (reassigned next
///   Setup), no energy spent
/// - sender cannot afford the hop: sender dies
/// - head cannot afford the receive: plain failure, nobody pays
pub(crate) fn send_to_head(nodes: &mut [SensorNode], sender: usize, cfg: &EnergyConfig) -> bool {
    let head_idx = {
        let s = &nodes[sender];
        if !s.alive || s.data.is_empty() {
            return false;
        }
        match s.role.head_id() {
            Some(id) => id as usize,
            None => return false,
        }
    };

    if !nodes[head_idx].alive {
        nodes[sender].role = NodeRole::Unassigned;
        return false;
    }

    let distance = nodes[sender].pos.distance_to(nodes[head_idx].pos);
    let tx = transmit_cost(cfg, cfg.packet_bits, distance);
    let rx = receive_cost(cfg, cfg.packet_bits);

    if nodes[sender].energy < tx {
        nodes[sender].energy = 0.0;
        nodes[sender].alive = false;
        return false;
    }
    if nodes[head_idx].energy < rx {
        return false;
    }

    nodes[sender].debit(tx);
    nodes[head_idx].debit(rx);

    let batch = std::mem::take(&mut nodes[sender].data);
    nodes[head_idx].receive_from_member(batch);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{INITIAL_ENERGY, PACKET_BITS};

    fn sink() -> Position {
        Position::new(0.0, 0.0)
    }

    fn node_at(id: u32, x: f64, y: f64) -> SensorNode {
        SensorNode::new(id, Position::new(x, y), sink(), INITIAL_ENERGY)
    }

    fn station() -> BaseStation {
        BaseStation::new(sink(), 60.0)
    }

    #[test]
    fn test_sense_debits_and_buffers() {
        let cfg = EnergyConfig::default();
        let mut n = node_at(0, 10.0, 10.0);
        n.sense(25.0, &cfg);
        assert!(n.alive);
        assert_eq!(n.data, vec![25.0]);
        assert!((n.energy - (INITIAL_ENERGY - cfg.sense_cost)).abs() < 1e-15);
    }

    #[test]
    fn test_sense_kills_when_unaffordable() {
        let cfg = EnergyConfig::default();
        let mut n = node_at(0, 10.0, 10.0);
        n.energy = cfg.sense_cost / 2.0;
        n.sense(30.0, &cfg);
        assert!(!n.alive);
        assert_eq!(n.energy, 0.0);
        assert!(n.data.is_empty(), "failed sense must not buffer the reading");
    }

    #[test]
    fn test_sense_exact_balance_is_terminal() {
        let cfg = EnergyConfig::default();
        let mut n = node_at(0, 10.0, 10.0);
        n.energy = cfg.sense_cost;
        n.sense(30.0, &cfg);
        assert!(!n.alive, "zero energy and dead are the same terminal state");
        assert_eq!(n.energy, 0.0);
        assert!(n.data.is_empty());
    }

    #[test]
    fn test_dead_node_ignores_all_operations() {
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut n = node_at(0, 10.0, 10.0);
        n.alive = false;
        n.energy = 0.0;

        n.sense(30.0, &cfg);
        assert!(n.data.is_empty());
        n.role = NodeRole::Direct;
        n.data.push(30.0);
        assert!(!n.send_direct(&mut bs, &cfg));
        n.idle(&cfg);
        assert_eq!(n.energy, 0.0);
        assert_eq!(bs.total_readings(), 0);
    }

    #[test]
    fn test_send_direct_drains_buffer_and_bills_transmit() {
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut n = node_at(3, 10.0, 10.0);
        n.role = NodeRole::Direct;
        n.data = vec![21.0, 44.0];

        let expected = transmit_cost(&cfg, PACKET_BITS, n.distance_to_sink());
        assert!(n.send_direct(&mut bs, &cfg));
        assert!(n.data.is_empty());
        assert_eq!(bs.received_data[&3], vec![21.0, 44.0]);
        assert!((n.energy - (INITIAL_ENERGY - expected)).abs() < 1e-15);
    }

    #[test]
    fn test_send_direct_requires_direct_role_and_data() {
        let cfg = EnergyConfig::default();
        let mut bs = station();

        let mut clustered = node_at(0, 10.0, 10.0);
        clustered.role = NodeRole::Member { head: 1 };
        clustered.data = vec![25.0];
        assert!(!clustered.send_direct(&mut bs, &cfg));

        let mut empty = node_at(1, 10.0, 10.0);
        empty.role = NodeRole::Direct;
        assert!(!empty.send_direct(&mut bs, &cfg));
        assert_eq!(bs.total_readings(), 0);
    }

    #[test]
    fn test_send_direct_shortfall_kills_without_delivery() {
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut n = node_at(2, 200.0, 200.0);
        n.role = NodeRole::Direct;
        n.data = vec![33.0];
        n.energy = 1e-9;

        assert!(!n.send_direct(&mut bs, &cfg));
        assert!(!n.alive);
        assert_eq!(n.energy, 0.0);
        assert_eq!(bs.total_readings(), 0);
        assert_eq!(n.data, vec![33.0], "undelivered buffer stays put");
    }

    #[test]
    fn test_send_to_head_moves_buffer_and_bills_both_parties() {
        let cfg = EnergyConfig::default();
        let mut nodes = vec![node_at(0, 10.0, 10.0), node_at(1, 20.0, 10.0)];
        nodes[1].become_head(0);
        nodes[1].members.push(0);
        nodes[0].role = NodeRole::Member { head: 1 };
        nodes[0].data = vec![25.0, 26.0];

        let tx = transmit_cost(&cfg, PACKET_BITS, 10.0);
        let rx = receive_cost(&cfg, PACKET_BITS);
        assert!(send_to_head(&mut nodes, 0, &cfg));

        assert!(nodes[0].data.is_empty());
        assert_eq!(nodes[1].data, vec![25.0, 26.0]);
        assert!((nodes[0].energy - (INITIAL_ENERGY - tx)).abs() < 1e-15);
        assert!((nodes[1].energy - (INITIAL_ENERGY - rx)).abs() < 1e-15);
    }

    #[test]
    fn test_send_to_stale_head_clears_role_for_free() {
        let cfg = EnergyConfig::default();
        let mut nodes = vec![node_at(0, 10.0, 10.0), node_at(1, 20.0, 10.0)];
        nodes[1].become_head(0);
        nodes[0].role = NodeRole::Member { head: 1 };
        nodes[0].data = vec![25.0];
        nodes[1].alive = false;
        nodes[1].energy = 0.0;

        assert!(!send_to_head(&mut nodes, 0, &cfg));
        assert_eq!(nodes[0].role, NodeRole::Unassigned);
        assert_eq!(nodes[0].energy, INITIAL_ENERGY, "stale-head failure is free");
        assert_eq!(nodes[0].data, vec![25.0]);
    }

    #[test]
    fn test_send_to_head_sender_shortfall_kills_sender_only() {
        let cfg = EnergyConfig::default();
        let mut nodes = vec![node_at(0, 10.0, 10.0), node_at(1, 20.0, 10.0)];
        nodes[1].become_head(0);
        nodes[0].role = NodeRole::Member { head: 1 };
        nodes[0].data = vec![25.0];
        nodes[0].energy = 1e-12;

        assert!(!send_to_head(&mut nodes, 0, &cfg));
        assert!(!nodes[0].alive);
        assert!(nodes[1].alive);
        assert_eq!(nodes[1].energy, INITIAL_ENERGY);
        assert!(nodes[1].data.is_empty());
    }

    #[test]
    fn test_send_to_head_receiver_shortfall_charges_nobody() {
        let cfg = EnergyConfig::default();
        let mut nodes = vec![node_at(0, 10.0, 10.0), node_at(1, 20.0, 10.0)];
        nodes[1].become_head(0);
        nodes[0].role = NodeRole::Member { head: 1 };
        nodes[0].data = vec![25.0];
        nodes[1].energy = 1e-12;

        assert!(!send_to_head(&mut nodes, 0, &cfg));
        assert!(nodes[0].alive);
        assert!(nodes[1].alive, "receive shortfall does not kill the head here");
        assert_eq!(nodes[0].energy, INITIAL_ENERGY);
        assert!((nodes[1].energy - 1e-12).abs() < 1e-24);
        assert_eq!(nodes[0].data, vec![25.0]);
    }

    #[test]
    fn test_aggregate_folds_surcharge_into_bits() {
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut head = node_at(5, 30.0, 40.0);
        head.become_head(2);
        head.members = vec![1, 2];
        head.data = vec![25.0, 26.0, 27.0];

        let bits = PACKET_BITS + aggregate_cost(&cfg, 2);
        let expected = transmit_cost(&cfg, bits, 50.0);
        assert!(head.aggregate_and_forward(&mut bs, &cfg));
        assert!((head.energy - (INITIAL_ENERGY - expected)).abs() < 1e-15);
        assert_eq!(bs.received_data[&5], vec![25.0, 26.0, 27.0]);
        assert!(head.data.is_empty());
    }

    #[test]
    fn test_aggregate_surcharge_counts_registered_members() {
        // Members that died before delivering still widen the payload: the
        // surcharge keys off the formation roster, not received batches.
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut quiet = node_at(0, 10.0, 0.0);
        quiet.become_head(0);
        quiet.members = vec![7, 8, 9];
        quiet.data = vec![30.0];

        let bits = PACKET_BITS + aggregate_cost(&cfg, 3);
        let expected = transmit_cost(&cfg, bits, 10.0);
        assert!(quiet.aggregate_and_forward(&mut bs, &cfg));
        assert!((quiet.energy - (INITIAL_ENERGY - expected)).abs() < 1e-15);
    }

    #[test]
    fn test_aggregate_shortfall_kills_head() {
        let cfg = EnergyConfig::default();
        let mut bs = station();
        let mut head = node_at(4, 300.0, 0.0);
        head.become_head(0);
        head.data = vec![25.0];
        head.energy = 1e-9;

        assert!(!head.aggregate_and_forward(&mut bs, &cfg));
        assert!(!head.alive);
        assert_eq!(bs.total_readings(), 0);
    }

    #[test]
    fn test_idle_debits_and_kills_at_zero() {
        let cfg = EnergyConfig::default();
        let mut n = node_at(0, 10.0, 10.0);
        n.idle(&cfg);
        assert!(n.alive);
        assert!((n.energy - (INITIAL_ENERGY - cfg.idle_cost)).abs() < 1e-15);

        n.energy = cfg.idle_cost / 2.0;
        n.idle(&cfg);
        assert!(!n.alive);
        assert_eq!(n.energy, 0.0);
    }

    #[test]
    fn test_become_head_stamps_rotation_memory() {
        let mut n = node_at(0, 10.0, 10.0);
        assert_eq!(n.last_head_round, None);
        n.members.push(9);
        n.become_head(4);
        assert!(n.role.is_head());
        assert!(n.members.is_empty(), "member roster resets on promotion");
        assert_eq!(n.last_head_round, Some(4));
    }

    #[test]
    fn test_reset_role_preserves_rotation_memory() {
        let mut n = node_at(0, 10.0, 10.0);
        n.become_head(2);
        n.members = vec![1, 2];
        n.reset_role();
        assert_eq!(n.role, NodeRole::Unassigned);
        assert!(n.members.is_empty());
        assert_eq!(n.last_head_round, Some(2), "reset never clears last_head_round");
    }

    #[test]
    fn test_energy_never_goes_negative() {
        let cfg = EnergyConfig::default();
        let mut n = node_at(0, 10.0, 10.0);
        n.energy = 1e-12;
        n.idle(&cfg);
        assert_eq!(n.energy, 0.0);
        n.idle(&cfg);
        assert_eq!(n.energy, 0.0);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Round Scheduler

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cluster::run_setup;
use crate::config::{ConfigError, SimConfig};
use crate::conservation::{residual_energy, EnergyAudit};
use crate::node::{send_to_head, SensorNode};
use crate::station::BaseStation;
use crate::topology::Topology;
use crate::types::{HaltReason, NodeRole, Protocol, RoundStats, SimReport};

// ─── FieldSimulation struct ──────────────────────────────────────────────────

/// Drives one network from deployment to halt. Owns the node registry, the
/// sink, the RNG, and all per-round history.
///
/// Node ids equal their registry index; every cross-node reference (member
/// rosters, assigned heads) is such an id, never a shared handle.
pub struct FieldSimulation {
    pub(crate) nodes: Vec<SensorNode>,
    pub(crate) station: BaseStation,
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha8Rng,

    /// Heads elected in the current round, in election order.
    pub(crate) current_heads: Vec<u32>,
    /// Alive count per round, preallocated to the full budget with zeros.
    pub(crate) alive_history: Vec<u32>,
    /// Mean survivor energy per round, same shape as `alive_history`.
    pub(crate) energy_history: Vec<f64>,
    pub(crate) round_log: Vec<RoundStats>,

    pub(crate) round: usize,
    /// 1-based label of the first round entered with a dead node.
    pub(crate) first_death: Option<usize>,
    pub(crate) halt: Option<HaltReason>,

    pub(crate) audit: EnergyAudit,
}

// ─── Round Pipeline ──────────────────────────────────────────────────────────

impl FieldSimulation {
    pub fn new(topology: &Topology, config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let station = BaseStation::new(topology.sink, config.alert_threshold);
        let nodes: Vec<SensorNode> = topology
            .sensors
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                SensorNode::new(i as u32, pos, topology.sink, config.energy.initial_energy)
            })
            .collect();

        let audit = EnergyAudit::new(config.energy.initial_energy * nodes.len() as f64);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let rounds = config.rounds;

        Ok(Self {
            nodes,
            station,
            config,
            rng,
            current_heads: Vec::new(),
            alive_history: vec![0; rounds],
            energy_history: vec![0.0; rounds],
            round_log: Vec::new(),
            round: 0,
            first_death: None,
            halt: None,
            audit,
        })
    }

    /// Executes one full round, or returns `None` once the run has halted.
    /// Phase order is fixed: pre-check, Setup, Sense, MemberTransmit,
    /// HeadAggregate, Idle, Accounting.
    pub fn step(&mut self) -> Option<RoundStats> {
        if self.halt.is_some() {
            return None;
        }
        if self.round >= self.config.rounds {
            self.halt = Some(HaltReason::BudgetExhausted);
            return None;
        }

        // Pre-check. First death is stamped before the threshold test, so a
        // network that loses its first node and its functional floor in the
        // same breath still records the death.
        let total = self.nodes.len() as u32;
        let alive = self.alive_count();
        if alive != total && self.first_death.is_none() {
            self.first_death = Some(self.round + 1);
            log::info!("first node death observed entering round {}", self.round + 1);
        }
        if f64::from(alive) / f64::from(total) <= self.config.functional_threshold {
            self.halt = Some(HaltReason::NetworkDown);
            log::info!(
                "halting at round {}: {}/{} alive is at or below the {:.0}% floor",
                self.round,
                alive,
                total,
                self.config.functional_threshold * 100.0
            );
            return None;
        }

        // Setup
        self.current_heads = match self.config.protocol {
            Protocol::Leach => run_setup(
                &mut self.nodes,
                self.round,
                self.config.head_probability,
                &mut self.rng,
            ),
            Protocol::Direct => assign_all_direct(&mut self.nodes),
        };
        if !self.current_heads.is_empty() {
            log::debug!(
                "round {}: elected {} heads {:?}",
                self.round,
                self.current_heads.len(),
                self.current_heads
            );
        }

        let energy_before = residual_energy(self.nodes.iter().map(|n| n.energy));

        // Sense. The snapshot fixes who participates; a reading is drawn for
        // every participant even when the sensing cycle itself kills it, so
        // the draw sequence does not depend on death timing.
        let sensing: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| i)
            .collect();
        for i in sensing {
            self.nodes[i].rounds_alive += 1;
            let reading = self.config.readings.sample(&mut self.rng);
            self.nodes[i].sense(reading, &self.config.energy);
        }

        // MemberTransmit, in id order.
        let mut sent_to_head = 0u32;
        let mut sent_direct = 0u32;
        for i in 0..self.nodes.len() {
            if !self.nodes[i].alive || self.nodes[i].role.is_head() {
                continue;
            }
            match self.nodes[i].role {
                NodeRole::Direct => {
                    if self.nodes[i].send_direct(&mut self.station, &self.config.energy) {
                        sent_direct += 1;
                    }
                }
                NodeRole::Member { .. } => {
                    if send_to_head(&mut self.nodes, i, &self.config.energy) {
                        sent_to_head += 1;
                    }
                }
                _ => {}
            }
        }

        // HeadAggregate, in election order.
        let mut heads_forwarded = 0u32;
        for idx in 0..self.current_heads.len() {
            let h = self.current_heads[idx] as usize;
            if self.nodes[h].alive
                && !self.nodes[h].data.is_empty()
                && self.nodes[h].aggregate_and_forward(&mut self.station, &self.config.energy)
            {
                heads_forwarded += 1;
            }
        }

        // Idle
        for node in self.nodes.iter_mut() {
            node.idle(&self.config.energy);
        }

        // Accounting
        let alive_after = self.alive_count();
        let residual = residual_energy(self.nodes.iter().map(|n| n.energy));
        let mean_alive_energy = if alive_after == 0 {
            0.0
        } else {
            residual / f64::from(alive_after)
        };
        let consumed = energy_before - residual;
        self.audit.record_round(residual, consumed);

        self.alive_history[self.round] = alive_after;
        self.energy_history[self.round] = mean_alive_energy;

        let stats = RoundStats {
            round: self.round,
            heads_elected: self.current_heads.len() as u32,
            sent_to_head,
            sent_direct,
            heads_forwarded,
            alive: alive_after,
            mean_alive_energy,
            consumed,
        };
        log::debug!(
            "round {}: {} to heads, {} direct, {} forwarded, {} alive, mean {:.6} J",
            self.round,
            sent_to_head,
            sent_direct,
            heads_forwarded,
            alive_after,
            mean_alive_energy
        );
        self.round_log.push(stats.clone());
        self.round += 1;

        if alive_after == 0 {
            self.halt = Some(HaltReason::AllDead);
            log::info!("all nodes dead after round {}", self.round);
        }

        Some(stats)
    }

    /// Runs until halt and returns the final report.
    pub fn run(&mut self) -> SimReport {
        log::info!(
            "starting {} run: {} nodes, budget {} rounds, seed {}",
            self.config.protocol.label(),
            self.nodes.len(),
            self.config.rounds,
            self.config.seed
        );
        while self.step().is_some() {}
        let report = self.report();
        match report.halt {
            Some(reason) => log::info!(
                "{} run ended after {} rounds: {}",
                self.config.protocol.label(),
                report.rounds_executed,
                reason.label()
            ),
            None => log::info!("run paused after {} rounds", report.rounds_executed),
        }
        report
    }

    pub fn report(&self) -> SimReport {
        let total = self.nodes.len() as u32;
        let alive = self.alive_count();
        let mean_survivor_energy = if alive == 0 {
            0.0
        } else {
            self.nodes
                .iter()
                .filter(|n| n.alive)
                .map(|n| n.energy)
                .sum::<f64>()
                / f64::from(alive)
        };
        let mean_rounds_alive = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes
                .iter()
                .map(|n| f64::from(n.rounds_alive))
                .sum::<f64>()
                / self.nodes.len() as f64
        };

        SimReport {
            protocol: self.config.protocol,
            total_nodes: total,
            rounds_executed: self.round,
            lifetime: network_lifetime(&self.alive_history),
            alive,
            dead: total - alive,
            mean_survivor_energy,
            mean_rounds_alive,
            first_death_round: self.first_death,
            total_alerts: self.station.alerts.len(),
            halt: self.halt,
            audit_violations: self.audit.violations,
        }
    }

    pub fn alive_count(&self) -> u32 {
        self.nodes.iter().filter(|n| n.alive).count() as u32
    }

    /// Overrides one node's residual energy between rounds, for heterogeneous
    /// deployments and scripted experiments. The conservation baseline moves
    /// with the change so the ledger keeps reconciling. Ignored for unknown
    /// ids and for dead nodes; death stays terminal. A value at or below zero
    /// kills the node.
    pub fn set_node_energy(&mut self, id: u32, energy: f64) {
        let node = match self.nodes.get_mut(id as usize) {
            Some(n) => n,
            None => return,
        };
        if !node.alive {
            return;
        }
        let next = energy.max(0.0);
        self.audit.adjust_baseline(next - node.energy);
        node.energy = next;
        if next <= 0.0 {
            node.alive = false;
            log::debug!("node {} forced dead by energy override", id);
        }
    }

    /// Forces a node failure between rounds. The remaining charge leaves the
    /// audited pool with the node.
    pub fn kill_node(&mut self, id: u32) {
        self.set_node_energy(id, 0.0);
    }

    pub fn nodes(&self) -> &[SensorNode] {
        &self.nodes
    }

    pub fn station(&self) -> &BaseStation {
        &self.station
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn alive_history(&self) -> &[u32] {
        &self.alive_history
    }

    pub fn energy_history(&self) -> &[f64] {
        &self.energy_history
    }

    pub fn round_log(&self) -> &[RoundStats] {
        &self.round_log
    }

    pub fn current_round(&self) -> usize {
        self.round
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt
    }

    pub fn first_death_round(&self) -> Option<usize> {
        self.first_death
    }

    pub fn audit(&self) -> &EnergyAudit {
        &self.audit
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Rounds with at least one alive node. History tails past the halt are
/// zero-filled, so this counts the productive prefix.
pub fn network_lifetime(alive_history: &[u32]) -> usize {
    alive_history.iter().filter(|&&a| a != 0).count()
}

/// Setup phase of the no-clustering baseline: every survivor goes direct.
fn assign_all_direct(nodes: &mut [SensorNode]) -> Vec<u32> {
    for node in nodes.iter_mut() {
        node.reset_role();
        if node.alive {
            node.role = NodeRole::Direct;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn topo(sensors: &[(f64, f64)]) -> Topology {
        Topology {
            sink: Position::new(0.0, 0.0),
            sensors: sensors.iter().map(|&(x, y)| Position::new(x, y)).collect(),
        }
    }

    fn short_config(rounds: usize) -> SimConfig {
        let mut cfg = SimConfig::leach();
        cfg.rounds = rounds;
        cfg
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut cfg = SimConfig::leach();
        cfg.head_probability = 2.0;
        assert!(FieldSimulation::new(&topo(&[(10.0, 10.0)]), cfg).is_err());
    }

    #[test]
    fn test_direct_setup_marks_every_survivor_direct() {
        let mut cfg = SimConfig::direct();
        cfg.rounds = 1;
        let mut sim = FieldSimulation::new(&topo(&[(5.0, 5.0), (9.0, 2.0)]), cfg).unwrap();
        let stats = sim.step().unwrap();
        assert_eq!(stats.heads_elected, 0);
        assert_eq!(stats.sent_direct, 2);
        assert_eq!(stats.sent_to_head, 0);
    }

    #[test]
    fn test_zeroed_sense_cost_gives_exact_direct_billing() {
        let mut cfg = short_config(1);
        cfg.energy.sense_cost = 0.0;
        let t = topo(&[(10.0, 10.0)]);
        let mut sim = FieldSimulation::new(&t, cfg.clone()).unwrap();
        sim.step();
        // Cold start: no head is electable yet, so the sensor routes direct.
        let d = t.sensors[0].distance_to(t.sink);
        let tx = crate::energy::transmit_cost(&cfg.energy, cfg.energy.packet_bits, d);
        let expected = cfg.energy.initial_energy - tx - cfg.energy.idle_cost;
        assert_eq!(sim.nodes()[0].energy, expected, "billing must be exact with sensing free");
        assert_eq!(sim.station().received_data[&0].len(), 1);
    }

    #[test]
    fn test_round_budget_exhaustion() {
        let mut sim = FieldSimulation::new(&topo(&[(10.0, 10.0)]), short_config(3)).unwrap();
        let report = sim.run();
        assert_eq!(report.rounds_executed, 3);
        assert_eq!(report.lifetime, 3);
        assert_eq!(report.halt, Some(HaltReason::BudgetExhausted));
        assert!(sim.step().is_none(), "halted runs refuse further rounds");
    }

    #[test]
    fn test_first_death_recorded_once_with_one_based_label() {
        let mut cfg = short_config(6);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (12.0, 12.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        sim.nodes[1].energy = 1e-6; // dies sensing in round 0
        let report = sim.run();
        // The death is observed by round 1's pre-check, labelled round 2.
        assert_eq!(report.first_death_round, Some(2));
        assert_eq!(sim.alive_history()[0], 1);
    }

    #[test]
    fn test_network_down_halt_uses_inclusive_threshold() {
        let mut cfg = short_config(10);
        cfg.functional_threshold = 0.5;
        let t = topo(&[(10.0, 10.0), (12.0, 12.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        sim.nodes[1].energy = 1e-6;
        let report = sim.run();
        // Round 0 runs and kills node 1; round 1's pre-check sees 1/2 alive,
        // exactly the floor, and halts without executing.
        assert_eq!(report.rounds_executed, 1);
        assert_eq!(report.halt, Some(HaltReason::NetworkDown));
        assert_eq!(report.alive, 1);
    }

    #[test]
    fn test_all_dead_halts_at_accounting_with_zero_tail() {
        let mut cfg = short_config(8);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (20.0, 20.0)]);
        let mut sim = FieldSimulation::new(&t, cfg.clone()).unwrap();
        for node in sim.nodes.iter_mut() {
            node.energy = cfg.energy.sense_cost * 1.5; // sense survives, send is fatal
        }
        let report = sim.run();
        assert_eq!(report.halt, Some(HaltReason::AllDead));
        assert_eq!(report.rounds_executed, 1);
        assert_eq!(report.alive, 0);
        assert_eq!(report.lifetime, 0);
        assert!(sim.alive_history().iter().all(|&a| a == 0));
    }

    #[test]
    fn test_round_mean_energy_averages_survivors_only() {
        let mut cfg = short_config(1);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (12.0, 12.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        sim.nodes[1].energy = 1e-6;
        let stats = sim.step().unwrap();
        assert_eq!(stats.alive, 1);
        let survivor = &sim.nodes()[0];
        assert!((stats.mean_alive_energy - survivor.energy).abs() < 1e-12);
    }

    #[test]
    fn test_rounds_alive_freezes_at_death() {
        let mut cfg = short_config(5);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (12.0, 12.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        sim.nodes[1].energy = 1e-6;
        let report = sim.run();
        assert_eq!(sim.nodes()[1].rounds_alive, 1, "died during its first round");
        assert_eq!(sim.nodes()[0].rounds_alive as usize, report.rounds_executed);
    }

    #[test]
    fn test_audit_stays_clean_across_a_run() {
        let t = topo(&[(10.0, 10.0), (30.0, 40.0), (60.0, 20.0), (80.0, 80.0)]);
        let mut sim = FieldSimulation::new(&t, short_config(50)).unwrap();
        sim.run();
        assert_eq!(sim.audit().violations, 0);
        assert!(!sim.audit().tripped);
    }

    #[test]
    fn test_network_lifetime_counts_nonzero_entries() {
        assert_eq!(network_lifetime(&[5, 4, 4, 1, 0, 0, 0]), 4);
        assert_eq!(network_lifetime(&[0, 0]), 0);
        assert_eq!(network_lifetime(&[]), 0);
    }

    #[test]
    fn test_empty_field_halts_immediately() {
        let mut sim = FieldSimulation::new(&topo(&[]), short_config(4)).unwrap();
        let report = sim.run();
        assert_eq!(report.halt, Some(HaltReason::AllDead));
        assert_eq!(report.rounds_executed, 1);
        assert_eq!(report.total_nodes, 0);
    }

    #[test]
    fn test_kill_node_keeps_audit_clean() {
        let mut cfg = short_config(20);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (30.0, 40.0), (60.0, 20.0), (80.0, 80.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        for _ in 0..5 {
            sim.step();
        }
        sim.kill_node(2);
        assert!(!sim.nodes()[2].alive);
        assert_eq!(sim.nodes()[2].energy, 0.0);
        let report = sim.run();
        assert_eq!(report.alive, 3);
        assert_eq!(report.audit_violations, 0, "forced failure must re-base the ledger");
        assert_eq!(report.first_death_round, Some(6));
    }

    #[test]
    fn test_set_node_energy_supports_heterogeneous_start() {
        let t = topo(&[(10.0, 10.0), (30.0, 40.0)]);
        let mut sim = FieldSimulation::new(&t, short_config(30)).unwrap();
        sim.set_node_energy(0, 4.0);
        assert_eq!(sim.nodes()[0].energy, 4.0);
        let report = sim.run();
        assert_eq!(report.audit_violations, 0);
        assert!(sim.nodes()[0].energy > sim.nodes()[1].energy);
    }

    #[test]
    fn test_set_node_energy_never_resurrects() {
        let mut cfg = short_config(10);
        cfg.functional_threshold = 0.0;
        let t = topo(&[(10.0, 10.0), (30.0, 40.0)]);
        let mut sim = FieldSimulation::new(&t, cfg).unwrap();
        sim.kill_node(1);
        sim.set_node_energy(1, 5.0);
        assert!(!sim.nodes()[1].alive);
        assert_eq!(sim.nodes()[1].energy, 0.0);
        sim.set_node_energy(99, 5.0); // unknown id is a no-op
        let report = sim.run();
        assert_eq!(report.audit_violations, 0);
    }
}

// Scenario Definitions — deployment geometry, cost overrides, pass criteria
// Zero engine changes: all scenario logic is in config overrides and
// setup/event closures

use field_engine::{FieldSimulation, Position, Protocol, ReadingModel, SimConfig};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub protocol: Protocol,
    pub nodes: usize,
    pub rounds: usize,
    pub width: f64,
    pub height: f64,
    pub sink: Position,
    pub initial_energy: f64,
    pub head_probability: f64,
    pub readings: ReadingModel,
    pub criteria: PassCriteria,
    /// Pre-run setup (e.g., set_node_energy for heterogeneous reserves)
    pub setup: Option<Box<dyn Fn(&mut FieldSimulation) + Send + Sync>>,
    /// Mid-simulation events (e.g., kill_node at a specific round)
    pub mid_event: Option<Box<dyn Fn(&mut FieldSimulation, usize) + Send + Sync>>,
}

impl Scenario {
    /// Materializes the run configuration for one seed. Starts from the
    /// protocol's reference preset so the functional threshold tracks it.
    pub fn config(&self, seed: u64) -> SimConfig {
        let mut cfg = match self.protocol {
            Protocol::Leach => SimConfig::leach(),
            Protocol::Direct => SimConfig::direct(),
        };
        cfg.rounds = self.rounds;
        cfg.seed = seed;
        cfg.head_probability = self.head_probability;
        cfg.energy.initial_energy = self.initial_energy;
        cfg.readings = self.readings;
        cfg
    }
}

pub struct PassCriteria {
    pub max_audit_violations: u32,
    pub min_lifetime: Option<usize>,
    pub max_lifetime: Option<usize>,
    pub min_first_death: Option<usize>,
    pub max_first_death: Option<usize>,
    pub min_final_alive: Option<u32>,
    pub min_head_share: Option<f64>,
    pub max_head_share: Option<f64>,
    pub min_alerts: Option<usize>,
    pub max_alerts: Option<usize>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_audit_violations: 0,
            min_lifetime: None,
            max_lifetime: None,
            min_first_death: None,
            max_first_death: None,
            min_final_alive: None,
            min_head_share: None,
            max_head_share: None,
            min_alerts: None,
            max_alerts: None,
        }
    }
}

// ─── Scenario Definitions ───────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    let mut all = vec![
        // ─── Baselines (4) ──────────────────────────────────────────────
        // Mid-field sink: every hop stays in the free-space regime.
        Scenario { name: "LEACH_MID_FIELD", label: "LEACH: Mid-Field Sink", category: "baseline",
            protocol: Protocol::Leach, nodes: 100, rounds: 20_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(3000), min_first_death: Some(2000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "DIRECT_MID_FIELD", label: "Direct: Mid-Field Sink", category: "baseline",
            protocol: Protocol::Direct, nodes: 100, rounds: 20_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(5000), min_first_death: Some(3000), ..Default::default() },
            setup: None, mid_event: None },
        // Remote sink: the far half of the field pays quartic amplifier
        // costs on sink hops, which is where rotation earns its keep.
        Scenario { name: "LEACH_REMOTE_SINK", label: "LEACH: Remote Sink", category: "baseline",
            protocol: Protocol::Leach, nodes: 100, rounds: 20_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 175.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(2500), min_first_death: Some(1000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "DIRECT_REMOTE_SINK", label: "Direct: Remote Sink", category: "baseline",
            protocol: Protocol::Direct, nodes: 100, rounds: 20_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 175.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            // The far corner burns out quickly; that hotspot is the point.
            criteria: PassCriteria { min_lifetime: Some(2000), max_first_death: Some(1500), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Density (3) ────────────────────────────────────────────────
        Scenario { name: "LEACH_SPARSE_25", label: "LEACH: Sparse 25", category: "density",
            protocol: Protocol::Leach, nodes: 25, rounds: 20_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(3000), min_first_death: Some(2000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "LEACH_DENSE_200", label: "LEACH: Dense 200", category: "density",
            protocol: Protocol::Leach, nodes: 200, rounds: 12_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(3000), min_first_death: Some(2000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "DIRECT_DENSE_400", label: "Direct: Dense 400", category: "density",
            protocol: Protocol::Direct, nodes: 400, rounds: 12_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(5000), min_first_death: Some(3000), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Election (2) ───────────────────────────────────────────────
        // Integer 1/P keeps the whole population on one eligibility clock,
        // so the long-run head share equals P exactly.
        Scenario { name: "ELECTION_P05", label: "Election: p=0.05", category: "election",
            protocol: Protocol::Leach, nodes: 100, rounds: 10_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.05, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(2500), min_head_share: Some(0.03), max_head_share: Some(0.08), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "ELECTION_P50", label: "Election: p=0.50", category: "election",
            protocol: Protocol::Leach, nodes: 100, rounds: 10_000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.5, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(3000), min_head_share: Some(0.4), max_head_share: Some(0.6), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Energy Envelope (2) ────────────────────────────────────────
        Scenario { name: "LOW_BATTERY", label: "Energy: 0.5 J Cells", category: "energy",
            protocol: Protocol::Leach, nodes: 100, rounds: 5000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 0.5, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(800), max_lifetime: Some(3500), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "EXTENDED_BATTERY", label: "Energy: 5 J Cells", category: "energy",
            protocol: Protocol::Leach, nodes: 50, rounds: 4000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 5.0, head_probability: 0.3, readings: ReadingModel::default(),
            // The budget runs out long before the cells do.
            criteria: PassCriteria { min_lifetime: Some(4000), min_final_alive: Some(50), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Hazard Detection (2) ───────────────────────────────────────
        Scenario { name: "FIRE_WATCH", label: "Hazard: Fire Season", category: "hazard",
            protocol: Protocol::Direct, nodes: 60, rounds: 2000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3,
            readings: ReadingModel::FireBias {
                fire_chance: 0.1, calm_lo: 20.0, calm_hi: 50.0, fire_lo: 60.0, fire_hi: 100.0,
            },
            // 120k delivered readings at a 10% spike rate.
            criteria: PassCriteria { min_final_alive: Some(60), min_alerts: Some(10_000), max_alerts: Some(14_000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "CALM_FIELD", label: "Hazard: Calm Field", category: "hazard",
            protocol: Protocol::Leach, nodes: 60, rounds: 2000,
            width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
            initial_energy: 2.0, head_probability: 0.3,
            readings: ReadingModel::Uniform { lo: 20.0, hi: 55.0 },
            criteria: PassCriteria { min_final_alive: Some(60), max_alerts: Some(0), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Scale (2) ──────────────────────────────────────────────────
        Scenario { name: "SCALE_1K_LEACH", label: "Scale: 1K LEACH", category: "scale",
            protocol: Protocol::Leach, nodes: 1000, rounds: 1500,
            width: 200.0, height: 200.0, sink: Position::new(100.0, 100.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(1500), min_final_alive: Some(1000), ..Default::default() },
            setup: None, mid_event: None },
        Scenario { name: "SCALE_10K_DIRECT", label: "Scale: 10K Direct", category: "scale",
            protocol: Protocol::Direct, nodes: 10_000, rounds: 600,
            width: 200.0, height: 200.0, sink: Position::new(100.0, 100.0),
            initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(600), min_final_alive: Some(10_000), ..Default::default() },
            setup: None, mid_event: None },

        // ─── Endurance (1) ──────────────────────────────────────────────
        Scenario { name: "SMALL_FIELD_DEPLETION", label: "Endurance: Full Depletion", category: "endurance",
            protocol: Protocol::Leach, nodes: 40, rounds: 8000,
            width: 50.0, height: 50.0, sink: Position::new(25.0, 25.0),
            initial_energy: 1.0, head_probability: 0.3, readings: ReadingModel::default(),
            criteria: PassCriteria { min_lifetime: Some(1500), max_lifetime: Some(6000), min_first_death: Some(800), ..Default::default() },
            setup: None, mid_event: None },
    ];

    // ─── Protocol-Exact Scenarios ───────────────────────────────────────

    // Integer epoch: with p=0.2 every survivor serves exactly once per five
    // rounds, so the aggregate head share is 0.2 to the digit.
    all.push(Scenario {
        name: "ROTATION_EXACT_EPOCH",
        label: "Rotation: Epoch Share (p=0.2)",
        category: "protocol-exact",
        protocol: Protocol::Leach, nodes: 100, rounds: 100,
        width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
        initial_energy: 2.0, head_probability: 0.2, readings: ReadingModel::default(),
        criteria: PassCriteria {
            min_head_share: Some(0.19),
            max_head_share: Some(0.21),
            min_final_alive: Some(100),
            ..Default::default()
        },
        setup: None, mid_event: None,
    });

    // Forced failures mid-run: the ledger re-bases and the survivors carry on.
    all.push(Scenario {
        name: "FAILURE_WAVE",
        label: "Failures: 10% at Round 300",
        category: "protocol-exact",
        protocol: Protocol::Leach, nodes: 80, rounds: 600,
        width: 100.0, height: 100.0, sink: Position::new(50.0, 50.0),
        initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
        criteria: PassCriteria {
            min_final_alive: Some(70),
            min_first_death: Some(300),
            ..Default::default()
        },
        setup: None,
        mid_event: Some(Box::new(|sim: &mut FieldSimulation, round: usize| {
            if round == 300 {
                for id in 0..8u32 {
                    sim.kill_node(id);
                }
            }
        })),
    });

    // Half the fleet deploys with double reserves; the audit must follow the
    // override and the first death still lands in the far, single-reserve set.
    all.push(Scenario {
        name: "HETEROGENEOUS_RESERVE",
        label: "Hetero: Double-Reserve Half",
        category: "protocol-exact",
        protocol: Protocol::Direct, nodes: 60, rounds: 3000,
        width: 100.0, height: 100.0, sink: Position::new(50.0, 175.0),
        initial_energy: 2.0, head_probability: 0.3, readings: ReadingModel::default(),
        criteria: PassCriteria {
            min_lifetime: Some(2000),
            max_first_death: Some(1500),
            ..Default::default()
        },
        setup: Some(Box::new(|sim: &mut FieldSimulation| {
            for id in 0..30u32 {
                sim.set_node_energy(id, 4.0);
            }
        })),
        mid_event: None,
    });

    all
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Configuration

use rand::Rng;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::types::Protocol;

// ─── Radio Model Constants ───────────────────────────────────────────────────
// First-order radio model, EESRA calibration.

pub const E_ELEC: f64 = 50e-9; // J/bit, transceiver electronics
pub const E_FS: f64 = 10e-12; // J/bit/m^2, free-space amplifier
pub const E_MP: f64 = 0.0013e-12; // J/bit/m^4, multipath amplifier
pub const D_THRESHOLD: f64 = 75.0; // m, amplifier crossover distance
pub const E_DA: f64 = 5e-9; // J/bit/signal, aggregation surcharge
pub const E_SENSE: f64 = 8e-5; // J per sensing cycle
pub const E_SLEEP: f64 = 15e-10; // J per idle round

pub const PACKET_BITS: f64 = 2000.0;
pub const INITIAL_ENERGY: f64 = 2.0; // J per node at deployment

pub const HEAD_PROBABILITY: f64 = 0.3;
pub const ALERT_THRESHOLD: f64 = 60.0;

/// Alive fraction below which a clustered run is halted.
pub const FUNCTIONAL_THRESHOLD_LEACH: f64 = 0.12;
/// Cutoff used by the direct-to-sink baseline.
pub const FUNCTIONAL_THRESHOLD_DIRECT: f64 = 0.2;

// ─── Energy Config ───────────────────────────────────────────────────────────

/// Radio and duty-cycle cost table. All values in joules (per bit where
/// indicated).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    /// Per-bit electronics cost, paid on both transmit and receive.
    pub elec_per_bit: f64,
    /// Amplifier cost per bit per m^2, below the crossover distance.
    pub free_space_per_bit: f64,
    /// Amplifier cost per bit per m^4, at or beyond the crossover distance.
    pub multipath_per_bit: f64,
    pub distance_threshold: f64,
    /// Per-bit cost of fusing one member signal at a cluster head.
    pub aggregation_per_bit: f64,
    /// Nominal payload per transmission. Fractional values are legal: the
    /// aggregation surcharge is folded into the bit count before costing.
    pub packet_bits: f64,
    pub initial_energy: f64,
    /// Charge per sensing cycle. Zero disables the sensing drain.
    pub sense_cost: f64,
    /// Charge per idle round.
    pub idle_cost: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            elec_per_bit: E_ELEC,
            free_space_per_bit: E_FS,
            multipath_per_bit: E_MP,
            distance_threshold: D_THRESHOLD,
            aggregation_per_bit: E_DA,
            packet_bits: PACKET_BITS,
            initial_energy: INITIAL_ENERGY,
            sense_cost: E_SENSE,
            idle_cost: E_SLEEP,
        }
    }
}

// ─── Reading Model ───────────────────────────────────────────────────────────

/// How sensed temperatures are drawn each round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ReadingModel {
    /// Uniform over `[lo, hi)`.
    Uniform { lo: f64, hi: f64 },
    /// Calm-range readings with an occasional fire-range spike. The spike
    /// check consumes one RNG draw whether or not it fires.
    FireBias {
        fire_chance: f64,
        calm_lo: f64,
        calm_hi: f64,
        fire_lo: f64,
        fire_hi: f64,
    },
}

impl Default for ReadingModel {
    fn default() -> Self {
        ReadingModel::Uniform { lo: 20.0, hi: 70.0 }
    }
}

impl ReadingModel {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Uniform { lo, hi } => rng.gen_range(lo..hi),
            Self::FireBias { fire_chance, calm_lo, calm_hi, fire_lo, fire_hi } => {
                if rng.gen::<f64>() < fire_chance {
                    rng.gen_range(fire_lo..fire_hi)
                } else {
                    rng.gen_range(calm_lo..calm_hi)
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Uniform { lo, hi } => {
                if !(lo < hi) {
                    return Err(ConfigError::ReadingBounds { lo, hi });
                }
            }
            Self::FireBias { fire_chance, calm_lo, calm_hi, fire_lo, fire_hi } => {
                if !(0.0..=1.0).contains(&fire_chance) {
                    return Err(ConfigError::FireChance(fire_chance));
                }
                if !(calm_lo < calm_hi) {
                    return Err(ConfigError::ReadingBounds { lo: calm_lo, hi: calm_hi });
                }
                if !(fire_lo < fire_hi) {
                    return Err(ConfigError::ReadingBounds { lo: fire_lo, hi: fire_hi });
                }
            }
        }
        Ok(())
    }
}

// ─── Sim Config ──────────────────────────────────────────────────────────────

/// Full run configuration. `leach()` and `direct()` build the two reference
/// setups; field-level overrides go through plain struct update syntax.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub protocol: Protocol,
    /// Upper bound on rounds. Runs usually halt earlier.
    pub rounds: usize,
    pub seed: u64,
    /// Target cluster-head fraction per round.
    pub head_probability: f64,
    /// The run halts once alive/total falls to or below this fraction.
    pub functional_threshold: f64,
    /// Readings strictly above this raise an alert at the sink.
    pub alert_threshold: f64,
    pub energy: EnergyConfig,
    pub readings: ReadingModel,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::leach()
    }
}

impl SimConfig {
    pub fn leach() -> Self {
        Self {
            protocol: Protocol::Leach,
            rounds: 20_000,
            seed: 42,
            head_probability: HEAD_PROBABILITY,
            functional_threshold: FUNCTIONAL_THRESHOLD_LEACH,
            alert_threshold: ALERT_THRESHOLD,
            energy: EnergyConfig::default(),
            readings: ReadingModel::default(),
        }
    }

    pub fn direct() -> Self {
        Self {
            protocol: Protocol::Direct,
            functional_threshold: FUNCTIONAL_THRESHOLD_DIRECT,
            readings: ReadingModel::FireBias {
                fire_chance: 0.1,
                calm_lo: 20.0,
                calm_hi: 50.0,
                fire_lo: 60.0,
                fire_hi: 100.0,
            },
            ..Self::leach()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if !(self.head_probability > 0.0 && self.head_probability <= 1.0) {
            return Err(ConfigError::HeadProbability(self.head_probability));
        }
        if !(0.0..1.0).contains(&self.functional_threshold) {
            return Err(ConfigError::FunctionalThreshold(self.functional_threshold));
        }
        if !(self.energy.packet_bits > 0.0) {
            return Err(ConfigError::PacketBits(self.energy.packet_bits));
        }
        if !(self.energy.initial_energy > 0.0) {
            return Err(ConfigError::InitialEnergy(self.energy.initial_energy));
        }
        if self.energy.sense_cost < 0.0 || self.energy.idle_cost < 0.0 {
            return Err(ConfigError::NegativeCost);
        }
        self.readings.validate()
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("round budget must be positive")]
    ZeroRounds,
    #[error("head probability must be in (0, 1], got {0}")]
    HeadProbability(f64),
    #[error("functional threshold must be in [0, 1), got {0}")]
    FunctionalThreshold(f64),
    #[error("packet size must be positive, got {0} bits")]
    PacketBits(f64),
    #[error("initial energy must be positive, got {0} J")]
    InitialEnergy(f64),
    #[error("energy costs must be non-negative")]
    NegativeCost,
    #[error("reading bounds inverted: [{lo}, {hi})")]
    ReadingBounds { lo: f64, hi: f64 },
    #[error("fire chance must be in [0, 1], got {0}")]
    FireChance(f64),
}

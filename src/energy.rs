// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Radio Energy Model

use crate::config::EnergyConfig;

/// Cost of pushing `bits` over `distance` meters. Quadratic free-space
/// amplifier up to the crossover distance (inclusive), quartic multipath
/// beyond it. `bits` is fractional on purpose: heads fold their aggregation
/// surcharge into the bit count before calling this.
pub fn transmit_cost(cfg: &EnergyConfig, bits: f64, distance: f64) -> f64 {
    if distance <= cfg.distance_threshold {
        bits * (cfg.elec_per_bit + cfg.free_space_per_bit * distance.powi(2))
    } else {
        bits * (cfg.elec_per_bit + cfg.multipath_per_bit * distance.powi(4))
    }
}

/// Cost of receiving `bits`. Electronics only, independent of distance.
pub fn receive_cost(cfg: &EnergyConfig, bits: f64) -> f64 {
    bits * cfg.elec_per_bit
}

/// Cost of fusing `signals` member packets at a cluster head, in joules.
pub fn aggregate_cost(cfg: &EnergyConfig, signals: usize) -> f64 {
    signals as f64 * cfg.packet_bits * cfg.aggregation_per_bit
}

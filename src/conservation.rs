// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Energy Conservation Audit

use serde::{Serialize, Deserialize};

// --- Constants ---

/// Allowed ledger slack, in joules. Wide enough to swallow f64 summation
/// drift over long runs, narrow enough to catch a dropped sensing debit
/// across a whole round.
pub const TOLERANCE: f64 = 1e-7;

/// Consecutive failed reconciliations before the audit trips.
const TRIP_AFTER: u32 = 3;

// --- Result ---

/// One round's reconciliation of the energy ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuditResult {
    pub valid: bool,
    /// Energy the field started with.
    pub expected: f64,
    /// Residual pool plus everything accounted as spent.
    pub actual: f64,
    pub error: f64,
}

// --- Helpers ---

/// Total energy still held by the field. Dead nodes hold exactly zero, so
/// summing everything is equivalent to summing survivors.
pub fn residual_energy(energies: impl Iterator<Item = f64>) -> f64 {
    energies.sum()
}

// --- Audit ---

/// Cross-checks the round pipeline's bookkeeping: the initial allotment must
/// equal residual energy plus cumulative measured drain, and the residual
/// pool must never grow. Purely diagnostic; it never stops a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyAudit {
    pub initial_total: f64,
    /// Cumulative drain reported by the scheduler, joules.
    pub consumed: f64,
    pub violations: u32,
    pub consecutive_violations: u32,
    pub max_error: f64,
    /// Set after `TRIP_AFTER` consecutive failures; never clears.
    pub tripped: bool,
    last_residual: f64,
}

impl EnergyAudit {
    pub fn new(initial_total: f64) -> Self {
        Self {
            initial_total,
            consumed: 0.0,
            violations: 0,
            consecutive_violations: 0,
            max_error: 0.0,
            tripped: false,
            last_residual: initial_total,
        }
    }

    /// Reconciles one round: `residual` is the pool left in the field,
    /// `spent` the drain measured for the round just executed.
    pub fn record_round(&mut self, residual: f64, spent: f64) -> AuditResult {
        self.consumed += spent;

        let expected = self.initial_total;
        let actual = residual + self.consumed;
        let mut error = (expected - actual).abs();

        // Nodes never recharge; a rising pool is a bookkeeping bug even if
        // the totals happen to balance.
        if residual > self.last_residual + TOLERANCE {
            error = error.max(residual - self.last_residual);
        }
        self.last_residual = residual;

        let valid = error <= TOLERANCE;
        if valid {
            self.consecutive_violations = 0;
        } else {
            self.violations += 1;
            self.consecutive_violations += 1;
            if error > self.max_error {
                self.max_error = error;
            }
            if self.consecutive_violations >= TRIP_AFTER {
                self.tripped = true;
            }
            log::error!(
                "energy ledger off by {:.3e} J (residual {:.6}, consumed {:.6}, initial {:.6})",
                error,
                residual,
                self.consumed,
                self.initial_total
            );
        }

        AuditResult { valid, expected, actual, error }
    }

    /// Re-baselines the ledger after an out-of-band pool change such as a
    /// forced node failure or a heterogeneous-energy override. `delta` is the
    /// signed change in total field energy.
    pub fn adjust_baseline(&mut self, delta: f64) {
        self.initial_total += delta;
        self.last_residual += delta;
    }
}

impl Default for EnergyAudit {
    fn default() -> Self {
        Self::new(0.0)
    }
}

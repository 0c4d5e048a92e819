// Benchmark Report Types
// Structured output for lifetime comparisons and protocol validation

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub seed: u64,
    pub pass: bool,
    pub protocol: String,
    pub nodes: usize,
    pub rounds_budget: usize,
    pub rounds_executed: usize,
    pub lifetime: usize,
    pub first_death_round: Option<usize>,
    pub final_alive: u32,
    pub final_dead: u32,
    pub mean_survivor_energy: f64,
    pub mean_rounds_alive: f64,
    pub readings_delivered: usize,
    pub total_alerts: usize,
    pub heads_elected_total: u64,
    pub head_share: f64,
    pub sent_to_head_total: u64,
    pub sent_direct_total: u64,
    pub heads_forwarded_total: u64,
    pub consumed_total: f64,
    pub audit_violations: u32,
    pub audit_max_error: f64,
    pub halt: Option<String>,
    pub elapsed_ms: u128,
    pub rounds_per_sec: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub lifetime: Stats,
    /// First-death rounds, censored at `rounds_executed` when nobody died.
    pub first_death: Stats,
    pub final_alive: Stats,
    pub mean_rounds_alive: Stats,
    pub mean_survivor_energy: Stats,
    pub readings_delivered: Stats,
    pub total_alerts: Stats,
    pub head_share: Stats,
    pub consumed_total: Stats,
    pub audit_max_error: Stats,
    pub elapsed_ms: Stats,
    pub rounds_per_sec: Stats,
    /// Runs whose conservation audit flagged at least one round.
    pub audit_violation_runs: usize,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Protocol Validation Summary ────────────────────────────────────────────

/// Headline claims checked once per suite, over and above per-scenario
/// criteria. The stability claims come from paired runs on shared
/// topologies, not from the Monte Carlo aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolValidation {
    /// Rotation pushes the first node death later than the direct baseline.
    pub clustering_extends_stability: bool,
    /// Clustered depletion is even: deaths start late relative to halt,
    /// where the baseline burns its far nodes first.
    pub clustering_spreads_depletion: bool,
    /// Election share lands on the configured probability over exact epochs.
    pub rotation_share_on_target: bool,
    /// No run anywhere left the energy ledger unbalanced.
    pub ledger_reconciles_everywhere: bool,
    pub max_audit_error: f64,
}

impl ProtocolValidation {
    pub fn all_pass(&self) -> bool {
        self.clustering_extends_stability
            && self.clustering_spreads_depletion
            && self.rotation_share_on_target
            && self.ledger_reconciles_everywhere
            && self.max_audit_error <= field_engine::conservation::TOLERANCE
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub summary: Summary,
    pub protocol_validation: ProtocolValidation,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

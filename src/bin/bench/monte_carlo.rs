// Monte Carlo Infrastructure — N runs per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N-1, computing mean ± 95% CI

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use field_engine::{FieldSimulation, Topology};

use crate::history::HistoryRecorder;
use crate::report::*;
use crate::scenarios::Scenario;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed. The seed drives
/// both the random deployment and the simulation's own stream.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    history_dir: Option<&std::path::Path>,
) -> BenchResult {
    let start = Instant::now();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let topology = Topology::random(
        scenario.nodes,
        scenario.width,
        scenario.height,
        scenario.sink,
        &mut rng,
    );
    let config = scenario.config(seed);
    let mut sim = FieldSimulation::new(&topology, config).expect("scenario config must validate");

    // Pre-run setup (energy overrides, etc.)
    if let Some(setup) = &scenario.setup {
        setup(&mut sim);
    }

    loop {
        if let Some(event) = &scenario.mid_event {
            let round = sim.current_round();
            event(&mut sim, round);
        }
        if sim.step().is_none() {
            break;
        }
    }

    let report = sim.report();
    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis();
    let elapsed_secs = elapsed.as_secs_f64().max(0.001);

    // Totals over the round log
    let mut heads_total = 0u64;
    let mut alive_total = 0u64;
    let mut sent_to_head_total = 0u64;
    let mut sent_direct_total = 0u64;
    let mut forwarded_total = 0u64;
    let mut consumed_total = 0.0f64;
    for r in sim.round_log() {
        heads_total += u64::from(r.heads_elected);
        alive_total += u64::from(r.alive);
        sent_to_head_total += u64::from(r.sent_to_head);
        sent_direct_total += u64::from(r.sent_direct);
        forwarded_total += u64::from(r.heads_forwarded);
        consumed_total += r.consumed;
    }
    let head_share = if alive_total > 0 {
        heads_total as f64 / alive_total as f64
    } else {
        0.0
    };

    if let Some(dir) = history_dir {
        let mut recorder = HistoryRecorder::new(report.total_nodes);
        for r in sim.round_log() {
            recorder.record(r);
        }
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = recorder.write_jsonl(&path) {
            eprintln!("  Warning: failed to write round history: {}", e);
        }
    }

    // Evaluate pass/fail
    let c = &scenario.criteria;
    let mut pass = report.audit_violations <= c.max_audit_violations;
    if let Some(min) = c.min_lifetime {
        if report.lifetime < min {
            pass = false;
        }
    }
    if let Some(max) = c.max_lifetime {
        if report.lifetime > max {
            pass = false;
        }
    }
    // "No death before round N"; a run with no deaths at all satisfies it.
    if let Some(min) = c.min_first_death {
        if let Some(fd) = report.first_death_round {
            if fd < min {
                pass = false;
            }
        }
    }
    // "Some death at or before round N".
    if let Some(max) = c.max_first_death {
        match report.first_death_round {
            Some(fd) if fd <= max => {}
            _ => pass = false,
        }
    }
    if let Some(min) = c.min_final_alive {
        if report.alive < min {
            pass = false;
        }
    }
    if let Some(min) = c.min_head_share {
        if head_share < min {
            pass = false;
        }
    }
    if let Some(max) = c.max_head_share {
        if head_share > max {
            pass = false;
        }
    }
    if let Some(min) = c.min_alerts {
        if report.total_alerts < min {
            pass = false;
        }
    }
    if let Some(max) = c.max_alerts {
        if report.total_alerts > max {
            pass = false;
        }
    }

    BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        protocol: sim.config().protocol.label().to_string(),
        nodes: scenario.nodes,
        rounds_budget: scenario.rounds,
        rounds_executed: report.rounds_executed,
        lifetime: report.lifetime,
        first_death_round: report.first_death_round,
        final_alive: report.alive,
        final_dead: report.dead,
        mean_survivor_energy: report.mean_survivor_energy,
        mean_rounds_alive: report.mean_rounds_alive,
        readings_delivered: sim.station().total_readings(),
        total_alerts: report.total_alerts,
        heads_elected_total: heads_total,
        head_share,
        sent_to_head_total,
        sent_direct_total,
        heads_forwarded_total: forwarded_total,
        consumed_total,
        audit_violations: report.audit_violations,
        audit_max_error: sim.audit().max_error,
        halt: report.halt.map(|h| h.label().to_string()),
        elapsed_ms,
        rounds_per_sec: report.rounds_executed as f64 / elapsed_secs,
    }
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    history_base: Option<&std::path::Path>,
) -> MonteCarloReport {
    let history_dir = history_base.map(|base| base.join(scenario.name.to_lowercase()));

    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        let result = run_single(scenario, seed, history_dir.as_deref());
        results.push(result);
    }

    aggregate(scenario, results)
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n > 0 { passed as f64 / n as f64 } else { 0.0 };

    let lifetime = Stats::from_samples(
        &results.iter().map(|r| r.lifetime as f64).collect::<Vec<_>>()
    );
    let first_death = Stats::from_samples(
        &results.iter()
            .map(|r| r.first_death_round.unwrap_or(r.rounds_executed) as f64)
            .collect::<Vec<_>>()
    );
    let final_alive = Stats::from_samples(
        &results.iter().map(|r| f64::from(r.final_alive)).collect::<Vec<_>>()
    );
    let mean_rounds_alive = Stats::from_samples(
        &results.iter().map(|r| r.mean_rounds_alive).collect::<Vec<_>>()
    );
    let mean_survivor_energy = Stats::from_samples(
        &results.iter().map(|r| r.mean_survivor_energy).collect::<Vec<_>>()
    );
    let readings_delivered = Stats::from_samples(
        &results.iter().map(|r| r.readings_delivered as f64).collect::<Vec<_>>()
    );
    let total_alerts = Stats::from_samples(
        &results.iter().map(|r| r.total_alerts as f64).collect::<Vec<_>>()
    );
    let head_share = Stats::from_samples(
        &results.iter().map(|r| r.head_share).collect::<Vec<_>>()
    );
    let consumed_total = Stats::from_samples(
        &results.iter().map(|r| r.consumed_total).collect::<Vec<_>>()
    );
    let audit_max_error = Stats::from_samples(
        &results.iter().map(|r| r.audit_max_error).collect::<Vec<_>>()
    );
    let elapsed_ms = Stats::from_samples(
        &results.iter().map(|r| r.elapsed_ms as f64).collect::<Vec<_>>()
    );
    let rounds_per_sec = Stats::from_samples(
        &results.iter().map(|r| r.rounds_per_sec).collect::<Vec<_>>()
    );
    let audit_violation_runs = results.iter().filter(|r| r.audit_violations > 0).count();

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate,
        lifetime,
        first_death,
        final_alive,
        mean_rounds_alive,
        mean_survivor_energy,
        readings_delivered,
        total_alerts,
        head_share,
        consumed_total,
        audit_max_error,
        elapsed_ms,
        rounds_per_sec,
        audit_violation_runs,
        individual_runs: results,
    }
}

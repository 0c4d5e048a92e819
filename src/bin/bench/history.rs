// Per-Round JSONL History Recorder
// Outputs one JSON line per round for independent analysis

use serde::Serialize;
use field_engine::RoundStats;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct RoundSnapshot {
    pub round: usize,
    pub heads_elected: u32,
    pub sent_to_head: u32,
    pub sent_direct: u32,
    pub heads_forwarded: u32,
    pub alive: u32,
    pub alive_fraction: f64,
    pub mean_alive_energy: f64,
    pub consumed: f64,
    pub consumed_cumulative: f64,
}

impl RoundSnapshot {
    pub fn from_stats(stats: &RoundStats, total_nodes: u32, consumed_cumulative: f64) -> Self {
        let alive_fraction = if total_nodes == 0 {
            0.0
        } else {
            f64::from(stats.alive) / f64::from(total_nodes)
        };
        Self {
            round: stats.round,
            heads_elected: stats.heads_elected,
            sent_to_head: stats.sent_to_head,
            sent_direct: stats.sent_direct,
            heads_forwarded: stats.heads_forwarded,
            alive: stats.alive,
            alive_fraction,
            mean_alive_energy: stats.mean_alive_energy,
            consumed: stats.consumed,
            consumed_cumulative,
        }
    }
}

/// History recorder that accumulates snapshots and writes JSONL
pub struct HistoryRecorder {
    total_nodes: u32,
    consumed_running: f64,
    snapshots: Vec<RoundSnapshot>,
}

impl HistoryRecorder {
    pub fn new(total_nodes: u32) -> Self {
        Self {
            total_nodes,
            consumed_running: 0.0,
            snapshots: Vec::new(),
        }
    }

    pub fn record(&mut self, stats: &RoundStats) {
        self.consumed_running += stats.consumed;
        self.snapshots.push(RoundSnapshot::from_stats(
            stats,
            self.total_nodes,
            self.consumed_running,
        ));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

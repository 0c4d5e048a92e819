// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Type Definitions

use serde::{Serialize, Deserialize};

// ─── Position ────────────────────────────────────────────────────────────────

/// A fixed point on the deployment plane, in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance. Cheaper than `distance_to` for ordering.
    pub fn distance_sq(&self, other: Position) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

// ─── Protocol ────────────────────────────────────────────────────────────────

/// Data-collection strategy run by the scheduler. `Direct` disables the
/// clustering algorithm entirely; every alive node sends straight to the sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Protocol {
    Leach,
    Direct,
}

impl Default for Protocol {
    fn default() -> Self { Protocol::Leach }
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Leach => "LEACH",
            Self::Direct => "Direct",
        }
    }
}

// ─── Node Role ───────────────────────────────────────────────────────────────

/// Per-round role, reset before every election. Roles are mutually exclusive:
/// a head is never a member, and `Member` always names a head elected in the
/// same round (the reference may go stale if that head dies mid-round).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeRole {
    /// Between role reset and election, and for dead nodes.
    Unassigned,
    /// Sends its buffer straight to the sink this round.
    Direct,
    /// Clustered under the head with the given node id.
    Member { head: u32 },
    /// Aggregates member data and forwards to the sink this round.
    Head,
}

impl Default for NodeRole {
    fn default() -> Self { NodeRole::Unassigned }
}

impl NodeRole {
    pub fn is_head(&self) -> bool {
        matches!(self, Self::Head)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }

    /// The assigned head's id, if clustered.
    pub fn head_id(&self) -> Option<u32> {
        match self {
            Self::Member { head } => Some(*head),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Direct => "direct",
            Self::Member { .. } => "member",
            Self::Head => "head",
        }
    }
}

// ─── Halt Reason ─────────────────────────────────────────────────────────────

/// Why a run stopped. Checked by the bench criteria and surfaced in reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HaltReason {
    /// Alive fraction fell to or below the functional-network threshold.
    NetworkDown,
    /// Every node is dead.
    AllDead,
    /// The configured round budget ran out.
    BudgetExhausted,
}

impl HaltReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NetworkDown => "network below functional threshold",
            Self::AllDead => "all nodes dead",
            Self::BudgetExhausted => "round budget exhausted",
        }
    }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// A reading above the fire threshold, attributed to the forwarding node
/// (the cluster head's id for aggregated data, not the sensing member's).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub node_id: u32,
    pub reading: f64,
}

// ─── RoundStats ──────────────────────────────────────────────────────────────

/// One completed round, as recorded at the Accounting phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStats {
    /// Zero-based round index.
    pub round: usize,
    /// Heads elected at Setup (before any mid-round deaths).
    pub heads_elected: u32,
    /// Successful member→head transfers.
    pub sent_to_head: u32,
    /// Successful member→sink sends.
    pub sent_direct: u32,
    /// Heads that aggregated and reached the sink.
    pub heads_forwarded: u32,
    /// Nodes alive after the round.
    pub alive: u32,
    /// Mean residual energy across alive nodes (0.0 when none survive).
    pub mean_alive_energy: f64,
    /// Energy consumed by the whole network during this round, in joules.
    pub consumed: f64,
}

// ─── SimReport ───────────────────────────────────────────────────────────────

/// Final run summary, produced once the scheduler stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub protocol: Protocol,
    pub total_nodes: u32,
    /// Rounds that actually executed (the history tail beyond this is zeros).
    pub rounds_executed: usize,
    /// Rounds with a non-zero alive count in the history.
    pub lifetime: usize,
    pub alive: u32,
    pub dead: u32,
    /// Mean residual energy of survivors (0.0 when none).
    pub mean_survivor_energy: f64,
    /// Mean `rounds_alive` across all nodes, dead and alive.
    pub mean_rounds_alive: f64,
    /// 1-based label of the first round entered with a dead node, if any.
    pub first_death_round: Option<usize>,
    pub total_alerts: usize,
    pub halt: Option<HaltReason>,
    /// Conservation audit outcome: rounds where the energy ledger failed to
    /// balance within tolerance.
    pub audit_violations: u32,
}

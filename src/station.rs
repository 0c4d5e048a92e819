// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Base Station

use std::collections::BTreeMap;

use crate::types::{Alert, Position};

/// The sink. Unlimited energy, so ingestion never fails; it only records.
#[derive(Debug, Clone)]
pub struct BaseStation {
    pub pos: Position,
    /// Every reading ever received, keyed by the forwarding node's id. For
    /// aggregated traffic that is the head's id, not the sensing member's.
    pub received_data: BTreeMap<u32, Vec<f64>>,
    /// Fire alerts in arrival order.
    pub alerts: Vec<Alert>,
    pub alert_threshold: f64,
}

impl BaseStation {
    pub fn new(pos: Position, alert_threshold: f64) -> Self {
        Self {
            pos,
            received_data: BTreeMap::new(),
            alerts: Vec::new(),
            alert_threshold,
        }
    }

    /// Ingests a batch of readings from `node_id`. Each reading strictly
    /// above the fire threshold raises one alert, in batch order.
    pub fn receive_data(&mut self, node_id: u32, readings: Vec<f64>) {
        for &reading in &readings {
            if reading > self.alert_threshold {
                log::warn!("fire alert: node {} reported {:.1} C", node_id, reading);
                self.alerts.push(Alert { node_id, reading });
            }
        }
        self.received_data.entry(node_id).or_default().extend(readings);
    }

    /// Total readings ingested across all senders.
    pub fn total_readings(&self) -> usize {
        self.received_data.values().map(Vec::len).sum()
    }
}

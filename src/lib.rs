// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field")

pub mod types;
pub mod config;
pub mod energy;
pub mod node;
pub mod station;
pub mod cluster;
pub mod topology;
pub mod conservation;
pub mod simulation;

pub use types::*;
pub use config::{ConfigError, EnergyConfig, ReadingModel, SimConfig};
pub use conservation::EnergyAudit;
pub use node::SensorNode;
pub use simulation::{network_lifetime, FieldSimulation};
pub use station::BaseStation;
pub use topology::{Topology, TopologyError};

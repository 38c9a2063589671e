//! Quickstart orchestrator: provisions a complete local cluster.
//!
//! The orchestrator owns only the bookkeeping (steps, ports, names) and the
//! stage order. Certificates, the ODB and components are created by
//! collaborators behind traits, so every stage can be exercised with mocks.

mod counters;
mod runner;
mod types;

pub use counters::{PortAllocator, ProgressCounter};
pub use runner::QuickstartOrchestrator;
pub use types::{
    ClusterCrypto, OrchestratorError, ProvisioningReport, ProvisioningRequest, RequestSnapshot,
    ServerSlot,
};

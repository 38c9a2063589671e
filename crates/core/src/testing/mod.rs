//! Mock collaborators for orchestrator tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickstart_core::testing::{MockCertificateAuthority, MockComponentFactory};
//!
//! let ca = Arc::new(MockCertificateAuthority::new());
//! let components = Arc::new(MockComponentFactory::new());
//! components.fail_on(ComponentKind::Scheduler).await;
//!
//! let orchestrator = QuickstartOrchestrator::new(ca.clone(), components.clone(), Arc::new(SqliteConnector));
//! ```

mod mock_ca;
mod mock_components;

pub use mock_ca::MockCertificateAuthority;
pub use mock_components::MockComponentFactory;

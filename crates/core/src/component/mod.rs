//! Creation of cluster components: servers, load balancer, dashboard and scheduler.
//!
//! Each component lives in its own directory, which the caller creates
//! beforehand. A factory fills it with configuration and registers whatever
//! the component needs in the ODB. Running the component is out of scope.

mod error;
mod fs_factory;
mod traits;
mod types;

pub use error::ComponentError;
pub use fs_factory::FsComponentFactory;
pub use traits::ComponentFactory;
pub use types::{
    ComponentKind, CreateDashboardRequest, CreateLoadBalancerRequest, CreateSchedulerRequest,
    CreateServerRequest, DashboardCreated,
};

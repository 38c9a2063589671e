//! Trait definitions for the component module.

use async_trait::async_trait;

use crate::odb::Odb;

use super::error::ComponentError;
use super::types::{
    CreateDashboardRequest, CreateLoadBalancerRequest, CreateSchedulerRequest,
    CreateServerRequest, DashboardCreated,
};

/// Creates cluster components inside pre-created directories.
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    /// Returns the name of this factory implementation.
    fn name(&self) -> &str;

    /// Creates a server and returns its ODB id.
    async fn create_server(
        &self,
        odb: &dyn Odb,
        request: CreateServerRequest,
    ) -> Result<i64, ComponentError>;

    /// Creates the load balancer in front of the cluster's servers.
    async fn create_load_balancer(
        &self,
        request: CreateLoadBalancerRequest,
    ) -> Result<(), ComponentError>;

    /// Creates the dashboard and makes sure its admin user exists.
    async fn create_dashboard(
        &self,
        odb: &dyn Odb,
        request: CreateDashboardRequest,
    ) -> Result<DashboardCreated, ComponentError>;

    /// Creates the scheduler.
    async fn create_scheduler(&self, request: CreateSchedulerRequest)
        -> Result<(), ComponentError>;
}

//! Mock component factory for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::component::{
    ComponentError, ComponentFactory, ComponentKind, CreateDashboardRequest,
    CreateLoadBalancerRequest, CreateSchedulerRequest, CreateServerRequest, DashboardCreated,
};
use crate::defaults::DASHBOARD_ADMIN_USER;
use crate::odb::{Odb, RegisterServerRequest};

/// Mock implementation of the ComponentFactory trait.
///
/// Writes nothing to disk. Servers are registered and the dashboard admin
/// is ensured in the ODB it is handed, so ids and the admin flag behave
/// like the real factory.
#[derive(Debug)]
pub struct MockComponentFactory {
    /// Component kinds in call order.
    calls: Arc<RwLock<Vec<ComponentKind>>>,
    servers: Arc<RwLock<Vec<CreateServerRequest>>>,
    load_balancers: Arc<RwLock<Vec<CreateLoadBalancerRequest>>>,
    dashboards: Arc<RwLock<Vec<CreateDashboardRequest>>>,
    schedulers: Arc<RwLock<Vec<CreateSchedulerRequest>>>,
    /// If set, creating this kind of component fails.
    fail_on: Arc<RwLock<Option<ComponentKind>>>,
}

impl Default for MockComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComponentFactory {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            servers: Arc::new(RwLock::new(Vec::new())),
            load_balancers: Arc::new(RwLock::new(Vec::new())),
            dashboards: Arc::new(RwLock::new(Vec::new())),
            schedulers: Arc::new(RwLock::new(Vec::new())),
            fail_on: Arc::new(RwLock::new(None)),
        }
    }

    /// Make every creation of `kind` fail.
    pub async fn fail_on(&self, kind: ComponentKind) {
        *self.fail_on.write().await = Some(kind);
    }

    pub async fn recorded_calls(&self) -> Vec<ComponentKind> {
        self.calls.read().await.clone()
    }

    pub async fn recorded_servers(&self) -> Vec<CreateServerRequest> {
        self.servers.read().await.clone()
    }

    pub async fn recorded_load_balancers(&self) -> Vec<CreateLoadBalancerRequest> {
        self.load_balancers.read().await.clone()
    }

    pub async fn recorded_dashboards(&self) -> Vec<CreateDashboardRequest> {
        self.dashboards.read().await.clone()
    }

    pub async fn recorded_schedulers(&self) -> Vec<CreateSchedulerRequest> {
        self.schedulers.read().await.clone()
    }

    async fn record(&self, kind: ComponentKind, path: &std::path::Path) -> Result<(), ComponentError> {
        self.calls.write().await.push(kind);

        if *self.fail_on.read().await == Some(kind) {
            return Err(ComponentError::write_failed(
                path.to_path_buf(),
                std::io::Error::other(format!("injected {} failure", kind.as_str())),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ComponentFactory for MockComponentFactory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_server(
        &self,
        odb: &dyn Odb,
        request: CreateServerRequest,
    ) -> Result<i64, ComponentError> {
        self.record(ComponentKind::Server, &request.path).await?;

        let server_id = odb.register_server(&RegisterServerRequest {
            cluster_name: request.cluster_name.clone(),
            server_name: request.server_name.clone(),
            bind_port: request.port,
            token: format!("mock-token-{}", request.server_name),
        })?;
        self.servers.write().await.push(request);
        Ok(server_id)
    }

    async fn create_load_balancer(
        &self,
        request: CreateLoadBalancerRequest,
    ) -> Result<(), ComponentError> {
        self.record(ComponentKind::LoadBalancer, &request.path).await?;
        self.load_balancers.write().await.push(request);
        Ok(())
    }

    async fn create_dashboard(
        &self,
        odb: &dyn Odb,
        request: CreateDashboardRequest,
    ) -> Result<DashboardCreated, ComponentError> {
        self.record(ComponentKind::WebAdmin, &request.path).await?;

        let admin_created = odb.ensure_dashboard_user(DASHBOARD_ADMIN_USER, "mock-hash")?;
        self.dashboards.write().await.push(request);
        Ok(DashboardCreated { admin_created })
    }

    async fn create_scheduler(
        &self,
        request: CreateSchedulerRequest,
    ) -> Result<(), ComponentError> {
        self.record(ComponentKind::Scheduler, &request.path).await?;
        self.schedulers.write().await.push(request);
        Ok(())
    }
}

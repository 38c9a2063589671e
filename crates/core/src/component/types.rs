//! Types for the component module.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{KvdbConfig, OdbConfig};
use crate::crypto::CryptoMaterialBundle;

/// Kind of component, as recorded in its `.zato` marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    Server,
    LoadBalancer,
    WebAdmin,
    Scheduler,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Server => "SERVER",
            ComponentKind::LoadBalancer => "LOAD_BALANCER",
            ComponentKind::WebAdmin => "WEB_ADMIN",
            ComponentKind::Scheduler => "SCHEDULER",
        }
    }
}

/// Request to create one server.
#[derive(Debug, Clone)]
pub struct CreateServerRequest {
    /// Directory of the server, created by the caller.
    pub path: PathBuf,
    pub cluster_name: String,
    pub server_name: String,
    /// Plain HTTP port the server binds to.
    pub port: u16,
    pub odb: OdbConfig,
    pub kvdb: KvdbConfig,
    /// Main secret key, shared by all servers of the cluster.
    pub secret_key: String,
    /// JWT signing secret, shared by all servers of the cluster.
    pub jwt_secret: String,
    /// TLS material; `None` when TLS is disabled.
    pub crypto: Option<CryptoMaterialBundle>,
}

/// Request to create the load balancer.
#[derive(Debug, Clone)]
pub struct CreateLoadBalancerRequest {
    pub path: PathBuf,
    pub cluster_name: String,
    pub lb_host: String,
    pub lb_port: u16,
    pub lb_agent_port: u16,
    /// Port of the backend server the load balancer forwards to.
    pub servers_port: u16,
    pub crypto: Option<CryptoMaterialBundle>,
}

/// Request to create the dashboard.
#[derive(Debug, Clone)]
pub struct CreateDashboardRequest {
    pub path: PathBuf,
    pub cluster_name: String,
    pub odb: OdbConfig,
    /// Password the dashboard uses when invoking server services.
    pub admin_invoke_password: String,
    /// Password for the `admin` dashboard user, if it has to be created.
    pub admin_password: String,
    pub crypto: Option<CryptoMaterialBundle>,
}

/// Outcome of dashboard creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCreated {
    /// `false` if the admin user already existed in the ODB.
    pub admin_created: bool,
}

/// Request to create the scheduler.
#[derive(Debug, Clone)]
pub struct CreateSchedulerRequest {
    pub path: PathBuf,
    pub cluster_name: String,
    pub cluster_id: i64,
    /// Directory of the server the scheduler talks to.
    pub server_path: PathBuf,
    pub odb: OdbConfig,
    pub kvdb: KvdbConfig,
    pub secret_key: String,
    pub crypto: Option<CryptoMaterialBundle>,
}

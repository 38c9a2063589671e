//! Types for the quickstart orchestrator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::component::ComponentError;
use crate::config::{KvdbConfig, OdbConfig, SanitizedKvdbConfig, SanitizedOdbConfig};
use crate::crypto::{CryptoError, CryptoMaterialBundle};
use crate::odb::{ClusterOutcome, OdbError, SchemaOutcome};
use crate::platform::Platform;
use crate::scripts::{ScriptError, WrittenScripts};

/// Errors that abort a provisioning run.
///
/// Collaborator errors are passed through with their own message.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The target directory already has content.
    #[error("Directory {0} is not empty")]
    TargetNotEmpty(PathBuf),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {0}")]
    Serialize(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Scripts(#[from] ScriptError),
}

impl OrchestratorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Input of one quickstart run.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    /// Directory to create the cluster in; created if missing, must be empty.
    pub target_dir: PathBuf,
    /// Generated as `quickstart-<n>` when absent.
    pub cluster_name: Option<String>,
    pub servers: usize,
    pub odb: OdbConfig,
    pub kvdb: KvdbConfig,
    /// Shared server secret key; generated when absent.
    pub secret_key: Option<String>,
    /// Shared JWT secret; generated when absent.
    pub jwt_secret_key: Option<String>,
    /// Write a sanitized snapshot of this request next to the cluster.
    pub store_config: bool,
    pub platform: Platform,
}

impl ProvisioningRequest {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            cluster_name: None,
            servers: 1,
            odb: OdbConfig::default(),
            kvdb: KvdbConfig::default(),
            secret_key: None,
            jwt_secret_key: None,
            store_config: false,
            platform: Platform::current(),
        }
    }
}

/// One provisioned server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSlot {
    /// 1-based ordinal.
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    pub port: u16,
    pub crypto: Option<CryptoMaterialBundle>,
    /// Id returned by the server-creation collaborator.
    pub server_id: i64,
}

/// TLS material located for every component of the cluster.
#[derive(Debug, Clone)]
pub struct ClusterCrypto {
    pub ca_dir: PathBuf,
    pub lb_agent: CryptoMaterialBundle,
    pub dashboard: CryptoMaterialBundle,
    pub scheduler: CryptoMaterialBundle,
    /// In server order.
    pub servers: Vec<CryptoMaterialBundle>,
}

/// What a successful run created.
#[derive(Debug, Clone)]
pub struct ProvisioningReport {
    pub cluster_name: String,
    pub cluster_id: i64,
    pub target_dir: PathBuf,
    pub schema: SchemaOutcome,
    pub cluster: ClusterOutcome,
    pub servers: Vec<ServerSlot>,
    /// Backend port the load balancer was created with.
    pub lb_servers_port: u16,
    /// Password of the newly created dashboard admin, `None` if it already existed.
    pub admin_password: Option<String>,
    pub scripts: WrittenScripts,
    pub config_snapshot: Option<PathBuf>,
    /// Progress lines in the order they were reported.
    pub progress: Vec<String>,
    pub total_steps: usize,
}

/// Request snapshot written when `store_config` is set. Secrets are
/// replaced with flags.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub cluster_name: String,
    pub servers: usize,
    pub platform: Platform,
    pub target_dir: PathBuf,
    pub secret_key_configured: bool,
    pub jwt_secret_key_configured: bool,
    pub created_at: DateTime<Utc>,
    pub odb: SanitizedOdbConfig,
    pub kvdb: SanitizedKvdbConfig,
}

impl RequestSnapshot {
    pub fn new(request: &ProvisioningRequest, cluster_name: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            servers: request.servers,
            platform: request.platform,
            target_dir: request.target_dir.clone(),
            secret_key_configured: request.secret_key.is_some(),
            jwt_secret_key_configured: request.jwt_secret_key.is_some(),
            created_at: Utc::now(),
            odb: SanitizedOdbConfig::from(&request.odb),
            kvdb: SanitizedKvdbConfig::from(&request.kvdb),
        }
    }
}

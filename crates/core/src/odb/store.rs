//! ODB trait and request types.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{OdbConfig, OdbType};

/// Error type for ODB operations.
#[derive(Debug, Error)]
pub enum OdbError {
    /// Underlying database error.
    #[error("Database error: {0}")]
    Database(String),

    /// No cluster with this name exists.
    #[error("No such cluster: {0}")]
    NoSuchCluster(String),

    /// The connector cannot talk to this kind of database.
    #[error("Unsupported ODB type: {0}")]
    Unsupported(OdbType),

    /// A file-backed ODB was requested without a file path.
    #[error("ODB type {0} requires a database file path")]
    MissingPath(OdbType),
}

impl From<rusqlite::Error> for OdbError {
    fn from(e: rusqlite::Error) -> Self {
        OdbError::Database(e.to_string())
    }
}

/// Result of creating the ODB schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    AlreadyExists,
}

/// Result of creating the cluster record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterOutcome {
    Created { cluster_id: i64 },
    AlreadyExists { cluster_id: i64 },
}

impl ClusterOutcome {
    pub fn cluster_id(&self) -> i64 {
        match self {
            ClusterOutcome::Created { cluster_id } | ClusterOutcome::AlreadyExists { cluster_id } => {
                *cluster_id
            }
        }
    }
}

/// Request to create a cluster together with its initial data.
#[derive(Debug, Clone)]
pub struct CreateClusterRequest {
    pub name: String,
    pub odb_type: OdbType,
    pub lb_host: String,
    pub lb_port: u16,
    pub lb_agent_port: u16,
    /// Password of the `admin.invoke` account created with the cluster.
    pub admin_invoke_password: String,
}

/// Request to register a newly created server.
#[derive(Debug, Clone)]
pub struct RegisterServerRequest {
    pub cluster_name: String,
    pub server_name: String,
    pub bind_port: u16,
    pub token: String,
}

/// Operations the quickstart needs from the ODB.
pub trait Odb: Send + Sync {
    /// Create all ODB tables; reports `AlreadyExists` if the schema is in place.
    fn create_schema(&self) -> Result<SchemaOutcome, OdbError>;

    /// Create a cluster with its initial data; reports `AlreadyExists` for a known name.
    fn create_cluster(&self, request: &CreateClusterRequest) -> Result<ClusterOutcome, OdbError>;

    /// Look up a cluster's id by name.
    fn cluster_id(&self, cluster_name: &str) -> Result<i64, OdbError>;

    /// Insert a server row and return its id. A server already registered
    /// under this name keeps its id and gets the new bind port and token.
    fn register_server(&self, request: &RegisterServerRequest) -> Result<i64, OdbError>;

    /// Look up a server's id by cluster and server name.
    fn server_id(&self, cluster_name: &str, server_name: &str) -> Result<Option<i64>, OdbError>;

    /// Make `server_id` the delivery server of every subscription to `topic_name`
    /// within `cluster_name`, in a single transaction. Returns the number of
    /// subscriptions updated.
    fn set_pubsub_server(
        &self,
        cluster_name: &str,
        topic_name: &str,
        server_id: i64,
    ) -> Result<usize, OdbError>;

    /// Create a dashboard user unless one with this name exists.
    /// Returns `true` if the user was created.
    fn ensure_dashboard_user(&self, username: &str, password_hash: &str)
        -> Result<bool, OdbError>;
}

/// Opens an ODB from connection parameters.
pub trait OdbConnector: Send + Sync {
    /// Whether `connect` can open this kind of ODB.
    fn supports(&self, odb_type: OdbType) -> bool;

    fn connect(&self, config: &OdbConfig) -> Result<Arc<dyn Odb>, OdbError>;
}

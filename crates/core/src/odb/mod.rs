//! Operational database (ODB) holding cluster, server and pub/sub metadata.

mod sqlite;
mod store;

pub use sqlite::{SqliteConnector, SqliteOdb};
pub use store::{
    ClusterOutcome, CreateClusterRequest, Odb, OdbConnector, OdbError, RegisterServerRequest,
    SchemaOutcome,
};

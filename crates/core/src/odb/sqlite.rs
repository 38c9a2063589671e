//! SQLite-backed ODB implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::config::{OdbConfig, OdbType};
use crate::defaults::{ADMIN_INVOKE_USER, SAMPLE_PUBSUB_TOPIC};

use super::{
    ClusterOutcome, CreateClusterRequest, Odb, OdbConnector, OdbError, RegisterServerRequest,
    SchemaOutcome,
};

const SCHEMA: &str = r#"
    CREATE TABLE cluster (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        odb_type TEXT NOT NULL,
        lb_host TEXT NOT NULL,
        lb_port INTEGER NOT NULL,
        lb_agent_port INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE server (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cluster_id INTEGER NOT NULL REFERENCES cluster(id),
        name TEXT NOT NULL,
        bind_host TEXT NOT NULL,
        bind_port INTEGER NOT NULL,
        token TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (cluster_id, name)
    );

    CREATE TABLE sec_basic_auth (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cluster_id INTEGER NOT NULL REFERENCES cluster(id),
        name TEXT NOT NULL,
        username TEXT NOT NULL,
        password TEXT NOT NULL,
        realm TEXT NOT NULL,
        UNIQUE (cluster_id, name)
    );

    CREATE TABLE pubsub_topic (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cluster_id INTEGER NOT NULL REFERENCES cluster(id),
        name TEXT NOT NULL,
        UNIQUE (cluster_id, name)
    );

    CREATE TABLE pubsub_subscription (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cluster_id INTEGER NOT NULL REFERENCES cluster(id),
        topic_id INTEGER NOT NULL REFERENCES pubsub_topic(id),
        sub_key TEXT NOT NULL UNIQUE,
        server_id INTEGER REFERENCES server(id),
        created_at TEXT NOT NULL
    );

    CREATE TABLE dashboard_user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX idx_pubsub_subscription_topic ON pubsub_subscription(topic_id);
"#;

/// SQLite-backed ODB.
pub struct SqliteOdb {
    conn: Mutex<Connection>,
}

impl SqliteOdb {
    /// Open (or create) the database file. Tables are created by [`Odb::create_schema`].
    pub fn new(path: &Path) -> Result<Self, OdbError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory ODB (useful for testing).
    pub fn in_memory() -> Result<Self, OdbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, OdbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, OdbError> {
        self.conn
            .lock()
            .map_err(|_| OdbError::Database("connection lock poisoned".to_string()))
    }

    /// Names of all clusters, in creation order.
    pub fn cluster_names(&self) -> Result<Vec<String>, OdbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM cluster ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Delivery server of each subscription to `topic_name` within `cluster_name`.
    pub fn subscription_servers(
        &self,
        cluster_name: &str,
        topic_name: &str,
    ) -> Result<Vec<Option<i64>>, OdbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT s.server_id FROM pubsub_subscription s \
             JOIN pubsub_topic t ON t.id = s.topic_id \
             JOIN cluster c ON c.id = t.cluster_id \
             WHERE t.name = ?1 AND c.name = ?2 ORDER BY s.id",
        )?;
        let servers = stmt
            .query_map(params![topic_name, cluster_name], |row| row.get(0))?
            .collect::<Result<Vec<Option<i64>>, _>>()?;
        Ok(servers)
    }

    /// Stored password hash of a dashboard user.
    pub fn dashboard_user_hash(&self, username: &str) -> Result<Option<String>, OdbError> {
        let conn = self.conn()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM dashboard_user WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn schema_exists(conn: &Connection) -> Result<bool, OdbError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'cluster'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn find_cluster_id(conn: &Connection, cluster_name: &str) -> Result<Option<i64>, OdbError> {
        let id = conn
            .query_row(
                "SELECT id FROM cluster WHERE name = ?1",
                params![cluster_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl Odb for SqliteOdb {
    fn create_schema(&self) -> Result<SchemaOutcome, OdbError> {
        let mut conn = self.conn()?;

        if Self::schema_exists(&conn)? {
            return Ok(SchemaOutcome::AlreadyExists);
        }

        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;

        info!("ODB schema created");
        Ok(SchemaOutcome::Created)
    }

    fn create_cluster(&self, request: &CreateClusterRequest) -> Result<ClusterOutcome, OdbError> {
        let mut conn = self.conn()?;

        if let Some(cluster_id) = Self::find_cluster_id(&conn, &request.name)? {
            return Ok(ClusterOutcome::AlreadyExists { cluster_id });
        }

        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO cluster (name, description, odb_type, lb_host, lb_port, lb_agent_port, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.name,
                "Created by quickstart",
                request.odb_type.as_str(),
                request.lb_host,
                request.lb_port,
                request.lb_agent_port,
                now,
            ],
        )?;
        let cluster_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO sec_basic_auth (cluster_id, name, username, password, realm) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                cluster_id,
                ADMIN_INVOKE_USER,
                ADMIN_INVOKE_USER,
                request.admin_invoke_password,
                "Zato admin invoke",
            ],
        )?;

        tx.execute(
            "INSERT INTO pubsub_topic (cluster_id, name) VALUES (?1, ?2)",
            params![cluster_id, SAMPLE_PUBSUB_TOPIC],
        )?;
        let topic_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO pubsub_subscription (cluster_id, topic_id, sub_key, server_id, created_at) \
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![
                cluster_id,
                topic_id,
                format!("zpsk.demo.{}", uuid::Uuid::new_v4().simple()),
                now,
            ],
        )?;

        tx.commit()?;

        info!(cluster = %request.name, cluster_id, "Cluster created");
        Ok(ClusterOutcome::Created { cluster_id })
    }

    fn cluster_id(&self, cluster_name: &str) -> Result<i64, OdbError> {
        let conn = self.conn()?;
        Self::find_cluster_id(&conn, cluster_name)?
            .ok_or_else(|| OdbError::NoSuchCluster(cluster_name.to_string()))
    }

    fn register_server(&self, request: &RegisterServerRequest) -> Result<i64, OdbError> {
        let conn = self.conn()?;

        let cluster_id = Self::find_cluster_id(&conn, &request.cluster_name)?
            .ok_or_else(|| OdbError::NoSuchCluster(request.cluster_name.clone()))?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM server WHERE cluster_id = ?1 AND name = ?2",
                params![cluster_id, request.server_name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(server_id) = existing {
            conn.execute(
                "UPDATE server SET bind_port = ?1, token = ?2 WHERE id = ?3",
                params![request.bind_port, request.token, server_id],
            )?;
            info!(
                server = %request.server_name,
                server_id,
                "Server already registered, bind port and token refreshed"
            );
            return Ok(server_id);
        }

        conn.execute(
            "INSERT INTO server (cluster_id, name, bind_host, bind_port, token, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cluster_id,
                request.server_name,
                "0.0.0.0",
                request.bind_port,
                request.token,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let server_id = conn.last_insert_rowid();

        debug!(server = %request.server_name, server_id, "Server registered");
        Ok(server_id)
    }

    fn server_id(&self, cluster_name: &str, server_name: &str) -> Result<Option<i64>, OdbError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT s.id FROM server s JOIN cluster c ON c.id = s.cluster_id \
                 WHERE c.name = ?1 AND s.name = ?2",
                params![cluster_name, server_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn set_pubsub_server(
        &self,
        cluster_name: &str,
        topic_name: &str,
        server_id: i64,
    ) -> Result<usize, OdbError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let sub_ids = {
            let mut stmt = tx.prepare(
                "SELECT s.id FROM pubsub_subscription s \
                 JOIN pubsub_topic t ON t.id = s.topic_id \
                 JOIN cluster c ON c.id = t.cluster_id \
                 WHERE t.name = ?1 AND c.name = ?2",
            )?;
            let ids = stmt
                .query_map(params![topic_name, cluster_name], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };

        for sub_id in &sub_ids {
            tx.execute(
                "UPDATE pubsub_subscription SET server_id = ?1 WHERE id = ?2",
                params![server_id, sub_id],
            )?;
        }

        tx.commit()?;

        debug!(
            topic = topic_name,
            server_id,
            updated = sub_ids.len(),
            "Pub/sub delivery server set"
        );
        Ok(sub_ids.len())
    }

    fn ensure_dashboard_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, OdbError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO dashboard_user (username, password_hash, created_at) \
             VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }
}

/// Connects to file-backed SQLite ODBs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

impl OdbConnector for SqliteConnector {
    fn supports(&self, odb_type: OdbType) -> bool {
        odb_type == OdbType::Sqlite
    }

    fn connect(&self, config: &OdbConfig) -> Result<Arc<dyn Odb>, OdbError> {
        if !self.supports(config.odb_type) {
            return Err(OdbError::Unsupported(config.odb_type));
        }
        let path = config
            .sqlite_path
            .as_deref()
            .ok_or(OdbError::MissingPath(OdbType::Sqlite))?;
        debug!(path = %path.display(), "Opening SQLite ODB");
        Ok(Arc::new(SqliteOdb::new(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{LB_AGENT_PORT, LB_HOST, LB_PORT};
    use tempfile::TempDir;

    fn cluster_request(name: &str) -> CreateClusterRequest {
        CreateClusterRequest {
            name: name.to_string(),
            odb_type: OdbType::Sqlite,
            lb_host: LB_HOST.to_string(),
            lb_port: LB_PORT,
            lb_agent_port: LB_AGENT_PORT,
            admin_invoke_password: "admin.invoke.abc".to_string(),
        }
    }

    fn odb_with_cluster(name: &str) -> SqliteOdb {
        let odb = SqliteOdb::in_memory().unwrap();
        odb.create_schema().unwrap();
        odb.create_cluster(&cluster_request(name)).unwrap();
        odb
    }

    fn register(odb: &SqliteOdb, cluster: &str, server: &str, port: u16) -> i64 {
        odb.register_server(&RegisterServerRequest {
            cluster_name: cluster.to_string(),
            server_name: server.to_string(),
            bind_port: port,
            token: "token".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_create_schema_twice() {
        let odb = SqliteOdb::in_memory().unwrap();
        assert_eq!(odb.create_schema().unwrap(), SchemaOutcome::Created);
        assert_eq!(odb.create_schema().unwrap(), SchemaOutcome::AlreadyExists);
    }

    #[test]
    fn test_create_cluster_twice_keeps_one_row() {
        let odb = SqliteOdb::in_memory().unwrap();
        odb.create_schema().unwrap();

        let first = odb.create_cluster(&cluster_request("qs-1")).unwrap();
        let second = odb.create_cluster(&cluster_request("qs-1")).unwrap();

        assert!(matches!(first, ClusterOutcome::Created { .. }));
        assert!(matches!(second, ClusterOutcome::AlreadyExists { .. }));
        assert_eq!(first.cluster_id(), second.cluster_id());
        assert_eq!(odb.cluster_names().unwrap(), vec!["qs-1".to_string()]);
    }

    #[test]
    fn test_create_cluster_seeds_sample_subscription() {
        let odb = odb_with_cluster("qs-1");
        let servers = odb
            .subscription_servers("qs-1", SAMPLE_PUBSUB_TOPIC)
            .unwrap();
        assert_eq!(servers, vec![None]);
    }

    #[test]
    fn test_cluster_id_lookup() {
        let odb = odb_with_cluster("qs-1");
        assert!(odb.cluster_id("qs-1").unwrap() > 0);
        assert!(matches!(
            odb.cluster_id("missing"),
            Err(OdbError::NoSuchCluster(_))
        ));
    }

    #[test]
    fn test_register_and_find_server() {
        let odb = odb_with_cluster("qs-1");
        let id = register(&odb, "qs-1", "server1", 17010);

        assert_eq!(odb.server_id("qs-1", "server1").unwrap(), Some(id));
        assert_eq!(odb.server_id("qs-1", "server2").unwrap(), None);
    }

    #[test]
    fn test_register_server_twice_refreshes_row() {
        let odb = odb_with_cluster("qs-1");
        let first = register(&odb, "qs-1", "server1", 17010);

        let second = odb
            .register_server(&RegisterServerRequest {
                cluster_name: "qs-1".to_string(),
                server_name: "server1".to_string(),
                bind_port: 17020,
                token: "new-token".to_string(),
            })
            .unwrap();

        assert_eq!(first, second);
        let (port, token): (u16, String) = odb
            .conn()
            .unwrap()
            .query_row(
                "SELECT bind_port, token FROM server WHERE id = ?1",
                params![first],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(port, 17020);
        assert_eq!(token, "new-token");
    }

    #[test]
    fn test_register_server_unknown_cluster() {
        let odb = odb_with_cluster("qs-1");
        let result = odb.register_server(&RegisterServerRequest {
            cluster_name: "other".to_string(),
            server_name: "server1".to_string(),
            bind_port: 17010,
            token: "t".to_string(),
        });
        assert!(matches!(result, Err(OdbError::NoSuchCluster(_))));
    }

    #[test]
    fn test_set_pubsub_server_scoped_to_cluster() {
        let odb = odb_with_cluster("qs-1");
        odb.create_cluster(&cluster_request("qs-2")).unwrap();

        let server_id = register(&odb, "qs-1", "server1", 17010);
        let updated = odb
            .set_pubsub_server("qs-1", SAMPLE_PUBSUB_TOPIC, server_id)
            .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(
            odb.subscription_servers("qs-1", SAMPLE_PUBSUB_TOPIC).unwrap(),
            vec![Some(server_id)]
        );
        assert_eq!(
            odb.subscription_servers("qs-2", SAMPLE_PUBSUB_TOPIC).unwrap(),
            vec![None]
        );
    }

    #[test]
    fn test_set_pubsub_server_unknown_topic_updates_nothing() {
        let odb = odb_with_cluster("qs-1");
        let server_id = register(&odb, "qs-1", "server1", 17010);
        let updated = odb
            .set_pubsub_server("qs-1", "/no/such/topic", server_id)
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[test]
    fn test_ensure_dashboard_user_only_once() {
        let odb = odb_with_cluster("qs-1");
        assert!(odb.ensure_dashboard_user("admin", "hash-1").unwrap());
        assert!(!odb.ensure_dashboard_user("admin", "hash-2").unwrap());
        assert_eq!(
            odb.dashboard_user_hash("admin").unwrap().as_deref(),
            Some("hash-1")
        );
    }

    #[test]
    fn test_connector_opens_sqlite_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zato.db");
        let config = OdbConfig {
            sqlite_path: Some(path.clone()),
            ..Default::default()
        };

        let odb = SqliteConnector.connect(&config).unwrap();
        assert_eq!(odb.create_schema().unwrap(), SchemaOutcome::Created);
        assert!(path.exists());

        // A second connection sees the existing schema
        let again = SqliteConnector.connect(&config).unwrap();
        assert_eq!(again.create_schema().unwrap(), SchemaOutcome::AlreadyExists);
    }

    #[test]
    fn test_connector_requires_sqlite_path() {
        let result = SqliteConnector.connect(&OdbConfig::default());
        assert!(matches!(result, Err(OdbError::MissingPath(OdbType::Sqlite))));
    }

    #[test]
    fn test_connector_rejects_server_databases() {
        let config = OdbConfig {
            odb_type: OdbType::Postgresql,
            ..Default::default()
        };
        let result = SqliteConnector.connect(&config);
        assert!(matches!(result, Err(OdbError::Unsupported(OdbType::Postgresql))));
    }

    #[test]
    fn test_connector_supports_only_sqlite() {
        assert!(SqliteConnector.supports(OdbType::Sqlite));
        assert!(!SqliteConnector.supports(OdbType::Postgresql));
        assert!(!SqliteConnector.supports(OdbType::Mysql));
    }
}

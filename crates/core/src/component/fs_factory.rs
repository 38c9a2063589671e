//! Component factory that writes configuration files to disk.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::config::{KvdbConfig, OdbConfig, SanitizedKvdbConfig, SanitizedOdbConfig};
use crate::crypto::{hash_password, CryptoMaterialBundle};
use crate::defaults::{
    ADMIN_INVOKE_USER, DASHBOARD_ADMIN_USER, DASHBOARD_PORT, SCHEDULER_PORT,
};
use crate::odb::{Odb, RegisterServerRequest};

use super::error::ComponentError;
use super::traits::ComponentFactory;
use super::types::{
    ComponentKind, CreateDashboardRequest, CreateLoadBalancerRequest, CreateSchedulerRequest,
    CreateServerRequest, DashboardCreated,
};

/// Marker file identifying a component directory.
pub const MARKER_FILE: &str = ".zato";
pub const CONFIG_DIR: &str = "config";
pub const SECRETS_FILE: &str = "secrets.toml";

#[derive(Debug, Serialize)]
struct Marker<'a> {
    component: ComponentKind,
    version: &'a str,
    created_ts: String,
}

#[derive(Debug, Serialize)]
struct TlsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    cert_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priv_key_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub_key_path: Option<PathBuf>,
    ca_certs_path: PathBuf,
}

impl From<&CryptoMaterialBundle> for TlsSection {
    fn from(bundle: &CryptoMaterialBundle) -> Self {
        Self {
            cert_path: bundle.cert_path.clone(),
            priv_key_path: bundle.priv_path.clone(),
            pub_key_path: bundle.pub_path.clone(),
            ca_certs_path: bundle.ca_certs_path.clone(),
        }
    }
}

fn tls_section(crypto: &Option<CryptoMaterialBundle>) -> Option<TlsSection> {
    crypto.as_ref().map(TlsSection::from)
}

#[derive(Debug, Serialize)]
struct ServerFile<'a> {
    main: ServerMain<'a>,
    odb: SanitizedOdbConfig,
    kvdb: SanitizedKvdbConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    crypto: Option<TlsSection>,
}

#[derive(Debug, Serialize)]
struct ServerMain<'a> {
    cluster_name: &'a str,
    server_name: &'a str,
    host: &'a str,
    port: u16,
    token: &'a str,
    use_tls: bool,
}

/// Credentials of one component. Only ever written with owner-only permissions.
#[derive(Debug, Default, Serialize)]
struct SecretsFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    odb_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kvdb_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_invoke_password: Option<&'a str>,
}

impl<'a> SecretsFile<'a> {
    fn with_db_passwords(odb: &'a OdbConfig, kvdb: Option<&'a KvdbConfig>) -> Self {
        Self {
            odb_password: odb.password.as_deref().filter(|p| !p.is_empty()),
            kvdb_password: kvdb
                .and_then(|k| k.password.as_deref())
                .filter(|p| !p.is_empty()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct LoadBalancerFile<'a> {
    cluster_name: &'a str,
    frontend: Endpoint<'a>,
    agent: Endpoint<'a>,
    backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    crypto: Option<TlsSection>,
}

#[derive(Debug, Serialize)]
struct Endpoint<'a> {
    host: &'a str,
    port: u16,
}

#[derive(Debug, Serialize)]
struct Backend {
    servers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DashboardFile<'a> {
    main: DashboardMain<'a>,
    odb: SanitizedOdbConfig,
    admin_invoke: AdminInvoke<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crypto: Option<TlsSection>,
}

#[derive(Debug, Serialize)]
struct DashboardMain<'a> {
    cluster_name: &'a str,
    host: &'a str,
    port: u16,
}

#[derive(Debug, Serialize)]
struct AdminInvoke<'a> {
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct SchedulerFile<'a> {
    main: SchedulerMain<'a>,
    odb: SanitizedOdbConfig,
    kvdb: SanitizedKvdbConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    crypto: Option<TlsSection>,
}

#[derive(Debug, Serialize)]
struct SchedulerMain<'a> {
    cluster_id: i64,
    cluster_name: &'a str,
    server_path: &'a Path,
    host: &'a str,
    port: u16,
}

/// Writes component configs under each component's directory.
#[derive(Debug, Default, Clone)]
pub struct FsComponentFactory;

impl FsComponentFactory {
    pub fn new() -> Self {
        Self
    }

    /// Makes sure `path` exists and prepares its config directory and marker.
    async fn prepare(path: &Path, kind: ComponentKind) -> Result<PathBuf, ComponentError> {
        if !fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(ComponentError::MissingDirectory {
                path: path.to_path_buf(),
            });
        }

        let config_dir = path.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)
            .await
            .map_err(|e| ComponentError::write_failed(config_dir.clone(), e))?;

        let marker = Marker {
            component: kind,
            version: env!("CARGO_PKG_VERSION"),
            created_ts: Utc::now().to_rfc3339(),
        };
        let contents =
            serde_json::to_string_pretty(&marker).map_err(|e| ComponentError::SerializeFailed {
                file: MARKER_FILE.to_string(),
                reason: e.to_string(),
            })?;
        write_file(&path.join(MARKER_FILE), contents).await?;

        Ok(config_dir)
    }
}

async fn write_file(path: &Path, contents: String) -> Result<(), ComponentError> {
    fs::write(path, contents)
        .await
        .map_err(|e| ComponentError::write_failed(path.to_path_buf(), e))
}

async fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ComponentError> {
    let contents = toml::to_string_pretty(value).map_err(|e| ComponentError::SerializeFailed {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    write_file(path, contents).await
}

/// Writes a file readable by its owner only.
async fn write_private_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ComponentError> {
    write_toml(path, value).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| ComponentError::write_failed(path.to_path_buf(), e))?;
    }

    Ok(())
}

#[async_trait]
impl ComponentFactory for FsComponentFactory {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn create_server(
        &self,
        odb: &dyn Odb,
        request: CreateServerRequest,
    ) -> Result<i64, ComponentError> {
        let config_dir = Self::prepare(&request.path, ComponentKind::Server).await?;
        let token = uuid::Uuid::new_v4().simple().to_string();

        let file = ServerFile {
            main: ServerMain {
                cluster_name: &request.cluster_name,
                server_name: &request.server_name,
                host: "0.0.0.0",
                port: request.port,
                token: &token,
                use_tls: request.crypto.is_some(),
            },
            odb: SanitizedOdbConfig::from(&request.odb),
            kvdb: SanitizedKvdbConfig::from(&request.kvdb),
            crypto: tls_section(&request.crypto),
        };
        write_toml(&config_dir.join("server.toml"), &file).await?;

        let secrets = SecretsFile {
            secret_key: Some(request.secret_key.as_str()),
            jwt_secret: Some(request.jwt_secret.as_str()),
            ..SecretsFile::with_db_passwords(&request.odb, Some(&request.kvdb))
        };
        write_private_toml(&config_dir.join(SECRETS_FILE), &secrets).await?;

        let server_id = odb.register_server(&RegisterServerRequest {
            cluster_name: request.cluster_name.clone(),
            server_name: request.server_name.clone(),
            bind_port: request.port,
            token,
        })?;

        info!(
            server = %request.server_name,
            server_id,
            port = request.port,
            "Server created"
        );
        Ok(server_id)
    }

    async fn create_load_balancer(
        &self,
        request: CreateLoadBalancerRequest,
    ) -> Result<(), ComponentError> {
        let config_dir = Self::prepare(&request.path, ComponentKind::LoadBalancer).await?;

        let file = LoadBalancerFile {
            cluster_name: &request.cluster_name,
            frontend: Endpoint {
                host: &request.lb_host,
                port: request.lb_port,
            },
            agent: Endpoint {
                host: &request.lb_host,
                port: request.lb_agent_port,
            },
            backend: Backend {
                servers: vec![format!("127.0.0.1:{}", request.servers_port)],
            },
            crypto: tls_section(&request.crypto),
        };
        write_toml(&config_dir.join("lb.toml"), &file).await?;

        info!(
            servers_port = request.servers_port,
            "Load-balancer created"
        );
        Ok(())
    }

    async fn create_dashboard(
        &self,
        odb: &dyn Odb,
        request: CreateDashboardRequest,
    ) -> Result<DashboardCreated, ComponentError> {
        let config_dir = Self::prepare(&request.path, ComponentKind::WebAdmin).await?;

        let file = DashboardFile {
            main: DashboardMain {
                cluster_name: &request.cluster_name,
                host: "0.0.0.0",
                port: DASHBOARD_PORT,
            },
            odb: SanitizedOdbConfig::from(&request.odb),
            admin_invoke: AdminInvoke {
                username: ADMIN_INVOKE_USER,
            },
            crypto: tls_section(&request.crypto),
        };
        write_toml(&config_dir.join("web-admin.toml"), &file).await?;

        let secrets = SecretsFile {
            admin_invoke_password: Some(request.admin_invoke_password.as_str()),
            ..SecretsFile::with_db_passwords(&request.odb, None)
        };
        write_private_toml(&config_dir.join(SECRETS_FILE), &secrets).await?;

        let admin_created = odb.ensure_dashboard_user(
            DASHBOARD_ADMIN_USER,
            &hash_password(&request.admin_password),
        )?;

        debug!(admin_created, "Dashboard created");
        Ok(DashboardCreated { admin_created })
    }

    async fn create_scheduler(
        &self,
        request: CreateSchedulerRequest,
    ) -> Result<(), ComponentError> {
        let config_dir = Self::prepare(&request.path, ComponentKind::Scheduler).await?;

        let file = SchedulerFile {
            main: SchedulerMain {
                cluster_id: request.cluster_id,
                cluster_name: &request.cluster_name,
                server_path: &request.server_path,
                host: "127.0.0.1",
                port: SCHEDULER_PORT,
            },
            odb: SanitizedOdbConfig::from(&request.odb),
            kvdb: SanitizedKvdbConfig::from(&request.kvdb),
            crypto: tls_section(&request.crypto),
        };
        write_toml(&config_dir.join("scheduler.toml"), &file).await?;

        let secrets = SecretsFile {
            secret_key: Some(request.secret_key.as_str()),
            ..SecretsFile::with_db_passwords(&request.odb, Some(&request.kvdb))
        };
        write_private_toml(&config_dir.join(SECRETS_FILE), &secrets).await?;

        info!(cluster_id = request.cluster_id, "Scheduler created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{LB_AGENT_PORT, LB_HOST, LB_PORT};
    use crate::odb::{CreateClusterRequest, SqliteOdb};
    use crate::config::OdbType;
    use tempfile::TempDir;

    fn odb() -> SqliteOdb {
        let odb = SqliteOdb::in_memory().unwrap();
        odb.create_schema().unwrap();
        odb.create_cluster(&CreateClusterRequest {
            name: "qs-1".to_string(),
            odb_type: OdbType::Sqlite,
            lb_host: LB_HOST.to_string(),
            lb_port: LB_PORT,
            lb_agent_port: LB_AGENT_PORT,
            admin_invoke_password: "admin.invoke.x".to_string(),
        })
        .unwrap();
        odb
    }

    fn server_request(path: PathBuf) -> CreateServerRequest {
        CreateServerRequest {
            path,
            cluster_name: "qs-1".to_string(),
            server_name: "server1".to_string(),
            port: 17010,
            odb: OdbConfig::default(),
            kvdb: KvdbConfig::default(),
            secret_key: "secret-key-value".to_string(),
            jwt_secret: "jwt-secret-value".to_string(),
            crypto: None,
        }
    }

    #[tokio::test]
    async fn test_create_server_writes_config_and_registers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server1");
        std::fs::create_dir(&path).unwrap();
        let odb = odb();

        let factory = FsComponentFactory::new();
        let server_id = factory
            .create_server(&odb, server_request(path.clone()))
            .await
            .unwrap();

        assert_eq!(odb.server_id("qs-1", "server1").unwrap(), Some(server_id));

        let config = std::fs::read_to_string(path.join("config/server.toml")).unwrap();
        let parsed: toml::Value = toml::from_str(&config).unwrap();
        assert_eq!(parsed["main"]["port"].as_integer(), Some(17010));
        assert_eq!(parsed["main"]["use_tls"].as_bool(), Some(false));
        assert!(!config.contains("secret-key-value"));

        let secrets = std::fs::read_to_string(path.join("config/secrets.toml")).unwrap();
        assert!(secrets.contains("secret-key-value"));
        assert!(secrets.contains("jwt-secret-value"));

        let marker: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path.join(".zato")).unwrap()).unwrap();
        assert_eq!(marker["component"], "SERVER");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_secrets_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server1");
        std::fs::create_dir(&path).unwrap();

        FsComponentFactory::new()
            .create_server(&odb(), server_request(path.clone()))
            .await
            .unwrap();

        let mode = std::fs::metadata(path.join("config/secrets.toml"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    fn files_under(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(files_under(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_credentials_only_in_private_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let odb = odb();
        let factory = FsComponentFactory::new();

        let db = OdbConfig {
            password: Some("odb-pw-1".to_string()),
            ..Default::default()
        };
        let kvdb = KvdbConfig {
            password: Some("kvdb-pw-1".to_string()),
            ..Default::default()
        };

        for name in ["server1", "web-admin", "scheduler"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }

        let mut request = server_request(dir.path().join("server1"));
        request.odb = db.clone();
        request.kvdb = kvdb.clone();
        factory.create_server(&odb, request).await.unwrap();

        factory
            .create_dashboard(
                &odb,
                CreateDashboardRequest {
                    path: dir.path().join("web-admin"),
                    cluster_name: "qs-1".to_string(),
                    odb: db.clone(),
                    admin_invoke_password: "invoke-pw-1".to_string(),
                    admin_password: "pw".to_string(),
                    crypto: None,
                },
            )
            .await
            .unwrap();

        factory
            .create_scheduler(CreateSchedulerRequest {
                path: dir.path().join("scheduler"),
                cluster_name: "qs-1".to_string(),
                cluster_id: 1,
                server_path: dir.path().join("server1"),
                odb: db,
                kvdb,
                secret_key: "secret-key-value".to_string(),
                crypto: None,
            })
            .await
            .unwrap();

        let secrets = ["odb-pw-1", "kvdb-pw-1", "invoke-pw-1", "secret-key-value"];
        let mut found = Vec::new();
        for path in files_under(dir.path()) {
            let contents = std::fs::read_to_string(&path).unwrap();
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            for secret in secrets {
                if contents.contains(secret) {
                    assert_eq!(mode, 0o600, "{} leaks {}", path.display(), secret);
                    found.push(secret);
                }
            }
        }
        for secret in secrets {
            assert!(found.contains(&secret), "{} was not stored", secret);
        }

        let dashboard = std::fs::read_to_string(dir.path().join("web-admin/config/web-admin.toml"))
            .unwrap();
        let parsed: toml::Value = toml::from_str(&dashboard).unwrap();
        assert_eq!(parsed["odb"]["password_configured"].as_bool(), Some(true));
        assert_eq!(
            parsed["admin_invoke"]["username"].as_str(),
            Some(ADMIN_INVOKE_USER)
        );
    }

    #[tokio::test]
    async fn test_create_server_requires_directory() {
        let dir = TempDir::new().unwrap();
        let result = FsComponentFactory::new()
            .create_server(&odb(), server_request(dir.path().join("missing")))
            .await;
        assert!(matches!(
            result,
            Err(ComponentError::MissingDirectory { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_load_balancer_backend_port() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("load-balancer");
        std::fs::create_dir(&path).unwrap();

        FsComponentFactory::new()
            .create_load_balancer(CreateLoadBalancerRequest {
                path: path.clone(),
                cluster_name: "qs-1".to_string(),
                lb_host: LB_HOST.to_string(),
                lb_port: LB_PORT,
                lb_agent_port: LB_AGENT_PORT,
                servers_port: 17011,
                crypto: None,
            })
            .await
            .unwrap();

        let config = std::fs::read_to_string(path.join("config/lb.toml")).unwrap();
        let parsed: toml::Value = toml::from_str(&config).unwrap();
        assert_eq!(parsed["frontend"]["port"].as_integer(), Some(11223));
        assert_eq!(parsed["agent"]["port"].as_integer(), Some(20151));
        assert_eq!(
            parsed["backend"]["servers"][0].as_str(),
            Some("127.0.0.1:17011")
        );
        assert!(parsed.get("crypto").is_none());
    }

    #[tokio::test]
    async fn test_create_dashboard_admin_created_once() {
        let dir = TempDir::new().unwrap();
        let odb = odb();
        let factory = FsComponentFactory::new();

        let mut created = Vec::new();
        for name in ["web-admin", "web-admin-2"] {
            let path = dir.path().join(name);
            std::fs::create_dir(&path).unwrap();
            let outcome = factory
                .create_dashboard(
                    &odb,
                    CreateDashboardRequest {
                        path,
                        cluster_name: "qs-1".to_string(),
                        odb: OdbConfig::default(),
                        admin_invoke_password: "admin.invoke.x".to_string(),
                        admin_password: "pw".to_string(),
                        crypto: None,
                    },
                )
                .await
                .unwrap();
            created.push(outcome.admin_created);
        }

        assert_eq!(created, vec![true, false]);
        let hash = odb.dashboard_user_hash("admin").unwrap().unwrap();
        assert!(crate::crypto::verify_password("pw", &hash));
    }

    #[tokio::test]
    async fn test_create_scheduler_with_tls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scheduler");
        std::fs::create_dir(&path).unwrap();

        let crypto = CryptoMaterialBundle {
            cert_path: Some(PathBuf::from("/ca/out-cert/1-scheduler1-cert.pem")),
            priv_path: Some(PathBuf::from("/ca/out-priv/1-scheduler1-priv.pem")),
            pub_path: None,
            ca_certs_path: PathBuf::from("/ca/ca-material/ca-cert.pem"),
        };

        FsComponentFactory::new()
            .create_scheduler(CreateSchedulerRequest {
                path: path.clone(),
                cluster_name: "qs-1".to_string(),
                cluster_id: 1,
                server_path: dir.path().join("server1"),
                odb: OdbConfig::default(),
                kvdb: KvdbConfig::default(),
                secret_key: "k".to_string(),
                crypto: Some(crypto),
            })
            .await
            .unwrap();

        let config = std::fs::read_to_string(path.join("config/scheduler.toml")).unwrap();
        let parsed: toml::Value = toml::from_str(&config).unwrap();
        assert_eq!(parsed["main"]["cluster_id"].as_integer(), Some(1));
        assert_eq!(
            parsed["crypto"]["cert_path"].as_str(),
            Some("/ca/out-cert/1-scheduler1-cert.pem")
        );
        assert!(parsed["crypto"].get("pub_key_path").is_none());
    }
}

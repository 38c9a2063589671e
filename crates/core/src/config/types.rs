use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuickstartConfig {
    #[serde(default)]
    pub odb: OdbConfig,
    #[serde(default)]
    pub kvdb: KvdbConfig,
    #[serde(default)]
    pub cluster: ClusterDefaults,
    #[serde(default)]
    pub tls: TlsConfig,
}

/// Operational database (ODB) connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OdbConfig {
    #[serde(default)]
    pub odb_type: OdbType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Database file for file-backed ODBs. Quickstart defaults it to `<target>/zato.db`.
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
    #[serde(default)]
    pub postgresql_schema: Option<String>,
}

impl Default for OdbConfig {
    fn default() -> Self {
        Self {
            odb_type: OdbType::Sqlite,
            host: None,
            port: None,
            user: None,
            db_name: None,
            password: None,
            sqlite_path: None,
            postgresql_schema: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OdbType {
    #[default]
    Sqlite,
    Postgresql,
    Mysql,
}

impl OdbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OdbType::Sqlite => "sqlite",
            OdbType::Postgresql => "postgresql",
            OdbType::Mysql => "mysql",
        }
    }

    /// Whether the ODB lives in a local file rather than behind a server.
    pub fn is_file_backed(&self) -> bool {
        matches!(self, OdbType::Sqlite)
    }
}

impl fmt::Display for OdbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OdbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(OdbType::Sqlite),
            "postgresql" | "postgres" => Ok(OdbType::Postgresql),
            "mysql" => Ok(OdbType::Mysql),
            other => Err(format!("unknown ODB type: {}", other)),
        }
    }
}

/// Key/value database (Redis) connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KvdbConfig {
    #[serde(default = "default_kvdb_host")]
    pub host: String,
    #[serde(default = "default_kvdb_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for KvdbConfig {
    fn default() -> Self {
        Self {
            host: default_kvdb_host(),
            port: default_kvdb_port(),
            password: None,
        }
    }
}

fn default_kvdb_host() -> String {
    "127.0.0.1".to_string()
}

fn default_kvdb_port() -> u16 {
    6379
}

/// Cluster defaults, overridable from the command line
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterDefaults {
    /// Name of the new cluster (random when not set)
    #[serde(default)]
    pub name: Option<String>,
    /// How many servers to create
    #[serde(default = "default_servers")]
    pub servers: usize,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            name: None,
            servers: default_servers(),
        }
    }
}

fn default_servers() -> usize {
    1
}

/// Settings for the openssl-backed certificate authority
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to the openssl binary (default: "openssl")
    #[serde(default = "default_openssl_path")]
    pub openssl_path: PathBuf,
    /// RSA key size in bits (default: 2048)
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,
    /// Certificate validity in days (default: 3650)
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            openssl_path: default_openssl_path(),
            key_bits: default_key_bits(),
            validity_days: default_validity_days(),
        }
    }
}

fn default_openssl_path() -> PathBuf {
    PathBuf::from("openssl")
}

fn default_key_bits() -> u32 {
    2048
}

fn default_validity_days() -> u32 {
    3650
}

/// Sanitized ODB config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOdbConfig {
    pub odb_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    pub password_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgresql_schema: Option<String>,
}

impl From<&OdbConfig> for SanitizedOdbConfig {
    fn from(config: &OdbConfig) -> Self {
        Self {
            odb_type: config.odb_type.to_string(),
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            db_name: config.db_name.clone(),
            password_configured: config.password.as_deref().is_some_and(|p| !p.is_empty()),
            sqlite_path: config.sqlite_path.clone(),
            postgresql_schema: config.postgresql_schema.clone(),
        }
    }
}

/// Sanitized KVDB config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedKvdbConfig {
    pub host: String,
    pub port: u16,
    pub password_configured: bool,
}

impl From<&KvdbConfig> for SanitizedKvdbConfig {
    fn from(config: &KvdbConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            password_configured: config.password.as_deref().is_some_and(|p| !p.is_empty()),
        }
    }
}

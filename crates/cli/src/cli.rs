//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use quickstart_core::{OdbType, Platform, QuickstartConfig};

/// Quickly creates a working Zato cluster
#[derive(Parser, Debug)]
#[command(name = "zato-qs")]
#[command(version)]
pub struct Cli {
    /// Configuration file with ODB, KVDB and TLS defaults
    #[arg(long, global = true, env = "ZATO_QS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a quickstart cluster in an empty directory
    Create(CreateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Directory to create the cluster in
    pub path: PathBuf,

    /// ODB type [sqlite, postgresql, mysql]
    #[arg(long)]
    pub odb_type: Option<OdbType>,

    #[arg(long)]
    pub odb_host: Option<String>,

    #[arg(long)]
    pub odb_port: Option<u16>,

    #[arg(long)]
    pub odb_user: Option<String>,

    #[arg(long)]
    pub odb_db_name: Option<String>,

    #[arg(long, env = "ZATO_QS_ODB_PASSWORD", hide_env_values = true)]
    pub odb_password: Option<String>,

    /// SQLite database file, `<PATH>/zato.db` by default
    #[arg(long)]
    pub sqlite_path: Option<PathBuf>,

    #[arg(long)]
    pub postgresql_schema: Option<String>,

    #[arg(long)]
    pub kvdb_host: Option<String>,

    #[arg(long)]
    pub kvdb_port: Option<u16>,

    #[arg(long, env = "ZATO_QS_KVDB_PASSWORD", hide_env_values = true)]
    pub kvdb_password: Option<String>,

    /// Name to be given to the new cluster
    #[arg(long)]
    pub cluster_name: Option<String>,

    /// How many servers to create
    #[arg(long)]
    pub servers: Option<usize>,

    /// Main secret key the server(s) will use
    #[arg(long, env = "ZATO_QS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Secret key for JWT (JSON Web Tokens)
    #[arg(long, env = "ZATO_QS_JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret_key: Option<String>,

    /// Store a sanitized copy of the quickstart configuration
    #[arg(long)]
    pub store_config: bool,

    /// Target platform [posix, windows], defaults to the current one
    #[arg(long)]
    pub platform: Option<Platform>,
}

impl CreateArgs {
    /// Applies command-line values on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut QuickstartConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut config.odb.odb_type, &self.odb_type);
        set_opt(&mut config.odb.host, &self.odb_host);
        set_opt(&mut config.odb.port, &self.odb_port);
        set_opt(&mut config.odb.user, &self.odb_user);
        set_opt(&mut config.odb.db_name, &self.odb_db_name);
        set_opt(&mut config.odb.password, &self.odb_password);
        set_opt(&mut config.odb.sqlite_path, &self.sqlite_path);
        set_opt(&mut config.odb.postgresql_schema, &self.postgresql_schema);

        set(&mut config.kvdb.host, &self.kvdb_host);
        set(&mut config.kvdb.port, &self.kvdb_port);
        set_opt(&mut config.kvdb.password, &self.kvdb_password);

        set_opt(&mut config.cluster.name, &self.cluster_name);
        set(&mut config.cluster.servers, &self.servers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zato-qs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_create_defaults() {
        let cli = parse(&["create", "/tmp/qs1"]);
        assert!(!cli.verbose);
        let Command::Create(args) = cli.command;
        assert_eq!(args.path, PathBuf::from("/tmp/qs1"));
        assert!(args.servers.is_none());
        assert!(!args.store_config);
    }

    #[test]
    fn test_parse_create_options() {
        let cli = parse(&[
            "--verbose",
            "create",
            "/tmp/qs1",
            "--odb-type",
            "postgresql",
            "--odb-host",
            "db.local",
            "--servers",
            "3",
            "--platform",
            "windows",
            "--store-config",
        ]);
        assert!(cli.verbose);
        let Command::Create(args) = cli.command;
        assert_eq!(args.odb_type, Some(OdbType::Postgresql));
        assert_eq!(args.servers, Some(3));
        assert_eq!(args.platform, Some(Platform::Windows));
        assert!(args.store_config);
    }

    #[test]
    fn test_parse_rejects_unknown_odb_type() {
        let result = Cli::try_parse_from(["zato-qs", "create", "/tmp/qs1", "--odb-type", "oracle"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_to_overrides_only_given_values() {
        let mut config = QuickstartConfig::default();
        config.kvdb.port = 6390;

        let cli = parse(&[
            "create",
            "/tmp/qs1",
            "--kvdb-host",
            "cache.local",
            "--cluster-name",
            "qs-7",
            "--servers",
            "2",
        ]);
        let Command::Create(args) = cli.command;
        args.apply_to(&mut config);

        assert_eq!(config.kvdb.host, "cache.local");
        assert_eq!(config.kvdb.port, 6390);
        assert_eq!(config.cluster.name.as_deref(), Some("qs-7"));
        assert_eq!(config.cluster.servers, 2);
        assert_eq!(config.odb.odb_type, OdbType::Sqlite);
    }
}

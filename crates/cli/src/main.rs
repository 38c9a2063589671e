mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickstart_core::{
    load_config, validate_config, CertificateAuthority, FsComponentFactory, OdbConnector,
    OdbError, OpensslCa, Platform, ProvisioningRequest, QuickstartOrchestrator, SqliteConnector,
};

use cli::{Cli, Command, CreateArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Create(args) => create(cli.config.as_deref(), args).await,
    }
}

async fn create(config_path: Option<&std::path::Path>, args: CreateArgs) -> Result<()> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
    }
    let mut config = load_config(config_path).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    let connector = SqliteConnector;
    if !connector.supports(config.odb.odb_type) {
        return Err(OdbError::Unsupported(config.odb.odb_type).into());
    }

    let platform = args.platform.unwrap_or_else(Platform::current);

    let ca = OpensslCa::new(config.tls.clone());
    if platform.has_tls() {
        ca.validate()
            .await
            .context("openssl is required to create TLS material")?;
    }
    let ca: Arc<dyn CertificateAuthority> = Arc::new(ca);

    let orchestrator = QuickstartOrchestrator::new(
        ca,
        Arc::new(FsComponentFactory::new()),
        Arc::new(connector),
    );

    let request = ProvisioningRequest {
        target_dir: args.path.clone(),
        cluster_name: config.cluster.name.clone(),
        servers: config.cluster.servers,
        odb: config.odb.clone(),
        kvdb: config.kvdb.clone(),
        secret_key: args.secret_key.clone(),
        jwt_secret_key: args.jwt_secret_key.clone(),
        store_config: args.store_config,
        platform,
    };

    let report = orchestrator
        .run(request)
        .await
        .with_context(|| format!("Failed to create quickstart cluster in {:?}", args.path))?;

    debug!(
        cluster_id = report.cluster_id,
        servers = report.servers.len(),
        "Quickstart finished"
    );
    info!("Visit https://zato.io/support for more information and support options");
    Ok(())
}

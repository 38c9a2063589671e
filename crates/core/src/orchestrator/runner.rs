//! Quickstart orchestrator implementation.
//!
//! Runs the provisioning stages strictly in order:
//! 1. CA and per-component TLS material (POSIX-like targets only)
//! 2. ODB schema
//! 3. Cluster record with initial data
//! 4. Servers
//! 5. Load balancer
//! 6. Dashboard
//! 7. Scheduler
//! 8. Management scripts
//!
//! There is no rollback: a failing stage leaves earlier artifacts on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tokio::fs;
use tracing::{debug, info, info_span, Instrument};

use crate::component::{
    ComponentFactory, CreateDashboardRequest, CreateLoadBalancerRequest, CreateSchedulerRequest,
    CreateServerRequest,
};
use crate::config::{is_valid_cluster_name, OdbType};
use crate::crypto::{
    admin_invoke_password, generate_password, generate_secret_key, CertificateAuthority,
    CryptoMaterialBundle,
};
use crate::defaults::{
    server_name, CA_DIR, CONFIG_SNAPSHOT_FILE, DASHBOARD_ADMIN_USER, DASHBOARD_CRYPTO_NAME,
    DASHBOARD_DIR, HTTP_PLAIN_SERVER_PORT, LB_AGENT_CRYPTO_NAME, LB_AGENT_PORT, LB_HOST,
    LB_PORT, LOAD_BALANCER_DIR, SAMPLE_PUBSUB_TOPIC, SCHEDULER_DIR, SCHEDULER_NAME, SQLITE_FILE,
};
use crate::odb::{
    ClusterOutcome, CreateClusterRequest, Odb, OdbConnector, OdbError, SchemaOutcome,
};
use crate::scripts::{self, ScriptOptions};

use super::counters::{PortAllocator, ProgressCounter};
use super::types::{
    ClusterCrypto, OrchestratorError, ProvisioningReport, ProvisioningRequest, RequestSnapshot,
    ServerSlot,
};

/// Provisions a complete quickstart cluster through its collaborators.
pub struct QuickstartOrchestrator {
    ca: Arc<dyn CertificateAuthority>,
    components: Arc<dyn ComponentFactory>,
    connector: Arc<dyn OdbConnector>,
}

impl QuickstartOrchestrator {
    pub fn new(
        ca: Arc<dyn CertificateAuthority>,
        components: Arc<dyn ComponentFactory>,
        connector: Arc<dyn OdbConnector>,
    ) -> Self {
        Self {
            ca,
            components,
            connector,
        }
    }

    /// Runs every stage for `request` and reports what was created.
    pub async fn run(
        &self,
        request: ProvisioningRequest,
    ) -> Result<ProvisioningReport, OrchestratorError> {
        if request.servers == 0 {
            return Err(OrchestratorError::InvalidRequest(
                "at least one server is required".to_string(),
            ));
        }
        if let Some(name) = request.cluster_name.as_deref() {
            if !is_valid_cluster_name(name) {
                return Err(OrchestratorError::InvalidRequest(format!(
                    "cluster name {:?} may only contain letters, digits, '.', '_' and '-'",
                    name
                )));
            }
        }
        // Before anything touches the target directory.
        if !self.connector.supports(request.odb.odb_type) {
            return Err(OdbError::Unsupported(request.odb.odb_type).into());
        }

        let target = std::path::absolute(&request.target_dir)
            .map_err(|e| OrchestratorError::io(&request.target_dir, e))?;
        ensure_empty_dir(&target).await?;

        let mut request = request;
        request.target_dir = target.clone();
        if request.odb.odb_type == OdbType::Sqlite && request.odb.sqlite_path.is_none() {
            request.odb.sqlite_path = Some(target.join(SQLITE_FILE));
        }

        let platform = request.platform;
        let cluster_name = request
            .cluster_name
            .clone()
            .unwrap_or_else(random_cluster_name);
        let secret_key = request
            .secret_key
            .clone()
            .unwrap_or_else(generate_secret_key);
        let jwt_secret = request
            .jwt_secret_key
            .clone()
            .unwrap_or_else(generate_secret_key);
        let server_names: Vec<String> = (1..=request.servers).map(server_name).collect();
        let admin_invoke_password = admin_invoke_password();

        let mut progress = ProgressCounter::new(platform.total_steps(request.servers));
        let mut ports = PortAllocator::new(HTTP_PLAIN_SERVER_PORT);

        info!(
            cluster = %cluster_name,
            servers = request.servers,
            platform = %platform,
            path = %target.display(),
            "Creating quickstart cluster"
        );

        // 1) CA
        let crypto = if platform.has_tls() {
            let crypto = self
                .create_crypto(&target, &cluster_name, &server_names)
                .instrument(info_span!("provision", stage = "ca"))
                .await?;
            Some(crypto)
        } else {
            None
        };
        progress.advance("Certificate authority created");

        // 2) ODB schema
        let odb = self.connector.connect(&request.odb)?;
        let schema = {
            let _span = info_span!("provision", stage = "odb").entered();
            odb.create_schema()?
        };
        progress.advance(match schema {
            SchemaOutcome::Created => "ODB schema created",
            SchemaOutcome::AlreadyExists => "ODB schema already exists",
        });

        // 3) Cluster and initial data
        let cluster = {
            let _span = info_span!("provision", stage = "cluster").entered();
            odb.create_cluster(&CreateClusterRequest {
                name: cluster_name.clone(),
                odb_type: request.odb.odb_type,
                lb_host: LB_HOST.to_string(),
                lb_port: LB_PORT,
                lb_agent_port: LB_AGENT_PORT,
                admin_invoke_password: admin_invoke_password.clone(),
            })?
        };
        progress.advance(match cluster {
            ClusterOutcome::Created { .. } => "Cluster created with ODB initial data",
            ClusterOutcome::AlreadyExists { .. } => "Cluster already exists",
        });

        // 4) Servers
        let mut servers = Vec::with_capacity(server_names.len());
        for (idx, name) in server_names.iter().enumerate() {
            let path = target.join(name);
            create_dir(&path).await?;

            let port = ports.next_port()?;
            let server_crypto = crypto.as_ref().and_then(|c| c.servers.get(idx).cloned());

            let server_id = self
                .components
                .create_server(
                    odb.as_ref(),
                    CreateServerRequest {
                        path: path.clone(),
                        cluster_name: cluster_name.clone(),
                        server_name: name.clone(),
                        port,
                        odb: request.odb.clone(),
                        kvdb: request.kvdb.clone(),
                        secret_key: secret_key.clone(),
                        jwt_secret: jwt_secret.clone(),
                        crypto: server_crypto.clone(),
                    },
                )
                .instrument(info_span!("provision", stage = "server", server = %name))
                .await?;

            // The first server delivers sample pub/sub messages.
            if idx == 0 {
                self.wire_pubsub_server(odb.as_ref(), &cluster_name, server_id)?;
            }

            servers.push(ServerSlot {
                index: idx + 1,
                name: name.clone(),
                path,
                port,
                crypto: server_crypto,
                server_id,
            });
            progress.advance(format!("{} created", name));
        }

        // 5) Load balancer
        let lb_servers_port = ports.last_allocated().ok_or_else(|| {
            OrchestratorError::InvalidRequest("no server ports were allocated".to_string())
        })?;
        let lb_path = target.join(LOAD_BALANCER_DIR);
        create_dir(&lb_path).await?;
        self.components
            .create_load_balancer(CreateLoadBalancerRequest {
                path: lb_path,
                cluster_name: cluster_name.clone(),
                lb_host: LB_HOST.to_string(),
                lb_port: LB_PORT,
                lb_agent_port: LB_AGENT_PORT,
                servers_port: lb_servers_port,
                crypto: crypto.as_ref().map(|c| c.lb_agent.clone()),
            })
            .instrument(info_span!("provision", stage = "load-balancer"))
            .await?;

        // Created on Windows-like targets too, but never started there.
        if !platform.is_windows() {
            progress.advance("Load-balancer created");
        }

        // 6) Dashboard
        let dashboard_path = target.join(DASHBOARD_DIR);
        create_dir(&dashboard_path).await?;
        let admin_password = generate_password();
        let dashboard = self
            .components
            .create_dashboard(
                odb.as_ref(),
                CreateDashboardRequest {
                    path: dashboard_path,
                    cluster_name: cluster_name.clone(),
                    odb: request.odb.clone(),
                    admin_invoke_password,
                    admin_password: admin_password.clone(),
                    crypto: crypto.as_ref().map(|c| c.dashboard.clone()),
                },
            )
            .instrument(info_span!("provision", stage = "dashboard"))
            .await?;
        progress.advance("Dashboard created");

        // 7) Scheduler
        let scheduler_path = target.join(SCHEDULER_DIR);
        create_dir(&scheduler_path).await?;
        let cluster_id = odb.cluster_id(&cluster_name)?;
        let first_server_path = servers
            .first()
            .map(|s| s.path.clone())
            .unwrap_or_default();
        self.components
            .create_scheduler(CreateSchedulerRequest {
                path: scheduler_path,
                cluster_name: cluster_name.clone(),
                cluster_id,
                server_path: first_server_path,
                odb: request.odb.clone(),
                kvdb: request.kvdb.clone(),
                secret_key: secret_key.clone(),
                crypto: crypto.as_ref().map(|c| c.scheduler.clone()),
            })
            .instrument(info_span!("provision", stage = "scheduler"))
            .await?;
        progress.advance("Scheduler created");

        // 8) Scripts
        let script_set = scripts::render(&ScriptOptions::new(
            platform,
            cluster_name.clone(),
            server_names,
        ));
        let written = scripts::write_scripts(&target, &script_set)
            .instrument(info_span!("provision", stage = "scripts"))
            .await?;
        if !platform.is_windows() {
            progress.advance("Management scripts created");
        }

        let config_snapshot = if request.store_config {
            Some(store_config(&target, &RequestSnapshot::new(&request, &cluster_name)).await?)
        } else {
            None
        };

        info!("Quickstart cluster {} created", cluster_name);
        if dashboard.admin_created {
            info!(
                "Dashboard user:[{}], password:[{}]",
                DASHBOARD_ADMIN_USER, admin_password
            );
        } else {
            info!("User [{}] already exists in the ODB", DASHBOARD_ADMIN_USER);
        }
        info!(
            "Start the cluster by issuing this command: {}",
            written.start_script.display()
        );

        let total_steps = progress.total();
        Ok(ProvisioningReport {
            cluster_name,
            cluster_id,
            target_dir: target,
            schema,
            cluster,
            servers,
            lb_servers_port,
            admin_password: dashboard.admin_created.then_some(admin_password),
            scripts: written,
            config_snapshot,
            progress: progress.into_lines(),
            total_steps,
        })
    }

    /// Creates the CA and the material of every component, then locates it.
    async fn create_crypto(
        &self,
        target: &Path,
        cluster_name: &str,
        server_names: &[String],
    ) -> Result<ClusterCrypto, OrchestratorError> {
        let ca_dir = target.join(CA_DIR);
        create_dir(&ca_dir).await?;

        debug!(ca = self.ca.name(), "Creating certificate authority");
        self.ca.create_ca(&ca_dir, cluster_name).await?;
        for component in [LB_AGENT_CRYPTO_NAME, DASHBOARD_CRYPTO_NAME, SCHEDULER_NAME] {
            self.ca.create_component(&ca_dir, component).await?;
        }

        let mut servers = Vec::with_capacity(server_names.len());
        for name in server_names {
            let pattern = format!("{}-{}", cluster_name, name);
            self.ca.create_component(&ca_dir, &pattern).await?;
            servers.push(CryptoMaterialBundle::locate(&ca_dir, &pattern)?);
        }

        Ok(ClusterCrypto {
            lb_agent: CryptoMaterialBundle::locate(&ca_dir, LB_AGENT_CRYPTO_NAME)?,
            dashboard: CryptoMaterialBundle::locate(&ca_dir, DASHBOARD_CRYPTO_NAME)?,
            scheduler: CryptoMaterialBundle::locate(&ca_dir, SCHEDULER_NAME)?,
            servers,
            ca_dir,
        })
    }

    fn wire_pubsub_server(
        &self,
        odb: &dyn Odb,
        cluster_name: &str,
        server_id: i64,
    ) -> Result<(), OrchestratorError> {
        let updated = odb.set_pubsub_server(cluster_name, SAMPLE_PUBSUB_TOPIC, server_id)?;
        debug!(
            topic = SAMPLE_PUBSUB_TOPIC,
            server_id, updated, "Pub/sub delivery server set"
        );
        Ok(())
    }
}

/// Random cluster name, `quickstart-<0..2^20>`.
fn random_cluster_name() -> String {
    format!("quickstart-{}", rand::thread_rng().gen_range(0..1u32 << 20))
}

/// Creates `path` if it is missing and fails if it has any entries.
async fn ensure_empty_dir(path: &Path) -> Result<(), OrchestratorError> {
    match fs::metadata(path).await {
        Ok(meta) if !meta.is_dir() => {
            return Err(OrchestratorError::InvalidRequest(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path)
                .await
                .map_err(|e| OrchestratorError::io(path, e))?;
            return Ok(());
        }
        Err(e) => return Err(OrchestratorError::io(path, e)),
    }

    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| OrchestratorError::io(path, e))?;
    if entries
        .next_entry()
        .await
        .map_err(|e| OrchestratorError::io(path, e))?
        .is_some()
    {
        return Err(OrchestratorError::TargetNotEmpty(path.to_path_buf()));
    }

    Ok(())
}

async fn create_dir(path: &Path) -> Result<(), OrchestratorError> {
    fs::create_dir(path)
        .await
        .map_err(|e| OrchestratorError::io(path, e))
}

async fn store_config(
    target: &Path,
    snapshot: &RequestSnapshot,
) -> Result<PathBuf, OrchestratorError> {
    let path = target.join(CONFIG_SNAPSHOT_FILE);
    let contents = toml::to_string_pretty(snapshot)
        .map_err(|e| OrchestratorError::Serialize(format!("{}: {}", CONFIG_SNAPSHOT_FILE, e)))?;
    fs::write(&path, contents)
        .await
        .map_err(|e| OrchestratorError::io(&path, e))?;
    debug!(path = %path.display(), "Config snapshot stored");
    Ok(path)
}

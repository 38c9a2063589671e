//! Fixed names, ports and paths shared by every quickstart cluster.

/// First port handed out to servers; each further server gets the next one.
pub const HTTP_PLAIN_SERVER_PORT: u16 = 17010;

pub const LB_HOST: &str = "127.0.0.1";
pub const LB_PORT: u16 = 11223;
pub const LB_AGENT_PORT: u16 = 20151;
pub const DASHBOARD_PORT: u16 = 8183;
pub const SCHEDULER_PORT: u16 = 31530;

/// Pub/sub topic whose subscriptions are delivered by the first server.
pub const SAMPLE_PUBSUB_TOPIC: &str = "/zato/demo/sample";

pub const SCHEDULER_NAME: &str = "scheduler1";
pub const DASHBOARD_ADMIN_USER: &str = "admin";
pub const ADMIN_INVOKE_USER: &str = "admin.invoke";

pub const CA_DIR: &str = "ca";
pub const LOAD_BALANCER_DIR: &str = "load-balancer";
pub const DASHBOARD_DIR: &str = "web-admin";
pub const SCHEDULER_DIR: &str = "scheduler";
pub const VSCODE_DIR: &str = ".vscode";
pub const SQLITE_FILE: &str = "zato.db";
pub const CONFIG_SNAPSHOT_FILE: &str = "zato.quickstart.config.toml";

/// Crypto component names as they appear in CA output file names.
pub const LB_AGENT_CRYPTO_NAME: &str = "lb-agent";
pub const DASHBOARD_CRYPTO_NAME: &str = "web-admin";

/// Name of the directory and crypto component for server `idx` (1-based).
pub fn server_name(idx: usize) -> String {
    format!("server{}", idx)
}

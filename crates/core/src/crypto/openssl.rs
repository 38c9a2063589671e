//! Certificate authority backed by the `openssl` command-line tool.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TlsConfig;

use super::error::CryptoError;
use super::locator::CryptoKind;
use super::traits::CertificateAuthority;
use super::{CA_CERT_FILE, CA_KEY_FILE, CA_MATERIAL_DIR, CSR_OUT_DIR};

/// Drives `openssl` to create a CA and sign per-component certificates.
pub struct OpensslCa {
    config: TlsConfig,
}

/// Output file locations for one component.
#[derive(Debug, Clone)]
struct ComponentFiles {
    priv_path: PathBuf,
    pub_path: PathBuf,
    csr_path: PathBuf,
    cert_path: PathBuf,
}

impl ComponentFiles {
    fn new(ca_dir: &Path, prefix: &str) -> Self {
        let file = |dir: &str, kind: &str| ca_dir.join(dir).join(format!("{}-{}.pem", prefix, kind));
        Self {
            priv_path: file(CryptoKind::Priv.out_dir(), CryptoKind::Priv.as_str()),
            pub_path: file(CryptoKind::Pub.out_dir(), CryptoKind::Pub.as_str()),
            csr_path: file(CSR_OUT_DIR, "csr"),
            cert_path: file(CryptoKind::Cert.out_dir(), CryptoKind::Cert.as_str()),
        }
    }
}

impl OpensslCa {
    pub fn new(config: TlsConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TlsConfig::default())
    }

    /// Checks that the openssl binary can be executed.
    pub async fn validate(&self) -> Result<(), CryptoError> {
        let mut command = Command::new(&self.config.openssl_path);
        command.arg("version");
        self.run("version", &mut command).await
    }

    fn build_ca_args(&self, ca_dir: &Path, cluster_name: &str) -> Vec<String> {
        let material = ca_dir.join(CA_MATERIAL_DIR);
        vec![
            "req".to_string(),
            "-x509".to_string(),
            "-newkey".to_string(),
            format!("rsa:{}", self.config.key_bits),
            "-nodes".to_string(),
            "-days".to_string(),
            self.config.validity_days.to_string(),
            "-subj".to_string(),
            format!("/O=Zato/CN={} CA", cluster_name),
            "-keyout".to_string(),
            path_arg(&material.join(CA_KEY_FILE)),
            "-out".to_string(),
            path_arg(&material.join(CA_CERT_FILE)),
        ]
    }

    fn build_genrsa_args(&self, files: &ComponentFiles) -> Vec<String> {
        vec![
            "genrsa".to_string(),
            "-out".to_string(),
            path_arg(&files.priv_path),
            self.config.key_bits.to_string(),
        ]
    }

    fn build_pubkey_args(&self, files: &ComponentFiles) -> Vec<String> {
        vec![
            "rsa".to_string(),
            "-in".to_string(),
            path_arg(&files.priv_path),
            "-pubout".to_string(),
            "-out".to_string(),
            path_arg(&files.pub_path),
        ]
    }

    fn build_csr_args(&self, files: &ComponentFiles, component: &str) -> Vec<String> {
        vec![
            "req".to_string(),
            "-new".to_string(),
            "-key".to_string(),
            path_arg(&files.priv_path),
            "-subj".to_string(),
            format!("/O=Zato/CN={}", component),
            "-out".to_string(),
            path_arg(&files.csr_path),
        ]
    }

    fn build_sign_args(&self, ca_dir: &Path, files: &ComponentFiles) -> Vec<String> {
        let material = ca_dir.join(CA_MATERIAL_DIR);
        vec![
            "x509".to_string(),
            "-req".to_string(),
            "-in".to_string(),
            path_arg(&files.csr_path),
            "-CA".to_string(),
            path_arg(&material.join(CA_CERT_FILE)),
            "-CAkey".to_string(),
            path_arg(&material.join(CA_KEY_FILE)),
            "-CAserial".to_string(),
            path_arg(&material.join("ca.srl")),
            "-CAcreateserial".to_string(),
            "-days".to_string(),
            self.config.validity_days.to_string(),
            "-out".to_string(),
            path_arg(&files.cert_path),
        ]
    }

    async fn openssl(&self, step: &str, args: Vec<String>) -> Result<(), CryptoError> {
        let mut command = Command::new(&self.config.openssl_path);
        command.args(&args);
        self.run(step, &mut command).await
    }

    async fn run(&self, step: &str, command: &mut Command) -> Result<(), CryptoError> {
        debug!(step, "Running openssl");

        let output = command.kill_on_drop(true).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CryptoError::OpensslNotFound {
                    path: self.config.openssl_path.clone(),
                }
            } else {
                CryptoError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(CryptoError::command_failed(
                step,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Unique, sortable prefix for a component's output files.
fn file_prefix(component: &str) -> String {
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%6f"), component)
}

#[async_trait]
impl CertificateAuthority for OpensslCa {
    fn name(&self) -> &str {
        "openssl"
    }

    async fn create_ca(&self, ca_dir: &Path, cluster_name: &str) -> Result<(), CryptoError> {
        for dir in [
            CA_MATERIAL_DIR,
            CSR_OUT_DIR,
            CryptoKind::Cert.out_dir(),
            CryptoKind::Priv.out_dir(),
            CryptoKind::Pub.out_dir(),
        ] {
            fs::create_dir_all(ca_dir.join(dir)).await?;
        }

        self.openssl("req -x509", self.build_ca_args(ca_dir, cluster_name))
            .await?;

        info!(ca_dir = %ca_dir.display(), "Certificate authority created");
        Ok(())
    }

    async fn create_component(&self, ca_dir: &Path, component: &str) -> Result<(), CryptoError> {
        let files = ComponentFiles::new(ca_dir, &file_prefix(component));

        self.openssl("genrsa", self.build_genrsa_args(&files)).await?;
        self.openssl("rsa -pubout", self.build_pubkey_args(&files))
            .await?;
        self.openssl("req -new", self.build_csr_args(&files, component))
            .await?;
        self.openssl("x509 -req", self.build_sign_args(ca_dir, &files))
            .await?;

        debug!(component, cert = %files.cert_path.display(), "Component certificate issued");
        Ok(())
    }
}

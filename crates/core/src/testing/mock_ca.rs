//! Mock certificate authority for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::crypto::{
    CertificateAuthority, CryptoError, CryptoKind, CA_CERT_FILE, CA_KEY_FILE, CA_MATERIAL_DIR,
};

/// Mock implementation of the CertificateAuthority trait.
///
/// Writes placeholder PEM files in the same layout as a real CA, so
/// [`CryptoMaterialBundle::locate`](crate::crypto::CryptoMaterialBundle::locate)
/// finds them.
///
/// # Example
///
/// ```rust,ignore
/// let ca = MockCertificateAuthority::new();
/// ca.create_ca(&ca_dir, "qs-1").await?;
/// ca.create_component(&ca_dir, "qs-1-server1").await?;
///
/// assert_eq!(ca.recorded_components().await, vec!["qs-1-server1"]);
/// ```
#[derive(Debug)]
pub struct MockCertificateAuthority {
    /// Clusters passed to create_ca.
    cas: Arc<RwLock<Vec<String>>>,
    /// Components passed to create_component, in call order.
    components: Arc<RwLock<Vec<String>>>,
    /// If set, the next call fails with this message.
    next_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockCertificateAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCertificateAuthority {
    pub fn new() -> Self {
        Self {
            cas: Arc::new(RwLock::new(Vec::new())),
            components: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Clusters a CA was created for.
    pub async fn recorded_cas(&self) -> Vec<String> {
        self.cas.read().await.clone()
    }

    /// Components material was issued for.
    pub async fn recorded_components(&self) -> Vec<String> {
        self.components.read().await.clone()
    }

    /// Make the next call fail.
    pub async fn set_next_error(&self, message: impl Into<String>) {
        *self.next_error.write().await = Some(message.into());
    }

    async fn take_error(&self, step: &str) -> Result<(), CryptoError> {
        match self.next_error.write().await.take() {
            Some(message) => Err(CryptoError::command_failed(step, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CertificateAuthority for MockCertificateAuthority {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_ca(&self, ca_dir: &Path, cluster_name: &str) -> Result<(), CryptoError> {
        self.take_error("create_ca").await?;

        let material = ca_dir.join(CA_MATERIAL_DIR);
        fs::create_dir_all(&material).await?;
        for kind in CryptoKind::ALL {
            fs::create_dir_all(ca_dir.join(kind.out_dir())).await?;
        }
        fs::write(material.join(CA_CERT_FILE), "mock ca cert").await?;
        fs::write(material.join(CA_KEY_FILE), "mock ca key").await?;

        self.cas.write().await.push(cluster_name.to_string());
        Ok(())
    }

    async fn create_component(&self, ca_dir: &Path, component: &str) -> Result<(), CryptoError> {
        self.take_error("create_component").await?;

        let mut components = self.components.write().await;
        let seq = components.len();
        for kind in CryptoKind::ALL {
            let file = format!("{:04}-{}-{}.pem", seq, component, kind.as_str());
            fs::write(
                ca_dir.join(kind.out_dir()).join(file),
                format!("mock {} for {}", kind.as_str(), component),
            )
            .await?;
        }
        components.push(component.to_string());
        Ok(())
    }
}

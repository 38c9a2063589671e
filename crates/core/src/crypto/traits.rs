//! Trait definitions for the crypto module.

use async_trait::async_trait;
use std::path::Path;

use super::error::CryptoError;

/// Creates a certificate authority and issues per-component TLS material.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Creates the CA itself inside `ca_dir`, which must already exist and be empty.
    async fn create_ca(&self, ca_dir: &Path, cluster_name: &str) -> Result<(), CryptoError>;

    /// Issues a key pair and certificate for `component` signed by the CA in `ca_dir`.
    ///
    /// Output file names contain `<component>-cert`, `<component>-priv`
    /// and `<component>-pub` so they can be found with
    /// [`CryptoMaterialBundle::locate`](super::CryptoMaterialBundle::locate).
    async fn create_component(&self, ca_dir: &Path, component: &str) -> Result<(), CryptoError>;
}

//! Certificate authority and TLS material for cluster components.
//!
//! The CA lays out its output as:
//!
//! ```text
//! ca/
//!   ca-material/ca-cert.pem    shared CA certificate
//!   ca-material/ca-key.pem
//!   out-cert/<ts>-<component>-cert.pem
//!   out-priv/<ts>-<component>-priv.pem
//!   out-pub/<ts>-<component>-pub.pem
//!   out-csr/<ts>-<component>-csr.pem
//! ```
//!
//! [`CryptoMaterialBundle::locate`] finds a component's files again after
//! the CA has produced them.

mod error;
mod locator;
mod openssl;
mod secrets;
mod traits;

pub use error::CryptoError;
pub use locator::{CryptoKind, CryptoMaterialBundle};
pub use openssl::OpensslCa;
pub use secrets::{
    admin_invoke_password, generate_password, generate_secret_key, hash_password, verify_password,
};
pub use traits::CertificateAuthority;

/// Directory holding the CA's own certificate and key.
pub const CA_MATERIAL_DIR: &str = "ca-material";
pub const CA_CERT_FILE: &str = "ca-cert.pem";
pub const CA_KEY_FILE: &str = "ca-key.pem";
pub const CSR_OUT_DIR: &str = "out-csr";

pub mod component;
pub mod config;
pub mod crypto;
pub mod defaults;
pub mod odb;
pub mod orchestrator;
pub mod platform;
pub mod scripts;
pub mod testing;

pub use component::{ComponentError, ComponentFactory, FsComponentFactory};
pub use config::{
    load_config, load_config_from_str, validate_config, ConfigError, KvdbConfig, OdbConfig,
    OdbType, QuickstartConfig, TlsConfig,
};
pub use crypto::{CertificateAuthority, CryptoError, CryptoMaterialBundle, OpensslCa};
pub use odb::{Odb, OdbConnector, OdbError, SqliteConnector, SqliteOdb};
pub use orchestrator::{
    OrchestratorError, ProvisioningReport, ProvisioningRequest, QuickstartOrchestrator,
};
pub use platform::Platform;

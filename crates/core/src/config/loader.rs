use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::QuickstartConfig, ConfigError};

/// Environment variable prefix, e.g. `ZATO_QS_ODB__HOST=db.local`
pub const ENV_PREFIX: &str = "ZATO_QS_";

/// Load configuration from built-in defaults, an optional file and environment overrides
pub fn load_config(path: Option<&Path>) -> Result<QuickstartConfig, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(QuickstartConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<QuickstartConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

use super::{types::QuickstartConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one server is requested
/// - The cluster name is safe to use in paths, scripts and certificate subjects
/// - KVDB port is not 0
/// - Server-backed ODBs name their host, user and database
pub fn validate_config(config: &QuickstartConfig) -> Result<(), ConfigError> {
    if config.cluster.servers == 0 {
        return Err(ConfigError::ValidationError(
            "cluster.servers must be at least 1".to_string(),
        ));
    }

    if let Some(name) = config.cluster.name.as_deref() {
        if !is_valid_cluster_name(name) {
            return Err(ConfigError::ValidationError(format!(
                "cluster.name {:?} may only contain letters, digits, '.', '_' and '-'",
                name
            )));
        }
    }

    if config.kvdb.port == 0 {
        return Err(ConfigError::ValidationError(
            "kvdb.port cannot be 0".to_string(),
        ));
    }

    if config.odb.port == Some(0) {
        return Err(ConfigError::ValidationError(
            "odb.port cannot be 0".to_string(),
        ));
    }

    if !config.odb.odb_type.is_file_backed() {
        let missing: Vec<&str> = [
            ("odb.host", config.odb.host.is_none()),
            ("odb.user", config.odb.user.is_none()),
            ("odb.db_name", config.odb.db_name.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} ODB requires {}",
                config.odb.odb_type,
                missing.join(", ")
            )));
        }
    }

    Ok(())
}

/// Cluster names end up unquoted in shell scripts, file names and
/// openssl subjects, so only `[A-Za-z0-9._-]` is accepted.
pub fn is_valid_cluster_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

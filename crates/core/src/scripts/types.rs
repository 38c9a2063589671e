//! Types for the scripts module.

use crate::platform::Platform;

/// Everything the generated scripts depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    pub platform: Platform,
    pub cluster_name: String,
    /// Server names in start order.
    pub server_names: Vec<String>,
}

impl ScriptOptions {
    pub fn new(platform: Platform, cluster_name: impl Into<String>, server_names: Vec<String>) -> Self {
        Self {
            platform,
            cluster_name: cluster_name.into(),
            server_names,
        }
    }

    pub fn steps(&self) -> StepCounts {
        StepCounts::for_servers(self.server_names.len())
    }
}

/// Number of progress steps the start and stop scripts report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCounts {
    pub start: usize,
    pub stop: usize,
}

impl StepCounts {
    pub fn for_servers(servers: usize) -> Self {
        Self {
            start: 6 + servers,
            stop: 3 + servers,
        }
    }
}

/// One generated file, relative to the cluster's base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub file_name: &'static str,
    pub contents: String,
    /// Whether the file gets executable permissions on POSIX-like targets.
    pub executable: bool,
}

/// The full set of files produced for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScriptSet {
    pub start: ScriptFile,
    /// `None` on Windows-like targets.
    pub stop: Option<ScriptFile>,
    /// `None` on Windows-like targets.
    pub restart: Option<ScriptFile>,
    pub vscode_launch: String,
    pub vscode_settings: String,
}

impl GeneratedScriptSet {
    /// Start, stop and restart scripts, in that order, skipping absent ones.
    pub fn scripts(&self) -> impl Iterator<Item = &ScriptFile> {
        std::iter::once(&self.start)
            .chain(self.stop.as_ref())
            .chain(self.restart.as_ref())
    }
}

//! Target platform flavour of the provisioned cluster.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of host the generated cluster is meant to run on.
///
/// Windows-like targets get no TLS material, a single batch start script
/// and fewer reported provisioning steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// TLS material is only generated on POSIX-like targets.
    pub fn has_tls(&self) -> bool {
        !self.is_windows()
    }

    /// Reported steps that do not depend on the number of servers.
    pub fn non_server_steps(&self) -> usize {
        match self {
            Platform::Windows => 5,
            Platform::Posix => 7,
        }
    }

    pub fn total_steps(&self, servers: usize) -> usize {
        self.non_server_steps() + servers
    }

    pub fn zato_bin(&self) -> &'static str {
        match self {
            Platform::Windows => "zato.bat",
            Platform::Posix => "zato",
        }
    }

    pub fn start_script_name(&self) -> &'static str {
        match self {
            Platform::Windows => "zato-qs-start.bat",
            Platform::Posix => "zato-qs-start.sh",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Posix => "posix",
            Platform::Windows => "windows",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "posix" | "unix" | "linux" | "macos" => Ok(Platform::Posix),
            "windows" => Ok(Platform::Windows),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

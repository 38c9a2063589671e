use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::defaults::VSCODE_DIR;

use super::error::ScriptError;
use super::types::GeneratedScriptSet;
use super::{VSCODE_LAUNCH_FILE, VSCODE_SETTINGS_FILE};

/// Owner read/write/execute, group read.
pub const SCRIPT_MODE: u32 = 0o740;

/// Paths of the files written by [`write_scripts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenScripts {
    pub start_script: PathBuf,
    pub stop_script: Option<PathBuf>,
    pub restart_script: Option<PathBuf>,
    pub vscode_dir: PathBuf,
}

/// Writes the generated set under `base_dir`, overwriting existing files.
pub async fn write_scripts(
    base_dir: &Path,
    set: &GeneratedScriptSet,
) -> Result<WrittenScripts, ScriptError> {
    let vscode_dir = base_dir.join(VSCODE_DIR);
    fs::create_dir_all(&vscode_dir)
        .await
        .map_err(|e| ScriptError::write(&vscode_dir, e))?;
    write(&vscode_dir.join(VSCODE_LAUNCH_FILE), &set.vscode_launch).await?;
    write(&vscode_dir.join(VSCODE_SETTINGS_FILE), &set.vscode_settings).await?;

    for script in set.scripts() {
        let path = base_dir.join(script.file_name);
        write(&path, &script.contents).await?;
        if script.executable {
            make_executable(&path).await?;
        }
        debug!(path = %path.display(), "Script written");
    }

    Ok(WrittenScripts {
        start_script: base_dir.join(set.start.file_name),
        stop_script: set.stop.as_ref().map(|s| base_dir.join(s.file_name)),
        restart_script: set.restart.as_ref().map(|s| base_dir.join(s.file_name)),
        vscode_dir,
    })
}

async fn write(path: &Path, contents: &str) -> Result<(), ScriptError> {
    fs::write(path, contents)
        .await
        .map_err(|e| ScriptError::write(path, e))
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), ScriptError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(SCRIPT_MODE))
        .await
        .map_err(|e| ScriptError::Permissions {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), ScriptError> {
    Ok(())
}

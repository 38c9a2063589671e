//! Management scripts and editor files written next to a quickstart cluster.
//!
//! Rendering is pure: the same [`ScriptOptions`] always give byte-identical
//! output. Writing the result to disk is a separate step.

mod error;
mod render;
mod types;
mod writer;

pub use error::ScriptError;
pub use render::{render, render_start_shell, render_stop_shell};
pub use types::{GeneratedScriptSet, ScriptFile, ScriptOptions, StepCounts};
pub use writer::{write_scripts, WrittenScripts, SCRIPT_MODE};

pub const STOP_SCRIPT: &str = "zato-qs-stop.sh";
pub const RESTART_SCRIPT: &str = "zato-qs-restart.sh";
pub const VSCODE_LAUNCH_FILE: &str = "launch.json";
pub const VSCODE_SETTINGS_FILE: &str = "settings.json";

//! Template rendering for management scripts.

use crate::platform::Platform;

use super::types::{GeneratedScriptSet, ScriptFile, ScriptOptions};
use super::{RESTART_SCRIPT, STOP_SCRIPT};

const SCRIPT_DIR: &str = include_str!("../../templates/script_dir.sh");
const START_HEAD: &str = include_str!("../../templates/start_head.sh");
const START_BODY: &str = include_str!("../../templates/start_body.sh");
const START_TAIL: &str = include_str!("../../templates/start_tail.sh");
const START_LB_POSIX: &str = include_str!("../../templates/start_lb_posix.sh");
const START_LB_WINDOWS: &str = include_str!("../../templates/start_lb_windows.sh");
const START_SERVER: &str = include_str!("../../templates/start_server.sh");
const STOP: &str = include_str!("../../templates/stop.sh");
const STOP_SERVER: &str = include_str!("../../templates/stop_server.sh");
const RESTART: &str = include_str!("../../templates/restart.sh");
const START_BAT: &str = include_str!("../../templates/start.bat");
const VSCODE_LAUNCH: &str = include_str!("../../templates/vscode_launch.json");
const VSCODE_SETTINGS: &str = include_str!("../../templates/vscode_settings.json");

/// Replaces `{{name}}` placeholders in a single pass.
///
/// Substituted values are never scanned again, and unknown placeholders
/// are kept as they are.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn per_server<F>(options: &ScriptOptions, line: F) -> String
where
    F: Fn(usize, &str) -> String,
{
    options
        .server_names
        .iter()
        .enumerate()
        .map(|(idx, name)| line(idx + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the POSIX start script.
///
/// The load-balancer step is a skip message on Windows-like targets.
pub fn render_start_shell(options: &ScriptOptions) -> String {
    let steps = options.steps();
    let zato_bin = options.platform.zato_bin();
    let start_steps = steps.start.to_string();
    let scheduler_step = (steps.start - 1).to_string();

    let check_config = per_server(options, |_, name| {
        format!("$ZATO_BIN check-config $BASE_DIR/{}", name)
    });
    let start_servers = per_server(options, |idx, name| {
        fill(
            START_SERVER,
            &[("server_name", name), ("step", &(idx + 4).to_string())],
        )
    });
    let start_lb = match options.platform {
        Platform::Windows => START_LB_WINDOWS,
        Platform::Posix => START_LB_POSIX,
    };

    let head = fill(
        START_HEAD,
        &[
            ("script_dir", SCRIPT_DIR),
            ("zato_bin", zato_bin),
            ("start_steps", &start_steps),
            ("cluster_name", &options.cluster_name),
        ],
    );
    let body = fill(
        START_BODY,
        &[
            ("check_config", &check_config),
            ("start_lb", start_lb),
            ("start_servers", &start_servers),
            ("scheduler_step", &scheduler_step),
        ],
    );

    format!("{}{}{}", head, body, START_TAIL)
}

/// Renders the POSIX stop script.
pub fn render_stop_shell(options: &ScriptOptions) -> String {
    let steps = options.steps();
    let stop_steps = steps.stop.to_string();
    let web_admin_step = (steps.stop - 1).to_string();

    let delete_pidfiles = per_server(options, |_, name| {
        format!("  rm -f $BASE_DIR/{}/pidfile", name)
    });
    let stop_servers = per_server(options, |idx, name| {
        fill(
            STOP_SERVER,
            &[("server_name", name), ("step", &(idx + 1).to_string())],
        )
    });

    fill(
        STOP,
        &[
            ("script_dir", SCRIPT_DIR),
            ("delete_server_pidfiles", &delete_pidfiles),
            ("zato_bin", options.platform.zato_bin()),
            ("stop_steps", &stop_steps),
            ("cluster_name", &options.cluster_name),
            ("stop_servers", &stop_servers),
            ("web_admin_step", &web_admin_step),
        ],
    )
}

fn render_restart_shell() -> String {
    fill(RESTART, &[("script_dir", SCRIPT_DIR)])
}

fn render_start_bat(options: &ScriptOptions) -> String {
    let start_servers = per_server(options, |_, name| {
        format!("start \"\" /b %zato_cmd% start \"%env_dir%{}\"", name)
    });

    fill(
        START_BAT,
        &[
            ("zato_bin", options.platform.zato_bin()),
            ("start_servers", &start_servers),
            ("cluster_name", &options.cluster_name),
        ],
    )
}

/// Renders every file for the given options.
pub fn render(options: &ScriptOptions) -> GeneratedScriptSet {
    let (start, stop, restart) = match options.platform {
        Platform::Windows => (
            ScriptFile {
                file_name: options.platform.start_script_name(),
                contents: render_start_bat(options),
                executable: false,
            },
            None,
            None,
        ),
        Platform::Posix => (
            ScriptFile {
                file_name: options.platform.start_script_name(),
                contents: render_start_shell(options),
                executable: true,
            },
            Some(ScriptFile {
                file_name: STOP_SCRIPT,
                contents: render_stop_shell(options),
                executable: true,
            }),
            Some(ScriptFile {
                file_name: RESTART_SCRIPT,
                contents: render_restart_shell(),
                executable: true,
            }),
        ),
    };

    GeneratedScriptSet {
        start,
        stop,
        restart,
        vscode_launch: VSCODE_LAUNCH.to_string(),
        vscode_settings: VSCODE_SETTINGS.to_string(),
    }
}

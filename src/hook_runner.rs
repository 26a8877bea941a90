//! Hook-runner shim generation.
//!
//! Tools with native hook support invoke an executable per hook. Instead of
//! symlinking the registry script directly, we generate a small shim that
//! exports the configured environment and hands off to the right interpreter
//! for the script's extension. The header line marks the shim as
//! system-owned so sync can later recognize and remove stale ones.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Second line of every generated runner.
pub const RUNNER_HEADER: &str = "# generated by hawk-hooks; do not edit";

/// Interpreter command for a hook script, selected by extension.
/// `None` means the script is exec'd directly and relies on its shebang.
pub fn interpreter_for(script: &Path) -> Option<&'static str> {
    match script.extension().and_then(|ext| ext.to_str()) {
        Some("sh") | Some("bash") => Some("bash"),
        Some("py") => Some("python3"),
        Some("js") | Some("mjs") => Some("node"),
        Some("ts") => Some("npx tsx"),
        _ => None,
    }
}

/// Render the runner shim for `script`.
pub fn runner_script(script: &Path, env: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(RUNNER_HEADER);
    out.push('\n');

    for (key, value) in env {
        out.push_str("export ");
        out.push_str(key);
        out.push('=');
        out.push_str(&shell_quote(value));
        out.push('\n');
    }

    let script_path = shell_quote(&script.to_string_lossy());
    match interpreter_for(script) {
        Some(interpreter) => {
            out.push_str(&format!("exec {interpreter} {script_path} \"$@\"\n"));
        }
        None => {
            out.push_str(&format!("exec {script_path} \"$@\"\n"));
        }
    }

    out
}

/// Write the runner shim to `dest` with executable permissions.
pub fn write_runner(dest: &Path, script: &Path, env: &BTreeMap<String, String>) -> Result<()> {
    let content = runner_script(script, env);

    if let Some(parent) = dest.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(dest, &content)
        .with_context(|| format!("Failed to write hook runner: {}", dest.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to chmod hook runner: {}", dest.display()))?;
    }

    Ok(())
}

/// Whether `path` is a runner this system generated.
pub fn is_runner(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match fs::read_to_string(path) {
        Ok(content) => content.lines().take(2).any(|line| line == RUNNER_HEADER),
        Err(_) => false,
    }
}

/// Single-quote `value` for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

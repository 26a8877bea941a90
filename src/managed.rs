//! Managed blocks inside foreign config files.
//!
//! Some tool config files mix hand-authored content with fragments this
//! system owns. Each owned fragment is delimited by a begin/end comment pair
//! embedding a stable unit id, so it can be replaced or removed later without
//! touching anything around it. Only hash-comment text formats are supported;
//! JSON files cannot carry comment markers and are rejected up front.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Begin marker for a managed unit.
pub fn begin_marker(unit_id: &str) -> String {
    format!("# >>> hawk-hooks managed: {unit_id} >>>")
}

/// End marker for a managed unit.
pub fn end_marker(unit_id: &str) -> String {
    format!("# <<< hawk-hooks managed: {unit_id} <<<")
}

const BEGIN_PREFIX: &str = "# >>> hawk-hooks managed: ";
const END_PREFIX: &str = "# <<< hawk-hooks managed: ";

/// Reject targets whose format cannot carry hash-comment markers and unit
/// ids that would corrupt the marker lines.
fn validate_op(path: &Path, unit_id: &str) -> Result<()> {
    if path.extension().is_some_and(|ext| ext == "json") {
        bail!(
            "managed blocks are not supported for JSON files: {}",
            path.display()
        );
    }
    if unit_id.is_empty() || unit_id.contains('\n') || unit_id.contains('\r') {
        bail!("invalid managed unit id: {unit_id:?}");
    }
    Ok(())
}

/// Replace any prior block for `unit_id` with a fresh one appended at the
/// end of the file, creating the file and parent directories if absent.
/// Line endings are normalized to `\n` on write.
pub fn upsert(path: &Path, unit_id: &str, payload: &str) -> Result<()> {
    validate_op(path, unit_id)?;

    let existing = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read managed file: {}", path.display()))?
    } else {
        String::new()
    };

    let (without_unit, _) = strip_unit(&normalize(&existing), unit_id);

    let mut out = String::new();
    let base = without_unit.trim_end();
    if !base.is_empty() {
        out.push_str(base);
        out.push_str("\n\n");
    }
    out.push_str(&begin_marker(unit_id));
    out.push('\n');
    let body = payload.trim_end_matches('\n');
    if !body.is_empty() {
        out.push_str(&normalize(body));
        out.push('\n');
    }
    out.push_str(&end_marker(unit_id));
    out.push('\n');

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, out)
        .with_context(|| format!("Failed to write managed file: {}", path.display()))
}

/// Strip the block for `unit_id` and report whether content actually
/// changed. A missing file or absent block is a normal `false`; the file is
/// left byte-identical in that case.
pub fn remove(path: &Path, unit_id: &str) -> Result<bool> {
    validate_op(path, unit_id)?;

    if !path.exists() {
        return Ok(false);
    }

    let existing = fs::read_to_string(path)
        .with_context(|| format!("Failed to read managed file: {}", path.display()))?;
    let (stripped, changed) = strip_unit(&normalize(&existing), unit_id);
    if !changed {
        return Ok(false);
    }

    fs::write(path, stripped)
        .with_context(|| format!("Failed to write managed file: {}", path.display()))?;
    Ok(true)
}

/// Remove every managed block irrespective of unit id.
pub fn strip_all(text: &str) -> String {
    if !text.contains(BEGIN_PREFIX) {
        return text.to_string();
    }
    strip_blocks(text, |line| {
        line.starts_with(BEGIN_PREFIX) && line.ends_with(">>>")
    })
}

/// Remove the block for one unit id, reporting whether anything was
/// stripped. Text without the unit's marker comes back untouched.
pub fn strip_unit(text: &str, unit_id: &str) -> (String, bool) {
    let begin = begin_marker(unit_id);
    if !text.contains(&begin) {
        return (text.to_string(), false);
    }
    let stripped = strip_blocks(text, |line| line == begin);
    (stripped, true)
}

fn strip_blocks(text: &str, is_begin: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_block = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if !in_block && is_begin(trimmed) {
            in_block = true;
            // Drop one blank separator line the upsert inserted before the block.
            if out.ends_with("\n\n") {
                out.pop();
            }
            continue;
        }
        if in_block {
            if trimmed.starts_with(END_PREFIX) && trimmed.ends_with("<<<") {
                in_block = false;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// One batch operation for [`apply`].
#[derive(Debug, Clone)]
pub enum ManagedOp {
    Upsert {
        path: PathBuf,
        unit_id: String,
        payload: String,
    },
    Remove {
        path: PathBuf,
        unit_id: String,
    },
}

impl ManagedOp {
    pub fn unit_id(&self) -> &str {
        match self {
            ManagedOp::Upsert { unit_id, .. } | ManagedOp::Remove { unit_id, .. } => unit_id,
        }
    }
}

/// Outcome of an [`apply`] batch.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Unit ids whose operation succeeded.
    pub succeeded: Vec<String>,
    /// `(unit id, error)` pairs for failed operations.
    pub failed: Vec<(String, String)>,
}

/// Run a sequence of upsert/remove operations. Failures (unsupported
/// targets, I/O errors) are captured per operation and never abort the rest
/// of the batch.
pub fn apply(ops: &[ManagedOp]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for op in ops {
        let result = match op {
            ManagedOp::Upsert {
                path,
                unit_id,
                payload,
            } => upsert(path, unit_id, payload),
            ManagedOp::Remove { path, unit_id } => remove(path, unit_id).map(|_| ()),
        };

        match result {
            Ok(()) => report.succeeded.push(op.unit_id().to_string()),
            Err(e) => {
                tracing::error!(unit = op.unit_id(), error = %e, "Managed-config operation failed");
                report.failed.push((op.unit_id().to_string(), e.to_string()));
            }
        }
    }

    report
}

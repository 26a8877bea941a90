//! Per-tool adapters.
//!
//! An adapter turns a resolved component set into one tool's native
//! filesystem state: symlinks into the registry grouped by type
//! subdirectory, generated hook runners for tools that support them, and a
//! merged MCP config in whatever format the tool's loader expects. Sync is
//! reconciliation, not a change log: the adapter observes what is on disk,
//! links what is missing, and unlinks stale entries it owns, so re-running
//! with unchanged input is a no-op.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::component::ComponentType;
use crate::hook_runner;
use crate::mcp::{self, McpServerConfig};
use crate::registry::Registry;
use crate::resolver::ResolvedSet;
use crate::tool::{HookSupport, Tool};

/// One tool's outcome for one sync pass.
#[derive(Debug, Default)]
pub struct SyncResult {
    /// `type/name` entries linked or relinked this pass.
    pub linked: Vec<String>,
    /// `type/name` entries removed as stale.
    pub unlinked: Vec<String>,
    /// Error strings; non-fatal for the rest of the pass.
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn no_changes(&self) -> bool {
        self.linked.is_empty() && self.unlinked.is_empty() && self.errors.is_empty()
    }
}

/// Per-tool translation of a resolved set into native filesystem state.
///
/// The linking behavior is identical across tools and lives in the default
/// `sync`; concrete adapters supply only their MCP format and any
/// path differences.
pub trait Adapter {
    fn tool(&self) -> Tool;

    fn global_dir(&self) -> PathBuf {
        self.tool().global_dir()
    }

    fn project_dir(&self, project_dir: &Path) -> PathBuf {
        self.tool().project_dir(project_dir)
    }

    fn hook_support(&self) -> HookSupport {
        self.tool().hook_support()
    }

    /// Materialize every resolved name under `target_dir`. In dry-run mode
    /// nothing is written, but the reported names match a real run exactly.
    fn sync(
        &self,
        resolved: &ResolvedSet,
        target_dir: &Path,
        registry: &Registry,
        env: &BTreeMap<String, String>,
        dry_run: bool,
    ) -> SyncResult {
        link_components(self.tool(), resolved, target_dir, registry, env, dry_run)
    }

    /// Merge `servers` into the tool's MCP config under `target_dir`.
    /// Returns whether the file content changed (or would change, in
    /// dry-run mode).
    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool>;
}

/// The adapter for a tool.
pub fn adapter_for(tool: Tool) -> Box<dyn Adapter> {
    match tool {
        Tool::Claude => Box::new(ClaudeAdapter),
        Tool::Gemini => Box::new(GeminiAdapter),
        Tool::Codex => Box::new(CodexAdapter),
        Tool::OpenCode => Box::new(OpenCodeAdapter),
        Tool::Cursor => Box::new(CursorAdapter),
        Tool::Antigravity => Box::new(AntigravityAdapter),
    }
}

// =============================================================================
// Concrete adapters
// =============================================================================

/// Claude Code: `.mcp.json` with `mcpServers`.
pub struct ClaudeAdapter;

impl Adapter for ClaudeAdapter {
    fn tool(&self) -> Tool {
        Tool::Claude
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_marked_json(
            &target_dir.join(".mcp.json"),
            "mcpServers",
            servers,
            mcp::server_to_json,
            dry_run,
        )
    }
}

/// Gemini CLI: `settings.json` plus the ownership sidecar.
pub struct GeminiAdapter;

impl Adapter for GeminiAdapter {
    fn tool(&self) -> Tool {
        Tool::Gemini
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_gemini_settings(
            &target_dir.join("settings.json"),
            &target_dir.join(mcp::GEMINI_SIDECAR),
            servers,
            dry_run,
        )
    }
}

/// OpenAI Codex CLI: `config.toml` with `[mcp_servers.<name>]` tables.
pub struct CodexAdapter;

impl Adapter for CodexAdapter {
    fn tool(&self) -> Tool {
        Tool::Codex
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_codex_toml(&target_dir.join("config.toml"), servers, dry_run)
    }
}

/// OpenCode: `opencode.json` with its `mcp` key and argv-style commands.
pub struct OpenCodeAdapter;

impl Adapter for OpenCodeAdapter {
    fn tool(&self) -> Tool {
        Tool::OpenCode
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_opencode_config(&target_dir.join("opencode.json"), servers, dry_run)
    }
}

/// Cursor: `mcp.json` with `mcpServers`.
pub struct CursorAdapter;

impl Adapter for CursorAdapter {
    fn tool(&self) -> Tool {
        Tool::Cursor
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_marked_json(
            &target_dir.join("mcp.json"),
            "mcpServers",
            servers,
            mcp::server_to_json,
            dry_run,
        )
    }
}

/// Antigravity: `mcp.json` with `mcpServers`.
pub struct AntigravityAdapter;

impl Adapter for AntigravityAdapter {
    fn tool(&self) -> Tool {
        Tool::Antigravity
    }

    fn write_mcp_config(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        target_dir: &Path,
        dry_run: bool,
    ) -> Result<bool> {
        mcp::merge_marked_json(
            &target_dir.join("mcp.json"),
            "mcpServers",
            servers,
            mcp::server_to_json,
            dry_run,
        )
    }
}

// =============================================================================
// Symlink materialization (shared capability)
// =============================================================================

/// Link every resolved name for `tool` under `target_dir` and unlink stale
/// owned entries. MCP entries are excluded; they go through
/// `write_mcp_config`.
pub fn link_components(
    tool: Tool,
    resolved: &ResolvedSet,
    target_dir: &Path,
    registry: &Registry,
    env: &BTreeMap<String, String>,
    dry_run: bool,
) -> SyncResult {
    let mut result = SyncResult::default();
    let hooks_unsupported = tool.hook_support() == HookSupport::Unsupported;

    // Capability errors are reported on every pass, even when the link
    // state is already up to date.
    if hooks_unsupported {
        for name in resolved.get(ComponentType::Hook) {
            result.errors.push(format!(
                "hook/{name}: hooks are unsupported for {}",
                tool.id()
            ));
        }
    }

    // Fast no-change path: hash the observed owned entries against the
    // linkable part of the resolved set.
    let desired = linkable_lists(tool, resolved);
    let observed = observe_links(tool, target_dir, registry);
    if observed.content_hash() == ResolvedSet::from_lists(desired.clone()).content_hash() {
        return result;
    }

    for &ty in ComponentType::all() {
        if ty == ComponentType::Mcp {
            continue;
        }
        let Some(subdir) = tool.component_dir(ty) else {
            continue;
        };
        let type_dir = target_dir.join(subdir);
        let names = desired.get(&ty).cloned().unwrap_or_default();

        if !names.is_empty() && !dry_run && !type_dir.exists() {
            if let Err(e) = fs::create_dir_all(&type_dir) {
                result.errors.push(format!(
                    "{}: failed to create {}: {e}",
                    ty,
                    type_dir.display()
                ));
                continue;
            }
        }

        for name in &names {
            match link_one(registry, ty, name, &type_dir, env, dry_run) {
                Ok(true) => result.linked.push(format!("{ty}/{name}")),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(tool = tool.id(), component = %format!("{ty}/{name}"), error = %e, "Link failed");
                    result.errors.push(format!("{ty}/{name}: {e:#}"));
                }
            }
        }

        // Reconcile even when nothing is resolved for this type: entries we
        // linked on earlier passes may have gone stale.
        match remove_stale(registry, ty, &names, &type_dir, dry_run) {
            Ok(removed) => result
                .unlinked
                .extend(removed.into_iter().map(|name| format!("{ty}/{name}"))),
            Err(e) => result.errors.push(format!("{ty}: {e:#}")),
        }
    }

    result
}

/// The part of a resolved set an adapter materializes as links, as a set
/// (for hash comparison against [`observe_links`]).
pub fn linkable_set(tool: Tool, resolved: &ResolvedSet) -> ResolvedSet {
    ResolvedSet::from_lists(linkable_lists(tool, resolved))
}

/// The per-type lists an adapter materializes as links: everything except
/// MCP entries and, for tools without hook support, hook entries.
fn linkable_lists(tool: Tool, resolved: &ResolvedSet) -> BTreeMap<ComponentType, Vec<String>> {
    let mut lists = BTreeMap::new();
    for (ty, names) in resolved.iter() {
        if ty == ComponentType::Mcp {
            continue;
        }
        if ty == ComponentType::Hook && tool.hook_support() == HookSupport::Unsupported {
            continue;
        }
        lists.insert(ty, names.to_vec());
    }
    lists
}

/// Materialize one entry. Returns whether anything changed (or would).
fn link_one(
    registry: &Registry,
    ty: ComponentType,
    name: &str,
    type_dir: &Path,
    env: &BTreeMap<String, String>,
    dry_run: bool,
) -> Result<bool> {
    let entry = registry
        .get_path(ty, name)?
        .context("not found in registry")?;
    let entry = fs::canonicalize(&entry)
        .with_context(|| format!("Failed to resolve registry entry: {}", entry.display()))?;
    let dest = type_dir.join(name);

    if ty == ComponentType::Hook {
        ensure_runner(&entry, &dest, env, dry_run)
    } else {
        ensure_symlink(&entry, &dest, type_dir, dry_run)
    }
}

/// Create or correct a relative symlink `dest` -> `entry`.
fn ensure_symlink(entry: &Path, dest: &Path, type_dir: &Path, dry_run: bool) -> Result<bool> {
    let base = fs::canonicalize(type_dir).unwrap_or_else(|_| type_dir.to_path_buf());
    let relative = pathdiff::diff_paths(entry, &base)
        .ok_or_else(|| anyhow::anyhow!("Cannot calculate relative path"))?;

    if dest.is_symlink() {
        let current = fs::read_link(dest)
            .with_context(|| format!("Failed to read symlink: {}", dest.display()))?;
        if current == relative {
            return Ok(false);
        }
        if !dry_run {
            fs::remove_file(dest)
                .with_context(|| format!("Failed to remove old symlink: {}", dest.display()))?;
            create_symlink(&relative, dest, entry)?;
        }
        return Ok(true);
    }

    if dest.exists() {
        // Not ours; never replace hand-placed content.
        bail!("destination exists and is not a symlink: {}", dest.display());
    }

    if !dry_run {
        create_symlink(&relative, dest, entry)?;
    }
    Ok(true)
}

fn create_symlink(relative: &Path, dest: &Path, entry: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(relative, dest)
        .with_context(|| format!("Failed to create symlink: {}", dest.display()))?;

    #[cfg(windows)]
    {
        let result = if entry.is_dir() {
            std::os::windows::fs::symlink_dir(relative, dest)
        } else {
            std::os::windows::fs::symlink_file(relative, dest)
        };
        result.with_context(|| format!("Failed to create symlink: {}", dest.display()))?;
    }

    #[cfg(not(windows))]
    let _ = entry;

    Ok(())
}

/// Write or refresh a hook-runner shim at `dest`.
fn ensure_runner(
    entry: &Path,
    dest: &Path,
    env: &BTreeMap<String, String>,
    dry_run: bool,
) -> Result<bool> {
    let content = hook_runner::runner_script(entry, env);

    if dest.exists() {
        if !hook_runner::is_runner(dest) {
            bail!(
                "destination exists and was not generated by hawk-hooks: {}",
                dest.display()
            );
        }
        let existing = fs::read_to_string(dest)
            .with_context(|| format!("Failed to read hook runner: {}", dest.display()))?;
        if existing == content {
            return Ok(false);
        }
    }

    if !dry_run {
        hook_runner::write_runner(dest, entry, env)?;
    }
    Ok(true)
}

/// Remove owned entries in `type_dir` that are no longer resolved.
/// Returns the removed names. Foreign entries are never touched.
fn remove_stale(
    registry: &Registry,
    ty: ComponentType,
    desired: &[String],
    type_dir: &Path,
    dry_run: bool,
) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    if !type_dir.is_dir() {
        return Ok(removed);
    }

    let registry_root =
        fs::canonicalize(registry.root()).unwrap_or_else(|_| registry.root().to_path_buf());
    let base = fs::canonicalize(type_dir).unwrap_or_else(|_| type_dir.to_path_buf());

    for dir_entry in WalkDir::new(type_dir).min_depth(1).max_depth(1) {
        let dir_entry =
            dir_entry.with_context(|| format!("Failed to read directory: {}", type_dir.display()))?;
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if desired.iter().any(|d| *d == name) {
            continue;
        }

        let path = dir_entry.path().to_path_buf();
        let owned = if path.is_symlink() {
            symlink_points_into(&path, &base, &registry_root)
        } else if ty == ComponentType::Hook {
            hook_runner::is_runner(&path)
        } else {
            false
        };
        if !owned {
            continue;
        }

        if !dry_run {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale entry: {}", path.display()))?;
        }
        removed.push(name);
    }

    removed.sort();
    Ok(removed)
}

/// Whether the symlink at `path` targets somewhere inside the registry.
/// Works for dangling links too: the target is resolved lexically.
fn symlink_points_into(path: &Path, base: &Path, registry_root: &Path) -> bool {
    let Ok(target) = fs::read_link(path) else {
        return false;
    };
    let absolute = if target.is_absolute() {
        target
    } else {
        base.join(target)
    };
    normalize_lexically(&absolute).starts_with(registry_root)
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// The owned entries currently on disk for `tool` under `target_dir`,
/// as a resolved set (non-MCP types only). Used for no-change detection
/// and status reporting.
pub fn observe_links(tool: Tool, target_dir: &Path, registry: &Registry) -> ResolvedSet {
    let registry_root =
        fs::canonicalize(registry.root()).unwrap_or_else(|_| registry.root().to_path_buf());
    let mut lists = BTreeMap::new();

    for &ty in ComponentType::all() {
        if ty == ComponentType::Mcp {
            continue;
        }
        let Some(subdir) = tool.component_dir(ty) else {
            continue;
        };
        let type_dir = target_dir.join(subdir);
        if !type_dir.is_dir() {
            continue;
        }
        let base = fs::canonicalize(&type_dir).unwrap_or_else(|_| type_dir.clone());

        let mut names = Vec::new();
        for dir_entry in WalkDir::new(&type_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
        {
            let path = dir_entry.path();
            let owned = if path.is_symlink() {
                symlink_points_into(path, &base, &registry_root)
            } else if ty == ComponentType::Hook {
                hook_runner::is_runner(path)
            } else {
                false
            };
            if owned {
                names.push(dir_entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        if !names.is_empty() {
            lists.insert(ty, names);
        }
    }

    ResolvedSet::from_lists(lists)
}

//! Sync engine orchestration.
//!
//! Drives the resolver, registry and adapters across the global scope and
//! project directories. One tool's failure never aborts the others; every
//! pass returns the full per-tool result map for reporting.

use std::collections::BTreeMap;
use std::path::Path;

use crate::adapter::{self, Adapter, SyncResult};
use crate::component::ComponentType;
use crate::config::{DirConfig, DirIndex, GlobalConfig, ProfileSet};
use crate::mcp;
use crate::registry::Registry;
use crate::resolver::{self, ResolvedSet};
use crate::tool::Tool;

/// Orchestrates resolution and per-tool sync passes.
pub struct SyncEngine<'a> {
    registry: &'a Registry,
    global: &'a GlobalConfig,
    profiles: &'a ProfileSet,
    dir_index: &'a DirIndex,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        registry: &'a Registry,
        global: &'a GlobalConfig,
        profiles: &'a ProfileSet,
        dir_index: &'a DirIndex,
    ) -> Self {
        Self {
            registry,
            global,
            profiles,
            dir_index,
        }
    }

    /// Sync the global scope: one resolution shared by every tool, applied
    /// to each tool's global config directory. Tools disabled in the global
    /// config are skipped.
    pub fn sync_global(&self, tools: &[Tool], dry_run: bool) -> BTreeMap<Tool, SyncResult> {
        // Tool-specific extra/exclude lives in directory layers, so the
        // global set is identical across tools and resolved once.
        let resolved = resolver::resolve(self.global, None, None, None, None);
        tracing::debug!(hash = %resolved.content_hash(), "Resolved global component set");

        let mut results = BTreeMap::new();
        for &tool in tools {
            let settings = self.global.tool_settings(tool);
            if !settings.enabled {
                tracing::debug!(tool = tool.id(), "Tool disabled in global config; skipping");
                continue;
            }
            let adapter = adapter::adapter_for(tool);
            let target = settings.dir.unwrap_or_else(|| adapter.global_dir());
            results.insert(
                tool,
                self.sync_one(adapter.as_ref(), &resolved, &target, dry_run),
            );
        }
        results
    }

    /// Sync one project directory: builds the ancestor layer chain, resolves
    /// per tool (tool overrides live in the layers), and syncs into each
    /// tool's project config directory.
    pub fn sync_directory(
        &self,
        project_dir: &Path,
        tools: &[Tool],
        local: Option<&DirConfig>,
        dry_run: bool,
    ) -> BTreeMap<Tool, SyncResult> {
        let chain = resolver::build_chain(self.dir_index, self.profiles, project_dir, local);
        tracing::debug!(
            project = %project_dir.display(),
            layers = chain.len(),
            "Built directory chain"
        );

        let mut results = BTreeMap::new();
        for &tool in tools {
            if !self.global.tool_settings(tool).enabled {
                tracing::debug!(tool = tool.id(), "Tool disabled in global config; skipping");
                continue;
            }
            let resolved = resolver::resolve(self.global, None, None, Some(&chain), Some(tool));
            let adapter = adapter::adapter_for(tool);
            let target = adapter.project_dir(project_dir);
            results.insert(
                tool,
                self.sync_one(adapter.as_ref(), &resolved, &target, dry_run),
            );
        }
        results
    }

    /// Resolve the set a tool would get for a project directory, without
    /// touching the filesystem. Used for status reporting.
    pub fn resolve_directory(
        &self,
        project_dir: &Path,
        tool: Tool,
        local: Option<&DirConfig>,
    ) -> ResolvedSet {
        let chain = resolver::build_chain(self.dir_index, self.profiles, project_dir, local);
        resolver::resolve(self.global, None, None, Some(&chain), Some(tool))
    }

    /// Resolve the global set.
    pub fn resolve_global(&self) -> ResolvedSet {
        resolver::resolve(self.global, None, None, None, None)
    }

    fn sync_one(
        &self,
        adapter: &dyn Adapter,
        resolved: &ResolvedSet,
        target: &Path,
        dry_run: bool,
    ) -> SyncResult {
        let mut result = adapter.sync(resolved, target, self.registry, &self.global.env, dry_run);

        let mcp_names = resolved.get(ComponentType::Mcp);
        let (servers, load_errors) = mcp::load_servers(self.registry, mcp_names);
        result.errors.extend(load_errors);

        match adapter.write_mcp_config(&servers, target, dry_run) {
            Ok(true) => result
                .linked
                .extend(servers.keys().map(|name| format!("mcp/{name}"))),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(tool = adapter.tool().id(), error = %e, "MCP config merge failed");
                result.errors.push(format!("mcp: {e:#}"));
            }
        }

        result
    }
}

/// Render per-tool results as the human report.
pub fn format_sync_results(results: &BTreeMap<Tool, SyncResult>) -> String {
    let mut out = String::new();

    for (tool, result) in results {
        if result.no_changes() {
            out.push_str(&format!("{}: no changes\n", tool.id()));
            continue;
        }

        let mut parts = Vec::new();
        if !result.linked.is_empty() {
            parts.push(format!(
                "+{} linked ({})",
                result.linked.len(),
                result.linked.join(", ")
            ));
        }
        if !result.unlinked.is_empty() {
            parts.push(format!(
                "-{} unlinked ({})",
                result.unlinked.len(),
                result.unlinked.join(", ")
            ));
        }
        if !result.errors.is_empty() {
            parts.push(format!("!{} errors", result.errors.len()));
        }

        out.push_str(&format!("{}: {}\n", tool.id(), parts.join(", ")));
        for error in &result.errors {
            out.push_str(&format!("    {error}\n"));
        }
    }

    out
}

//! Layered configuration resolution.
//!
//! `resolve` is a pure function from configuration documents to a
//! [`ResolvedSet`]: per component type it starts from the global list and
//! folds each directory layer over it, outermost to innermost. The per-layer
//! step order is fixed and load-bearing: profile additions, directory
//! additions, directory removals, tool-specific additions, tool-specific
//! removals. Additions are append-if-absent and never reorder existing
//! entries; removals drop matching names wherever they sit.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use crate::component::ComponentType;
use crate::config::{DirConfig, DirIndex, GlobalConfig, Profile, ProfileSet};
use crate::tool::Tool;

/// One directory layer: an optional profile merged with an optional
/// directory config. A layer with neither is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct Layer<'a> {
    pub profile: Option<&'a Profile>,
    pub dir: Option<&'a DirConfig>,
}

/// Final per-type component name lists for one (tool, directory) evaluation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedSet {
    lists: BTreeMap<ComponentType, Vec<String>>,
}

impl ResolvedSet {
    /// Build a set directly from per-type lists (used for observed state).
    pub fn from_lists(lists: BTreeMap<ComponentType, Vec<String>>) -> Self {
        Self { lists }
    }

    /// Resolved names for one type, in resolution order.
    pub fn get(&self, component_type: ComponentType) -> &[String] {
        self.lists
            .get(&component_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate non-empty `(type, names)` pairs in type order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentType, &[String])> {
        self.lists
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(ty, names)| (*ty, names.as_slice()))
    }

    /// Total resolved name count across types.
    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deterministic hash over sorted contents: insensitive to list order,
    /// sensitive to membership. Types with no names do not contribute, so an
    /// empty list and an absent type hash identically.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (ty, names) in &self.lists {
            if names.is_empty() {
                continue;
            }
            let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            hasher.update(ty.config_key().as_bytes());
            hasher.update([0u8]);
            for name in sorted {
                hasher.update(name.as_bytes());
                hasher.update([0u8]);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Resolve the component set for one (tool, directory) evaluation.
///
/// When `dir_chain` is given it supersedes `profile`/`dir_config` entirely;
/// otherwise those two form a single layer. Tool-specific extra/exclude
/// adjustments apply only when `tool` is set.
pub fn resolve(
    global: &GlobalConfig,
    profile: Option<&Profile>,
    dir_config: Option<&DirConfig>,
    dir_chain: Option<&[Layer<'_>]>,
    tool: Option<Tool>,
) -> ResolvedSet {
    let single;
    let layers: &[Layer<'_>] = match dir_chain {
        Some(chain) => chain,
        None if profile.is_some() || dir_config.is_some() => {
            single = [Layer {
                profile,
                dir: dir_config,
            }];
            &single
        }
        None => &[],
    };

    let mut lists = BTreeMap::new();
    for &ty in ComponentType::all() {
        let base = global
            .components
            .get(&ty)
            .cloned()
            .unwrap_or_default();
        let resolved = layers
            .iter()
            .fold(base, |names, layer| apply_layer(names, layer, ty, tool));
        lists.insert(ty, resolved);
    }

    ResolvedSet { lists }
}

/// Build the ordered layer chain for `target`: every registered ancestor
/// (outermost first), then the unregistered target's own local config, if
/// any. Each layer's named profile is looked up in `profiles`; unknown
/// profile names are logged and skipped.
pub fn build_chain<'a>(
    index: &'a DirIndex,
    profiles: &'a ProfileSet,
    target: &Path,
    local: Option<&'a DirConfig>,
) -> Vec<Layer<'a>> {
    let mut layers: Vec<Layer<'a>> = index
        .ancestors_of(target)
        .into_iter()
        .map(|(_, dir)| layer_for(dir, profiles))
        .collect();

    if let Some(local) = local
        && !index.is_registered(target)
    {
        layers.push(layer_for(local, profiles));
    }

    layers
}

fn layer_for<'a>(dir: &'a DirConfig, profiles: &'a ProfileSet) -> Layer<'a> {
    let profile = dir.profile.as_deref().and_then(|name| {
        let found = profiles.get(name);
        if found.is_none() {
            tracing::warn!(profile = name, "Directory layer names an unknown profile");
        }
        found
    });
    Layer {
        profile,
        dir: Some(dir),
    }
}

/// One fold step. Returns a new list; never reorders surviving entries.
fn apply_layer(
    names: Vec<String>,
    layer: &Layer<'_>,
    component_type: ComponentType,
    tool: Option<Tool>,
) -> Vec<String> {
    let mut next = names;

    // 1. Profile additions.
    if let Some(profile) = layer.profile {
        for name in profile.additions(component_type) {
            append_if_absent(&mut next, name);
        }
    }

    let Some(dir) = layer.dir else {
        return next;
    };

    // 2/3. Directory enabled, then disabled.
    if let Some(selection) = dir.selection(component_type) {
        for name in selection.enabled() {
            append_if_absent(&mut next, name);
        }
        for name in selection.disabled() {
            next.retain(|existing| existing != name);
        }
    }

    // 4/5. Tool-specific extra, then exclude. Skipped entirely without a tool.
    if let Some(tool) = tool
        && let Some(adjust) = dir.tool_adjust(tool, component_type)
    {
        for name in &adjust.extra {
            append_if_absent(&mut next, name);
        }
        for name in &adjust.exclude {
            next.retain(|existing| existing != name);
        }
    }

    next
}

fn append_if_absent(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}

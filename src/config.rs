//! Configuration documents for hawk-hooks.
//!
//! Defines the global config, reusable profiles, per-directory overrides and
//! the registered-directory index, plus the TOML store that loads them. The
//! resolver and sync engine only ever see these as plain data; all file I/O
//! lives here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::component::ComponentType;
use crate::tool::Tool;

/// Global config file name under the hawk root.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Registered-directory index file name under the hawk root.
pub const DIRS_FILE_NAME: &str = "dirs.toml";

/// Per-project local override file name.
pub const LOCAL_CONFIG_FILE_NAME: &str = ".hawk-hooks.toml";

/// Default hawk root directory name under the user's home.
pub const DEFAULT_ROOT_DIR: &str = ".hawk-hooks";

/// Global configuration: the baseline component lists, per-tool overrides
/// and environment variables exported into generated hook runners.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Enabled component names per type at global scope.
    #[serde(default)]
    pub components: BTreeMap<ComponentType, Vec<String>>,

    /// Per-tool settings, keyed by tool id (aliases accepted).
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSettings>,

    /// Environment variables exported in generated hook runners.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl GlobalConfig {
    /// Settings for a tool, matching config keys through alias
    /// normalization. Absent entries mean defaults.
    pub fn tool_settings(&self, tool: Tool) -> ToolSettings {
        self.tools
            .iter()
            .find(|(key, _)| Tool::from_id(key) == Some(tool))
            .map(|(_, settings)| settings.clone())
            .unwrap_or_default()
    }
}

/// Per-tool enable and destination overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override for the tool's global config directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// A named reusable partial config: additional names per type.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub components: BTreeMap<ComponentType, Vec<String>>,
}

impl Profile {
    /// Additions for one component type.
    pub fn additions(&self, component_type: ComponentType) -> &[String] {
        self.components
            .get(&component_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Per-type selection inside a directory config: either a plain list
/// (shorthand for `{enabled = [...], disabled = []}`) or an explicit delta.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSelection {
    Plain(Vec<String>),
    Delta {
        #[serde(default)]
        enabled: Vec<String>,
        #[serde(default)]
        disabled: Vec<String>,
    },
}

impl TypeSelection {
    pub fn enabled(&self) -> &[String] {
        match self {
            TypeSelection::Plain(names) => names,
            TypeSelection::Delta { enabled, .. } => enabled,
        }
    }

    pub fn disabled(&self) -> &[String] {
        match self {
            TypeSelection::Plain(_) => &[],
            TypeSelection::Delta { disabled, .. } => disabled,
        }
    }
}

/// Per-tool adjustment nested under `tools.<tool>.<type>`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ToolAdjust {
    #[serde(default)]
    pub extra: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One directory's override layer.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DirConfig {
    /// Name of a profile merged into this layer.
    #[serde(default)]
    pub profile: Option<String>,

    /// Per-type selections.
    #[serde(default)]
    pub components: BTreeMap<ComponentType, TypeSelection>,

    /// Per-tool adjustments, keyed by tool id then component type.
    #[serde(default)]
    pub tools: BTreeMap<String, BTreeMap<ComponentType, ToolAdjust>>,
}

impl DirConfig {
    pub fn selection(&self, component_type: ComponentType) -> Option<&TypeSelection> {
        self.components.get(&component_type)
    }

    /// The `{extra, exclude}` adjustment for `(tool, type)`, matching the
    /// tool key through alias normalization.
    pub fn tool_adjust(&self, tool: Tool, component_type: ComponentType) -> Option<&ToolAdjust> {
        self.tools
            .iter()
            .find(|(key, _)| Tool::from_id(key) == Some(tool))
            .and_then(|(_, types)| types.get(&component_type))
    }
}

/// Registered project directories mapped to their override layers.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DirIndex {
    #[serde(default)]
    pub dirs: BTreeMap<PathBuf, DirConfig>,
}

impl DirIndex {
    /// Registered entries that are `target` itself or one of its ancestors,
    /// ordered outermost first.
    pub fn ancestors_of<'a>(&'a self, target: &Path) -> Vec<(&'a Path, &'a DirConfig)> {
        let mut hits: Vec<(&Path, &DirConfig)> = self
            .dirs
            .iter()
            .filter(|(dir, _)| target.starts_with(dir))
            .map(|(dir, config)| (dir.as_path(), config))
            .collect();
        hits.sort_by_key(|(dir, _)| dir.components().count());
        hits
    }

    /// Whether `dir` itself is registered.
    pub fn is_registered(&self, dir: &Path) -> bool {
        self.dirs.contains_key(dir)
    }
}

/// Named profiles loaded from the profiles directory.
pub type ProfileSet = BTreeMap<String, Profile>;

/// Loads every configuration document under one hawk root directory.
///
/// Layout: `<root>/config.toml`, `<root>/dirs.toml`,
/// `<root>/profiles/<name>.toml`, `<root>/registry/<type>/<name>`.
#[derive(Debug)]
pub struct ConfigStore {
    root: PathBuf,
    global: GlobalConfig,
    profiles: ProfileSet,
    dir_index: DirIndex,
}

impl ConfigStore {
    /// Default hawk root: `~/.hawk-hooks`.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_ROOT_DIR)
    }

    /// Load all documents under `root`. Missing files are defaults, not
    /// errors; malformed files fail with context.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        let global = read_toml_or_default::<GlobalConfig>(&root.join(CONFIG_FILE_NAME))?;
        let dir_index = read_toml_or_default::<DirIndex>(&root.join(DIRS_FILE_NAME))?;

        let mut profiles = ProfileSet::new();
        let profiles_dir = root.join("profiles");
        if profiles_dir.is_dir() {
            for entry in fs::read_dir(&profiles_dir).with_context(|| {
                format!("Failed to read profiles dir: {}", profiles_dir.display())
            })? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "toml") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let profile: Profile = read_toml(&path)?;
                profiles.insert(name.to_string(), profile);
            }
        }

        Ok(Self {
            root,
            global,
            profiles,
            dir_index,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registry root under this hawk root.
    pub fn registry_root(&self) -> PathBuf {
        self.root.join("registry")
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn dir_index(&self) -> &DirIndex {
        &self.dir_index
    }
}

/// Load a project directory's local override file, if present.
pub fn load_local_config(project_dir: &Path) -> Result<Option<DirConfig>> {
    let path = project_dir.join(LOCAL_CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_toml(&path)?))
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn read_toml_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_toml(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
            [components]
            skills = ["tdd", "generic"]
            hooks = ["fmt"]

            [tools.claude]
            enabled = true

            [tools.cursor]
            enabled = false
            dir = "/custom/cursor"

            [env]
            HAWK_PROJECT = "demo"
        "#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.components[&ComponentType::Skill],
            vec!["tdd", "generic"]
        );
        assert!(config.tool_settings(Tool::Claude).enabled);
        assert!(!config.tool_settings(Tool::Cursor).enabled);
        assert_eq!(
            config.tool_settings(Tool::Cursor).dir,
            Some(PathBuf::from("/custom/cursor"))
        );
        // Unlisted tools default to enabled.
        assert!(config.tool_settings(Tool::Gemini).enabled);
        assert_eq!(config.env["HAWK_PROJECT"], "demo");
    }

    #[test]
    fn test_tool_settings_matches_aliases() {
        let toml = r#"
            [tools.claude-code]
            enabled = false
        "#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(!config.tool_settings(Tool::Claude).enabled);
    }

    #[test]
    fn test_dir_config_plain_and_delta_forms() {
        let toml = r#"
            profile = "react"

            [components]
            skills = ["extra-skill"]

            [components.hooks]
            enabled = ["fmt"]
            disabled = ["lint"]
        "#;

        let config: DirConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.profile.as_deref(), Some("react"));

        let skills = config.selection(ComponentType::Skill).unwrap();
        assert_eq!(skills.enabled(), ["extra-skill"]);
        assert!(skills.disabled().is_empty());

        let hooks = config.selection(ComponentType::Hook).unwrap();
        assert_eq!(hooks.enabled(), ["fmt"]);
        assert_eq!(hooks.disabled(), ["lint"]);
    }

    #[test]
    fn test_dir_config_tool_overrides() {
        let toml = r#"
            [tools.gemini.skills]
            extra = ["gemini-only"]
            exclude = ["generic"]
        "#;

        let config: DirConfig = toml::from_str(toml).unwrap();
        let adjust = config
            .tool_adjust(Tool::Gemini, ComponentType::Skill)
            .unwrap();
        assert_eq!(adjust.extra, ["gemini-only"]);
        assert_eq!(adjust.exclude, ["generic"]);
        assert!(
            config
                .tool_adjust(Tool::Claude, ComponentType::Skill)
                .is_none()
        );
    }

    #[test]
    fn test_dir_index_ancestors_ordered_outermost_first() {
        let toml = r#"
            [dirs."/work"]
            [dirs."/work/monorepo"]
            profile = "base"
            [dirs."/other"]
        "#;

        let index: DirIndex = toml::from_str(toml).unwrap();
        let chain = index.ancestors_of(Path::new("/work/monorepo/service"));
        let paths: Vec<_> = chain.iter().map(|(p, _)| *p).collect();
        assert_eq!(paths, [Path::new("/work"), Path::new("/work/monorepo")]);
        assert!(index.is_registered(Path::new("/work/monorepo")));
        assert!(!index.is_registered(Path::new("/work/monorepo/service")));
    }

    #[test]
    fn test_store_load_with_profiles() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(DEFAULT_ROOT_DIR);
        fs::create_dir_all(root.join("profiles")).unwrap();
        fs::write(
            root.join(CONFIG_FILE_NAME),
            "[components]\nskills = [\"tdd\"]\n",
        )
        .unwrap();
        fs::write(
            root.join("profiles/react.toml"),
            "[components]\nskills = [\"react\"]\n",
        )
        .unwrap();
        fs::write(
            root.join(DIRS_FILE_NAME),
            "[dirs.\"/work/app\"]\nprofile = \"react\"\n",
        )
        .unwrap();

        let store = ConfigStore::load(&root).unwrap();
        assert_eq!(
            store.global().components[&ComponentType::Skill],
            vec!["tdd"]
        );
        assert_eq!(
            store.profiles()["react"].additions(ComponentType::Skill),
            ["react"]
        );
        assert_eq!(store.dir_index().dirs.len(), 1);
        assert_eq!(store.registry_root(), root.join("registry"));
    }

    #[test]
    fn test_store_load_missing_files_defaults() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::load(temp.path().join("nowhere")).unwrap();
        assert!(store.global().components.is_empty());
        assert!(store.profiles().is_empty());
        assert!(store.dir_index().dirs.is_empty());
    }

    #[test]
    fn test_load_local_config() {
        let temp = TempDir::new().unwrap();
        assert!(load_local_config(temp.path()).unwrap().is_none());

        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE_NAME),
            "[components]\nskills = [\"local\"]\n",
        )
        .unwrap();
        let config = load_local_config(temp.path()).unwrap().unwrap();
        assert_eq!(
            config.selection(ComponentType::Skill).unwrap().enabled(),
            ["local"]
        );
    }
}

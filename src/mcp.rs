//! MCP (Model Context Protocol) configuration merging.
//!
//! Server definitions live in the registry as JSON files; each tool gets
//! them merged into its own config format. Every entry this system writes
//! carries a marker so later merges can tell owned entries from
//! hand-authored ones: owned entries are replaced wholesale, everything else
//! in the file is preserved untouched.
//!
//! Formats: most tools use a single JSON file with a `"hawkManaged": true`
//! key per owned entry. Codex uses TOML tables with `hawk_managed = true`.
//! Gemini validates server object keys, so its entries stay clean and the
//! owned names live in a sidecar file next to `settings.json`.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use toml::{Table as TomlTable, Value as TomlValue};

use crate::component::ComponentType;
use crate::registry::Registry;

/// Marker key stamped on owned entries in JSON configs.
pub const JSON_MARKER_KEY: &str = "hawkManaged";

/// Marker key stamped on owned entries in Codex TOML configs.
pub const TOML_MARKER_KEY: &str = "hawk_managed";

/// Sidecar file naming Gemini's owned entries.
pub const GEMINI_SIDECAR: &str = ".hawk-managed.json";

/// One MCP server definition as stored in the registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct McpServerConfig {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Transport type ("stdio", "http", "sse").
    #[serde(default, rename = "type")]
    pub transport_type: Option<String>,

    #[serde(default)]
    pub disabled: bool,
}

/// Load the resolved MCP server definitions from the registry.
///
/// Returns the parsed servers plus an error string per name that could not
/// be loaded; a bad definition never aborts the rest.
pub fn load_servers(
    registry: &Registry,
    names: &[String],
) -> (BTreeMap<String, McpServerConfig>, Vec<String>) {
    let mut servers = BTreeMap::new();
    let mut errors = Vec::new();

    for name in names {
        match load_one(registry, name) {
            Ok(config) => {
                if !config.disabled {
                    servers.insert(name.clone(), config);
                }
            }
            Err(e) => {
                tracing::error!(server = %name, error = %e, "Failed to load MCP server definition");
                errors.push(format!("mcp/{name}: {e:#}"));
            }
        }
    }

    (servers, errors)
}

fn load_one(registry: &Registry, name: &str) -> Result<McpServerConfig> {
    let path = registry
        .get_path(ComponentType::Mcp, name)?
        .context("not found in registry")?;

    let file = if path.is_dir() {
        // Directory entries keep their definition in server.json.
        path.join("server.json")
    } else {
        path
    };

    let content = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read definition: {}", file.display()))?;
    let config: McpServerConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse definition: {}", file.display()))?;
    Ok(config)
}

// =============================================================================
// JSON value conversion
// =============================================================================

/// Standard JSON shape shared by Claude, Cursor, Antigravity and Gemini.
pub fn server_to_json(config: &McpServerConfig) -> Value {
    let mut obj = Map::new();

    if let Some(ref cmd) = config.command {
        obj.insert("command".to_string(), json!(cmd));
    }
    if !config.args.is_empty() {
        obj.insert("args".to_string(), json!(config.args));
    }
    if !config.env.is_empty() {
        obj.insert("env".to_string(), json!(config.env));
    }
    if let Some(ref url) = config.url {
        obj.insert("url".to_string(), json!(url));
    }
    if !config.headers.is_empty() {
        obj.insert("headers".to_string(), json!(config.headers));
    }
    if let Some(ref transport) = config.transport_type {
        obj.insert("type".to_string(), json!(transport));
    }

    Value::Object(obj)
}

/// OpenCode's shape: `type` local/remote, argv-style `command` array,
/// `environment` map.
pub fn server_to_opencode_json(config: &McpServerConfig) -> Value {
    let mut obj = Map::new();

    if let Some(ref url) = config.url {
        obj.insert("type".to_string(), json!("remote"));
        obj.insert("url".to_string(), json!(url));
        if !config.headers.is_empty() {
            obj.insert("headers".to_string(), json!(config.headers));
        }
    } else {
        obj.insert("type".to_string(), json!("local"));
        let mut command_parts = Vec::new();
        if let Some(ref cmd) = config.command {
            command_parts.push(cmd.clone());
        }
        command_parts.extend(config.args.clone());
        obj.insert("command".to_string(), json!(command_parts));
        if !config.env.is_empty() {
            obj.insert("environment".to_string(), json!(config.env));
        }
    }

    obj.insert("enabled".to_string(), json!(true));
    Value::Object(obj)
}

/// Codex's shape: one TOML table per server.
fn server_to_codex_toml(config: &McpServerConfig) -> TomlValue {
    let mut table = TomlTable::new();

    if let Some(ref cmd) = config.command {
        table.insert("command".to_string(), TomlValue::String(cmd.clone()));
    }
    if !config.args.is_empty() {
        table.insert(
            "args".to_string(),
            TomlValue::Array(config.args.iter().cloned().map(TomlValue::String).collect()),
        );
    }
    if !config.env.is_empty() {
        let mut env_table = TomlTable::new();
        for (k, v) in &config.env {
            env_table.insert(k.clone(), TomlValue::String(v.clone()));
        }
        table.insert("env".to_string(), TomlValue::Table(env_table));
    }
    if let Some(ref url) = config.url {
        table.insert("url".to_string(), TomlValue::String(url.clone()));
    }
    if !config.headers.is_empty() {
        let mut headers_table = TomlTable::new();
        for (k, v) in &config.headers {
            headers_table.insert(k.clone(), TomlValue::String(v.clone()));
        }
        // Codex's MCP schema calls static headers `http_headers`.
        table.insert("http_headers".to_string(), TomlValue::Table(headers_table));
    }

    TomlValue::Table(table)
}

// =============================================================================
// Marker-aware merges
// =============================================================================

/// Merge `servers` into a JSON config at `path` under `wrapper_key`.
///
/// Entries carrying the marker are replaced by the new set; entries without
/// it and unrelated top-level keys survive. `to_value` picks the per-tool
/// entry shape. An absent file is only created when there is something to
/// own. Returns whether the file content changed (or would change, in
/// dry-run mode); an unchanged file is not rewritten.
pub fn merge_marked_json(
    path: &Path,
    wrapper_key: &str,
    servers: &BTreeMap<String, McpServerConfig>,
    to_value: fn(&McpServerConfig) -> Value,
    dry_run: bool,
) -> Result<bool> {
    merge_marked_json_inner(path, wrapper_key, servers, to_value, None, dry_run)
}

/// OpenCode's schema pointer, added when the config lacks one.
pub const OPENCODE_SCHEMA: &str = "https://opencode.ai/config.json";

/// Marked merge into `opencode.json`: servers under the `mcp` key, plus the
/// `$schema` pointer.
pub fn merge_opencode_config(
    path: &Path,
    servers: &BTreeMap<String, McpServerConfig>,
    dry_run: bool,
) -> Result<bool> {
    merge_marked_json_inner(
        path,
        "mcp",
        servers,
        server_to_opencode_json,
        Some(("$schema", OPENCODE_SCHEMA)),
        dry_run,
    )
}

fn merge_marked_json_inner(
    path: &Path,
    wrapper_key: &str,
    servers: &BTreeMap<String, McpServerConfig>,
    to_value: fn(&McpServerConfig) -> Value,
    ensure_key: Option<(&str, &str)>,
    dry_run: bool,
) -> Result<bool> {
    if !path.exists() && servers.is_empty() {
        return Ok(false);
    }

    let mut doc = read_json_doc(path)?;
    let doc_obj = doc
        .as_object_mut()
        .with_context(|| format!("Config is not a JSON object: {}", path.display()))?;

    let existing = doc_obj
        .remove(wrapper_key)
        .and_then(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    let mut entries: Map<String, Value> = existing
        .into_iter()
        .filter(|(_, entry)| {
            entry
                .get(JSON_MARKER_KEY)
                .and_then(Value::as_bool)
                .is_none_or(|owned| !owned)
        })
        .collect();

    for (name, config) in servers {
        let mut value = to_value(config);
        if let Some(obj) = value.as_object_mut() {
            obj.insert(JSON_MARKER_KEY.to_string(), json!(true));
        }
        entries.insert(name.clone(), value);
    }

    doc_obj.insert(wrapper_key.to_string(), Value::Object(entries));
    if let Some((key, value)) = ensure_key
        && !doc_obj.contains_key(key)
    {
        doc_obj.insert(key.to_string(), json!(value));
    }
    write_if_changed(path, &render_json(&doc)?, dry_run)
}

/// Merge `servers` into a Codex `config.toml`. Owned tables carry
/// `hawk_managed = true`; everything else in the document is preserved.
pub fn merge_codex_toml(
    path: &Path,
    servers: &BTreeMap<String, McpServerConfig>,
    dry_run: bool,
) -> Result<bool> {
    if !path.exists() && servers.is_empty() {
        return Ok(false);
    }

    let mut doc = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read existing config: {}", path.display()))?;
        let parsed: TomlValue = toml::from_str(&content)
            .with_context(|| format!("Failed to parse existing config as TOML: {}", path.display()))?;
        parsed.as_table().cloned().unwrap_or_default()
    } else {
        TomlTable::new()
    };

    let existing = doc
        .get("mcp_servers")
        .and_then(|v| v.as_table())
        .cloned()
        .unwrap_or_default();

    let mut entries: TomlTable = existing
        .into_iter()
        .filter(|(_, entry)| {
            entry
                .get(TOML_MARKER_KEY)
                .and_then(TomlValue::as_bool)
                .is_none_or(|owned| !owned)
        })
        .collect();

    for (name, config) in servers {
        let mut value = server_to_codex_toml(config);
        if let Some(table) = value.as_table_mut() {
            table.insert(TOML_MARKER_KEY.to_string(), TomlValue::Boolean(true));
        }
        entries.insert(name.clone(), value);
    }

    doc.insert("mcp_servers".to_string(), TomlValue::Table(entries));

    let rendered = toml::to_string_pretty(&TomlValue::Table(doc))
        .context("Failed to serialize Codex config")?;
    write_if_changed(path, &rendered, dry_run)
}

/// Merge `servers` into Gemini's `settings.json`, tracking ownership in the
/// sidecar file instead of per-entry markers.
pub fn merge_gemini_settings(
    settings_path: &Path,
    sidecar_path: &Path,
    servers: &BTreeMap<String, McpServerConfig>,
    dry_run: bool,
) -> Result<bool> {
    if !settings_path.exists() && servers.is_empty() {
        return Ok(false);
    }

    let previously_owned: Vec<String> = if sidecar_path.exists() {
        let content = fs::read_to_string(sidecar_path)
            .with_context(|| format!("Failed to read sidecar: {}", sidecar_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sidecar: {}", sidecar_path.display()))?
    } else {
        Vec::new()
    };

    let mut doc = read_json_doc(settings_path)?;
    let doc_obj = doc
        .as_object_mut()
        .with_context(|| format!("Config is not a JSON object: {}", settings_path.display()))?;

    let existing = doc_obj
        .remove("mcpServers")
        .and_then(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    let mut entries: Map<String, Value> = existing
        .into_iter()
        .filter(|(name, _)| !previously_owned.contains(name))
        .collect();

    for (name, config) in servers {
        let mut value = server_to_json(config);
        if let Some(obj) = value.as_object_mut() {
            // Gemini requires trust: true for non-interactive execution.
            obj.insert("trust".to_string(), json!(true));
        }
        entries.insert(name.clone(), value);
    }

    doc_obj.insert("mcpServers".to_string(), Value::Object(entries));
    let settings_changed = write_if_changed(settings_path, &render_json(&doc)?, dry_run)?;

    let owned_names: Vec<&String> = servers.keys().collect();
    let sidecar_changed = if owned_names.is_empty() && !sidecar_path.exists() {
        false
    } else {
        let sidecar =
            serde_json::to_string_pretty(&owned_names).context("Failed to serialize sidecar")?;
        write_if_changed(sidecar_path, &sidecar, dry_run)?
    };

    Ok(settings_changed || sidecar_changed)
}

fn read_json_doc(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read existing config: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse existing config as JSON: {}", path.display()))
}

fn render_json(doc: &Value) -> Result<String> {
    let rendered =
        serde_json::to_string_pretty(doc).context("Failed to serialize merged config")?;
    Ok(format!("{rendered}\n"))
}

/// Write `content` unless the file already holds it. Dry-run mode only
/// reports whether a write would happen.
fn write_if_changed(path: &Path, content: &str, dry_run: bool) -> Result<bool> {
    if path.exists() {
        let existing = fs::read_to_string(path)
            .with_context(|| format!("Failed to read existing config: {}", path.display()))?;
        if existing == content {
            return Ok(false);
        }
    }

    if dry_run {
        return Ok(true);
    }

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_server() -> McpServerConfig {
        McpServerConfig {
            command: Some("npx".to_string()),
            args: vec![
                "-y".to_string(),
                "@modelcontextprotocol/server-filesystem".to_string(),
                ".".to_string(),
            ],
            ..Default::default()
        }
    }

    fn servers_with(name: &str) -> BTreeMap<String, McpServerConfig> {
        BTreeMap::from([(name.to_string(), test_server())])
    }

    // ==========================================================================
    // LOAD TESTS
    // ==========================================================================

    #[test]
    fn test_load_servers_from_registry() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new(temp.path().join("registry"));
        let def = temp.path().join("github.json");
        fs::write(&def, r#"{"command": "gh-mcp", "args": ["serve"]}"#).unwrap();
        registry.add(ComponentType::Mcp, "github", &def).unwrap();

        let (servers, errors) = load_servers(&registry, &["github".to_string()]);
        assert!(errors.is_empty());
        assert_eq!(servers["github"].command.as_deref(), Some("gh-mcp"));
        assert_eq!(servers["github"].args, ["serve"]);
    }

    #[test]
    fn test_load_servers_collects_errors_per_name() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new(temp.path().join("registry"));
        let good = temp.path().join("good.json");
        fs::write(&good, r#"{"command": "ok"}"#).unwrap();
        registry.add(ComponentType::Mcp, "good", &good).unwrap();

        let (servers, errors) =
            load_servers(&registry, &["good".to_string(), "missing".to_string()]);
        assert_eq!(servers.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("mcp/missing"));
    }

    #[test]
    fn test_load_servers_skips_disabled() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new(temp.path().join("registry"));
        let def = temp.path().join("off.json");
        fs::write(&def, r#"{"command": "x", "disabled": true}"#).unwrap();
        registry.add(ComponentType::Mcp, "off", &def).unwrap();

        let (servers, errors) = load_servers(&registry, &["off".to_string()]);
        assert!(servers.is_empty());
        assert!(errors.is_empty());
    }

    // ==========================================================================
    // MARKED JSON MERGE TESTS
    // ==========================================================================

    #[test]
    fn test_merge_marked_json_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");

        merge_marked_json(
            &path,
            "mcpServers",
            &servers_with("filesystem"),
            server_to_json,
            false,
        )
        .unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &doc["mcpServers"]["filesystem"];
        assert_eq!(entry["command"], "npx");
        assert_eq!(entry[JSON_MARKER_KEY], true);
    }

    #[test]
    fn test_merge_marked_json_preserves_hand_authored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");
        fs::write(
            &path,
            r#"{
                "otherSetting": "keep",
                "mcpServers": {
                    "mine": {"command": "hand-written"}
                }
            }"#,
        )
        .unwrap();

        merge_marked_json(
            &path,
            "mcpServers",
            &servers_with("filesystem"),
            server_to_json,
            false,
        )
        .unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["otherSetting"], "keep");
        assert_eq!(doc["mcpServers"]["mine"]["command"], "hand-written");
        assert!(doc["mcpServers"]["mine"].get(JSON_MARKER_KEY).is_none());
        assert!(doc["mcpServers"]["filesystem"].is_object());
    }

    #[test]
    fn test_merge_marked_json_replaces_owned_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");

        merge_marked_json(
            &path,
            "mcpServers",
            &servers_with("old-server"),
            server_to_json,
            false,
        )
        .unwrap();
        merge_marked_json(
            &path,
            "mcpServers",
            &servers_with("new-server"),
            server_to_json,
            false,
        )
        .unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(doc["mcpServers"].get("old-server").is_none());
        assert!(doc["mcpServers"]["new-server"].is_object());
    }

    #[test]
    fn test_merge_marked_json_empty_set_removes_owned_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");
        fs::write(
            &path,
            r#"{"mcpServers": {"mine": {"command": "hand-written"}}}"#,
        )
        .unwrap();

        merge_marked_json(&path, "mcpServers", &servers_with("owned"), server_to_json, false)
            .unwrap();
        merge_marked_json(&path, "mcpServers", &BTreeMap::new(), server_to_json, false).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(doc["mcpServers"]["mine"].is_object());
        assert!(doc["mcpServers"].get("owned").is_none());
    }

    #[test]
    fn test_merge_marked_json_absent_file_empty_set_is_noop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");

        merge_marked_json(&path, "mcpServers", &BTreeMap::new(), server_to_json, false).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_merge_marked_json_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");
        let servers = servers_with("filesystem");

        let first =
            merge_marked_json(&path, "mcpServers", &servers, server_to_json, false).unwrap();
        let second =
            merge_marked_json(&path, "mcpServers", &servers, server_to_json, false).unwrap();
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn test_merge_marked_json_dry_run_reports_without_writing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");

        let would_change =
            merge_marked_json(&path, "mcpServers", &servers_with("x"), server_to_json, true)
                .unwrap();
        assert!(would_change);
        assert!(!path.exists());
    }

    #[test]
    fn test_merge_opencode_adds_schema() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("opencode.json");

        merge_opencode_config(&path, &servers_with("filesystem"), false).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["$schema"], OPENCODE_SCHEMA);
        assert_eq!(doc["mcp"]["filesystem"]["type"], "local");
        assert_eq!(doc["mcp"]["filesystem"][JSON_MARKER_KEY], true);
    }

    #[test]
    fn test_opencode_shape() {
        let value = server_to_opencode_json(&test_server());
        assert_eq!(value["type"], "local");
        let command = value["command"].as_array().unwrap();
        assert_eq!(command[0], "npx");
        assert_eq!(command.len(), 4);
        assert_eq!(value["enabled"], true);

        let remote = server_to_opencode_json(&McpServerConfig {
            url: Some("https://example.com/mcp".to_string()),
            ..Default::default()
        });
        assert_eq!(remote["type"], "remote");
        assert_eq!(remote["url"], "https://example.com/mcp");
    }

    // ==========================================================================
    // CODEX TOML MERGE TESTS
    // ==========================================================================

    #[test]
    fn test_merge_codex_toml_marks_and_preserves() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "model = \"gpt-5-codex\"\n\n[mcp_servers.mine]\ncommand = \"hand-written\"\n",
        )
        .unwrap();

        merge_codex_toml(&path, &servers_with("filesystem"), false).unwrap();

        let parsed: TomlValue = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let table = parsed.as_table().unwrap();
        assert_eq!(table["model"].as_str().unwrap(), "gpt-5-codex");

        let entries = table["mcp_servers"].as_table().unwrap();
        assert!(entries["mine"].as_table().unwrap().get(TOML_MARKER_KEY).is_none());
        let owned = entries["filesystem"].as_table().unwrap();
        assert_eq!(owned["command"].as_str().unwrap(), "npx");
        assert!(owned[TOML_MARKER_KEY].as_bool().unwrap());
    }

    #[test]
    fn test_merge_codex_toml_replaces_owned() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        merge_codex_toml(&path, &servers_with("old"), false).unwrap();
        merge_codex_toml(&path, &servers_with("new"), false).unwrap();

        let parsed: TomlValue = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entries = parsed.as_table().unwrap()["mcp_servers"].as_table().unwrap();
        assert!(entries.get("old").is_none());
        assert!(entries.get("new").is_some());
    }

    #[test]
    fn test_codex_uses_http_headers() {
        let config = McpServerConfig {
            url: Some("https://example.com/mcp".to_string()),
            headers: BTreeMap::from([("Authorization".to_string(), "Bearer t".to_string())]),
            transport_type: Some("http".to_string()),
            ..Default::default()
        };
        let value = server_to_codex_toml(&config);
        let table = value.as_table().unwrap();
        assert!(table.get("http_headers").is_some());
        assert!(table.get("headers").is_none());
        assert!(table.get("type").is_none());
    }

    // ==========================================================================
    // GEMINI SIDECAR TESTS
    // ==========================================================================

    #[test]
    fn test_gemini_merge_uses_sidecar_for_ownership() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        let sidecar = temp.path().join(GEMINI_SIDECAR);
        fs::write(
            &settings,
            r#"{"theme": "dark", "mcpServers": {"mine": {"command": "hand-written"}}}"#,
        )
        .unwrap();

        merge_gemini_settings(&settings, &sidecar, &servers_with("owned"), false).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["mcpServers"]["mine"]["command"], "hand-written");
        assert_eq!(doc["mcpServers"]["owned"]["trust"], true);
        // No per-entry marker: ownership lives in the sidecar.
        assert!(doc["mcpServers"]["owned"].get(JSON_MARKER_KEY).is_none());

        let owned: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
        assert_eq!(owned, ["owned"]);
    }

    #[test]
    fn test_gemini_merge_replaces_previously_owned() {
        let temp = TempDir::new().unwrap();
        let settings = temp.path().join("settings.json");
        let sidecar = temp.path().join(GEMINI_SIDECAR);

        merge_gemini_settings(&settings, &sidecar, &servers_with("old"), false).unwrap();
        merge_gemini_settings(&settings, &sidecar, &servers_with("new"), false).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
        assert!(doc["mcpServers"].get("old").is_none());
        assert!(doc["mcpServers"]["new"].is_object());

        let owned: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
        assert_eq!(owned, ["new"]);
    }
}

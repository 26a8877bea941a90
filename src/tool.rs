//! Supported AI coding-assistant tools.
//!
//! Each tool has a global config directory, a per-project config directory,
//! and a hook-support flag. Alias handling is centralized here so CLI
//! parsing, sync filtering, and reporting stay consistent.

use std::path::{Path, PathBuf};

use crate::component::ComponentType;

/// Whether a tool can run arbitrary hook scripts itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSupport {
    /// The tool invokes hook scripts natively; we generate runner shims.
    Native,
    /// The tool has no hook mechanism; hook components are skipped with an
    /// error entry.
    Unsupported,
}

/// Known tool identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    /// Claude Code (`.claude/`)
    Claude,
    /// Gemini CLI (`.gemini/`)
    Gemini,
    /// OpenAI Codex CLI (`.codex/`)
    Codex,
    /// OpenCode (`.opencode/`)
    OpenCode,
    /// Cursor (`.cursor/`)
    Cursor,
    /// Antigravity (`.antigravity/`)
    Antigravity,
}

impl Tool {
    /// All supported tools.
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Claude,
            Tool::Gemini,
            Tool::Codex,
            Tool::OpenCode,
            Tool::Cursor,
            Tool::Antigravity,
        ]
    }

    /// Canonical identifier string (used in config and reports).
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Claude => "claude",
            Tool::Gemini => "gemini",
            Tool::Codex => "codex",
            Tool::OpenCode => "opencode",
            Tool::Cursor => "cursor",
            Tool::Antigravity => "antigravity",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Claude => "Claude Code",
            Tool::Gemini => "Gemini CLI",
            Tool::Codex => "OpenAI Codex CLI",
            Tool::OpenCode => "OpenCode",
            Tool::Cursor => "Cursor",
            Tool::Antigravity => "Antigravity",
        }
    }

    /// Parse a user-provided tool identifier, accepting known aliases.
    pub fn from_id(id: &str) -> Option<Tool> {
        let canonical = if id.eq_ignore_ascii_case("claude")
            || id.eq_ignore_ascii_case("claude-code")
            || id.eq_ignore_ascii_case("claude_code")
        {
            "claude"
        } else if id.eq_ignore_ascii_case("gemini")
            || id.eq_ignore_ascii_case("gemini-cli")
            || id.eq_ignore_ascii_case("gemini_cli")
        {
            "gemini"
        } else if id.eq_ignore_ascii_case("codex")
            || id.eq_ignore_ascii_case("codex-cli")
            || id.eq_ignore_ascii_case("codex_cli")
        {
            "codex"
        } else if id.eq_ignore_ascii_case("opencode")
            || id.eq_ignore_ascii_case("open-code")
            || id.eq_ignore_ascii_case("open_code")
        {
            "opencode"
        } else if id.eq_ignore_ascii_case("cursor") {
            "cursor"
        } else if id.eq_ignore_ascii_case("antigravity") {
            "antigravity"
        } else {
            return None;
        };

        match canonical {
            "claude" => Some(Tool::Claude),
            "gemini" => Some(Tool::Gemini),
            "codex" => Some(Tool::Codex),
            "opencode" => Some(Tool::OpenCode),
            "cursor" => Some(Tool::Cursor),
            "antigravity" => Some(Tool::Antigravity),
            _ => None,
        }
    }

    /// Whether the tool runs hook scripts natively.
    pub fn hook_support(&self) -> HookSupport {
        match self {
            Tool::Claude | Tool::Gemini => HookSupport::Native,
            Tool::Codex | Tool::OpenCode | Tool::Cursor | Tool::Antigravity => {
                HookSupport::Unsupported
            }
        }
    }

    /// Name of the tool's config directory (both global and per-project).
    pub fn dir_name(&self) -> &'static str {
        match self {
            Tool::Claude => ".claude",
            Tool::Gemini => ".gemini",
            Tool::Codex => ".codex",
            Tool::OpenCode => ".opencode",
            Tool::Cursor => ".cursor",
            Tool::Antigravity => ".antigravity",
        }
    }

    /// Global config directory, under the user's home.
    pub fn global_dir(&self) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(self.dir_name())
    }

    /// Per-project config directory.
    pub fn project_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.dir_name())
    }

    /// Subdirectory for a component type inside the tool dir, or `None`
    /// when the tool has no native home for that type (`Mcp` is always
    /// `None` here: it goes through config-file merging, not symlinks).
    pub fn component_dir(&self, component_type: ComponentType) -> Option<&'static str> {
        match component_type {
            ComponentType::Skill => Some("skills"),
            ComponentType::Hook => Some("hooks"),
            ComponentType::Command => Some("commands"),
            ComponentType::Agent => Some("agents"),
            ComponentType::Mcp => None,
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

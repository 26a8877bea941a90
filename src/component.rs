//! Component kinds managed by the registry.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// The closed set of component types hawk-hooks manages.
///
/// `Command` covers both the `commands` and legacy `prompts` config keys;
/// they name the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentType {
    Skill,
    Hook,
    Command,
    Agent,
    Mcp,
}

impl ComponentType {
    /// All component types, in display order.
    pub fn all() -> &'static [ComponentType] {
        &[
            ComponentType::Skill,
            ComponentType::Hook,
            ComponentType::Command,
            ComponentType::Agent,
            ComponentType::Mcp,
        ]
    }

    /// Subdirectory name under the registry root.
    pub fn registry_dir(&self) -> &'static str {
        match self {
            ComponentType::Skill => "skills",
            ComponentType::Hook => "hooks",
            ComponentType::Command => "commands",
            ComponentType::Agent => "agents",
            ComponentType::Mcp => "mcp",
        }
    }

    /// Key used for this type in config documents.
    pub fn config_key(&self) -> &'static str {
        self.registry_dir()
    }

    /// Human-readable singular label.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::Skill => "skill",
            ComponentType::Hook => "hook",
            ComponentType::Command => "command",
            ComponentType::Agent => "agent",
            ComponentType::Mcp => "mcp",
        }
    }

    /// Parse a user-provided type name. Accepts singular and plural forms
    /// plus the legacy `prompt`/`prompts` aliases for commands.
    pub fn from_key(key: &str) -> Option<ComponentType> {
        match key.to_ascii_lowercase().as_str() {
            "skill" | "skills" => Some(ComponentType::Skill),
            "hook" | "hooks" => Some(ComponentType::Hook),
            "command" | "commands" | "prompt" | "prompts" => Some(ComponentType::Command),
            "agent" | "agents" => Some(ComponentType::Agent),
            "mcp" => Some(ComponentType::Mcp),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ComponentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.config_key())
    }
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        ComponentType::from_key(&key).ok_or_else(|| {
            de::Error::custom(format!(
                "unknown component type {key:?} (expected one of: skills, hooks, commands, agents, mcp)"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_accepts_aliases() {
        assert_eq!(ComponentType::from_key("skills"), Some(ComponentType::Skill));
        assert_eq!(ComponentType::from_key("skill"), Some(ComponentType::Skill));
        assert_eq!(ComponentType::from_key("HOOKS"), Some(ComponentType::Hook));
        assert_eq!(
            ComponentType::from_key("prompts"),
            Some(ComponentType::Command)
        );
        assert_eq!(
            ComponentType::from_key("prompt"),
            Some(ComponentType::Command)
        );
        assert_eq!(ComponentType::from_key("mcp"), Some(ComponentType::Mcp));
        assert_eq!(ComponentType::from_key("unknown"), None);
    }

    #[test]
    fn test_deserializes_from_config_keys() {
        use std::collections::BTreeMap;

        let doc: BTreeMap<ComponentType, Vec<String>> =
            toml::from_str("skills = [\"tdd\"]\nprompts = [\"review\"]").unwrap();
        assert_eq!(doc[&ComponentType::Skill], vec!["tdd"]);
        assert_eq!(doc[&ComponentType::Command], vec!["review"]);
    }

    #[test]
    fn test_registry_dirs_are_distinct() {
        let mut dirs: Vec<_> = ComponentType::all()
            .iter()
            .map(|t| t.registry_dir())
            .collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), ComponentType::all().len());
    }
}

//! On-disk component registry.
//!
//! The registry is the single source of truth: one file or directory tree
//! per `(type, name)` pair under `<root>/<type dir>/<name>`. Every operation
//! routes through the same name validator so a malformed name fails
//! identically everywhere.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::component::ComponentType;

/// Errors produced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid component name {name:?}: {rule}")]
    InvalidName { name: String, rule: &'static str },

    #[error("{component_type} {name:?} already exists in the registry")]
    DuplicateEntry {
        component_type: ComponentType,
        name: String,
    },

    #[error("source does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Validate a component name as a single safe path segment.
///
/// Rejected names: empty, containing a path separator or `..`
/// ("path traversal"), or starting with `.` ("hidden").
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            rule: "empty",
        });
    }
    if name == ".." || name.contains('/') || name.contains('\\') {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            rule: "path traversal",
        });
    }
    if name.starts_with('.') {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            rule: "hidden",
        });
    }
    Ok(())
}

/// Filesystem-backed component registry.
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Registry root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn type_dir(&self, component_type: ComponentType) -> PathBuf {
        self.root.join(component_type.registry_dir())
    }

    fn entry_path(&self, component_type: ComponentType, name: &str) -> PathBuf {
        self.type_dir(component_type).join(name)
    }

    /// Copy `source` (file or directory tree) into the registry as
    /// `(component_type, name)` and return the destination path.
    ///
    /// Fails if the name is invalid, the source is missing, or the entry
    /// already exists; callers must `remove` first to replace.
    pub fn add(
        &self,
        component_type: ComponentType,
        name: &str,
        source: &Path,
    ) -> Result<PathBuf> {
        validate_name(name)?;

        if !source.exists() {
            return Err(RegistryError::MissingSource(source.to_path_buf()));
        }
        if self.entry_path(component_type, name).exists() {
            return Err(RegistryError::DuplicateEntry {
                component_type,
                name: name.to_string(),
            });
        }

        let type_dir = self.type_dir(component_type);
        fs::create_dir_all(&type_dir).map_err(|e| RegistryError::Io {
            action: "create directory",
            path: type_dir.clone(),
            source: e,
        })?;

        let dest = self.entry_path(component_type, name);
        if source.is_dir() {
            copy_tree(source, &dest)?;
        } else {
            fs::copy(source, &dest).map_err(|e| RegistryError::Io {
                action: "copy",
                path: dest.clone(),
                source: e,
            })?;
        }

        tracing::debug!(component_type = %component_type, name, dest = %dest.display(), "Added registry entry");
        Ok(dest)
    }

    /// Delete the entry, returning whether anything was removed.
    /// Absence is a normal `false`, not an error.
    pub fn remove(&self, component_type: ComponentType, name: &str) -> Result<bool> {
        validate_name(name)?;

        let path = self.entry_path(component_type, name);
        if !path.exists() && !path.is_symlink() {
            return Ok(false);
        }

        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| RegistryError::Io {
                action: "remove",
                path: path.clone(),
                source: e,
            })?;
        } else {
            fs::remove_file(&path).map_err(|e| RegistryError::Io {
                action: "remove",
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(true)
    }

    /// Whether an entry exists for `(component_type, name)`.
    pub fn has(&self, component_type: ComponentType, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.entry_path(component_type, name).exists())
    }

    /// Path of an existing entry, or `None` if absent.
    pub fn get_path(&self, component_type: ComponentType, name: &str) -> Result<Option<PathBuf>> {
        validate_name(name)?;
        let path = self.entry_path(component_type, name);
        Ok(path.exists().then_some(path))
    }

    /// Whether adding `(component_type, name)` would collide with an
    /// existing entry.
    pub fn detect_clash(&self, component_type: ComponentType, name: &str) -> Result<bool> {
        self.has(component_type, name)
    }

    /// Every type (or one, if given) mapped to its sorted member names.
    pub fn list(
        &self,
        component_type: Option<ComponentType>,
    ) -> Result<BTreeMap<ComponentType, Vec<String>>> {
        let types: Vec<ComponentType> = match component_type {
            Some(t) => vec![t],
            None => ComponentType::all().to_vec(),
        };

        let mut out = BTreeMap::new();
        for ty in types {
            let dir = self.type_dir(ty);
            let mut names = Vec::new();
            if dir.is_dir() {
                let entries = fs::read_dir(&dir).map_err(|e| RegistryError::Io {
                    action: "read directory",
                    path: dir.clone(),
                    source: e,
                })?;
                for entry in entries {
                    let entry = entry.map_err(|e| RegistryError::Io {
                        action: "read directory",
                        path: dir.clone(),
                        source: e,
                    })?;
                    let name = entry.file_name().to_string_lossy().into_owned();
                    // Entries written by hand with unsafe names are ignored
                    // rather than surfaced through list().
                    if validate_name(&name).is_ok() {
                        names.push(name);
                    }
                }
            }
            names.sort();
            out.insert(ty, names);
        }
        Ok(out)
    }

    /// Flattened `(type, name)` pairs, ordered by type then name.
    pub fn list_flat(&self) -> Result<Vec<(ComponentType, String)>> {
        let mut out = Vec::new();
        for (ty, names) in self.list(None)? {
            for name in names {
                out.push((ty, name));
            }
        }
        Ok(out)
    }
}

/// Copy a directory tree, preserving symbolic links.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| RegistryError::Io {
        action: "create directory",
        path: dst.to_path_buf(),
        source: e,
    })?;

    let entries = fs::read_dir(src).map_err(|e| RegistryError::Io {
        action: "read directory",
        path: src.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| RegistryError::Io {
            action: "read directory",
            path: src.to_path_buf(),
            source: e,
        })?;
        let ty = entry.file_type().map_err(|e| RegistryError::Io {
            action: "stat",
            path: entry.path(),
            source: e,
        })?;
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_tree(&entry.path(), &dst_path)?;
        } else if ty.is_symlink() {
            let target = fs::read_link(entry.path()).map_err(|e| RegistryError::Io {
                action: "read link",
                path: entry.path(),
                source: e,
            })?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dst_path).map_err(|e| RegistryError::Io {
                action: "create symlink",
                path: dst_path.clone(),
                source: e,
            })?;
            #[cfg(windows)]
            {
                let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
                let result = if is_dir {
                    std::os::windows::fs::symlink_dir(&target, &dst_path)
                } else {
                    std::os::windows::fs::symlink_file(&target, &dst_path)
                };
                result.map_err(|e| RegistryError::Io {
                    action: "create symlink",
                    path: dst_path.clone(),
                    source: e,
                })?;
            }
        } else {
            fs::copy(entry.path(), &dst_path).map_err(|e| RegistryError::Io {
                action: "copy",
                path: dst_path.clone(),
                source: e,
            })?;
        }
    }
    Ok(())
}

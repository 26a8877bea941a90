//! hawk-hooks - declarative component sync for AI coding assistants
//!
//! Components (skills, hooks, commands, agents, MCP server definitions) are
//! authored once in a central registry. Per tool and per project directory,
//! layered configuration resolves which components apply, and the sync
//! engine reconciles each tool's config directory against that result with
//! symlinks and generated files.

pub mod adapter;
pub mod component;
pub mod config;
pub mod hook_runner;
pub mod managed;
pub mod mcp;
pub mod registry;
pub mod resolver;
pub mod sync;
pub mod tool;

pub use adapter::{Adapter, SyncResult, adapter_for};
pub use component::ComponentType;
pub use config::{ConfigStore, DirConfig, DirIndex, GlobalConfig, Profile, ProfileSet};
pub use registry::{Registry, RegistryError};
pub use resolver::{ResolvedSet, resolve};
pub use sync::{SyncEngine, format_sync_results};
pub use tool::{HookSupport, Tool};

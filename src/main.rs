//! hawk CLI
//!
//! Command-line interface over the registry, resolver and sync engine.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::PathBuf;

use hawk_hooks::{
    ComponentType, ConfigStore, Registry, SyncEngine, Tool, adapter, config, sync,
};

#[derive(Parser)]
#[command(name = "hawk")]
#[command(
    author,
    version,
    about = "Sync AI coding-assistant components from one source of truth"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Hawk root directory (default: ~/.hawk-hooks)
    #[arg(long, env = "HAWK_HOOKS_ROOT", global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the resolved component set to tool config directories
    Sync {
        /// Project directory to sync (default: the global scope)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Filter to specific tools (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tools: Option<Vec<String>>,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Copy a component into the registry
    Add {
        /// Component type (skill, hook, command, agent, mcp)
        component_type: String,
        /// Component name
        name: String,
        /// Source file or directory to copy
        source: PathBuf,
    },

    /// Delete a component from the registry
    Remove {
        component_type: String,
        name: String,
    },

    /// List registry contents
    List {
        component_type: Option<String>,
    },

    /// Show resolved components and link drift per tool
    Status {
        /// Project directory (default: the global scope)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Filter to specific tools (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tools: Option<Vec<String>>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(ConfigStore::default_root);
    let store = ConfigStore::load(&root)?;
    let registry = Registry::new(store.registry_root());

    match cli.command {
        Commands::Sync {
            project,
            tools,
            dry_run,
        } => {
            let tools = parse_tools(tools)?;
            let engine = SyncEngine::new(
                &registry,
                store.global(),
                store.profiles(),
                store.dir_index(),
            );

            if dry_run {
                println!("{}", "Running in dry-run mode\n".cyan());
            }

            let results = match project {
                Some(project) => {
                    let project = absolutize(project)?;
                    let local = config::load_local_config(&project)?;
                    println!(
                        "{} {}",
                        "➤ Syncing project".cyan().bold(),
                        project.display()
                    );
                    engine.sync_directory(&project, &tools, local.as_ref(), dry_run)
                }
                None => {
                    println!("{}", "➤ Syncing global scope".cyan().bold());
                    engine.sync_global(&tools, dry_run)
                }
            };

            print!("{}", sync::format_sync_results(&results));

            let errors: usize = results.values().map(|r| r.errors.len()).sum();
            if errors > 0 {
                bail!("sync finished with {errors} error(s)");
            }
        }

        Commands::Add {
            component_type,
            name,
            source,
        } => {
            let ty = parse_type(&component_type)?;
            let dest = registry.add(ty, &name, &source)?;
            println!(
                "  {} Added {} {} -> {}",
                "✔".green(),
                ty,
                name.bold(),
                dest.display()
            );
        }

        Commands::Remove {
            component_type,
            name,
        } => {
            let ty = parse_type(&component_type)?;
            if registry.remove(ty, &name)? {
                println!("  {} Removed {} {}", "✔".green(), ty, name.bold());
            } else {
                println!("  {} No {} named {}", "○".yellow(), ty, name.bold());
            }
        }

        Commands::List { component_type } => {
            let filter = component_type.as_deref().map(parse_type).transpose()?;
            let listing = registry.list(filter)?;
            for (ty, names) in &listing {
                if names.is_empty() && filter.is_none() {
                    continue;
                }
                println!("{}", ty.registry_dir().bold());
                for name in names {
                    println!("  {name}");
                }
            }
        }

        Commands::Status { project, tools } => {
            let tools = parse_tools(tools)?;
            let engine = SyncEngine::new(
                &registry,
                store.global(),
                store.profiles(),
                store.dir_index(),
            );

            for tool in tools {
                if !store.global().tool_settings(tool).enabled {
                    println!("{}: disabled", tool.id());
                    continue;
                }

                let (resolved, target) = match &project {
                    Some(project) => {
                        let project = absolutize(project.clone())?;
                        let local = config::load_local_config(&project)?;
                        let resolved = engine.resolve_directory(&project, tool, local.as_ref());
                        (resolved, adapter::adapter_for(tool).project_dir(&project))
                    }
                    None => {
                        let settings = store.global().tool_settings(tool);
                        let target = settings
                            .dir
                            .unwrap_or_else(|| adapter::adapter_for(tool).global_dir());
                        (engine.resolve_global(), target)
                    }
                };

                let desired = adapter::linkable_set(tool, &resolved);
                let observed = adapter::observe_links(tool, &target, &registry);
                let state = if observed.content_hash() == desired.content_hash() {
                    "in sync".green()
                } else {
                    "drift".yellow()
                };

                let counts: Vec<String> = resolved
                    .iter()
                    .map(|(ty, names)| format!("{} {}", names.len(), ty.registry_dir()))
                    .collect();
                println!(
                    "{}: {} [{}]",
                    tool.id(),
                    if counts.is_empty() {
                        "nothing resolved".to_string()
                    } else {
                        counts.join(", ")
                    },
                    state
                );
            }
        }
    }

    Ok(())
}

fn parse_type(key: &str) -> Result<ComponentType> {
    ComponentType::from_key(key)
        .ok_or_else(|| anyhow::anyhow!("unknown component type: {key} (expected skill, hook, command, agent or mcp)"))
}

fn parse_tools(filter: Option<Vec<String>>) -> Result<Vec<Tool>> {
    match filter {
        None => Ok(Tool::all().to_vec()),
        Some(ids) => ids
            .iter()
            .map(|id| {
                Tool::from_id(id).ok_or_else(|| anyhow::anyhow!("unknown tool: {id}"))
            })
            .collect(),
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

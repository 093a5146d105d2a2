use std::{collections::BTreeMap, fs, io, path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use serenity::all::Permissions;
use thiserror::Error;
use tracing::{info, warn};

use crate::bot::commands::commands::{CommandDefinition, CommandSpec, FlagSpec, GateCheck, HandlerTable, PreconditionTable, SubcommandDefinition};

pub const MANIFEST_EXTENSION: &str = "toml";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("category `{0}` does not exist")]
    UnknownCategory(String),
}

/// On-disk description of one command or subcommand.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandManifest {
    name: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    description: String,
    usage: Option<String>,
    #[serde(default)]
    required_args: usize,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    guild_only: bool,
    #[serde(default)]
    protected: bool,
    #[serde(default)]
    member_permissions: Vec<String>,
    #[serde(default)]
    bot_permissions: Vec<String>,
    precondition: Option<String>,
    /// Seconds.
    #[serde(default)]
    cooldown: u64,
    #[serde(default)]
    flags: Vec<FlagSpec>,
    gate_order: Option<Vec<GateCheck>>,
    handler: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// Per-category outcome of a load: what parsed, and what was skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub categories: BTreeMap<String, Vec<CommandDefinition>>,
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    pub fn command_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Reads `<root>/<category>/<command>.toml` manifests, plus
/// `<root>/<category>/<command>/<sub>.toml` for subcommands, and binds them to
/// compiled handlers.
pub struct CommandLoader {
    root: PathBuf,
    handlers: HandlerTable,
    preconditions: PreconditionTable,
}

impl CommandLoader {
    pub fn new(root: impl Into<PathBuf>, handlers: HandlerTable, preconditions: PreconditionTable) -> Self {
        Self { root: root.into(), handlers, preconditions }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_names(&self) -> Result<Vec<String>, LoadError> {
        let mut names = Vec::new();
        for entry in read_dir(&self.root)? {
            if entry.is_dir() {
                if let Some(name) = file_name(&entry) {
                    names.push(name.to_lowercase());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load_all(&self) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();
        for category in self.category_names()? {
            match self.load_category(&category) {
                Ok((definitions, failures)) => {
                    report.failures.extend(failures);
                    report.categories.insert(category, definitions);
                }
                Err(e) => report.failures.push(e),
            }
        }
        info!("Loaded {} commands from {}", report.command_count(), self.root.display());
        Ok(report)
    }

    /// Loads one category. A bad file is reported in the returned failures and
    /// its siblings still load.
    pub fn load_category(&self, category: &str) -> Result<(Vec<CommandDefinition>, Vec<LoadError>), LoadError> {
        let category = category.to_lowercase();
        let dir = self.root.join(&category);
        if !dir.is_dir() {
            return Err(LoadError::UnknownCategory(category));
        }

        let mut failures = Vec::new();
        let mut commands: BTreeMap<String, CommandDefinition> = BTreeMap::new();
        let mut sub_dirs = Vec::new();

        for path in read_dir(&dir)? {
            if path.is_dir() {
                sub_dirs.push(path);
            } else if is_manifest(&path) {
                match self.build_command(&category, &path) {
                    Ok(definition) => {
                        commands.insert(definition.name.clone(), definition);
                    }
                    Err(e) => failures.push(e),
                }
            }
        }

        for sub_dir in sub_dirs {
            let Some(parent_name) = file_name(&sub_dir).map(str::to_lowercase) else {
                continue;
            };
            let Some(parent) = commands.get_mut(&parent_name) else {
                failures.push(LoadError::Invalid {
                    path: sub_dir.clone(),
                    reason: format!("no command `{parent_name}` in category `{category}`"),
                });
                continue;
            };

            let entries = match read_dir(&sub_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    failures.push(e);
                    continue;
                }
            };
            for path in entries.into_iter().filter(|p| is_manifest(p)) {
                match self.build_subcommand(&category, &parent_name, &path) {
                    Ok(sub) => parent.attach(sub),
                    Err(e) => failures.push(e),
                }
            }
        }

        let mut definitions = Vec::with_capacity(commands.len());
        for (name, definition) in commands {
            if definition.spec.handler.is_none() && definition.subcommands.is_empty() {
                failures.push(LoadError::Invalid {
                    path: dir.join(format!("{name}.{MANIFEST_EXTENSION}")),
                    reason: format!("no handler `{category}.{name}` and no subcommands"),
                });
                continue;
            }
            definitions.push(definition);
        }

        for failure in &failures {
            warn!("Skipped command file: {failure}");
        }

        Ok((definitions, failures))
    }

    fn build_command(&self, category: &str, path: &Path) -> Result<CommandDefinition, LoadError> {
        let manifest = read_manifest(path)?;
        let name = manifest_name(&manifest, path)?;

        let mut definition = CommandDefinition::new(name.clone(), category);
        for alias in &manifest.aliases {
            definition = definition.alias(alias.trim());
        }
        let default_key = format!("{category}.{name}");
        definition.spec = self.build_spec(name, &default_key, &manifest, path)?;
        Ok(definition)
    }

    fn build_subcommand(&self, category: &str, parent: &str, path: &Path) -> Result<SubcommandDefinition, LoadError> {
        let manifest = read_manifest(path)?;
        if !manifest.aliases.is_empty() {
            return Err(invalid(path, "subcommands cannot declare aliases"));
        }
        let name = manifest_name(&manifest, path)?;
        let default_key = format!("{category}.{parent}.{name}");

        let mut sub = SubcommandDefinition::new(parent, name.clone());
        sub.spec = self.build_spec(format!("{parent} {name}"), &default_key, &manifest, path)?;
        if sub.spec.handler.is_none() {
            return Err(invalid(path, &format!("no handler `{default_key}`")));
        }
        Ok(sub)
    }

    fn build_spec(&self, key: String, default_handler: &str, manifest: &CommandManifest, path: &Path) -> Result<CommandSpec, LoadError> {
        let handler = match &manifest.handler {
            Some(explicit) => Some(
                self.handlers
                    .get(explicit)
                    .cloned()
                    .ok_or_else(|| invalid(path, &format!("unknown handler `{explicit}`")))?,
            ),
            None => self.handlers.get(default_handler).cloned(),
        };

        let precondition = match &manifest.precondition {
            Some(name) => Some(
                self.preconditions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| invalid(path, &format!("unknown precondition `{name}`")))?,
            ),
            None => None,
        };

        let mut spec = CommandSpec::new(key);
        spec.description = manifest.description.clone();
        if let Some(usage) = &manifest.usage {
            spec.usage = usage.clone();
        }
        spec.required_args = manifest.required_args;
        spec.enabled = manifest.enabled;
        spec.guild_only = manifest.guild_only;
        spec.protected = manifest.protected;
        spec.member_permissions = parse_permissions(&manifest.member_permissions, path)?;
        spec.bot_permissions = parse_permissions(&manifest.bot_permissions, path)?;
        spec.precondition = precondition;
        spec.cooldown = Duration::from_secs(manifest.cooldown);
        spec.flags = manifest.flags.iter().map(|f| FlagSpec { name: f.name.to_lowercase(), ..f.clone() }).collect();
        if let Some(order) = &manifest.gate_order {
            spec.gate_order = order.clone();
        }
        spec.handler = handler;
        Ok(spec)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io { path: dir.to_path_buf(), source };
    let mut paths = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    paths.sort();
    Ok(paths)
}

fn read_manifest(path: &Path) -> Result<CommandManifest, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    toml::from_str(&raw).map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })
}

fn manifest_name(manifest: &CommandManifest, path: &Path) -> Result<String, LoadError> {
    let name = match &manifest.name {
        Some(name) => name.trim().to_lowercase(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default(),
    };
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(invalid(path, "command names must be a single non-empty word"));
    }
    Ok(name)
}

fn parse_permissions(names: &[String], path: &Path) -> Result<Permissions, LoadError> {
    names.iter().try_fold(Permissions::empty(), |acc, name| {
        Permissions::from_name(&name.trim().to_uppercase())
            .map(|p| acc | p)
            .ok_or_else(|| invalid(path, &format!("unknown permission `{name}`")))
    })
}

fn is_manifest(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn invalid(path: &Path, reason: &str) -> LoadError {
    LoadError::Invalid { path: path.to_path_buf(), reason: reason.to_string() }
}

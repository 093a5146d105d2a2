use std::{collections::{BTreeMap, HashMap}, sync::Arc};

use thiserror::Error;

use crate::bot::commands::commands::CommandDefinition;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("`{key}` is already taken by command `{owner}`")]
    DuplicateName { key: String, owner: String },
    #[error("command `{0}` is not registered")]
    UnknownCommand(String),
}

/// Name/alias lookup table. Every key (a command's name or one of its
/// aliases) maps to exactly one command name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandDefinition>>,
    lookup: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: CommandDefinition) -> Result<Arc<CommandDefinition>, RegistryError> {
        check_keys(&self.lookup, &definition)?;
        Ok(self.insert_unchecked(definition))
    }

    pub fn unregister(&mut self, name: &str) -> Result<Arc<CommandDefinition>, RegistryError> {
        let name = name.to_lowercase();
        let definition = self.commands.remove(&name).ok_or_else(|| RegistryError::UnknownCommand(name.clone()))?;
        self.lookup.retain(|_, owner| *owner != name);
        Ok(definition)
    }

    pub fn resolve(&self, token: &str) -> Option<Arc<CommandDefinition>> {
        let name = self.lookup.get(&token.to_lowercase())?;
        self.commands.get(name).cloned()
    }

    /// Swaps every command of `category` for `definitions` in one step.
    /// Collisions are checked against the commands outside the category
    /// first; on error the registry is left untouched.
    pub fn replace_category(&mut self, category: &str, definitions: Vec<CommandDefinition>) -> Result<(), RegistryError> {
        let category = category.to_lowercase();
        let outgoing: Vec<String> = self
            .commands
            .values()
            .filter(|c| c.category == category)
            .map(|c| c.name.clone())
            .collect();

        let mut staging: HashMap<String, String> = self
            .lookup
            .iter()
            .filter(|(_, owner)| !outgoing.contains(owner))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut incoming = Vec::with_capacity(definitions.len());
        for mut definition in definitions {
            definition.category = category.clone();
            check_keys(&staging, &definition)?;
            for key in definition.lookup_keys() {
                staging.insert(key.to_string(), definition.name.clone());
            }
            incoming.push(definition);
        }

        for name in &outgoing {
            self.commands.remove(name);
        }
        self.lookup = staging;
        for definition in incoming {
            self.commands.insert(definition.name.clone(), Arc::new(definition));
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    /// Commands grouped by category, both sorted by name.
    pub fn categories(&self) -> BTreeMap<String, Vec<Arc<CommandDefinition>>> {
        let mut out: BTreeMap<String, Vec<Arc<CommandDefinition>>> = BTreeMap::new();
        for command in self.commands.values() {
            out.entry(command.category.clone()).or_default().push(command.clone());
        }
        for commands in out.values_mut() {
            commands.sort_by(|a, b| a.name.cmp(&b.name));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn insert_unchecked(&mut self, definition: CommandDefinition) -> Arc<CommandDefinition> {
        for key in definition.lookup_keys() {
            self.lookup.insert(key.to_string(), definition.name.clone());
        }
        let definition = Arc::new(definition);
        self.commands.insert(definition.name.clone(), definition.clone());
        definition
    }
}

fn check_keys(lookup: &HashMap<String, String>, definition: &CommandDefinition) -> Result<(), RegistryError> {
    let mut seen: Vec<&str> = Vec::new();
    for key in definition.lookup_keys() {
        if let Some(owner) = lookup.get(key) {
            return Err(RegistryError::DuplicateName { key: key.to_string(), owner: owner.clone() });
        }
        if seen.contains(&key) {
            return Err(RegistryError::DuplicateName { key: key.to_string(), owner: definition.name.clone() });
        }
        seen.push(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDefinition::new("ping", "general").alias("p").alias("pong")).unwrap();
        registry.register(CommandDefinition::new("help", "general").alias("h")).unwrap();
        registry.register(CommandDefinition::new("define", "search").alias("urban")).unwrap();
        registry
    }

    #[test]
    fn name_and_aliases_resolve_to_the_same_definition() {
        let registry = registry();
        let by_name = registry.resolve("ping").unwrap();
        for alias in ["p", "pong", "PING", "Pong"] {
            assert!(Arc::ptr_eq(&by_name, &registry.resolve(alias).unwrap()), "{alias}");
        }
        assert!(registry.resolve("pin").is_none());
    }

    #[test]
    fn colliding_alias_is_rejected() {
        let mut registry = registry();
        let err = registry.register(CommandDefinition::new("hello", "general").alias("h")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { key: "h".into(), owner: "help".into() });
        assert!(registry.get("hello").is_none());
    }

    #[test]
    fn alias_equal_to_own_name_is_rejected() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(CommandDefinition::new("echo", "general").alias("echo")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_drops_every_key() {
        let mut registry = registry();
        registry.unregister("ping").unwrap();
        assert!(registry.resolve("ping").is_none());
        assert!(registry.resolve("p").is_none());
        assert!(registry.resolve("pong").is_none());
        assert_eq!(registry.unregister("ping").unwrap_err(), RegistryError::UnknownCommand("ping".into()));
        // The freed alias can be claimed again.
        registry.register(CommandDefinition::new("pause", "general").alias("p")).unwrap();
    }

    #[test]
    fn replace_category_swaps_commands_and_aliases() {
        let mut registry = registry();
        registry
            .replace_category("general", vec![CommandDefinition::new("ping", "general").alias("latency")])
            .unwrap();

        assert!(registry.resolve("help").is_none());
        assert!(registry.resolve("p").is_none());
        assert!(registry.resolve("latency").is_some());
        assert!(registry.resolve("urban").is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn replace_category_is_all_or_nothing() {
        let mut registry = registry();
        let err = registry
            .replace_category(
                "general",
                vec![CommandDefinition::new("ping", "general"), CommandDefinition::new("lookup", "general").alias("urban")],
            )
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateName { key: "urban".into(), owner: "define".into() });
        assert!(registry.resolve("help").is_some());
        assert!(registry.resolve("pong").is_some());
        assert!(registry.resolve("lookup").is_none());
    }

    #[test]
    fn categories_are_sorted() {
        let registry = registry();
        let categories = registry.categories();
        let names: Vec<_> = categories["general"].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["help", "ping"]);
        assert_eq!(categories.keys().collect::<Vec<_>>(), ["general", "search"]);
    }
}

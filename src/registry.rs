//! Command registry
//!
//! The catalogue of every declared command, keyed by `<action><entity>`.
//! Built once at startup and immutable afterwards, so lookups are lock-free
//! shared reads.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::CommandDescriptor;
use crate::error::EngineError;
use crate::suggest;

/// Immutable catalogue of command descriptors.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandDescriptor>>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            commands: HashMap::new(),
        }
    }

    /// Look a command up by key, e.g. `createinstance`. Unknown keys carry a
    /// closest-match suggestion.
    pub fn get(&self, key: &str) -> Result<Arc<CommandDescriptor>, EngineError> {
        self.commands
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCommand {
                name: key.to_string(),
                suggestion: suggest::closest(key, self.commands.keys().map(String::as_str)),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.commands.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.commands.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Accumulates descriptors; duplicate keys are declaration mistakes and
/// abort the build.
pub struct RegistryBuilder {
    commands: HashMap<String, Arc<CommandDescriptor>>,
}

impl RegistryBuilder {
    pub fn register(mut self, descriptor: CommandDescriptor) -> Self {
        let key = descriptor.key();
        if self
            .commands
            .insert(key.clone(), Arc::new(descriptor))
            .is_some()
        {
            panic!("command '{}' registered twice", key);
        }
        self
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterKind;
    use crate::command::{Action, FieldSpec};

    fn sample(action: Action, entity: &str) -> CommandDescriptor {
        CommandDescriptor::declare(action, entity)
            .call("compute", "Noop")
            .field(FieldSpec::new("id", "Id", AdapterKind::Str).required())
            .done()
    }

    #[test]
    fn lookup_and_suggestion() {
        let registry = CommandRegistry::builder()
            .register(sample(Action::Create, "instance"))
            .register(sample(Action::Delete, "instance"))
            .build();

        assert!(registry.get("createinstance").is_ok());
        match registry.get("createinstnce") {
            Err(EngineError::UnknownCommand { name, suggestion }) => {
                assert_eq!(name, "createinstnce");
                assert_eq!(suggestion.as_deref(), Some("createinstance"));
            }
            other => panic!("expected unknown command, got {:?}", other.err()),
        }
        assert_eq!(registry.keys(), vec!["createinstance", "deleteinstance"]);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        CommandRegistry::builder()
            .register(sample(Action::Create, "instance"))
            .register(sample(Action::Create, "instance"))
            .build();
    }
}

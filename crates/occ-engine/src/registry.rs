use std::collections::BTreeMap;
use std::sync::Arc;

use occ_core::errors::{ErrorInfo, OccError};

use crate::module::DomainModule;

/// Name-indexed table of domain modules, read-only once built.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn DomainModule>>,
}

impl ModuleRegistry {
    /// Starts an empty builder.
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::default()
    }

    /// Module registered under `name`.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn DomainModule>, OccError> {
        self.modules.get(name).ok_or_else(|| {
            OccError::Module(
                ErrorInfo::new("module-unknown", format!("no domain module named `{name}`"))
                    .with_context("known", self.names().join(", ")),
            )
        })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

/// Collects modules; duplicate names are reported by [`ModuleRegistryBuilder::build`].
#[derive(Default)]
pub struct ModuleRegistryBuilder {
    modules: BTreeMap<String, Arc<dyn DomainModule>>,
    duplicates: Vec<String>,
}

impl ModuleRegistryBuilder {
    /// Adds a module under its own name.
    pub fn register<M: DomainModule + 'static>(self, module: M) -> Self {
        self.register_arc(Arc::new(module))
    }

    /// Adds a shared module under its own name.
    pub fn register_arc(mut self, module: Arc<dyn DomainModule>) -> Self {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.modules.insert(name, module);
        }
        self
    }

    /// Freezes the table.
    pub fn build(self) -> Result<ModuleRegistry, OccError> {
        if !self.duplicates.is_empty() {
            return Err(OccError::Module(
                ErrorInfo::new(
                    "module-duplicate",
                    format!("domain module names registered twice: {}", self.duplicates.join(", ")),
                )
                .with_hint("give every module a unique name()"),
            ));
        }
        Ok(ModuleRegistry {
            modules: self.modules,
        })
    }
}

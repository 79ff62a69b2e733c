//! Plugin registry: turns a compiled module into a ready plugin set.

use thiserror::Error;

use super::PluginError;
use super::published::{PluginEntry, PluginSet};
use crate::compiler::CompiledModule;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to construct `{type_name}`: {source}")]
    Construct {
        type_name: String,
        source: PluginError,
    },
    #[error("failed to initialize `{type_name}`: {source}")]
    Initialize {
        type_name: String,
        source: PluginError,
    },
}

impl RegistryError {
    /// The type whose instantiation aborted the cycle.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Construct { type_name, .. } | Self::Initialize { type_name, .. } => type_name,
        }
    }
}

/// Construct and initialize one instance per exported type, in table order.
///
/// All or nothing: the first failure drops every instance built so far.
pub fn instantiate(module: &CompiledModule) -> Result<PluginSet, RegistryError> {
    let mut entries = Vec::with_capacity(module.exports().len());

    for export in module.exports() {
        let mut instance = export
            .construct()
            .map_err(|source| RegistryError::Construct {
                type_name: export.name.clone(),
                source,
            })?;
        instance
            .initialize()
            .map_err(|source| RegistryError::Initialize {
                type_name: export.name.clone(),
                source,
            })?;
        entries.push(PluginEntry::new(export.name.clone(), instance));
    }

    Ok(PluginSet::new(module.generation(), entries))
}

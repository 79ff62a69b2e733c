//! Compiled modules and the dynamic library loader.

use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::{Library, Symbol};
use thiserror::Error;

use crate::embed::plugin::ENTRY_SYMBOL;
use crate::host::abi::{HOST_VTABLE, InstanceVTable, KILN_ABI_VERSION, ModuleEntry};
use crate::host::{Behaviour, PluginError};

/// Creates one fresh instance of an exported type.
pub type Factory = Arc<dyn Fn() -> Result<Box<dyn Behaviour>, PluginError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("missing entry symbol `kiln_module` in `{}`: {source}", path.display())]
    MissingEntry {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("module entry returned no descriptor")]
    NullDescriptor,
    #[error("module ABI version {found} does not match host version {expected}")]
    AbiMismatch { found: u32, expected: u32 },
    #[error("exported type #{0} has an invalid name")]
    BadTypeName(usize),
}

/// One row of a module's registry table.
#[derive(Clone)]
pub struct ExportedType {
    pub name: String,
    factory: Factory,
}

impl ExportedType {
    pub fn new(name: impl Into<String>, factory: Factory) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    pub fn construct(&self) -> Result<Box<dyn Behaviour>, PluginError> {
        (self.factory)()
    }
}

/// Output of one successful compile cycle. Immutable once built.
///
/// Every instance created from a loaded module keeps the library mapped, so a
/// superseded module is simply dropped.
pub struct CompiledModule {
    generation: u64,
    exports: Vec<ExportedType>,
    library: Option<Arc<LoadedLibrary>>,
}

impl CompiledModule {
    /// Module backed by in-process factories.
    pub fn from_factories(generation: u64, exports: Vec<ExportedType>) -> Self {
        Self {
            generation,
            exports,
            library: None,
        }
    }

    /// Load a generated library and read its registry table.
    pub fn load(generation: u64, path: &Path) -> Result<Self, LoadError> {
        // SAFETY: generated libraries only run std initialisers on load.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let (vtable, rows) = {
            // SAFETY: the entry symbol has the `ModuleEntry` signature by construction.
            let entry: Symbol<ModuleEntry> = unsafe { library.get(ENTRY_SYMBOL.as_bytes()) }
                .map_err(|source| LoadError::MissingEntry {
                    path: path.to_path_buf(),
                    source,
                })?;
            // SAFETY: `HOST_VTABLE` is a static; the descriptor is leaked by the module.
            let descriptor =
                unsafe { entry(&HOST_VTABLE).as_ref() }.ok_or(LoadError::NullDescriptor)?;

            if descriptor.abi_version != KILN_ABI_VERSION {
                return Err(LoadError::AbiMismatch {
                    found: descriptor.abi_version,
                    expected: KILN_ABI_VERSION,
                });
            }

            let types = if descriptor.type_count == 0 {
                &[][..]
            } else if descriptor.types.is_null() {
                return Err(LoadError::NullDescriptor);
            } else {
                // SAFETY: the module exports `type_count` contiguous rows.
                unsafe { std::slice::from_raw_parts(descriptor.types, descriptor.type_count) }
            };

            let mut rows = Vec::with_capacity(types.len());
            for (index, row) in types.iter().enumerate() {
                // SAFETY: names point at `&'static str` data inside the library.
                let bytes = unsafe { std::slice::from_raw_parts(row.name_ptr, row.name_len) };
                let name =
                    std::str::from_utf8(bytes).map_err(|_| LoadError::BadTypeName(index))?;
                rows.push((name.to_owned(), row.create));
            }
            (descriptor.vtable, rows)
        };

        let shared = Arc::new(LoadedLibrary {
            vtable,
            path: path.to_path_buf(),
            _library: library,
        });

        let exports = rows
            .into_iter()
            .map(|(name, create)| {
                let library = Arc::clone(&shared);
                let factory: Factory = Arc::new(move || -> Result<Box<dyn Behaviour>, PluginError> {
                    let ptr = NonNull::new(create()).ok_or(PluginError::ConstructPanicked)?;
                    Ok(Box::new(ForeignBehaviour {
                        ptr,
                        library: Arc::clone(&library),
                    }))
                });
                ExportedType::new(name, factory)
            })
            .collect();

        Ok(Self {
            generation,
            exports,
            library: Some(shared),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registry table in discovery order.
    pub fn exports(&self) -> &[ExportedType] {
        &self.exports
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_deref().map(|lib| lib.path.as_path())
    }
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("generation", &self.generation)
            .field(
                "exports",
                &self.exports.iter().map(|e| &e.name).collect::<Vec<_>>(),
            )
            .field("library", &self.library_path())
            .finish()
    }
}

struct LoadedLibrary {
    vtable: InstanceVTable,
    path: PathBuf,
    _library: Library,
}

/// Instance living inside a loaded library.
struct ForeignBehaviour {
    ptr: NonNull<std::ffi::c_void>,
    library: Arc<LoadedLibrary>,
}

// SAFETY: the instance is only ever reached through `&mut self`, one thread at a time.
unsafe impl Send for ForeignBehaviour {}

impl Behaviour for ForeignBehaviour {
    fn initialize(&mut self) -> Result<(), PluginError> {
        if (self.library.vtable.initialize)(self.ptr.as_ptr()) {
            Ok(())
        } else {
            Err(PluginError::HookPanicked("initialize"))
        }
    }

    fn update(&mut self) -> Result<(), PluginError> {
        if (self.library.vtable.update)(self.ptr.as_ptr()) {
            Ok(())
        } else {
            Err(PluginError::HookPanicked("update"))
        }
    }
}

impl Drop for ForeignBehaviour {
    fn drop(&mut self) {
        (self.library.vtable.destroy)(self.ptr.as_ptr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    impl Behaviour for Counter {
        fn initialize(&mut self) -> Result<(), PluginError> {
            Ok(())
        }

        fn update(&mut self) -> Result<(), PluginError> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn test_factory_module_constructs_fresh_instances() {
        let factory: Factory =
            Arc::new(|| -> Result<Box<dyn Behaviour>, PluginError> { Ok(Box::new(Counter(0))) });
        let module =
            CompiledModule::from_factories(3, vec![ExportedType::new("c::Counter", factory)]);

        assert_eq!(module.generation(), 3);
        assert!(module.library_path().is_none());

        let export = &module.exports()[0];
        let mut first = export.construct().unwrap();
        first.update().unwrap();
        assert!(export.construct().is_ok());
    }

    #[test]
    fn test_load_missing_library() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = CompiledModule::load(1, &temp.path().join("nope.so")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}

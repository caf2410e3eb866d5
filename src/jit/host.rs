//! The jit host: owns the native target and every sealed compilation unit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::FuncId;

use crate::error::HannaError;

/// Tags a disposable compilation unit. Releasing the handle unpublishes the
/// unit's symbols and frees its code pages; units sealed without a handle
/// live for the rest of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHandle(u32);

struct TrackedUnit {
    module: JITModule,
    symbols: Vec<String>,
}

/// Process-wide execution environment.
///
/// Each specialization is emitted into its own short-lived module; once a
/// module is sealed here its exported functions are published into a shared
/// symbol table that every later module resolves imports against (anything
/// not found there falls through to the process symbol table). That gives
/// cross-module calls the single-dylib behavior the rest of the pipeline
/// assumes.
pub struct JitHost {
    isa: OwnedTargetIsa,
    /// Published entry points, keyed by mangled name. Addresses are stored
    /// as integers so the table can be shared into the jit's symbol lookup
    /// callback regardless of its thread bounds.
    symbols: Arc<Mutex<HashMap<String, usize>>>,
    retained: Vec<JITModule>,
    tracked: HashMap<u32, TrackedUnit>,
    next_handle: u32,
}

impl JitHost {
    pub fn new() -> Result<Self, HannaError> {
        let mut flags = settings::builder();
        // The verifier plus the `speed` pipeline stand in for per-function
        // verification and optimization at definition time.
        for (flag, value) in [
            ("use_colocated_libcalls", "false"),
            ("is_pic", "false"),
            ("enable_verifier", "true"),
            ("opt_level", "speed"),
        ] {
            flags
                .set(flag, value)
                .map_err(|err| HannaError::Codegen(format!("invalid codegen flag {}: {}", flag, err)))?;
        }

        let isa = cranelift_native::builder()
            .map_err(|err| HannaError::Codegen(format!("native target unavailable: {}", err)))?
            .finish(settings::Flags::new(flags))
            .map_err(|err| HannaError::Codegen(err.to_string()))?;

        Ok(Self {
            isa,
            symbols: Arc::new(Mutex::new(HashMap::new())),
            retained: Vec::new(),
            tracked: HashMap::new(),
            next_handle: 0,
        })
    }

    /// Native target triple; stable for the life of the process.
    pub fn triple(&self) -> String {
        self.isa.triple().to_string()
    }

    /// Opens a fresh module wired to resolve previously published
    /// specializations.
    pub fn make_module(&self) -> JITModule {
        let mut builder =
            JITBuilder::with_isa(self.isa.clone(), cranelift_module::default_libcall_names());
        let table = Arc::clone(&self.symbols);
        builder.symbol_lookup_fn(Box::new(move |name| {
            table
                .lock()
                .unwrap()
                .get(name)
                .map(|&addr| addr as *const u8)
        }));
        JITModule::new(builder)
    }

    /// Takes ownership of a finished module, compiles it, and publishes the
    /// listed exports. A handle makes the whole unit disposable later.
    pub fn add_module(
        &mut self,
        mut module: JITModule,
        exports: Vec<(String, FuncId)>,
        handle: Option<ResourceHandle>,
    ) -> Result<(), HannaError> {
        module
            .finalize_definitions()
            .map_err(|err| HannaError::Codegen(err.to_string()))?;

        let mut published = Vec::with_capacity(exports.len());
        {
            let mut table = self.symbols.lock().unwrap();
            for (name, id) in exports {
                let addr = module.get_finalized_function(id);
                table.insert(name.clone(), addr as usize);
                published.push(name);
            }
        }

        match handle {
            Some(handle) => {
                self.tracked.insert(
                    handle.0,
                    TrackedUnit {
                        module,
                        symbols: published,
                    },
                );
            }
            None => self.retained.push(module),
        }
        Ok(())
    }

    /// Resolves a mangled name published by a sealed unit.
    pub fn lookup(&self, name: &str) -> Result<*const u8, HannaError> {
        self.symbols
            .lock()
            .unwrap()
            .get(name)
            .map(|&addr| addr as *const u8)
            .ok_or_else(|| {
                HannaError::Codegen(format!("symbol `{}` is not defined in the jit", name))
            })
    }

    pub fn new_handle(&mut self) -> ResourceHandle {
        self.next_handle += 1;
        ResourceHandle(self.next_handle)
    }

    /// Number of compilation units sealed for the life of the process, i.e.
    /// everything except disposable top-level wrappers.
    pub fn permanent_units(&self) -> usize {
        self.retained.len()
    }

    /// Drops the unit sealed under `handle`: its symbols disappear from the
    /// table and its code pages are unmapped.
    pub fn release(&mut self, handle: ResourceHandle) -> Result<(), HannaError> {
        let unit = self.tracked.remove(&handle.0).ok_or_else(|| {
            HannaError::Codegen(format!("resource handle {} has no compilation unit", handle.0))
        })?;

        {
            let mut table = self.symbols.lock().unwrap();
            for name in &unit.symbols {
                table.remove(name);
            }
        }

        // Nothing can reach the unit's code once its symbols are gone.
        unsafe { unit.module.free_memory() };
        Ok(())
    }
}

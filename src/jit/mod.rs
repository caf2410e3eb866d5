//! Cranelift-backed jit pipeline for Hanna.
//!
//! Methods are specialized per argument-type vector, each specialization
//! emitted into its own module and sealed into the host, where later
//! modules resolve it by mangled name.

pub mod compiler;
pub mod cursor;
pub mod host;
pub mod registry;
pub mod specialize;

use crate::error::HannaError;

use cursor::ModuleCursor;
use host::JitHost;
use registry::Registry;

/// Root object owning the process-wide codegen state. Passed explicitly to
/// every emission routine; there are no globals.
pub struct Jit {
    pub host: JitHost,
    pub cursor: ModuleCursor,
    pub registry: Registry,
    pub verbosity: u8,
}

impl Jit {
    pub fn new(verbosity: u8) -> Result<Self, HannaError> {
        let host = JitHost::new()?;
        let cursor = ModuleCursor::new(&host);
        Ok(Self {
            host,
            cursor,
            registry: Registry::default(),
            verbosity,
        })
    }
}

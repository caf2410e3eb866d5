//! The active codegen context: one module under construction at a time.

use cranelift_codegen::Context;
use cranelift_frontend::FunctionBuilderContext;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Module};

use crate::error::HannaError;

use super::host::{JitHost, ResourceHandle};

/// The module every emission currently targets, together with the reusable
/// builder and compilation contexts. `seal_and_reset` is the only way a
/// finished module reaches the host; function ids and IR values must never
/// be carried across it.
pub struct ModuleCursor {
    pub module: JITModule,
    pub builder_ctx: FunctionBuilderContext,
    pub ctx: Context,
    exports: Vec<(String, FuncId)>,
}

impl ModuleCursor {
    pub fn new(host: &JitHost) -> Self {
        let module = host.make_module();
        let ctx = module.make_context();
        Self {
            module,
            builder_ctx: FunctionBuilderContext::new(),
            ctx,
            exports: Vec::new(),
        }
    }

    /// Records a function defined in the active module; published when the
    /// module is sealed.
    pub fn record_export(&mut self, name: String, id: FuncId) {
        self.exports.push((name, id));
    }

    /// Hands the active module to the host and installs a fresh one. All
    /// subsequent codegen targets the new module.
    pub fn seal_and_reset(
        &mut self,
        host: &mut JitHost,
        handle: Option<ResourceHandle>,
    ) -> Result<(), HannaError> {
        let module = std::mem::replace(&mut self.module, host.make_module());
        let exports = std::mem::take(&mut self.exports);
        self.ctx = self.module.make_context();
        host.add_module(module, exports, handle)
    }

    /// Throws the active module away after a failed emission so nothing
    /// half-built survives, and installs a fresh one.
    pub fn discard_and_reset(&mut self, host: &JitHost) {
        self.module = host.make_module();
        self.exports.clear();
        self.ctx = self.module.make_context();
    }
}

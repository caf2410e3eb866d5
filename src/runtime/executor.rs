//! Top-level execution: wrap, specialize, compile, call, dispose.

use std::rc::Rc;

use crate::ast::{mangle, Expr, MethodDecl, MethodDef, TypeTag};
use crate::error::HannaError;
use crate::jit::specialize::emit_method;
use crate::jit::Jit;

use super::value::Value;

/// Symbol every top-level expression is compiled under. Its compilation
/// unit is released after the step runs so the next one can reuse the name.
pub const EXECUTION_SYMBOL: &str = "__hanna_execution";

/// Entry point of a compiled top-level wrapper, tagged by return ABI. Both
/// variants resolve to the same symbol; the tag picks the prototype it is
/// called under.
enum EntryFn {
    Int(unsafe extern "C" fn() -> i64),
    Real(unsafe extern "C" fn() -> f64),
}

impl EntryFn {
    /// SAFETY: `addr` must be the finalized wrapper entry point, and `ret`
    /// the return type its body was emitted with.
    unsafe fn from_addr(addr: *const u8, ret: TypeTag) -> Self {
        match ret {
            TypeTag::Real => EntryFn::Real(unsafe { std::mem::transmute(addr) }),
            _ => EntryFn::Int(unsafe { std::mem::transmute(addr) }),
        }
    }

    fn invoke(&self) -> Value {
        match self {
            EntryFn::Int(entry) => Value::Integer(unsafe { entry() }),
            EntryFn::Real(entry) => Value::Float(unsafe { entry() }),
        }
    }
}

/// Runs a parsed program: evaluates each top-level expression in source
/// order and records its typed result.
pub struct Executor {
    program: Vec<Expr>,
}

impl Executor {
    pub fn new(program: Vec<Expr>) -> Self {
        Self { program }
    }

    /// Evaluates every step. A specialization error aborts only the step
    /// that raised it; jit failures abort the run.
    pub fn run(self, jit: &mut Jit) -> Result<Vec<Value>, HannaError> {
        let mut results = Vec::with_capacity(self.program.len());
        for expr in self.program {
            if jit.verbosity > 0 {
                println!("Executing: {}", expr);
            }

            match Self::execute(jit, expr) {
                Ok(value) => {
                    println!("\tResult: {}", value);
                    if jit.verbosity > 0 {
                        println!();
                    }
                    results.push(value);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    eprintln!("ERROR: {}", err);
                    jit.registry.remove_spec(&mangle(EXECUTION_SYMBOL, &[]));
                    jit.cursor.discard_and_reset(&jit.host);
                }
            }
        }
        Ok(results)
    }

    fn execute(jit: &mut Jit, expr: Expr) -> Result<Value, HannaError> {
        // Wrap the expression in a synthetic zero-parameter method and emit
        // it like any other specialization.
        let decl = Rc::new(MethodDecl::new(EXECUTION_SYMBOL, Vec::new()));
        let wrapper = MethodDef::new(decl, expr);
        let ret = emit_method(jit, &wrapper, &[])?;

        let handle = jit.host.new_handle();
        jit.cursor.seal_and_reset(&mut jit.host, Some(handle))?;

        let addr = jit.host.lookup(EXECUTION_SYMBOL)?;
        // SAFETY: the wrapper was just emitted with this return type and its
        // code stays mapped until the handle is released below.
        let entry = unsafe { EntryFn::from_addr(addr, ret) };
        let value = entry.invoke();

        // Dispose of the wrapper; user-defined specializations stay.
        jit.host.release(handle)?;
        jit.registry.remove_spec(&mangle(EXECUTION_SYMBOL, &[]));
        Ok(value)
    }
}

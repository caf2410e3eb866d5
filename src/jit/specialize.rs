//! Method specialization: the lazy, per-call-site emission of method
//! definitions.
//!
//! A method parsed once is emitted separately for every distinct
//! argument-type vector it is invoked with, much like template
//! instantiation. Return types only settle at call sites, so emission runs
//! in two passes: a throwaway inference pass against typed placeholders,
//! then the real function.

use std::collections::HashMap;

use cranelift_codegen::ir::{types, AbiParam, Function, InstBuilder, UserFuncName};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{Linkage, Module};

use crate::ast::{
    mangle, Expr, MethodCall, MethodDef, TypeTag, EXPRESSION_NAME, INT_LITERAL_NAME,
    REAL_LITERAL_NAME,
};
use crate::error::HannaError;

use super::compiler::{call_arg_types, compile_expr, ensure_decl, ir_type, tag_of, FnEmitter};
use super::cursor::ModuleCursor;
use super::registry::Registry;
use super::Jit;

/// Emits one specialization of `def` for `arg_types` into the active module,
/// registers it, and returns the inferred return type. Callee
/// specializations the body depends on are emitted and sealed first, each
/// into its own module; the caller decides when the module holding `def`
/// itself is sealed.
pub fn emit_method(jit: &mut Jit, def: &MethodDef, arg_types: &[TypeTag]) -> Result<TypeTag, HannaError> {
    let mangled = mangle(def.name(), arg_types);
    if !jit.registry.begin_emission(&mangled) {
        // The callee graph must be acyclic; an in-flight specialization
        // showing up again means the method recurses.
        return Err(HannaError::EmissionFailed {
            name: mangled,
            message: "specialization depends on itself".to_string(),
        });
    }
    let result = emit_method_inner(jit, def, arg_types, &mangled);
    jit.registry.end_emission(&mangled);
    result
}

fn emit_method_inner(
    jit: &mut Jit,
    def: &MethodDef,
    arg_types: &[TypeTag],
    mangled: &str,
) -> Result<TypeTag, HannaError> {
    // The return type must be known before the function signature can be
    // built. A body that directly calls another method adopts that callee's
    // inferred return type; anything else is settled by a throwaway
    // emission against typed placeholders.
    let ret = match &def.body {
        Expr::Call(call) => specialize_call(jit, call, &def.decl.params, arg_types)?,
        _ => infer_return_type(jit, def, arg_types)?,
    };
    def.set_return_type(ret);

    jit.registry
        .register_spec(mangled.to_string(), def.decl.clone(), ret);

    let Jit {
        cursor,
        registry,
        verbosity,
        ..
    } = jit;

    let func_id = ensure_decl(
        &mut cursor.module,
        registry,
        def.name(),
        arg_types,
        ret,
        Linkage::Export,
    )?;

    let mut sig = cursor.module.make_signature();
    for tag in arg_types {
        sig.params.push(AbiParam::new(ir_type(*tag)));
    }
    sig.returns.push(AbiParam::new(ir_type(ret)));
    cursor.ctx.func = Function::with_name_signature(UserFuncName::default(), sig);

    let emitted = {
        let mut builder = FunctionBuilder::new(&mut cursor.ctx.func, &mut cursor.builder_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        // Rebind the real IR parameters; placeholder values from the
        // inference pass are dead by now.
        let params = builder.block_params(entry).to_vec();
        let mut locals = HashMap::new();
        for (name, value) in def.decl.params.iter().zip(params) {
            locals.insert(name.clone(), value);
        }

        let mut fx = FnEmitter {
            builder: &mut builder,
            module: &mut cursor.module,
            registry: &mut *registry,
            locals,
            verbosity: *verbosity,
        };
        let emitted = compile_expr(&mut fx, &def.body);

        match &emitted {
            Ok(value) => {
                builder.ins().return_(&[*value]);
            }
            Err(_) => {
                // Terminate the abandoned function so the builder can be
                // finalized; it is erased below.
                let filler = if ret == TypeTag::Real {
                    builder.ins().f64const(0.0)
                } else {
                    builder.ins().iconst(types::I64, 0)
                };
                builder.ins().return_(&[filler]);
            }
        }
        builder.finalize();
        emitted
    };

    if let Err(err) = emitted {
        // Erase the abandoned function and its registration; nothing
        // half-emitted may be reachable afterwards.
        cursor.module.clear_context(&mut cursor.ctx);
        registry.remove_spec(mangled);
        return Err(err);
    }

    // define_function runs the verifier and the function-level optimization
    // pipeline configured on the host.
    if let Err(err) = cursor.module.define_function(func_id, &mut cursor.ctx) {
        cursor.module.clear_context(&mut cursor.ctx);
        registry.remove_spec(mangled);
        return Err(HannaError::EmissionFailed {
            name: mangled.to_string(),
            message: err.to_string(),
        });
    }

    if *verbosity > 1 {
        println!("{}", cursor.ctx.func.display());
    }

    cursor.module.clear_context(&mut cursor.ctx);
    cursor.record_export(mangled.to_string(), func_id);
    Ok(ret)
}

/// Resolves a call's argument types under the parent's parameter binding and
/// makes sure the callee specialization exists, emitting and sealing it on
/// first use. Returns the callee's inferred return type.
///
/// `params` and `arg_types` describe the method whose body contains the
/// call; both are empty for a nested call specialized outside any binding.
pub fn specialize_call(
    jit: &mut Jit,
    call: &MethodCall,
    params: &[String],
    arg_types: &[TypeTag],
) -> Result<TypeTag, HannaError> {
    let callee_def = jit
        .registry
        .definition(&call.callee)
        .ok_or_else(|| HannaError::UnknownCallee(call.callee.clone()))?;

    if call.args.len() != callee_def.decl.params.len() {
        return Err(HannaError::ArityMismatch {
            name: call.callee.clone(),
            expected: callee_def.decl.params.len(),
            found: call.args.len(),
        });
    }

    // Nominal argument types: Binary arguments are forced through a codegen
    // pass against placeholders typed from the parent binding.
    let nominal = {
        let Jit {
            cursor,
            registry,
            verbosity,
            ..
        } = &mut *jit;
        let bindings: Vec<(String, TypeTag)> = params
            .iter()
            .cloned()
            .zip(arg_types.iter().copied())
            .collect();
        scratch_emit(cursor, registry, *verbosity, &bindings, |fx| {
            call_arg_types(fx, call)
        })?
    };

    // Parent parameter name → concrete type.
    let parent: HashMap<&str, TypeTag> = params
        .iter()
        .map(|p| p.as_str())
        .zip(arg_types.iter().copied())
        .collect();

    let mut resolved = Vec::with_capacity(nominal.len());
    let mut unknown = None;
    for (arg, tag) in call.args.iter().zip(&nominal) {
        if let Expr::Call(nested) = arg {
            // An argument that is itself a call: specialize it eagerly,
            // under an empty binding, so its symbol exists before the
            // caller's body is emitted. The slot keeps the structural tag.
            specialize_call(jit, nested, &[], &[])?;
            resolved.push(TypeTag::MethodCall);
            continue;
        }

        let name = arg.name();
        if name == INT_LITERAL_NAME || name == REAL_LITERAL_NAME || name == EXPRESSION_NAME {
            resolved.push(*tag);
        } else if let Some(found) = parent.get(name) {
            resolved.push(*found);
        } else {
            // Recorded but not fatal yet; the walk finishes so the failure
            // below names the whole call.
            eprintln!(
                "unknown variable `{}` used in call to {}",
                name, call.callee
            );
            unknown = Some(name.to_string());
            resolved.push(TypeTag::Variable);
        }
    }

    call.set_arg_types(resolved.clone());

    if resolved.contains(&TypeTag::Variable) {
        return Err(HannaError::TypeMismatch(format!(
            "argument `{}` of call to `{}` never resolved to a concrete type",
            unknown.unwrap_or_default(),
            call.callee
        )));
    }

    let mangled = mangle(&call.callee, &resolved);
    match jit.registry.spec(&mangled) {
        Some(spec) => Ok(spec.ret),
        None => {
            let ret = emit_method(jit, &callee_def, &resolved)?;
            jit.cursor.seal_and_reset(&mut jit.host, None)?;
            Ok(ret)
        }
    }
}

/// Runs `f` inside a throwaway function whose block parameters stand in
/// for the bound names. The function is never declared or defined; only
/// the types observed inside it survive.
fn scratch_emit<T>(
    cursor: &mut ModuleCursor,
    registry: &mut Registry,
    verbosity: u8,
    bindings: &[(String, TypeTag)],
    f: impl FnOnce(&mut FnEmitter) -> Result<T, HannaError>,
) -> Result<T, HannaError> {
    let mut sig = cursor.module.make_signature();
    for (_, tag) in bindings {
        sig.params.push(AbiParam::new(ir_type(*tag)));
    }

    let mut func = Function::with_name_signature(UserFuncName::default(), sig);
    let mut builder = FunctionBuilder::new(&mut func, &mut cursor.builder_ctx);
    let entry = builder.create_block();
    builder.append_block_params_for_function_params(entry);
    builder.switch_to_block(entry);
    builder.seal_block(entry);

    let params = builder.block_params(entry).to_vec();
    let mut locals = HashMap::new();
    for ((name, _), value) in bindings.iter().zip(params) {
        locals.insert(name.clone(), value);
    }

    let mut fx = FnEmitter {
        builder: &mut builder,
        module: &mut cursor.module,
        registry: &mut *registry,
        locals,
        verbosity,
    };
    let result = f(&mut fx);

    builder.ins().return_(&[]);
    builder.finalize();
    result
}

fn infer_return_type(
    jit: &mut Jit,
    def: &MethodDef,
    arg_types: &[TypeTag],
) -> Result<TypeTag, HannaError> {
    let Jit {
        cursor,
        registry,
        verbosity,
        ..
    } = jit;
    let bindings: Vec<(String, TypeTag)> = def
        .decl
        .params
        .iter()
        .cloned()
        .zip(arg_types.iter().copied())
        .collect();
    scratch_emit(cursor, registry, *verbosity, &bindings, |fx| {
        let value = compile_expr(fx, &def.body)?;
        Ok(tag_of(fx.builder.func.dfg.value_type(value)))
    })
}

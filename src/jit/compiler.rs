//! Expression codegen: AST → Cranelift IR inside the function currently
//! under construction.

use std::collections::HashMap;

use cranelift_codegen::ir::{types, AbiParam, InstBuilder, Type, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, FuncOrDataId, Linkage, Module};

use crate::ast::{mangle, BinOp, Binary, Expr, MethodCall, TypeTag};
use crate::error::HannaError;

use super::registry::Registry;

/// Cranelift type for a value tag: reals are f64, everything else an i64.
pub fn ir_type(tag: TypeTag) -> Type {
    if tag == TypeTag::Real {
        types::F64
    } else {
        types::I64
    }
}

/// Value tag of an emitted IR type.
pub fn tag_of(ty: Type) -> TypeTag {
    if ty == types::F64 {
        TypeTag::Real
    } else {
        TypeTag::Int
    }
}

/// Everything one function emission needs: the live builder, the active
/// module, the registry, and the local name binding. The binding is owned
/// here so every emission starts from a clean slate.
pub struct FnEmitter<'a, 'b> {
    pub builder: &'a mut FunctionBuilder<'b>,
    pub module: &'a mut JITModule,
    pub registry: &'a mut Registry,
    pub locals: HashMap<String, Value>,
    pub verbosity: u8,
}

pub fn compile_expr(fx: &mut FnEmitter, expr: &Expr) -> Result<Value, HannaError> {
    match expr {
        Expr::Int(value) => Ok(fx.builder.ins().iconst(types::I64, *value)),
        Expr::Real(value) => Ok(fx.builder.ins().f64const(*value)),
        Expr::Variable(name) => fx
            .locals
            .get(name)
            .copied()
            .ok_or_else(|| HannaError::UnknownVariable(name.clone())),
        Expr::Binary(binary) => compile_binary(fx, binary),
        Expr::Call(call) => compile_call(fx, call),
    }
}

/// Binary emission picks opcodes from the operands' IR types: floating
/// operands select the fadd family and make the result Real. There is no
/// implicit coercion; mismatched operand types mean the caller specialized
/// the surrounding function inconsistently.
fn compile_binary(fx: &mut FnEmitter, binary: &Binary) -> Result<Value, HannaError> {
    let lhs = compile_expr(fx, &binary.lhs)?;
    let rhs = compile_expr(fx, &binary.rhs)?;

    let lhs_ty = fx.builder.func.dfg.value_type(lhs);
    let rhs_ty = fx.builder.func.dfg.value_type(rhs);
    if lhs_ty != rhs_ty {
        return Err(HannaError::TypeMismatch(format!(
            "operands of `{}` have mismatched types ({} vs {})",
            binary.op, lhs_ty, rhs_ty
        )));
    }

    let is_real = lhs_ty == types::F64;
    binary.set_return_type(if is_real { TypeTag::Real } else { TypeTag::Int });

    let value = match (binary.op, is_real) {
        (BinOp::Add, true) => fx.builder.ins().fadd(lhs, rhs),
        (BinOp::Sub, true) => fx.builder.ins().fsub(lhs, rhs),
        (BinOp::Mul, true) => fx.builder.ins().fmul(lhs, rhs),
        (BinOp::Div, true) => fx.builder.ins().fdiv(lhs, rhs),
        (BinOp::Add, false) => fx.builder.ins().iadd(lhs, rhs),
        (BinOp::Sub, false) => fx.builder.ins().isub(lhs, rhs),
        (BinOp::Mul, false) => fx.builder.ins().imul(lhs, rhs),
        (BinOp::Div, false) => fx.builder.ins().sdiv(lhs, rhs),
    };
    Ok(value)
}

/// Call emission. The callee's return type comes from the registry entry for
/// the locally-computed argument-type vector; the declaration is then
/// materialized in the active module and the call emitted. The cached
/// argument types are cleared afterwards so the node re-infers under its
/// next caller.
fn compile_call(fx: &mut FnEmitter, call: &MethodCall) -> Result<Value, HannaError> {
    let arg_types = call_arg_types(fx, call)?;
    let mangled = mangle(&call.callee, &arg_types);

    let (decl, ret) = match fx.registry.spec(&mangled) {
        Some(spec) => (spec.decl.clone(), spec.ret),
        None => return Err(HannaError::UnknownCallee(call.callee.clone())),
    };
    call.set_return_type(ret);

    if fx.verbosity > 1 {
        println!("{}", mangled);
    }

    if call.args.len() != decl.params.len() {
        return Err(HannaError::ArityMismatch {
            name: call.callee.clone(),
            expected: decl.params.len(),
            found: call.args.len(),
        });
    }

    let func_id = ensure_decl(
        fx.module,
        fx.registry,
        &call.callee,
        &arg_types,
        ret,
        Linkage::Import,
    )?;

    let mut args = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        args.push(compile_expr(fx, arg)?);
    }

    let func_ref = fx.module.declare_func_in_func(func_id, fx.builder.func);
    let inst = fx.builder.ins().call(func_ref, &args);
    let result = fx.builder.inst_results(inst)[0];

    call.clear_arg_types();
    Ok(result)
}

/// Argument-type inference at a call site. Binary arguments are forced
/// through a codegen pass so their result type settles (the emitted
/// instructions are dead and the optimizer drops them); every other
/// argument reports its static node type. The result is cached on the call
/// until explicitly cleared.
pub fn call_arg_types(fx: &mut FnEmitter, call: &MethodCall) -> Result<Vec<TypeTag>, HannaError> {
    if let Some(cached) = call.cached_arg_types() {
        return Ok(cached);
    }

    let mut tags = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        if let Expr::Binary(_) = arg {
            let value = compile_expr(fx, arg)?;
            tags.push(tag_of(fx.builder.func.dfg.value_type(value)));
        } else {
            tags.push(arg.node_type());
        }
    }

    call.set_arg_types(tags.clone());
    Ok(tags)
}

/// Materializes a declaration in the active module. The module is consulted
/// first, since emitting the same mangled name twice into one module is
/// forbidden, and only then the registry template.
pub fn ensure_decl(
    module: &mut JITModule,
    registry: &Registry,
    name: &str,
    arg_types: &[TypeTag],
    ret: TypeTag,
    linkage: Linkage,
) -> Result<FuncId, HannaError> {
    let mangled = mangle(name, arg_types);
    if let Some(FuncOrDataId::Func(id)) = module.declarations().get_name(&mangled) {
        return Ok(id);
    }

    let decl = match registry.spec(&mangled) {
        Some(spec) => spec.decl.clone(),
        None => return Err(HannaError::UnknownCallee(name.to_string())),
    };
    if decl.params.len() != arg_types.len() {
        return Err(HannaError::ArityMismatch {
            name: name.to_string(),
            expected: decl.params.len(),
            found: arg_types.len(),
        });
    }

    let mut sig = module.make_signature();
    for tag in arg_types {
        sig.params.push(AbiParam::new(ir_type(*tag)));
    }
    sig.returns.push(AbiParam::new(ir_type(ret)));

    module
        .declare_function(&mangled, linkage, &sig)
        .map_err(|err| HannaError::Codegen(err.to_string()))
}

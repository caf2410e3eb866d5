//! Hanna AST.
//!
//! Expressions are a tagged enum; the small amount of type information that
//! only settles during code generation (a binary's result type, a call's
//! argument-type vector) lives in interior-mutable cells so the shared,
//! otherwise read-only definition templates can be re-specialized per call
//! site.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Node and value tags. `Int` and `Real` are the only types an expression
/// can ultimately yield; the rest are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Real,
    Variable,
    Binary,
    MethodCall,
    MethodDecl,
    MethodDef,
}

impl TypeTag {
    /// Fragment this tag contributes to a mangled name.
    pub fn mangle_str(self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Real => "double",
            TypeTag::Variable => "var",
            TypeTag::MethodCall => "MethodCall",
            _ => "",
        }
    }
}

/// Specialization identifier: the method name followed by one `_tag` per
/// argument, e.g. `add_int_int` or `add_double_double`.
pub fn mangle(name: &str, arg_types: &[TypeTag]) -> String {
    let mut mangled = String::from(name);
    for tag in arg_types {
        mangled.push('_');
        mangled.push_str(tag.mangle_str());
    }
    mangled
}

/// Sentinel names reported by nodes that have no source-level identifier.
/// The specialization engine keys its argument resolution on these.
pub const INT_LITERAL_NAME: &str = "Int Literal";
pub const REAL_LITERAL_NAME: &str = "Real Literal";
pub const EXPRESSION_NAME: &str = "Expression";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug)]
pub enum Expr {
    Int(i64),
    Real(f64),
    Variable(String),
    Binary(Binary),
    Call(MethodCall),
}

impl Expr {
    /// Stable identifier used during parameter-binding resolution.
    pub fn name(&self) -> &str {
        match self {
            Expr::Int(_) => INT_LITERAL_NAME,
            Expr::Real(_) => REAL_LITERAL_NAME,
            Expr::Variable(name) => name,
            Expr::Binary(_) => EXPRESSION_NAME,
            Expr::Call(call) => &call.callee,
        }
    }

    pub fn node_type(&self) -> TypeTag {
        match self {
            Expr::Int(_) => TypeTag::Int,
            Expr::Real(_) => TypeTag::Real,
            Expr::Variable(_) => TypeTag::Variable,
            Expr::Binary(_) => TypeTag::Binary,
            Expr::Call(_) => TypeTag::MethodCall,
        }
    }

    /// Inferred yielded type; defaults to `Int` until codegen proves
    /// otherwise.
    pub fn return_type(&self) -> TypeTag {
        match self {
            Expr::Int(_) => TypeTag::Int,
            Expr::Real(_) => TypeTag::Real,
            Expr::Variable(_) => TypeTag::Int,
            Expr::Binary(binary) => binary.return_type(),
            Expr::Call(call) => call.return_type(),
        }
    }

    pub fn as_call(&self) -> Option<&MethodCall> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(value) => write!(f, "{}", value),
            Expr::Real(value) => write!(f, "{:?}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Binary(binary) => write!(f, "{}", binary),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

#[derive(Debug)]
pub struct Binary {
    pub op: BinOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    return_type: Cell<TypeTag>,
}

impl Binary {
    pub fn new(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            return_type: Cell::new(TypeTag::Int),
        }
    }

    pub fn return_type(&self) -> TypeTag {
        self.return_type.get()
    }

    pub fn set_return_type(&self, tag: TypeTag) {
        self.return_type.set(tag);
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.lhs, self.op, self.rhs)
    }
}

#[derive(Debug)]
pub struct MethodCall {
    pub callee: String,
    pub args: Vec<Expr>,
    /// Cached argument-type vector; cleared after each emission so the node
    /// can be re-specialized under a different caller.
    arg_types: RefCell<Option<Vec<TypeTag>>>,
    return_type: Cell<TypeTag>,
}

impl MethodCall {
    pub fn new(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            callee: callee.into(),
            args,
            arg_types: RefCell::new(None),
            return_type: Cell::new(TypeTag::Int),
        }
    }

    pub fn cached_arg_types(&self) -> Option<Vec<TypeTag>> {
        self.arg_types.borrow().clone()
    }

    pub fn set_arg_types(&self, types: Vec<TypeTag>) {
        *self.arg_types.borrow_mut() = Some(types);
    }

    pub fn clear_arg_types(&self) {
        *self.arg_types.borrow_mut() = None;
    }

    pub fn return_type(&self) -> TypeTag {
        self.return_type.get()
    }

    pub fn set_return_type(&self, tag: TypeTag) {
        self.return_type.set(tag);
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Declaration template: name plus parameter names. Read-only after parse;
/// shared by the definitions map, the specialization registry, and any
/// in-flight emission.
#[derive(Debug)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

impl fmt::Display for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// Definition template awaiting specialization: the shared declaration plus
/// the single body expression. The concrete argument-type vector for each
/// specialization travels through the engine explicitly.
#[derive(Debug)]
pub struct MethodDef {
    pub decl: Rc<MethodDecl>,
    pub body: Expr,
    return_type: Cell<TypeTag>,
}

impl MethodDef {
    pub fn new(decl: Rc<MethodDecl>, body: Expr) -> Self {
        Self {
            decl,
            body,
            return_type: Cell::new(TypeTag::Int),
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn return_type(&self) -> TypeTag {
        self.return_type.get()
    }

    pub fn set_return_type(&self, tag: TypeTag) {
        self.return_type.set(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangled_names_follow_argument_tags() {
        assert_eq!(mangle("add", &[TypeTag::Int, TypeTag::Int]), "add_int_int");
        assert_eq!(
            mangle("add", &[TypeTag::Real, TypeTag::Real]),
            "add_double_double"
        );
        assert_eq!(mangle("dbl", &[TypeTag::MethodCall]), "dbl_MethodCall");
        assert_eq!(mangle("f", &[TypeTag::Variable]), "f_var");
        assert_eq!(mangle("main", &[]), "main");
    }

    #[test]
    fn literal_and_operator_nodes_report_sentinel_names() {
        assert_eq!(Expr::Int(1).name(), "Int Literal");
        assert_eq!(Expr::Real(1.5).name(), "Real Literal");
        assert_eq!(Expr::Variable("x".into()).name(), "x");
        let bin = Expr::Binary(Binary::new(BinOp::Add, Expr::Int(1), Expr::Int(2)));
        assert_eq!(bin.name(), "Expression");
        let call = Expr::Call(MethodCall::new("sq", vec![Expr::Int(2)]));
        assert_eq!(call.name(), "sq");
    }

    #[test]
    fn return_types_default_to_int() {
        let bin = Binary::new(BinOp::Mul, Expr::Int(2), Expr::Int(3));
        assert_eq!(bin.return_type(), TypeTag::Int);
        let call = MethodCall::new("f", Vec::new());
        assert_eq!(call.return_type(), TypeTag::Int);
    }

    #[test]
    fn call_arg_type_cache_round_trips() {
        let call = MethodCall::new("f", vec![Expr::Int(1)]);
        assert_eq!(call.cached_arg_types(), None);
        call.set_arg_types(vec![TypeTag::Int]);
        assert_eq!(call.cached_arg_types(), Some(vec![TypeTag::Int]));
        call.clear_arg_types();
        assert_eq!(call.cached_arg_types(), None);
    }

    #[test]
    fn display_shows_source_like_shapes() {
        let call = MethodCall::new(
            "add",
            vec![
                Expr::Int(2),
                Expr::Binary(Binary::new(BinOp::Mul, Expr::Int(3), Expr::Int(4))),
            ],
        );
        assert_eq!(call.to_string(), "add(2, (3 * 4))");
    }
}

//! Process-wide specialization registry.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::{MethodDecl, MethodDef, TypeTag};

/// One emitted specialization: the shared declaration template and the
/// return type inference settled on for this argument-type vector.
#[derive(Debug, Clone)]
pub struct Spec {
    pub decl: Rc<MethodDecl>,
    pub ret: TypeTag,
}

/// Definition templates by method name, and emitted specializations by
/// mangled name. `defs` is filled once after parsing and never changes;
/// `specs` grows as call sites demand specializations and only shrinks when
/// a top-level wrapper's resource handle is released.
#[derive(Default)]
pub struct Registry {
    defs: HashMap<String, Rc<MethodDef>>,
    specs: HashMap<String, Spec>,
    in_flight: HashSet<String>,
}

impl Registry {
    pub fn load_definitions(&mut self, methods: HashMap<String, Rc<MethodDef>>) {
        self.defs = methods;
    }

    pub fn definition(&self, name: &str) -> Option<Rc<MethodDef>> {
        self.defs.get(name).cloned()
    }

    pub fn spec(&self, mangled: &str) -> Option<&Spec> {
        self.specs.get(mangled)
    }

    pub fn register_spec(&mut self, mangled: String, decl: Rc<MethodDecl>, ret: TypeTag) {
        self.specs.insert(mangled, Spec { decl, ret });
    }

    pub fn remove_spec(&mut self, mangled: &str) {
        self.specs.remove(mangled);
    }

    /// Marks a specialization as being emitted. Returns false when it is
    /// already in flight, which can only mean the method's call graph is
    /// cyclic.
    pub fn begin_emission(&mut self, mangled: &str) -> bool {
        self.in_flight.insert(mangled.to_string())
    }

    pub fn end_emission(&mut self, mangled: &str) {
        self.in_flight.remove(mangled);
    }
}

use vc_common::Span;

use super::scope::ScopeStack;
use super::types::Type;
use crate::ast::DeclId;

/// What a declaration introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    GlobalVar,
    LocalVar,
    Param,
    Function,
}

/// Checker-side record of one declaration, indexed by [`DeclId`].
#[derive(Debug, Clone)]
pub struct DeclInfo {
    pub kind: DeclKind,
    pub name: String,
    /// Variable type, or return type for functions.
    pub ty: Type,
    /// Parameter types; empty for variables.
    pub params: Vec<Type>,
    pub span: Span,
}

impl DeclInfo {
    pub fn is_function(&self) -> bool {
        self.kind == DeclKind::Function
    }
}

/// The built-in I/O functions: name, return type, parameter types.
pub fn builtins() -> Vec<(&'static str, Type, Vec<Type>)> {
    vec![
        ("getInt", Type::Int, vec![]),
        ("putInt", Type::Void, vec![Type::Int]),
        ("putIntLn", Type::Void, vec![Type::Int]),
        ("getFloat", Type::Float, vec![]),
        ("putFloat", Type::Void, vec![Type::Float]),
        ("putFloatLn", Type::Void, vec![Type::Float]),
        ("putBool", Type::Void, vec![Type::Boolean]),
        ("putBoolLn", Type::Void, vec![Type::Boolean]),
        ("putString", Type::Void, vec![Type::String]),
        ("putStringLn", Type::Void, vec![Type::String]),
        ("putLn", Type::Void, vec![]),
    ]
}

/// Every declaration seen during one analysis run, starting with the
/// built-ins.
#[derive(Debug, Default)]
pub struct Environment {
    decls: Vec<DeclInfo>,
}

impl Environment {
    /// Create the standard environment and bind the built-ins at the
    /// current (global) level of `scopes`.
    pub fn standard(scopes: &mut ScopeStack) -> Self {
        let mut env = Self::default();
        for (name, ret, params) in builtins() {
            let id = env.declare(DeclInfo {
                kind: DeclKind::Function,
                name: name.to_string(),
                ty: ret,
                params,
                span: Span::dummy(),
            });
            scopes.insert(name, id);
        }
        env
    }

    pub fn declare(&mut self, info: DeclInfo) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(info);
        id
    }

    pub fn get(&self, id: DeclId) -> &DeclInfo {
        &self.decls[id.index()]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut DeclInfo {
        &mut self.decls[id.index()]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

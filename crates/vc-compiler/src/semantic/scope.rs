use tracing::trace;

use crate::ast::DeclId;

/// One entry of the scope stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub level: u32,
    pub decl: DeclId,
}

/// Level of the program's top scope: globals, functions and built-ins.
pub const GLOBAL_LEVEL: u32 = 1;

/// A single stack of `(name, level, declaration)` bindings.
///
/// Lookups scan from the top, so inner bindings shadow outer ones. Duplicate
/// names are pushed like any other binding; redeclaration is detected by the
/// caller through [`ScopeStack::retrieve_at_current_level`].
#[derive(Debug)]
pub struct ScopeStack {
    bindings: Vec<Binding>,
    level: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            level: GLOBAL_LEVEL,
        }
    }

    pub fn open_scope(&mut self) {
        self.level += 1;
        trace!(level = self.level, "scope opened");
    }

    /// Discard every binding of the current level, then leave it.
    ///
    /// # Panics
    /// If no scope is open.
    pub fn close_scope(&mut self) {
        assert!(self.level > 0, "close_scope called with no open scope");
        while self
            .bindings
            .last()
            .is_some_and(|binding| binding.level == self.level)
        {
            self.bindings.pop();
        }
        trace!(level = self.level, "scope closed");
        self.level -= 1;
    }

    pub fn insert(&mut self, name: impl Into<String>, decl: DeclId) {
        self.bindings.push(Binding {
            name: name.into(),
            level: self.level,
            decl,
        });
    }

    /// Innermost visible binding for `name`.
    pub fn retrieve(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|binding| binding.name == name)
    }

    /// Binding for `name` declared in the current scope only.
    pub fn retrieve_at_current_level(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .rev()
            .take_while(|binding| binding.level == self.level)
            .find(|binding| binding.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_binding_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.insert("x", DeclId(0));
        scopes.open_scope();
        scopes.insert("x", DeclId(1));
        assert_eq!(scopes.retrieve("x").map(|b| b.decl), Some(DeclId(1)));
        scopes.close_scope();
        assert_eq!(scopes.retrieve("x").map(|b| b.decl), Some(DeclId(0)));
    }

    #[test]
    fn current_level_lookup_ignores_outer_scopes() {
        let mut scopes = ScopeStack::new();
        scopes.insert("x", DeclId(0));
        scopes.open_scope();
        assert!(scopes.retrieve_at_current_level("x").is_none());
        assert!(scopes.retrieve("x").is_some());
        scopes.insert("y", DeclId(1));
        assert_eq!(
            scopes.retrieve_at_current_level("y").map(|b| b.level),
            Some(GLOBAL_LEVEL + 1)
        );
    }

    #[test]
    fn duplicate_insert_masks_earlier_binding() {
        let mut scopes = ScopeStack::new();
        scopes.insert("x", DeclId(0));
        scopes.insert("x", DeclId(1));
        assert_eq!(
            scopes.retrieve_at_current_level("x").map(|b| b.decl),
            Some(DeclId(1))
        );
    }

    #[test]
    fn close_scope_discards_only_its_level() {
        let mut scopes = ScopeStack::new();
        scopes.insert("g", DeclId(0));
        scopes.open_scope();
        scopes.insert("a", DeclId(1));
        scopes.open_scope();
        scopes.insert("b", DeclId(2));
        scopes.close_scope();
        assert!(scopes.retrieve("b").is_none());
        assert!(scopes.retrieve_at_current_level("a").is_some());
        assert!(scopes.retrieve("a").is_some());
        scopes.close_scope();
        assert!(scopes.retrieve("a").is_none());
        assert!(scopes.retrieve("g").is_some());
    }

    #[test]
    #[should_panic(expected = "no open scope")]
    fn closing_past_the_bottom_panics() {
        let mut scopes = ScopeStack::new();
        scopes.close_scope();
        scopes.close_scope();
    }
}

pub mod checker;
pub mod environment;
pub mod errors;
pub mod scope;
pub mod type_checker;
pub mod types;

pub use errors::SemanticError;
pub use types::Type;

use vc_common::DiagnosticBag;

use crate::ast::nodes::Program;

/// Run semantic analysis on the given program, decorating it in place.
///
/// Returns a `DiagnosticBag` containing every condition found. The pass:
///  1. Resolves identifiers against nested scopes, builtins included
///  2. Types every expression and specializes every operator
///  3. Inserts explicit int-to-float conversions
///  4. Validates control flow (loops, returns, reachability) and `main`
pub fn analyze(program: &mut Program) -> DiagnosticBag {
    checker::Checker::new().check(program)
}

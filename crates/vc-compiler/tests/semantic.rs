//! End-to-end tests: VC source → tokens → tree → checked, decorated tree.

use vc_common::Diagnostic;
use vc_compiler::ast::*;
use vc_compiler::lexer::Lexer;
use vc_compiler::parser::Parser;
use vc_compiler::semantic::{self, SemanticError, Type};

/// Lex, parse and check `source`; lexing and parsing must be clean.
fn check(source: &str) -> (Program, Vec<Diagnostic>) {
    let (tokens, lex_diags) = Lexer::new(source, "test.vc").tokenize();
    assert!(
        !lex_diags.has_errors(),
        "lexer errors: {:?}",
        lex_diags.diagnostics()
    );

    let (mut program, parse_diags) = Parser::new(tokens).parse();
    assert!(
        !parse_diags.has_errors(),
        "parse errors: {:?}",
        parse_diags.diagnostics()
    );

    let diags = semantic::analyze(&mut program);
    (program, diags.into_diagnostics())
}

fn codes(source: &str) -> Vec<u16> {
    check(source)
        .1
        .iter()
        .map(|d| d.code.expect("semantic diagnostics carry a code"))
        .collect()
}

fn lines(source: &str) -> Vec<(u16, u32)> {
    check(source)
        .1
        .iter()
        .map(|d| {
            let line = d.span.as_ref().map(|s| s.start.line).unwrap_or(0);
            (d.code.unwrap_or(u16::MAX), line)
        })
        .collect()
}

fn function<'a>(program: &'a Program, name: &str) -> &'a FunctionDecl {
    program
        .declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Function(f) if f.name == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function named {}", name))
}

// =========================================================================
// Whole programs
// =========================================================================

#[test]
fn e2e_well_typed_program_is_clean() {
    let (_, diags) = check(
        r#"
        int total[] = {1, 2, 3};
        float scale = 2;

        float average(int xs[], int n) {
            int i;
            float sum = 0;
            for (i = 0; i < n; i = i + 1)
                sum = sum + xs[i];
            return sum / n;
        }

        int main() {
            boolean done = false;
            while (!done) {
                putFloatLn(average(total, 3) * scale);
                done = true;
            }
            putStringLn("bye");
            return 0;
        }
        "#,
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
}

#[test]
fn e2e_diagnostics_follow_traversal_order() {
    let source = "\
int x;
float x;
int main() {
  y = 1;
  if (1) x = 2;
  break;
  return 0;
}
";
    assert_eq!(
        lines(source),
        vec![(2, 2), (5, 4), (20, 5), (23, 6)]
    );
}

#[test]
fn e2e_missing_main_reported_last() {
    assert_eq!(codes("int f() { return true; }"), vec![8, 0]);
}

#[test]
fn e2e_every_message_carries_code_prefix() {
    let (_, diags) = check("int f(int a) { int a; } int main() { f(1, 2); return g; }");
    assert_eq!(
        diags.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(),
        vec![
            "*2: identifier redeclared: a",
            "*31: missing return statement",
            "*25: too many actual parameters",
            "*5: identifier undeclared: g",
        ]
    );
}

#[test]
fn e2e_all_diagnostics_are_errors() {
    let (_, diags) = check("void main() { break; }");
    assert_eq!(diags.len(), 2);
    assert!(diags.iter().all(Diagnostic::is_error));
}

#[test]
fn e2e_codes_map_back_to_conditions() {
    for code in codes("int a[]; int main() { a[true] = 1; return 0; }") {
        let kind = SemanticError::from_code(code).expect("known code");
        assert_eq!(kind.code(), code);
    }
}

// =========================================================================
// Scopes
// =========================================================================

#[test]
fn e2e_scopes_close_with_their_blocks() {
    assert_eq!(
        codes("int main() { { int inner; } inner = 1; return 0; }"),
        vec![5]
    );
}

#[test]
fn e2e_parameters_are_local_to_their_function() {
    assert_eq!(
        codes("void f(int p) { } int main() { p = 1; return 0; }"),
        vec![5]
    );
}

#[test]
fn e2e_functions_are_visible_after_their_declaration_only() {
    assert_eq!(
        codes("int main() { return f(); } int f() { return 1; }"),
        vec![5]
    );
}

#[test]
fn e2e_locals_shadow_globals() {
    let (program, diags) = check("int v; int main() { float v; v = 1.5; return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);
    let main = function(&program, "main");
    let Stmt::Expr(assign) = &main.body.stmts[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { target, .. } = &assign.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Var(var) = &target.kind else {
        panic!("expected variable");
    };
    assert_eq!(var.decl, main.body.decls[0].id);
    assert_eq!(target.ty, Some(Type::Float));
}

// =========================================================================
// Decoration
// =========================================================================

#[test]
fn e2e_every_expression_is_typed() {
    fn walk(expr: &Expr, seen: &mut usize) {
        assert!(expr.ty.is_some(), "untyped node: {:?}", expr.kind);
        *seen += 1;
        match &expr.kind {
            ExprKind::Unary { operand, .. } => walk(operand, seen),
            ExprKind::Binary { left, right, .. } => {
                walk(left, seen);
                walk(right, seen);
            }
            ExprKind::Assign { target, value } => {
                walk(target, seen);
                walk(value, seen);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(|a| walk(a, seen)),
            ExprKind::Index { index, .. } => walk(index, seen),
            ExprKind::Literal(_) | ExprKind::Var(_) => {}
        }
    }

    let (program, diags) =
        check("int main() { int a[2]; float f; f = a[0] * 2 + -f; putFloat(f); return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);

    let main = function(&program, "main");
    let mut seen = 0;
    for stmt in &main.body.stmts {
        match stmt {
            Stmt::Expr(e) => walk(e, &mut seen),
            Stmt::Return(ret) => ret.value.iter().for_each(|e| walk(e, &mut seen)),
            _ => {}
        }
    }
    assert!(seen >= 10);
}

#[test]
fn e2e_mixed_arithmetic_is_specialized_and_widened() {
    let (program, diags) = check("int main() { float f; int i; f = i * 2.0; return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);

    let main = function(&program, "main");
    let Stmt::Expr(assign) = &main.body.stmts[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { value, .. } = &assign.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { left, op, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(op.spelling(), "f*");
    let ExprKind::Unary { op: conv, operand } = &left.kind else {
        panic!("expected conversion node");
    };
    assert_eq!(conv.spelling(), "i2f");
    assert_eq!(left.ty, Some(Type::Float));
    assert!(matches!(&operand.kind, ExprKind::Var(v) if v.name == "i"));
}

#[test]
fn e2e_boolean_operators_use_int_form() {
    let (program, diags) = check("int main() { boolean b; b = !b && 1.0 == 2.0; return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);

    let main = function(&program, "main");
    let Stmt::Expr(assign) = &main.body.stmts[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { value, .. } = &assign.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { left, op, right } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(op.spelling(), "i&&");
    let ExprKind::Unary { op: not, .. } = &left.kind else {
        panic!("expected unary expression");
    };
    assert_eq!(not.spelling(), "i!");
    let ExprKind::Binary { op: eq, .. } = &right.kind else {
        panic!("expected comparison");
    };
    assert_eq!(eq.spelling(), "f==");
    assert_eq!(right.ty, Some(Type::Boolean));
}

#[test]
fn e2e_call_arguments_are_widened() {
    let (program, diags) = check("int main() { putFloatLn(7); return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);

    let main = function(&program, "main");
    let Stmt::Expr(call) = &main.body.stmts[0] else {
        panic!("expected call statement");
    };
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected call");
    };
    assert!(matches!(
        &args[0].kind,
        ExprKind::Unary { op, .. } if op.op == UnaryOp::IntToFloat
    ));
    assert_eq!(call.ty, Some(Type::Void));
}

#[test]
fn e2e_return_value_is_widened() {
    let (program, diags) = check("float half(int n) { return n / 2; } int main() { return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);

    let half = function(&program, "half");
    let Stmt::Return(ret) = &half.body.stmts[0] else {
        panic!("expected return");
    };
    let value = ret.value.as_ref().expect("return value");
    let ExprKind::Unary { op, operand } = &value.kind else {
        panic!("expected conversion node");
    };
    assert_eq!(op.op, UnaryOp::IntToFloat);
    let ExprKind::Binary { op: div, .. } = &operand.kind else {
        panic!("expected division");
    };
    assert_eq!(div.spelling(), "i/");
}

#[test]
fn e2e_inferred_array_size_on_global() {
    let (program, diags) = check("boolean flags[] = {true, false}; int main() { return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);
    let Declaration::Var(flags) = &program.declarations[0] else {
        panic!("expected global");
    };
    assert_eq!(flags.ty, Type::array(Type::Boolean, Some(2)));
    assert_eq!(flags.ty.to_string(), "boolean[2]");
}

#[test]
fn e2e_decorated_tree_serializes() {
    let (program, diags) = check("int main() { float f = 1; return 0; }");
    assert!(diags.is_empty(), "{:?}", diags);
    let json = serde_json::to_string(&program).expect("tree serializes");
    assert!(json.contains("\"IntToFloat\""), "{}", json);
    assert!(json.contains("\"Float\""), "{}", json);
}

// =========================================================================
// Error containment
// =========================================================================

#[test]
fn e2e_undeclared_names_do_not_cascade() {
    assert_eq!(
        codes("int main() { int i; i = (nope + 1) * 2 - nope; if (nope) ; return nope; }"),
        vec![5, 5, 5, 5]
    );
}

#[test]
fn e2e_bad_call_arguments_do_not_cascade() {
    assert_eq!(
        codes("void f(int a) { } int main() { f(missing); f(1.5 + true); return 0; }"),
        vec![5, 9]
    );
}

#[test]
fn e2e_error_typed_initialiser_elements_are_skipped() {
    assert_eq!(
        codes("int main() { int a[2] = {q, 1}; return 0; }"),
        vec![5]
    );
}

#[test]
fn e2e_void_array_initialiser_is_not_checked_elementwise() {
    assert_eq!(
        codes("void v[] = {1, 2.0}; int main() { return 0; }"),
        vec![4]
    );
}

// =========================================================================
// Control flow
// =========================================================================

#[test]
fn e2e_loop_depth_is_per_function() {
    assert_eq!(
        codes("void f() { break; } int main() { while (true) f(); return 0; }"),
        vec![23]
    );
}

#[test]
fn e2e_nested_loops_and_blocks() {
    assert!(codes(
        "int main() { int i; for (i = 0; i < 3; i = i + 1) { while (false) { continue; } break; } return 0; }"
    )
    .is_empty());
}

#[test]
fn e2e_unreachable_after_return_in_nested_block() {
    assert_eq!(
        codes("int main() { { return 1; putLn(); } return 0; }"),
        vec![30]
    );
}

#[test]
fn e2e_return_as_last_statement_is_reachable() {
    assert!(codes("int main() { putLn(); return 0; }").is_empty());
}

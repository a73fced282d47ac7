use crate::ast::*;
use crate::lexer::token::TokenKind;

use super::Parser;

// ============================================================================
// Binding powers for Pratt parsing
// ============================================================================
//
// Higher values bind tighter. (left_bp, right_bp): left < right = left-assoc.
//
//  Assignment   =                 (2, 1)   right-assoc
//  Logical OR   ||                (3, 4)
//  Logical AND  &&                (5, 6)
//  Equality     == !=             (7, 8)
//  Relational   < <= > >=         (9, 10)
//  Additive     + -               (11, 12)
//  Multiplic.   * /               (13, 14)
//  Prefix       + - !             15

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Equal => Some((2, 1)),
        TokenKind::PipePipe => Some((3, 4)),
        TokenKind::AmpAmp => Some((5, 6)),
        TokenKind::EqualEqual | TokenKind::BangEqual => Some((7, 8)),
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Some((9, 10))
        }
        TokenKind::Plus | TokenKind::Minus => Some((11, 12)),
        TokenKind::Star | TokenKind::Slash => Some((13, 14)),
        _ => None,
    }
}

const PREFIX_BP: u8 = 15;

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_expr_bp(0)
    }

    /// Core Pratt loop: parse an expression whose operators all bind at
    /// least as tightly as `min_bp`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op_kind = self.peek();
            let Some((left_bp, right_bp)) = infix_binding_power(op_kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.advance(); // consume operator

            let rhs = self.parse_expr_bp(right_bp)?;
            let span = lhs.span.merge(&rhs.span);
            let kind = match token_to_binary_op(op_kind) {
                Some(op) => ExprKind::Binary {
                    left: Box::new(lhs),
                    op: BinaryOperator::new(op),
                    right: Box::new(rhs),
                },
                None => ExprKind::Assign {
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                },
            };
            lhs = Expr::new(kind, span);
        }

        Some(lhs)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        let op = match self.peek() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let start = self.current_span();
        self.advance(); // consume operator
        let operand = self.parse_expr_bp(PREFIX_BP)?;
        let span = start.merge(&operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op: UnaryOperator::new(op),
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.peek() {
            TokenKind::IntLiteral => {
                let token = self.advance().clone();
                match token.lexeme.parse::<i64>() {
                    Ok(value) => Some(Expr::new(
                        ExprKind::Literal(Literal::Int(value)),
                        token.span,
                    )),
                    Err(_) => {
                        self.diagnostics.error(
                            format!("{}: integer literal out of range", token.lexeme),
                            token.span,
                        );
                        None
                    }
                }
            }
            TokenKind::FloatLiteral => {
                let token = self.advance().clone();
                match parse_float(&token.lexeme) {
                    Some(value) => Some(Expr::new(
                        ExprKind::Literal(Literal::Float(value)),
                        token.span,
                    )),
                    None => {
                        self.diagnostics.error(
                            format!("{}: malformed float literal", token.lexeme),
                            token.span,
                        );
                        None
                    }
                }
            }
            TokenKind::BoolLiteral => {
                let token = self.advance().clone();
                let value = token.lexeme == "true";
                Some(Expr::new(ExprKind::Literal(Literal::Bool(value)), token.span))
            }
            TokenKind::StringLiteral => {
                let token = self.advance().clone();
                Some(Expr::new(
                    ExprKind::Literal(Literal::String(token.lexeme)),
                    token.span,
                ))
            }
            TokenKind::Identifier => self.parse_identifier_expr(),
            TokenKind::LeftParen => {
                self.advance(); // consume '('
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Some(inner)
            }
            _ => {
                self.error_expected("expression");
                None
            }
        }
    }

    /// `id`, `id ( args )` or `id [ expr ]`
    fn parse_identifier_expr(&mut self) -> Option<Expr> {
        let token = self.advance().clone();
        let name = VarRef::new(token.lexeme, token.span.clone());

        match self.peek() {
            TokenKind::LeftParen => {
                let args = self.parse_arg_list()?;
                let span = token.span.merge(&self.previous_span());
                Some(Expr::new(ExprKind::Call { callee: name, args }, span))
            }
            TokenKind::LeftBracket => {
                self.advance(); // consume '['
                let index = self.parse_expression()?;
                self.expect(TokenKind::RightBracket)?;
                let span = token.span.merge(&self.previous_span());
                Some(Expr::new(
                    ExprKind::Index {
                        array: name,
                        index: Box::new(index),
                    },
                    span,
                ))
            }
            _ => Some(Expr::new(ExprKind::Var(name), token.span)),
        }
    }

    /// `( (expr (, expr)*)? )`
    fn parse_arg_list(&mut self) -> Option<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if self.peek() != TokenKind::RightParen {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        Some(args)
    }
}

fn token_to_binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::PipePipe => Some(BinaryOp::Or),
        TokenKind::AmpAmp => Some(BinaryOp::And),
        TokenKind::EqualEqual => Some(BinaryOp::Eq),
        TokenKind::BangEqual => Some(BinaryOp::Neq),
        TokenKind::Less => Some(BinaryOp::Lt),
        TokenKind::LessEqual => Some(BinaryOp::Lte),
        TokenKind::Greater => Some(BinaryOp::Gt),
        TokenKind::GreaterEqual => Some(BinaryOp::Gte),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        _ => None,
    }
}

/// VC allows `1.` and `1.e5`; normalise those before handing off to `f64`.
fn parse_float(lexeme: &str) -> Option<f64> {
    let normalised = match lexeme.find('.') {
        Some(dot) if !lexeme[dot + 1..].starts_with(|c: char| c.is_ascii_digit()) => {
            format!("{}.0{}", &lexeme[..dot], &lexeme[dot + 1..])
        }
        _ => lexeme.to_string(),
    };
    normalised.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_float;
    use crate::ast::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn expr(source: &str) -> Expr {
        let src = format!("int main() {{ {}; }}", source);
        let (tokens, lex_diags) = Lexer::new(&src, "test.vc").tokenize();
        assert!(!lex_diags.has_errors(), "lex errors: {:?}", lex_diags.diagnostics());
        let (program, parse_diags) = Parser::new(tokens).parse();
        assert!(
            !parse_diags.has_errors(),
            "parse errors: {:?}",
            parse_diags.diagnostics()
        );
        match program.declarations.into_iter().next() {
            Some(Declaration::Function(f)) => match f.body.stmts.into_iter().next() {
                Some(Stmt::Expr(e)) => e,
                other => panic!("expected expression statement, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    /// Render the tree fully parenthesised, for precedence checks.
    fn show(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Literal(Literal::Int(v)) => v.to_string(),
            ExprKind::Literal(Literal::Float(v)) => v.to_string(),
            ExprKind::Literal(Literal::Bool(v)) => v.to_string(),
            ExprKind::Literal(Literal::String(s)) => format!("{:?}", s),
            ExprKind::Var(v) => v.name.clone(),
            ExprKind::Unary { op, operand } => format!("({}{})", op.spelling(), show(operand)),
            ExprKind::Binary { left, op, right } => {
                format!("({} {} {})", show(left), op.spelling(), show(right))
            }
            ExprKind::Assign { target, value } => format!("({} = {})", show(target), show(value)),
            ExprKind::Call { callee, args } => format!(
                "{}({})",
                callee.name,
                args.iter().map(show).collect::<Vec<_>>().join(", ")
            ),
            ExprKind::Index { array, index } => format!("{}[{}]", array.name, show(index)),
        }
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(show(&expr("1 + 2 * 3 - 4")), "((1 + (2 * 3)) - 4)");
    }

    #[test]
    fn logical_and_relational_precedence() {
        assert_eq!(
            show(&expr("a < b == c || d && !e")),
            "(((a < b) == c) || (d && (!e)))"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(show(&expr("a = b = c + 1")), "(a = (b = (c + 1)))");
    }

    #[test]
    fn assignment_target_may_be_any_expression() {
        assert_eq!(show(&expr("a + b = 1")), "((a + b) = 1)");
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        assert_eq!(show(&expr("-a * +b")), "((-a) * (+b))");
    }

    #[test]
    fn parentheses_regroup_without_a_node() {
        assert_eq!(show(&expr("(1 + 2) * 3")), "((1 + 2) * 3)");
    }

    #[test]
    fn calls_and_indexing() {
        assert_eq!(show(&expr("f(a[i + 1], g())")), "f(a[(i + 1)], g())");
    }

    #[test]
    fn literals() {
        assert_eq!(
            show(&expr("putString(\"hi\\n\") + 1.5 + true")),
            "((putString(\"hi\\n\") + 1.5) + true)"
        );
    }

    #[test]
    fn spans_cover_whole_expression() {
        let e = expr("a + bb");
        assert_eq!(e.span.start.column, 14);
        assert_eq!(e.span.end.column, 20);
    }

    #[test]
    fn float_lexemes_without_fraction_digits() {
        assert_eq!(parse_float("1."), Some(1.0));
        assert_eq!(parse_float("2.e2"), Some(200.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1E3"), Some(1000.0));
    }
}

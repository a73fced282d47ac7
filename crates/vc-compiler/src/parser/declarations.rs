use vc_common::Span;

use crate::ast::*;
use crate::lexer::token::TokenKind;
use crate::semantic::types::Type;

use super::Parser;

impl Parser {
    /// Parse one top-level declaration. A global variable declaration may
    /// declare several names, so results are pushed into `out`.
    pub(super) fn parse_declaration(&mut self, out: &mut Vec<Declaration>) -> Option<()> {
        let start = self.current_span();
        let ty = self.parse_type()?;
        let name_token = self.expect(TokenKind::Identifier)?.clone();

        if self.peek() == TokenKind::LeftParen {
            let func = self.parse_function_rest(ty, name_token.lexeme, name_token.span, start)?;
            out.push(Declaration::Function(func));
        } else {
            let vars = self.parse_var_decl_rest(ty, name_token.lexeme, name_token.span, start)?;
            out.extend(vars.into_iter().map(Declaration::Var));
        }
        Some(())
    }

    /// Parse `type declarator (= init)? (, declarator (= init)?)* ;` inside a
    /// block, after checking that the current token starts a type.
    pub(super) fn parse_local_var_decl(&mut self) -> Option<Vec<VarDecl>> {
        let start = self.current_span();
        let ty = self.parse_type()?;
        let name_token = self.expect(TokenKind::Identifier)?.clone();
        self.parse_var_decl_rest(ty, name_token.lexeme, name_token.span, start)
    }

    /// `void | boolean | int | float`
    pub(super) fn parse_type(&mut self) -> Option<Type> {
        let ty = match self.peek() {
            TokenKind::Void => Type::Void,
            TokenKind::Boolean => Type::Boolean,
            TokenKind::Int => Type::Int,
            TokenKind::Float => Type::Float,
            _ => {
                self.error_expected("type");
                return None;
            }
        };
        self.advance();
        Some(ty)
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn parse_function_rest(
        &mut self,
        return_type: Type,
        name: String,
        name_span: Span,
        start: Span,
    ) -> Option<FunctionDecl> {
        let params = self.parse_param_list()?;
        let body = self.parse_block()?;
        let span = start.merge(&body.span);

        Some(FunctionDecl {
            name,
            name_span,
            return_type,
            params,
            body,
            span,
            id: None,
        })
    }

    /// `( (type declarator (, type declarator)*)? )`
    fn parse_param_list(&mut self) -> Option<Vec<ParamDecl>> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();

        if self.peek() != TokenKind::RightParen {
            loop {
                let start = self.current_span();
                let base = self.parse_type()?;
                let name_token = self.expect(TokenKind::Identifier)?.clone();
                let ty = self.parse_array_suffix(base)?;
                params.push(ParamDecl {
                    name: name_token.lexeme,
                    name_span: name_token.span,
                    ty,
                    span: start.merge(&self.previous_span()),
                    id: None,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RightParen)?;
        Some(params)
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// Parse the rest of a declaration list once its type and first name
    /// have been consumed.
    fn parse_var_decl_rest(
        &mut self,
        base: Type,
        first_name: String,
        first_span: Span,
        start: Span,
    ) -> Option<Vec<VarDecl>> {
        let mut decls = vec![self.parse_init_declarator(&base, first_name, first_span, &start)?];

        while self.eat(TokenKind::Comma) {
            let name_token = self.expect(TokenKind::Identifier)?.clone();
            decls.push(self.parse_init_declarator(
                &base,
                name_token.lexeme,
                name_token.span,
                &start,
            )?);
        }

        self.expect(TokenKind::Semicolon)?;
        Some(decls)
    }

    fn parse_init_declarator(
        &mut self,
        base: &Type,
        name: String,
        name_span: Span,
        start: &Span,
    ) -> Option<VarDecl> {
        let ty = self.parse_array_suffix(base.clone())?;
        let initializer = if self.eat(TokenKind::Equal) {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        Some(VarDecl {
            name,
            name_span,
            ty,
            initializer,
            span: start.merge(&self.previous_span()),
            id: None,
        })
    }

    /// Optional `[ INTLITERAL? ]` after a declared name.
    fn parse_array_suffix(&mut self, base: Type) -> Option<Type> {
        if !self.eat(TokenKind::LeftBracket) {
            return Some(base);
        }
        let size = if self.peek() == TokenKind::IntLiteral {
            let token = self.advance().clone();
            match token.lexeme.parse::<usize>() {
                Ok(size) => Some(size),
                Err(_) => {
                    self.diagnostics.error(
                        format!("{}: array size out of range", token.lexeme),
                        token.span,
                    );
                    return None;
                }
            }
        } else {
            None
        };
        self.expect(TokenKind::RightBracket)?;
        Some(Type::Array {
            element: Box::new(base),
            size,
        })
    }

    /// `expr` or `{ (expr (, expr)* ,?)? }`
    fn parse_initializer(&mut self) -> Option<Initializer> {
        if self.peek() != TokenKind::LeftBrace {
            return self.parse_expression().map(Initializer::Expr);
        }

        let start = self.current_span();
        self.advance();
        let mut elements = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            elements.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Some(Initializer::Array(ArrayInit {
            elements,
            span: start.merge(&self.previous_span()),
        }))
    }
}

use tracing::debug;
use vc_common::{Diagnostic, DiagnosticBag, Span};

use crate::ast::*;

use super::environment::{DeclInfo, DeclKind, Environment};
use super::errors::SemanticError;
use super::scope::ScopeStack;
use super::type_checker::{self, OperandError};
use super::types::{widens_to, Type};

/// Where an expression appears, for the scalar/function rules on bare names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Operand, initialiser, argument, condition and so on.
    Value,
    /// The whole expression of an expression statement.
    Statement,
}

/// Scope resolution, type checking and decoration in a single pass.
///
/// Declarations are entered into the scope stack in source order. Every
/// expression gets its `ty`, every operator its specialization and every
/// implicit `int` to `float` conversion an explicit node.
pub struct Checker {
    scopes: ScopeStack,
    env: Environment,
    diagnostics: DiagnosticBag,
    /// Return type of the function being checked.
    current_return: Option<Type>,
    /// Set by any `return` in the current function body.
    seen_return: bool,
    loop_depth: u32,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        let mut scopes = ScopeStack::new();
        let env = Environment::standard(&mut scopes);
        Self {
            scopes,
            env,
            diagnostics: DiagnosticBag::new(),
            current_return: None,
            seen_return: true,
            loop_depth: 0,
        }
    }

    /// Check and decorate `program`, returning every diagnostic found.
    pub fn check(mut self, program: &mut Program) -> DiagnosticBag {
        debug!(
            declarations = program.declarations.len(),
            "semantic analysis started"
        );

        for decl in &mut program.declarations {
            match decl {
                Declaration::Function(func) => self.check_function(func),
                Declaration::Var(var) => self.check_var_decl(var, DeclKind::GlobalVar),
            }
        }

        let has_main = self
            .scopes
            .retrieve("main")
            .is_some_and(|binding| self.env.get(binding.decl).is_function());
        if !has_main {
            self.report(SemanticError::MissingMain, "", &program.span);
        }

        debug!(
            declarations = self.env.len(),
            errors = self.diagnostics.error_count(),
            "semantic analysis finished"
        );
        self.diagnostics
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn report(&mut self, kind: SemanticError, token: &str, span: &Span) {
        self.diagnostics.report(
            Diagnostic::error(kind.message(token))
                .with_code(kind.code())
                .with_span(span.clone()),
        );
    }

    /// Enter a declaration into the current scope, flagging a same-level
    /// duplicate. The new binding is inserted either way.
    fn declare(&mut self, name: &str, name_span: &Span, info: DeclInfo) -> DeclId {
        if self.scopes.retrieve_at_current_level(name).is_some() {
            self.report(SemanticError::IdentifierRedeclared, name, name_span);
        }
        let id = self.env.declare(info);
        self.scopes.insert(name, id);
        id
    }

    /// Look `var` up and link it to its declaration.
    fn resolve(&self, var: &mut VarRef) -> Option<DeclInfo> {
        let binding = self.scopes.retrieve(&var.name)?;
        var.decl = Some(binding.decl);
        Some(self.env.get(binding.decl).clone())
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn check_function(&mut self, func: &mut FunctionDecl) {
        debug!(function = %func.name, "checking function");

        let info = DeclInfo {
            kind: DeclKind::Function,
            name: func.name.clone(),
            ty: func.return_type.clone(),
            params: func.params.iter().map(|p| p.ty.clone()).collect(),
            span: func.name_span.clone(),
        };
        func.id = Some(self.declare(&func.name, &func.name_span, info));

        self.scopes.open_scope();
        let saved_return = self.current_return.replace(func.return_type.clone());
        let saved_seen = std::mem::replace(&mut self.seen_return, func.return_type.is_void());
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);

        if func.name == "main" && func.return_type != Type::Int {
            self.report(SemanticError::MainReturnTypeNotInt, "", &func.span);
        }

        for param in &mut func.params {
            self.check_param(param);
        }

        // The body shares the parameters' scope.
        self.check_block_contents(&mut func.body);

        if !self.seen_return {
            self.report(SemanticError::MissingReturnStatement, "", &func.span);
        }

        self.scopes.close_scope();
        self.current_return = saved_return;
        self.seen_return = saved_seen;
        self.loop_depth = saved_depth;
    }

    fn check_param(&mut self, param: &mut ParamDecl) {
        let info = DeclInfo {
            kind: DeclKind::Param,
            name: param.name.clone(),
            ty: param.ty.clone(),
            params: Vec::new(),
            span: param.name_span.clone(),
        };
        param.id = Some(self.declare(&param.name, &param.name_span, info));

        if param.ty.is_void() {
            self.report(SemanticError::IdentifierDeclaredVoid, &param.name, &param.name_span);
        } else if param.ty.element().is_some_and(Type::is_void) {
            self.report(
                SemanticError::IdentifierDeclaredVoidArray,
                &param.name,
                &param.name_span,
            );
        }
    }

    fn check_var_decl(&mut self, var: &mut VarDecl, kind: DeclKind) {
        let VarDecl {
            name,
            name_span,
            ty,
            initializer,
            span,
            id,
        } = var;

        if ty.is_void() {
            self.report(SemanticError::IdentifierDeclaredVoid, name, span);
        } else if ty.element().is_some_and(Type::is_void) {
            self.report(SemanticError::IdentifierDeclaredVoidArray, name, span);
        }

        let info = DeclInfo {
            kind,
            name: name.clone(),
            ty: ty.clone(),
            params: Vec::new(),
            span: name_span.clone(),
        };
        let decl_id = self.declare(name, name_span, info);
        *id = Some(decl_id);

        match initializer {
            None => {
                if matches!(ty, Type::Array { size: None, .. }) {
                    self.report(SemanticError::ArraySizeMissing, "", span);
                }
            }
            Some(Initializer::Array(_)) if !ty.is_array() => {
                self.report(SemanticError::InvalidInitialiserArrayForScalar, "", span);
            }
            Some(Initializer::Expr(expr)) if !ty.is_array() => {
                let init_ty = self.check_expr(expr, Context::Value);
                if !ty.assignable(&init_ty) {
                    self.report(SemanticError::IncompatibleTypeForAssignment, "", span);
                } else if widens_to(ty, &init_ty) {
                    widen(expr);
                }
            }
            Some(Initializer::Expr(_)) => {
                self.report(SemanticError::InvalidInitialiserScalarForArray, "", span);
            }
            Some(Initializer::Array(init)) => {
                self.check_array_init(ty, init);
                self.env.get_mut(decl_id).ty = ty.clone();
            }
        }
    }

    /// Infer a missing size, flag excess elements and check every element
    /// against the element type.
    fn check_array_init(&mut self, ty: &mut Type, init: &mut ArrayInit) {
        let Type::Array { element, size } = ty else {
            return;
        };
        let limit = match size {
            Some(n) => Some(*n),
            None => {
                *size = Some(init.elements.len());
                None
            }
        };
        let element: &Type = element;

        let mut excess_reported = false;
        for (index, elem) in init.elements.iter_mut().enumerate() {
            let elem_ty = self.check_expr(elem, Context::Value);

            if limit.is_some_and(|limit| index >= limit) && !excess_reported {
                self.report(SemanticError::ExcessElementsInArrayInitialiser, "", &elem.span);
                excess_reported = true;
            }

            if elem_ty.is_error() || element.is_void() {
                continue;
            }
            if widens_to(element, &elem_ty) {
                widen(elem);
            } else if !element.equals(&elem_ty) {
                self.report(SemanticError::WrongTypeForArrayInitialiser, "", &elem.span);
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Local declarations then statements, without opening a scope.
    fn check_block_contents(&mut self, block: &mut Block) {
        for decl in &mut block.decls {
            self.check_var_decl(decl, DeclKind::LocalVar);
        }

        let count = block.stmts.len();
        for index in 0..count {
            self.check_stmt(&mut block.stmts[index]);

            if matches!(block.stmts[index], Stmt::Return(_)) && index + 1 < count {
                let span = block.stmts[index + 1]
                    .span()
                    .merge(block.stmts[count - 1].span());
                self.report(SemanticError::StatementsNotReached, "", &span);
            }
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.scopes.open_scope();
                self.check_block_contents(block);
                self.scopes.close_scope();
            }
            Stmt::If(if_stmt) => {
                self.check_condition(&mut if_stmt.condition, SemanticError::IfConditionalNotBoolean);
                self.check_stmt(&mut if_stmt.then_branch);
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::While(while_stmt) => {
                self.check_condition(
                    &mut while_stmt.condition,
                    SemanticError::WhileConditionalNotBoolean,
                );
                self.check_loop_body(&mut while_stmt.body);
            }
            Stmt::For(for_stmt) => {
                if let Some(init) = &mut for_stmt.init {
                    self.check_expr(init, Context::Value);
                }
                if let Some(condition) = &mut for_stmt.condition {
                    self.check_condition(condition, SemanticError::ForConditionalNotBoolean);
                }
                if let Some(update) = &mut for_stmt.update {
                    self.check_expr(update, Context::Value);
                }
                self.check_loop_body(&mut for_stmt.body);
            }
            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.report(SemanticError::BreakNotInLoop, "", span);
                }
            }
            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.report(SemanticError::ContinueNotInLoop, "", span);
                }
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Expr(expr) => {
                self.check_expr(expr, Context::Statement);
            }
            Stmt::Empty(_) => {}
        }
    }

    fn check_condition(&mut self, condition: &mut Expr, kind: SemanticError) {
        let ty = self.check_expr(condition, Context::Value);
        if !ty.equals(&Type::Boolean) {
            self.report(kind, "", &condition.span);
        }
    }

    fn check_loop_body(&mut self, body: &mut Stmt) {
        self.loop_depth += 1;
        self.check_stmt(body);
        self.loop_depth -= 1;
    }

    fn check_return(&mut self, ret: &mut ReturnStmt) {
        self.seen_return = true;
        let Some(expected) = self.current_return.clone() else {
            if let Some(value) = &mut ret.value {
                self.check_expr(value, Context::Value);
            }
            return;
        };

        match &mut ret.value {
            None => {
                if !expected.is_void() {
                    self.report(SemanticError::IncompatibleTypeForReturn, "", &ret.span);
                }
            }
            Some(value) => {
                let actual = self.check_expr(value, Context::Value);
                // A void function returns no value, not even a void one.
                let void_value = expected.is_void() && !actual.is_error();
                if void_value || !expected.assignable(&actual) {
                    self.report(SemanticError::IncompatibleTypeForReturn, "", &ret.span);
                } else if widens_to(&expected, &actual) {
                    widen(value);
                }
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Type `expr`, store the result on the node and return it.
    fn check_expr(&mut self, expr: &mut Expr, ctx: Context) -> Type {
        let span = expr.span.clone();
        let ty = match &mut expr.kind {
            ExprKind::Literal(literal) => match literal {
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Bool(_) => Type::Boolean,
                Literal::String(_) => Type::String,
            },
            ExprKind::Var(var) => self.check_var(var, ctx),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(operand, Context::Value);
                match type_checker::check_unary_op(op.op, &operand_ty) {
                    Ok(typing) => {
                        op.class = typing.class;
                        typing.result
                    }
                    Err(_) => {
                        self.report(SemanticError::IncompatibleTypeForUnaryOperator, "", &span);
                        Type::Error
                    }
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left_ty = self.check_expr(left, Context::Value);
                let right_ty = self.check_expr(right, Context::Value);
                match type_checker::check_binary_op(&left_ty, op.op, &right_ty) {
                    Ok(typing) => {
                        op.class = typing.class;
                        if typing.widen_left {
                            widen(left);
                        }
                        if typing.widen_right {
                            widen(right);
                        }
                        typing.result
                    }
                    Err(OperandError::ArrayOperand) => {
                        self.report(SemanticError::ArrayFunctionAsScalar, "", &span);
                        Type::Error
                    }
                    Err(OperandError::Incompatible) => {
                        self.report(SemanticError::IncompatibleTypeForBinaryOperator, "", &span);
                        Type::Error
                    }
                }
            }
            ExprKind::Assign { target, value } => self.check_assign(target, value, &span),
            ExprKind::Call { callee, args } => self.check_call(callee, args, &span),
            ExprKind::Index { array, index } => self.check_index(array, index, &span),
        };
        expr.ty = Some(ty.clone());
        ty
    }

    /// A bare name. Functions are only usable as a whole statement; arrays
    /// are not allowed as one.
    fn check_var(&mut self, var: &mut VarRef, ctx: Context) -> Type {
        let Some(info) = self.resolve(var) else {
            self.report(SemanticError::IdentifierUndeclared, &var.name, &var.span);
            return Type::Error;
        };

        if info.is_function() {
            if ctx == Context::Statement {
                return info.ty;
            }
            self.report(SemanticError::ArrayFunctionAsScalar, "", &var.span);
            return Type::Error;
        }

        if info.ty.is_array() && ctx == Context::Statement {
            self.report(SemanticError::ArrayFunctionAsScalar, "", &var.span);
        }
        info.ty
    }

    fn check_assign(&mut self, target: &mut Expr, value: &mut Expr, span: &Span) -> Type {
        let function_target = match &mut target.kind {
            ExprKind::Var(var) => match self.resolve(var) {
                Some(info) if info.is_function() => {
                    target.ty = Some(info.ty);
                    true
                }
                _ => false,
            },
            ExprKind::Index { .. } => false,
            _ => {
                self.report(SemanticError::InvalidLvalueInAssignment, "", span);
                return Type::Error;
            }
        };

        let target_ty = if function_target {
            Type::Error
        } else {
            self.check_expr(target, Context::Value)
        };
        let value_ty = self.check_expr(value, Context::Value);

        if function_target {
            self.report(SemanticError::InvalidLvalueInAssignment, "", span);
            return Type::Error;
        }
        if target_ty.is_array() && !matches!(target.kind, ExprKind::Index { .. }) {
            self.report(SemanticError::ArrayFunctionAsScalar, "", span);
            return Type::Error;
        }
        if !target_ty.assignable(&value_ty) {
            self.report(SemanticError::IncompatibleTypeForAssignment, "", span);
            return Type::Error;
        }
        if widens_to(&target_ty, &value_ty) {
            widen(value);
        }
        target_ty
    }

    fn check_call(&mut self, callee: &mut VarRef, args: &mut [Expr], span: &Span) -> Type {
        let resolved = self.resolve(callee);

        if callee.name == "main" {
            self.report(SemanticError::Misc1, "main cannot be called", span);
            return Type::Error;
        }
        let Some(info) = resolved else {
            self.report(SemanticError::IdentifierUndeclared, &callee.name, span);
            return Type::Error;
        };
        if !info.is_function() {
            self.report(SemanticError::ScalarArrayAsFunction, &callee.name, span);
            return Type::Error;
        }

        let mut too_many_reported = false;
        for (index, arg) in args.iter_mut().enumerate() {
            let arg_ty = self.check_expr(arg, Context::Value);
            match info.params.get(index) {
                Some(param_ty) => self.check_argument(param_ty, &arg_ty, arg),
                None if !too_many_reported => {
                    self.report(SemanticError::TooManyActualParameters, "", &arg.span);
                    too_many_reported = true;
                }
                None => {}
            }
        }
        if args.len() < info.params.len() {
            self.report(SemanticError::TooFewActualParameters, "", span);
        }

        info.ty
    }

    /// Match one argument against its parameter: array-ness must agree,
    /// arrays need equal element types, scalars allow `int` to `float`.
    fn check_argument(&mut self, param_ty: &Type, arg_ty: &Type, arg: &mut Expr) {
        if arg_ty.is_error() {
            return;
        }
        let accepted = match (param_ty.element(), arg_ty.element()) {
            (Some(param_elem), Some(arg_elem)) => param_elem.equals(arg_elem),
            (None, None) => {
                if widens_to(param_ty, arg_ty) {
                    widen(arg);
                    true
                } else {
                    param_ty.equals(arg_ty)
                }
            }
            _ => false,
        };
        if !accepted {
            self.report(SemanticError::WrongTypeForActualParameter, "", &arg.span);
        }
    }

    fn check_index(&mut self, array: &mut VarRef, index: &mut Expr, span: &Span) -> Type {
        let resolved = self.resolve(array);
        if resolved.is_none() {
            self.report(SemanticError::IdentifierUndeclared, &array.name, &array.span);
        }
        let index_ty = self.check_expr(index, Context::Value);

        let Some(info) = resolved else {
            return Type::Error;
        };
        let Some(element) = info.ty.element().filter(|_| !info.is_function()) else {
            self.report(SemanticError::ScalarFunctionAsArray, "", span);
            return Type::Error;
        };
        let element = element.clone();

        if !index_ty.equals(&Type::Int) {
            self.report(SemanticError::ArraySubscriptNotInteger, "", &index.span);
            return Type::Error;
        }
        element
    }
}

/// Replace `expr` with an int-to-float conversion wrapping it.
fn widen(expr: &mut Expr) {
    let span = expr.span.clone();
    let placeholder = Expr::new(ExprKind::Literal(Literal::Int(0)), span.clone());
    let inner = std::mem::replace(expr, placeholder);
    *expr = Expr {
        kind: ExprKind::Unary {
            op: UnaryOperator {
                op: UnaryOp::IntToFloat,
                class: Some(OpClass::Float),
            },
            operand: Box::new(inner),
        },
        ty: Some(Type::Float),
        span,
    };
}

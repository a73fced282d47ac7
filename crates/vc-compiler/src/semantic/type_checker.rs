use crate::ast::nodes::{BinaryOp, OpClass, UnaryOp};

use super::types::Type;

/// Outcome of typing one operator application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTyping {
    pub result: Type,
    /// Specialization for code generation; `None` when an operand was `error`.
    pub class: Option<OpClass>,
    /// The left (or only) operand must be wrapped in an int-to-float node.
    pub widen_left: bool,
    pub widen_right: bool,
}

impl OperatorTyping {
    fn new(result: Type, class: OpClass) -> Self {
        Self {
            result,
            class: Some(class),
            widen_left: false,
            widen_right: false,
        }
    }

    /// An operand was already ill-typed; propagate without a new error.
    fn propagate_error() -> Self {
        Self {
            result: Type::Error,
            class: None,
            widen_left: false,
            widen_right: false,
        }
    }
}

/// Why an operator application was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandError {
    /// An operand is an array.
    ArrayOperand,
    /// Operand types do not fit the operator.
    Incompatible,
}

/// Type a unary operator applied to an operand of type `operand`.
pub fn check_unary_op(op: UnaryOp, operand: &Type) -> Result<OperatorTyping, OperandError> {
    if operand.is_error() {
        return Ok(OperatorTyping::propagate_error());
    }
    match (op, operand) {
        (UnaryOp::Not, Type::Boolean) => Ok(OperatorTyping::new(Type::Boolean, OpClass::Int)),
        (UnaryOp::Plus | UnaryOp::Minus, Type::Int) => {
            Ok(OperatorTyping::new(Type::Int, OpClass::Int))
        }
        (UnaryOp::Plus | UnaryOp::Minus, Type::Float) => {
            Ok(OperatorTyping::new(Type::Float, OpClass::Float))
        }
        // Conversion nodes may be revisited; they keep their type.
        (UnaryOp::IntToFloat, Type::Int) => Ok(OperatorTyping::new(Type::Float, OpClass::Float)),
        (UnaryOp::IntToFloat, other) => Ok(OperatorTyping::new(other.clone(), OpClass::Float)),
        _ => Err(OperandError::Incompatible),
    }
}

/// Type a binary operator. `error` operands propagate silently, then array
/// operands are rejected before the operator's own rules apply.
pub fn check_binary_op(
    left: &Type,
    op: BinaryOp,
    right: &Type,
) -> Result<OperatorTyping, OperandError> {
    if left.is_error() || right.is_error() {
        return Ok(OperatorTyping::propagate_error());
    }
    if left.is_array() || right.is_array() {
        return Err(OperandError::ArrayOperand);
    }

    match op {
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Type::Boolean, Type::Boolean) => Ok(OperatorTyping::new(Type::Boolean, OpClass::Int)),
            _ => Err(OperandError::Incompatible),
        },
        BinaryOp::Eq | BinaryOp::Neq => match (left, right) {
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => {
                Ok(mixed_numeric(Type::Boolean, left))
            }
            (Type::Float, Type::Float) => Ok(OperatorTyping::new(Type::Boolean, OpClass::Float)),
            (a, b) if a == b => Ok(OperatorTyping::new(Type::Boolean, OpClass::Int)),
            _ => Err(OperandError::Incompatible),
        },
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            numeric(left, right, |_| Type::Boolean)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            numeric(left, right, |class| match class {
                OpClass::Int => Type::Int,
                OpClass::Float => Type::Float,
            })
        }
    }
}

/// Both operands numeric; mixed `int`/`float` widens the `int` side.
fn numeric(
    left: &Type,
    right: &Type,
    result: impl Fn(OpClass) -> Type,
) -> Result<OperatorTyping, OperandError> {
    if !left.is_numeric() || !right.is_numeric() {
        return Err(OperandError::Incompatible);
    }
    if left != right {
        return Ok(mixed_numeric(result(OpClass::Float), left));
    }
    let class = if *left == Type::Float {
        OpClass::Float
    } else {
        OpClass::Int
    };
    Ok(OperatorTyping::new(result(class), class))
}

fn mixed_numeric(result: Type, left: &Type) -> OperatorTyping {
    let widen_left = *left == Type::Int;
    OperatorTyping {
        result,
        class: Some(OpClass::Float),
        widen_left,
        widen_right: !widen_left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(left: Type, op: BinaryOp, right: Type) -> OperatorTyping {
        check_binary_op(&left, op, &right).expect("operator should type-check")
    }

    #[test]
    fn int_arithmetic_stays_int() {
        let t = ok(Type::Int, BinaryOp::Add, Type::Int);
        assert_eq!(t.result, Type::Int);
        assert_eq!(t.class, Some(OpClass::Int));
        assert!(!t.widen_left && !t.widen_right);
    }

    #[test]
    fn mixed_arithmetic_widens_int_side() {
        let t = ok(Type::Int, BinaryOp::Mul, Type::Float);
        assert_eq!(t.result, Type::Float);
        assert_eq!(t.class, Some(OpClass::Float));
        assert!(t.widen_left && !t.widen_right);

        let t = ok(Type::Float, BinaryOp::Sub, Type::Int);
        assert!(!t.widen_left && t.widen_right);
    }

    #[test]
    fn arithmetic_rejects_non_numeric_operands() {
        let t = ok(Type::Float, BinaryOp::Div, Type::Float);
        assert_eq!(t.result, Type::Float);
        assert_eq!(t.class, Some(OpClass::Float));
        assert!(!t.widen_left && !t.widen_right);
        assert_eq!(
            check_binary_op(&Type::Boolean, BinaryOp::Add, &Type::Boolean),
            Err(OperandError::Incompatible)
        );
        assert_eq!(
            check_binary_op(&Type::Int, BinaryOp::Mul, &Type::Void),
            Err(OperandError::Incompatible)
        );
    }

    #[test]
    fn comparisons_yield_boolean() {
        let t = ok(Type::Float, BinaryOp::Lte, Type::Int);
        assert_eq!(t.result, Type::Boolean);
        assert_eq!(t.class, Some(OpClass::Float));
        assert!(t.widen_right);
        assert_eq!(
            check_binary_op(&Type::Boolean, BinaryOp::Lt, &Type::Boolean),
            Err(OperandError::Incompatible)
        );
    }

    #[test]
    fn equality_accepts_matching_non_numeric_operands() {
        let t = ok(Type::Boolean, BinaryOp::Eq, Type::Boolean);
        assert_eq!(t.result, Type::Boolean);
        assert_eq!(t.class, Some(OpClass::Int));
        assert_eq!(
            check_binary_op(&Type::Boolean, BinaryOp::Neq, &Type::Int),
            Err(OperandError::Incompatible)
        );
    }

    #[test]
    fn logical_operators_require_booleans() {
        let t = ok(Type::Boolean, BinaryOp::And, Type::Boolean);
        assert_eq!(t.class, Some(OpClass::Int));
        assert_eq!(
            check_binary_op(&Type::Int, BinaryOp::Or, &Type::Boolean),
            Err(OperandError::Incompatible)
        );
    }

    #[test]
    fn error_wins_over_array_operand() {
        let arr = Type::array(Type::Int, Some(2));
        let t = ok(Type::Error, BinaryOp::Add, arr.clone());
        assert_eq!(t.result, Type::Error);
        assert_eq!(t.class, None);
        assert_eq!(
            check_binary_op(&arr, BinaryOp::Add, &Type::Int),
            Err(OperandError::ArrayOperand)
        );
    }

    #[test]
    fn unary_operators() {
        let t = check_unary_op(UnaryOp::Minus, &Type::Float).unwrap();
        assert_eq!((t.result, t.class), (Type::Float, Some(OpClass::Float)));
        let t = check_unary_op(UnaryOp::Not, &Type::Boolean).unwrap();
        assert_eq!((t.result, t.class), (Type::Boolean, Some(OpClass::Int)));
        assert_eq!(
            check_unary_op(UnaryOp::Not, &Type::Int),
            Err(OperandError::Incompatible)
        );
        assert_eq!(
            check_unary_op(UnaryOp::Plus, &Type::String),
            Err(OperandError::Incompatible)
        );
        assert_eq!(check_unary_op(UnaryOp::Minus, &Type::Error).unwrap().result, Type::Error);
    }
}

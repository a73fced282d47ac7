/// Every condition the checker can report.
///
/// The `Display` text is the fixed message printed for the condition; the
/// number after `*` is its stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SemanticError {
    #[error("*0: main function is missing")]
    MissingMain,
    #[error("*1: return type of main is not int")]
    MainReturnTypeNotInt,

    // Scope
    #[error("*2: identifier redeclared")]
    IdentifierRedeclared,
    #[error("*3: identifier declared void")]
    IdentifierDeclaredVoid,
    #[error("*4: identifier declared void[]")]
    IdentifierDeclaredVoidArray,
    #[error("*5: identifier undeclared")]
    IdentifierUndeclared,

    // Assignment and return
    #[error("*6: incompatible type for =")]
    IncompatibleTypeForAssignment,
    #[error("*7: invalid lvalue in assignment")]
    InvalidLvalueInAssignment,
    #[error("*8: incompatible type for return")]
    IncompatibleTypeForReturn,

    // Operators
    #[error("*9: incompatible type for this binary operator")]
    IncompatibleTypeForBinaryOperator,
    #[error("*10: incompatible type for this unary operator")]
    IncompatibleTypeForUnaryOperator,

    // Scalars, arrays and functions
    #[error("*11: attempt to use an array/function as a scalar")]
    ArrayFunctionAsScalar,
    #[error("*12: attempt to use a scalar/function as an array")]
    ScalarFunctionAsArray,
    #[error("*13: wrong type for element in array initialiser")]
    WrongTypeForArrayInitialiser,
    #[error("*14: invalid initialiser: array initialiser for scalar")]
    InvalidInitialiserArrayForScalar,
    #[error("*15: invalid initialiser: scalar initialiser for array")]
    InvalidInitialiserScalarForArray,
    #[error("*16: excess elements in array initialiser")]
    ExcessElementsInArrayInitialiser,
    #[error("*17: array subscript is not an integer")]
    ArraySubscriptNotInteger,
    #[error("*18: array size missing")]
    ArraySizeMissing,
    #[error("*19: attempt to reference a scalar/array as a function")]
    ScalarArrayAsFunction,

    // Control flow
    #[error("*20: if conditional is not boolean")]
    IfConditionalNotBoolean,
    #[error("*21: for conditional is not boolean")]
    ForConditionalNotBoolean,
    #[error("*22: while conditional is not boolean")]
    WhileConditionalNotBoolean,
    #[error("*23: break must be in a while/for")]
    BreakNotInLoop,
    #[error("*24: continue must be in a while/for")]
    ContinueNotInLoop,

    // Calls
    #[error("*25: too many actual parameters")]
    TooManyActualParameters,
    #[error("*26: too few actual parameters")]
    TooFewActualParameters,
    #[error("*27: wrong type for actual parameter")]
    WrongTypeForActualParameter,

    /// Used for calls to `main`.
    #[error("*28: misc 1")]
    Misc1,
    /// Reserved.
    #[error("*29: misc 2")]
    Misc2,

    #[error("*30: statement(s) not reached")]
    StatementsNotReached,
    #[error("*31: missing return statement")]
    MissingReturnStatement,
}

impl SemanticError {
    /// All conditions, ordered by code.
    pub const ALL: [SemanticError; 32] = [
        SemanticError::MissingMain,
        SemanticError::MainReturnTypeNotInt,
        SemanticError::IdentifierRedeclared,
        SemanticError::IdentifierDeclaredVoid,
        SemanticError::IdentifierDeclaredVoidArray,
        SemanticError::IdentifierUndeclared,
        SemanticError::IncompatibleTypeForAssignment,
        SemanticError::InvalidLvalueInAssignment,
        SemanticError::IncompatibleTypeForReturn,
        SemanticError::IncompatibleTypeForBinaryOperator,
        SemanticError::IncompatibleTypeForUnaryOperator,
        SemanticError::ArrayFunctionAsScalar,
        SemanticError::ScalarFunctionAsArray,
        SemanticError::WrongTypeForArrayInitialiser,
        SemanticError::InvalidInitialiserArrayForScalar,
        SemanticError::InvalidInitialiserScalarForArray,
        SemanticError::ExcessElementsInArrayInitialiser,
        SemanticError::ArraySubscriptNotInteger,
        SemanticError::ArraySizeMissing,
        SemanticError::ScalarArrayAsFunction,
        SemanticError::IfConditionalNotBoolean,
        SemanticError::ForConditionalNotBoolean,
        SemanticError::WhileConditionalNotBoolean,
        SemanticError::BreakNotInLoop,
        SemanticError::ContinueNotInLoop,
        SemanticError::TooManyActualParameters,
        SemanticError::TooFewActualParameters,
        SemanticError::WrongTypeForActualParameter,
        SemanticError::Misc1,
        SemanticError::Misc2,
        SemanticError::StatementsNotReached,
        SemanticError::MissingReturnStatement,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Message with the offending token appended, as shown to the user.
    pub fn message(self, token: &str) -> String {
        if token.is_empty() {
            self.to_string()
        } else {
            format!("{}: {}", self, token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_message_prefixes() {
        for (index, kind) in SemanticError::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, index);
            let prefix = format!("*{}: ", index);
            assert!(kind.to_string().starts_with(&prefix), "{}", kind);
        }
    }

    #[test]
    fn from_code_round_trips() {
        assert_eq!(SemanticError::from_code(5), Some(SemanticError::IdentifierUndeclared));
        assert_eq!(SemanticError::from_code(31), Some(SemanticError::MissingReturnStatement));
        assert_eq!(SemanticError::from_code(32), None);
    }

    #[test]
    fn token_is_appended() {
        assert_eq!(
            SemanticError::IdentifierRedeclared.message("x"),
            "*2: identifier redeclared: x"
        );
        assert_eq!(
            SemanticError::MissingMain.message(""),
            "*0: main function is missing"
        );
    }
}

use serde::Serialize;
use std::fmt;

/// The VC type model.
///
/// Derived `==` is exact identity (array sizes included). Language-level
/// comparisons go through [`Type::equals`] and [`Type::assignable`], where
/// `Error` matches everything so one mistake is reported only once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Boolean,
    Int,
    Float,
    String,
    Void,
    Array {
        element: Box<Type>,
        /// Declared or inferred length; `None` for `int a[]` parameters and
        /// not-yet-inferred declarations.
        size: Option<usize>,
    },
    /// Sentinel for ill-typed expressions.
    Error,
}

impl Type {
    pub fn array(element: Type, size: Option<usize>) -> Self {
        Type::Array {
            element: Box::new(element),
            size,
        }
    }

    /// Structural equality. Arrays compare element types only.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Array { element: a, .. }, Type::Array { element: b, .. }) => a.equals(b),
            (a, b) => a == b,
        }
    }

    /// Whether a value of type `source` may be stored in `self`.
    /// `int` widens to `float`; nothing else converts implicitly.
    pub fn assignable(&self, source: &Type) -> bool {
        self.equals(source) || widens_to(self, source)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Element type of an array, `None` for scalars.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

/// True exactly when storing `source` into `target` needs an int-to-float
/// conversion. Unlike [`Type::assignable`], `Error` never matches here.
pub fn widens_to(target: &Type, source: &Type) -> bool {
    *target == Type::Float && *source == Type::Int
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "boolean"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Array {
                element,
                size: Some(n),
            } => write!(f, "{}[{}]", element, n),
            Type::Array {
                element,
                size: None,
            } => write!(f, "{}[]", element),
            Type::Error => write!(f, "error"),
        }
    }
}

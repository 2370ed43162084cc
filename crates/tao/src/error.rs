//! Error types for Tao lexing, parsing, and evaluation

use thiserror::Error;

/// Main error type for Tao operations.
///
/// Each variant corresponds to one user-visible error kind; the rendered
/// message is prefixed with the kind name so embedders can match on it
/// textually as well.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed source text (lexer or parser)
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Undefined or redefined name
    #[error("NameError: {0}")]
    Name(String),

    /// Operation applied to a value of the wrong type
    #[error("TypeError: {0}")]
    Type(String),

    /// Index outside the bounds of a collection
    #[error("RangeError: {0}")]
    Range(String),

    /// Call applied to a value that is not a function
    #[error("NotCallableError: {value} (type: {type_name}) is not callable")]
    NotCallable {
        /// Display form of the offending value
        value: String,
        /// Type name of the offending value
        type_name: &'static str,
    },

    /// Member or element access on a value that supports neither
    #[error("NotIndexableError: {value} (type: {type_name}) is not indexable")]
    NotIndexable {
        /// Display form of the offending value
        value: String,
        /// Type name of the offending value
        type_name: &'static str,
    },

    /// Assignment to an expression that is not an lvalue
    #[error("NotAssignableError: {value} (type: {type_name}) is not assignable")]
    NotAssignable {
        /// Display form of the offending value
        value: String,
        /// Type name of the offending value
        type_name: &'static str,
    },

    /// Key of the wrong type used to index a collection
    #[error("KeyTypeError: cannot use {value} (type: {type_name}) as key")]
    KeyType {
        /// Display form of the offending key
        value: String,
        /// Type name of the offending key
        type_name: &'static str,
    },

    /// Division or modulo by zero
    #[error("DivideByZeroError: {0}")]
    DivideByZero(String),

    /// Interpreter invariant violation (call depth, interrupted walk, ...)
    #[error("InternalError: {0}")]
    Internal(String),
}

impl Error {
    /// Build a `NotCallable` error from an offending value.
    pub fn not_callable(value: &crate::Value) -> Self {
        Error::NotCallable {
            value: value.to_string(),
            type_name: value.type_name(),
        }
    }

    /// Build a `NotIndexable` error from an offending value.
    pub fn not_indexable(value: &crate::Value) -> Self {
        Error::NotIndexable {
            value: value.to_string(),
            type_name: value.type_name(),
        }
    }

    /// Build a `NotAssignable` error from an offending value.
    pub fn not_assignable(value: &crate::Value) -> Self {
        Error::NotAssignable {
            value: value.to_string(),
            type_name: value.type_name(),
        }
    }

    /// Build a `KeyType` error from an offending key value.
    pub fn key_type(value: &crate::Value) -> Self {
        Error::KeyType {
            value: value.to_string(),
            type_name: value.type_name(),
        }
    }

    /// The kind prefix this error renders with (`"SyntaxError"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Syntax(_) => "SyntaxError",
            Error::Name(_) => "NameError",
            Error::Type(_) => "TypeError",
            Error::Range(_) => "RangeError",
            Error::NotCallable { .. } => "NotCallableError",
            Error::NotIndexable { .. } => "NotIndexableError",
            Error::NotAssignable { .. } => "NotAssignableError",
            Error::KeyType { .. } => "KeyTypeError",
            Error::DivideByZero(_) => "DivideByZeroError",
            Error::Internal(_) => "InternalError",
        }
    }
}

/// Result type alias for Tao operations.
pub type Result<T> = std::result::Result<T, Error>;

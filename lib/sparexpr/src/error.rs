use oxrdf::{NamedNode, VariableNameParseError};
use std::borrow::Cow;
use std::error::Error;

/// An error raised while evaluating an expression against a solution row.
///
/// These are per-row errors: the consumer decides what to do with them (a `FILTER` drops the row, a `BIND` leaves the variable unbound...).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: Cow<'static, str>,
    #[source]
    cause: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl QueryError {
    #[inline]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Builds an error wrapping a lower-level cause like a lexical parse failure.
    #[inline]
    pub fn with_cause(
        message: impl Into<Cow<'static, str>>,
        cause: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An error raised while building an expression tree, mostly when resolving a function call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A function was called with a number of arguments it does not accept
    #[error(
        "Incorrect number of arguments for the {function} function, expected {expected} but got {actual}"
    )]
    Arity {
        function: String,
        expected: &'static str,
        actual: usize,
    },
    /// The function is known but deliberately not supported
    #[error("The {0} function is not supported")]
    Unsupported(String),
    /// A `DISTINCT` or `*` modifier was given to a function that is not an aggregate
    #[error("The {function} function does not accept the {modifier} modifier")]
    UnexpectedModifier {
        function: String,
        modifier: &'static str,
    },
    /// A cast function was not given exactly one argument
    #[error("The cast to {datatype} requires exactly one argument, got {actual}")]
    CastArity { datatype: NamedNode, actual: usize },
    /// No registered factory is able to build the function
    #[error(
        "Unable to resolve the function {0}: no function factory is able to build it and unknown functions are not allowed"
    )]
    UnresolvedFunction(NamedNode),
    /// A variable name is not valid
    #[error(transparent)]
    InvalidVariableName(#[from] VariableNameParseError),
}

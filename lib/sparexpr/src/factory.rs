use crate::error::ParseError;
use crate::expression::Expression;
use oxrdf::NamedNode;
use rustc_hash::FxHashMap;
use std::fmt;

/// The marker given before the arguments of an aggregate call like `agg(DISTINCT ?x)` or `agg(*)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentModifier {
    Distinct,
    All,
}

impl ArgumentModifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Distinct => "DISTINCT",
            Self::All => "*",
        }
    }
}

impl fmt::Display for ArgumentModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The arguments of a function call site.
///
/// The `DISTINCT` and `*` markers are not arguments: [`FunctionArguments::new`] moves a leading
/// [`Expression::DistinctModifier`] or [`Expression::AllModifier`] into [`FunctionArguments::modifier`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionArguments {
    modifier: Option<ArgumentModifier>,
    positional: Vec<Expression>,
    scalar: FxHashMap<String, Expression>,
}

impl FunctionArguments {
    pub fn new(positional: impl IntoIterator<Item = Expression>) -> Self {
        let mut positional = positional.into_iter().peekable();
        let modifier = match positional.peek() {
            Some(Expression::DistinctModifier) => Some(ArgumentModifier::Distinct),
            Some(Expression::AllModifier) => Some(ArgumentModifier::All),
            _ => None,
        };
        if modifier.is_some() {
            positional.next();
        }
        Self {
            modifier,
            positional: positional.collect(),
            scalar: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_modifier(mut self, modifier: ArgumentModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Adds a named argument like the `separator` of `GROUP_CONCAT`.
    #[inline]
    #[must_use]
    pub fn with_scalar(mut self, name: impl Into<String>, value: Expression) -> Self {
        self.scalar.insert(name.into(), value);
        self
    }

    #[inline]
    pub fn modifier(&self) -> Option<ArgumentModifier> {
        self.modifier
    }

    #[inline]
    pub fn is_distinct(&self) -> bool {
        self.modifier == Some(ArgumentModifier::Distinct)
    }

    #[inline]
    pub fn positional(&self) -> &[Expression] {
        &self.positional
    }

    #[inline]
    pub fn scalar(&self) -> &FxHashMap<String, Expression> {
        &self.scalar
    }

    #[inline]
    pub fn has_scalar(&self) -> bool {
        !self.scalar.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}

impl From<Vec<Expression>> for FunctionArguments {
    #[inline]
    fn from(positional: Vec<Expression>) -> Self {
        Self::new(positional)
    }
}

/// Builds expression nodes for the function IRIs of a namespace.
///
/// A factory returns `Ok(None)` for the IRIs it does not handle, so that the next factory is tried.
/// It returns an error only for IRIs it handles but that are called with invalid arguments.
pub trait FunctionFactory: Send + Sync + 'static {
    /// The IRIs of the functions this factory is able to build.
    fn available_functions(&self) -> Vec<NamedNode>;

    /// The IRIs of the aggregates this factory is able to build.
    fn available_aggregates(&self) -> Vec<NamedNode>;

    fn try_create_expression(
        &self,
        function: &NamedNode,
        arguments: &FunctionArguments,
    ) -> Result<Option<Expression>, ParseError>;
}

/// Arity checks shared by the built-in factories.
pub(crate) struct CallSite<'a> {
    pub(crate) family: &'static str,
    pub(crate) name: &'a str,
    pub(crate) arguments: &'a FunctionArguments,
}

impl CallSite<'_> {
    fn display_name(&self) -> String {
        format!("{} {}()", self.family, self.name)
    }

    /// The positional arguments of a plain function, rejecting the `DISTINCT` and `*` markers.
    pub(crate) fn args(&self) -> Result<&[Expression], ParseError> {
        if let Some(modifier) = self.arguments.modifier() {
            return Err(ParseError::UnexpectedModifier {
                function: self.display_name(),
                modifier: modifier.as_str(),
            });
        }
        Ok(self.arguments.positional())
    }

    pub(crate) fn exactly(&self, count: usize, expected: &'static str) -> Result<Vec<Expression>, ParseError> {
        self.between(count, count, expected)
    }

    pub(crate) fn between(
        &self,
        min: usize,
        max: usize,
        expected: &'static str,
    ) -> Result<Vec<Expression>, ParseError> {
        let args = self.args()?;
        if (min..=max).contains(&args.len()) {
            Ok(args.to_vec())
        } else {
            Err(self.arity_error(expected))
        }
    }

    pub(crate) fn arity_error(&self, expected: &'static str) -> ParseError {
        ParseError::Arity {
            function: self.display_name(),
            expected,
            actual: self.arguments.len(),
        }
    }

    /// The arguments of an aggregate accepting an optional `DISTINCT` and returning if it is distinct.
    pub(crate) fn aggregate_args(
        &self,
        min: usize,
        max: usize,
        expected: &'static str,
    ) -> Result<(Vec<Expression>, bool), ParseError> {
        if self.arguments.modifier() == Some(ArgumentModifier::All) {
            return Err(ParseError::UnexpectedModifier {
                function: self.display_name(),
                modifier: "*",
            });
        }
        let args = self.arguments.positional();
        if (min..=max).contains(&args.len()) {
            Ok((args.to_vec(), self.arguments.is_distinct()))
        } else {
            Err(self.arity_error(expected))
        }
    }

    pub(crate) fn unsupported(&self) -> ParseError {
        ParseError::Unsupported(self.display_name())
    }
}

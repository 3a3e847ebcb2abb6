//! Function call nodes and the helpers shared by the built-in function libraries.

use crate::arq::ArqFunction;
use crate::context::{BindingId, EvaluationContext};
use crate::error::QueryError;
use crate::expression::Expression;
use crate::leviathan::LeviathanFunction;
use crate::numeric::Numeric;
use crate::term::to_string_and_language;
use crate::xpath::XPathFunction;
use oxrdf::{Literal, NamedNode, Term};
use regex::{Regex, RegexBuilder};
use sha2::Digest;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A function that has been resolved by a [`FunctionFactory`](crate::FunctionFactory).
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    XPath(XPathFunction),
    Leviathan(LeviathanFunction),
    Arq(ArqFunction),
    Custom(CustomFunction),
}

impl Function {
    pub fn iri(&self) -> NamedNode {
        match self {
            Self::XPath(function) => function.iri(),
            Self::Leviathan(function) => function.iri(),
            Self::Arq(function) => function.iri(),
            Self::Custom(function) => function.name.clone(),
        }
    }

    /// If the function always returns a number.
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::XPath(function) => function.is_numeric(),
            Self::Leviathan(function) => function.is_numeric(),
            Self::Arq(function) => function.is_numeric(),
            Self::Custom(function) => function.numeric,
        }
    }

    pub(crate) fn evaluate(
        &self,
        args: &[Expression],
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        match self {
            Self::XPath(function) => function.evaluate(args, context, binding_id),
            Self::Leviathan(function) => function.evaluate(args, context, binding_id),
            Self::Arq(function) => function.evaluate(args, context, binding_id),
            Self::Custom(function) => function.evaluate(args, context, binding_id),
        }
    }
}

impl From<XPathFunction> for Function {
    #[inline]
    fn from(function: XPathFunction) -> Self {
        Self::XPath(function)
    }
}

impl From<LeviathanFunction> for Function {
    #[inline]
    fn from(function: LeviathanFunction) -> Self {
        Self::Leviathan(function)
    }
}

impl From<ArqFunction> for Function {
    #[inline]
    fn from(function: ArqFunction) -> Self {
        Self::Arq(function)
    }
}

impl From<CustomFunction> for Function {
    #[inline]
    fn from(function: CustomFunction) -> Self {
        Self::Custom(function)
    }
}

/// A function implemented by a closure over the values of its arguments.
///
/// The closure is only called if all the arguments are bound. Returning `None` is an evaluation error.
///
/// ```
/// use oxrdf::{Literal, NamedNode, Term};
/// use sparexpr::CustomFunction;
///
/// let upper = CustomFunction::new(NamedNode::new("http://example.com/upper")?, |args| {
///     let Term::Literal(value) = args.first()? else {
///         return None;
///     };
///     Some(Literal::new_simple_literal(value.value().to_uppercase()).into())
/// });
/// assert_eq!(upper.name().as_str(), "http://example.com/upper");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
pub struct CustomFunction {
    name: NamedNode,
    implementation: Arc<dyn Fn(&[Term]) -> Option<Term> + Send + Sync>,
    numeric: bool,
}

impl CustomFunction {
    pub fn new(
        name: NamedNode,
        implementation: impl Fn(&[Term]) -> Option<Term> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            implementation: Arc::new(implementation),
            numeric: false,
        }
    }

    /// Marks the function as always returning numbers so that it is allowed in arithmetic.
    #[inline]
    #[must_use]
    pub fn with_numeric_result(mut self) -> Self {
        self.numeric = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &NamedNode {
        &self.name
    }

    fn evaluate(
        &self,
        args: &[Expression],
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        let call = CallArguments::new(&self.name, args, context, binding_id);
        let values = (0..call.len())
            .map(|i| call.term(i))
            .collect::<Result<Vec<_>, _>>()?;
        (self.implementation)(&values).map(Some).ok_or_else(|| {
            QueryError::new(format!(
                "The function {} is not able to compute a value from its arguments",
                self.name
            ))
        })
    }
}

impl PartialEq for CustomFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.numeric == other.numeric
            && Arc::ptr_eq(&self.implementation, &other.implementation)
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("name", &self.name)
            .field("numeric", &self.numeric)
            .finish_non_exhaustive()
    }
}

/// The arguments of a function call being evaluated against a row.
pub(crate) struct CallArguments<'a, 'b> {
    function: &'a dyn fmt::Display,
    args: &'a [Expression],
    context: &'a EvaluationContext<'b>,
    binding_id: BindingId,
}

impl<'a, 'b> CallArguments<'a, 'b> {
    pub(crate) fn new(
        function: &'a dyn fmt::Display,
        args: &'a [Expression],
        context: &'a EvaluationContext<'b>,
        binding_id: BindingId,
    ) -> Self {
        Self {
            function,
            args,
            context,
            binding_id,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.args.len()
    }

    pub(crate) fn get(&self, index: usize) -> Result<&'a Expression, QueryError> {
        self.args.get(index).ok_or_else(|| {
            QueryError::new(format!(
                "The function {} expects at least {} arguments, got {}",
                self.function,
                index + 1,
                self.args.len()
            ))
        })
    }

    /// The value of an argument that must be bound.
    pub(crate) fn term(&self, index: usize) -> Result<Term, QueryError> {
        let arg = self.get(index)?;
        arg.value(self.context, self.binding_id)?.ok_or_else(|| {
            QueryError::new(format!(
                "The function {} requires bound arguments but {arg} is unbound",
                self.function
            ))
        })
    }

    /// The lexical form and language tag of an argument that must be a string.
    pub(crate) fn string(&self, index: usize) -> Result<(String, Option<String>), QueryError> {
        let value = self.term(index)?;
        let (value, language) = to_string_and_language(&value).ok_or_else(|| {
            QueryError::new(format!(
                "The function {} requires a string argument, found {value}",
                self.function
            ))
        })?;
        Ok((value.to_owned(), language.map(ToOwned::to_owned)))
    }

    /// Two string arguments, the second one being [compatible](https://www.w3.org/TR/sparql11-query/#func-arg-compatibility) with the first one.
    pub(crate) fn compatible_strings(
        &self,
        first: usize,
        second: usize,
    ) -> Result<(String, String, Option<String>), QueryError> {
        let (value1, language1) = self.string(first)?;
        let (value2, language2) = self.string(second)?;
        if language2.is_some() && language1 != language2 {
            return Err(QueryError::new(format!(
                "The arguments of the function {} have incompatible language tags",
                self.function
            )));
        }
        Ok((value1, value2, language1))
    }

    pub(crate) fn numeric(&self, index: usize) -> Result<Numeric, QueryError> {
        Numeric::from_term(Some(&self.term(index)?))
    }

    pub(crate) fn double(&self, index: usize) -> Result<f64, QueryError> {
        Ok(self.numeric(index)?.to_double())
    }

    /// An argument that must be a number, truncated to an integer.
    pub(crate) fn integer(&self, index: usize) -> Result<i64, QueryError> {
        self.numeric(index)?.to_integer()
    }
}

pub(crate) fn double_term(value: f64) -> Term {
    Numeric::Double(value).into()
}

/// The hexadecimal digest of a string as a simple literal.
pub(crate) fn hash<H: Digest>(input: &str) -> Term {
    Literal::new_simple_literal(hex::encode(H::new().chain_update(input).finalize())).into()
}

/// Compiles an XPath regular expression with its flags.
pub(crate) fn compile_pattern(
    pattern: &str,
    flags: Option<&str>,
    size_limit: usize,
) -> Result<Regex, QueryError> {
    let mut pattern = Cow::Borrowed(pattern);
    let flags = flags.unwrap_or_default();
    if flags.contains('q') {
        pattern = regex::escape(&pattern).into();
    }
    let mut regex_builder = RegexBuilder::new(&pattern);
    regex_builder.size_limit(size_limit);
    for flag in flags.chars() {
        match flag {
            's' => {
                regex_builder.dot_matches_new_line(true);
            }
            'm' => {
                regex_builder.multi_line(true);
            }
            'i' => {
                regex_builder.case_insensitive(true);
            }
            'x' => {
                regex_builder.ignore_whitespace(true);
            }
            'q' => (), // Already supported
            _ => {
                return Err(QueryError::new(format!(
                    "Invalid regular expression flag '{flag}'"
                )));
            }
        }
    }
    regex_builder.build().map_err(|e| {
        QueryError::with_cause(format!("Invalid regular expression '{pattern}'"), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use md5::Md5;

    #[test]
    fn test_hash() {
        assert_eq!(
            hash::<Md5>("abc"),
            Literal::new_simple_literal("900150983cd24fb0d6963f7d28e17f72").into()
        );
    }

    #[test]
    fn test_compile_pattern() {
        assert!(compile_pattern("^a", Some("i"), 1_000_000).unwrap().is_match("Abc"));
        assert!(compile_pattern("a.c", Some("q"), 1_000_000).unwrap().is_match("xa.c"));
        assert!(!compile_pattern("a.c", Some("q"), 1_000_000).unwrap().is_match("abc"));
        assert!(compile_pattern("a", Some("z"), 1_000_000).is_err());
        assert!(compile_pattern("(", None, 1_000_000).is_err());
        assert!(compile_pattern("\\w{1000}", None, 100).is_err());
    }
}

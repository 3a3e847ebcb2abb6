//! The [ARQ function library](https://jena.apache.org/documentation/query/library-function.html) of Apache Jena.

use crate::context::{BindingId, EvaluationContext};
use crate::error::{ParseError, QueryError};
use crate::expression::Expression;
use crate::factory::{CallSite, FunctionArguments, FunctionFactory};
use crate::function::{CallArguments, Function, double_term, hash};
use crate::numeric::Numeric;
use crate::term::{build_plain_literal, numeric_cmp};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term};
use sha1::Sha1;
use std::cmp::Ordering;
use std::fmt;

pub const NAMESPACE: &str = "http://jena.hpl.hp.com/ARQ/function#";

/// An ARQ function evaluated by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArqFunction {
    /// The label of a blank node
    BNode,
    E,
    LocalName,
    Max,
    Min,
    Namespace,
    Now,
    Pi,
    Sha1Sum,
    Sqrt,
    /// `strjoin(separator, s1, s2...)`
    StrJoin,
    /// `substr(s, start)` and `substr(s, start, end)` with 0-based positions and an exclusive end
    Substring,
}

impl ArqFunction {
    pub const ALL: [Self; 12] = [
        Self::BNode,
        Self::E,
        Self::LocalName,
        Self::Max,
        Self::Min,
        Self::Namespace,
        Self::Now,
        Self::Pi,
        Self::Sha1Sum,
        Self::Sqrt,
        Self::StrJoin,
        Self::Substring,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BNode => "bnode",
            Self::E => "e",
            Self::LocalName => "localname",
            Self::Max => "max",
            Self::Min => "min",
            Self::Namespace => "namespace",
            Self::Now => "now",
            Self::Pi => "pi",
            Self::Sha1Sum => "sha1sum",
            Self::Sqrt => "sqrt",
            Self::StrJoin => "strjoin",
            Self::Substring => "substr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == "substring" {
            return Some(Self::Substring);
        }
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn iri(self) -> NamedNode {
        NamedNode::new_unchecked(format!("{NAMESPACE}{}", self.name()))
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::E | Self::Max | Self::Min | Self::Pi | Self::Sqrt
        )
    }

    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::E | Self::Now | Self::Pi => (0, 0, "0"),
            Self::BNode | Self::LocalName | Self::Namespace | Self::Sha1Sum | Self::Sqrt => {
                (1, 1, "1")
            }
            Self::Max | Self::Min => (2, 2, "2"),
            Self::StrJoin => (1, usize::MAX, "at least 1"),
            Self::Substring => (2, 3, "2 or 3"),
        }
    }

    pub(crate) fn evaluate(
        self,
        args: &[Expression],
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        let args = CallArguments::new(&self, args, context, binding_id);
        Ok(Some(match self {
            Self::BNode => match args.term(0)? {
                Term::BlankNode(node) => Literal::new_simple_literal(node.as_str()).into(),
                value => {
                    return Err(QueryError::new(format!(
                        "{self} expects a blank node, found {value}"
                    )));
                }
            },
            Self::E => double_term(std::f64::consts::E),
            Self::Pi => double_term(std::f64::consts::PI),
            Self::Sqrt => double_term(args.double(0)?.sqrt()),
            Self::LocalName | Self::Namespace => {
                let value = args.term(0)?;
                let Term::NamedNode(iri) = &value else {
                    return Err(QueryError::new(format!(
                        "{self} expects an IRI, found {value}"
                    )));
                };
                let (namespace, local_name) = split_iri(iri.as_str());
                Literal::new_simple_literal(if self == Self::LocalName {
                    local_name
                } else {
                    namespace
                })
                .into()
            }
            Self::Max | Self::Min => {
                let a = args.term(0)?;
                let b = args.term(1)?;
                let ordering = numeric_cmp(
                    Numeric::from_term(Some(&a))?,
                    Numeric::from_term(Some(&b))?,
                )?
                .ok_or_else(|| {
                    QueryError::new(format!("{a} and {b} are not comparable"))
                })?;
                let wanted = if self == Self::Max {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                if ordering == wanted { b } else { a }
            }
            Self::Now => {
                Literal::new_typed_literal(context.now().to_string(), xsd::DATE_TIME).into()
            }
            Self::Sha1Sum => hash::<Sha1>(&args.string(0)?.0),
            Self::StrJoin => {
                let (separator, _) = args.string(0)?;
                let mut result = String::new();
                for i in 1..args.len() {
                    if i > 1 {
                        result.push_str(&separator);
                    }
                    result.push_str(&args.string(i)?.0);
                }
                Literal::new_simple_literal(result).into()
            }
            Self::Substring => {
                let (value, language) = args.string(0)?;
                let length = value.chars().count();
                let start = position(args.integer(1)?, length)?;
                let end = if args.len() > 2 {
                    position(args.integer(2)?, length)?
                } else {
                    length
                };
                if end < start {
                    return Err(QueryError::new(format!(
                        "{self} end position {end} is before the start position {start}"
                    )));
                }
                build_plain_literal(
                    value.chars().skip(start).take(end - start).collect::<String>(),
                    language.as_deref(),
                )
            }
        }))
    }
}

impl fmt::Display for ArqFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "afn:{}", self.name())
    }
}

/// A 0-based character position that must be inside of the string.
fn position(value: i64, length: usize) -> Result<usize, QueryError> {
    usize::try_from(value)
        .ok()
        .filter(|position| *position <= length)
        .ok_or_else(|| {
            QueryError::new(format!(
                "The position {value} is outside of a string of length {length}"
            ))
        })
}

/// Splits an IRI after its last `#` or `/`, or after its last `:` if there are none.
fn split_iri(iri: &str) -> (&str, &str) {
    let split = iri
        .rfind(['#', '/'])
        .or_else(|| iri.rfind(':'))
        .map_or(0, |i| i + 1);
    iri.split_at(split)
}

/// Builds the [`afn:`](NAMESPACE) functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArqFunctionFactory;

impl FunctionFactory for ArqFunctionFactory {
    fn available_functions(&self) -> Vec<NamedNode> {
        ArqFunction::ALL.into_iter().map(ArqFunction::iri).collect()
    }

    fn available_aggregates(&self) -> Vec<NamedNode> {
        Vec::new()
    }

    fn try_create_expression(
        &self,
        function: &NamedNode,
        arguments: &FunctionArguments,
    ) -> Result<Option<Expression>, ParseError> {
        if arguments.has_scalar() {
            // Only positional arguments are supported
            return Ok(None);
        }
        let Some(name) = function.as_str().strip_prefix(NAMESPACE) else {
            return Ok(None);
        };
        let Some(arq) = ArqFunction::from_name(name) else {
            return Ok(None);
        };
        let site = CallSite {
            family: "ARQ",
            name,
            arguments,
        };
        let (min, max, expected) = arq.arity();
        Ok(Some(Expression::FunctionCall(
            Function::Arq(arq),
            site.between(min, max, expected)?,
        )))
    }
}

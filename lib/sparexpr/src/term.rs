//! Term level operations: effective boolean value, `=`/`!=` and the ordering used by relational operators.

use crate::error::QueryError;
use crate::numeric::{Numeric, NumericType};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, Term};
use oxsdatatypes::DateTime;
use std::cmp::Ordering;

/// Computes the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of a term.
///
/// Literals with a valid datatype but an invalid lexical form have the effective boolean value `false`.
pub fn effective_boolean_value(term: Option<&Term>) -> Result<bool, QueryError> {
    let Some(term) = term else {
        return Err(QueryError::new(
            "Cannot evaluate the effective boolean value of an unbound value",
        ));
    };
    let Term::Literal(literal) = term else {
        return Err(QueryError::new(format!(
            "Cannot evaluate the effective boolean value of {term} since it is not a literal"
        )));
    };
    match LiteralKind::of(literal) {
        LiteralKind::String | LiteralKind::LanguageString => Ok(!literal.value().is_empty()),
        LiteralKind::Boolean => Ok(parse_boolean(literal.value()).unwrap_or(false)),
        LiteralKind::Numeric(_) => Ok(Numeric::from_literal(literal)
            .map(Numeric::effective_boolean_value)
            .unwrap_or(false)),
        LiteralKind::DateTime | LiteralKind::Other => Err(QueryError::new(format!(
            "Cannot evaluate the effective boolean value of a literal with datatype {}",
            literal.datatype()
        ))),
    }
}

/// The SPARQL `=` operator.
///
/// An unbound operand is an error. Literals of an unknown datatype are only known to be equal when they are the same term.
pub fn equality(a: Option<&Term>, b: Option<&Term>) -> Result<bool, QueryError> {
    let (Some(a), Some(b)) = (a, b) else {
        return Err(QueryError::new(
            "Cannot evaluate equality when one or both arguments are unbound",
        ));
    };
    match (a, b) {
        (Term::Literal(a), Term::Literal(b)) => literal_equality(a, b),
        _ => Ok(a == b),
    }
}

/// The SPARQL `!=` operator, failing in the same cases as [`equality`].
pub fn inequality(a: Option<&Term>, b: Option<&Term>) -> Result<bool, QueryError> {
    equality(a, b).map(|equal| !equal)
}

fn literal_equality(a: &Literal, b: &Literal) -> Result<bool, QueryError> {
    match (LiteralKind::of(a), LiteralKind::of(b)) {
        (LiteralKind::Other, _) | (_, LiteralKind::Other) => {
            if a == b {
                Ok(true)
            } else {
                Err(QueryError::new(format!(
                    "Unable to determine the equality of {a} and {b} since one or both of them have an unknown datatype"
                )))
            }
        }
        (LiteralKind::Numeric(_), LiteralKind::Numeric(_)) => {
            match (Numeric::from_literal(a), Numeric::from_literal(b)) {
                (Ok(x), Ok(y)) => Ok(numeric_cmp(x, y)? == Some(Ordering::Equal)),
                _ => Ok(a == b),
            }
        }
        (LiteralKind::String, LiteralKind::String) => Ok(a.value() == b.value()),
        (LiteralKind::LanguageString, LiteralKind::LanguageString) => Ok(a.value() == b.value()
            && a.language().map(str::to_ascii_lowercase)
                == b.language().map(str::to_ascii_lowercase)),
        (LiteralKind::Boolean, LiteralKind::Boolean) => {
            match (parse_boolean(a.value()), parse_boolean(b.value())) {
                (Some(x), Some(y)) => Ok(x == y),
                _ => Ok(a == b),
            }
        }
        (LiteralKind::DateTime, LiteralKind::DateTime) => {
            match (a.value().parse::<DateTime>(), b.value().parse::<DateTime>()) {
                (Ok(x), Ok(y)) => Ok(x == y),
                _ => Ok(a == b),
            }
        }
        _ => Ok(false),
    }
}

/// Compares two numbers after promoting them to their common kind.
///
/// Returns `None` when one of them is NaN.
pub fn numeric_cmp(a: Numeric, b: Numeric) -> Result<Option<Ordering>, QueryError> {
    Ok(
        match a.numeric_type().promote(b.numeric_type()) {
            NumericType::Integer => Some(a.to_integer()?.cmp(&b.to_integer()?)),
            NumericType::Decimal => Some(a.to_decimal()?.cmp(&b.to_decimal()?)),
            NumericType::Float => a.to_float().partial_cmp(&b.to_float()),
            NumericType::Double | NumericType::NaN => a.to_double().partial_cmp(&b.to_double()),
        },
    )
}

/// The ordering used by the `<`, `<=`, `>` and `>=` operators and by sorting aggregates.
///
/// Unbound values sort first, then blank nodes, IRIs and literals.
/// Literals that can't be compared meaningfully, like a number and a string, are an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermComparer;

impl TermComparer {
    pub fn compare(self, a: Option<&Term>, b: Option<&Term>) -> Result<Ordering, QueryError> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(a), Some(b)) => match (a, b) {
                (Term::BlankNode(a), Term::BlankNode(b)) => Ok(a.as_str().cmp(b.as_str())),
                (Term::NamedNode(a), Term::NamedNode(b)) => Ok(a.as_str().cmp(b.as_str())),
                (Term::Literal(a), Term::Literal(b)) => compare_literals(a, b),
                _ => Ok(term_kind_rank(a).cmp(&term_kind_rank(b))),
            },
        }
    }
}

fn term_kind_rank(term: &Term) -> u8 {
    if term.is_blank_node() {
        0
    } else if term.is_named_node() {
        1
    } else if term.is_literal() {
        2
    } else {
        3
    }
}

fn compare_literals(a: &Literal, b: &Literal) -> Result<Ordering, QueryError> {
    match (LiteralKind::of(a), LiteralKind::of(b)) {
        (LiteralKind::Other, _) | (_, LiteralKind::Other) => {
            if a == b {
                Ok(Ordering::Equal)
            } else {
                Err(QueryError::new(format!(
                    "Unable to determine the ordering of {a} and {b} since one or both of them have an unknown datatype"
                )))
            }
        }
        (LiteralKind::Numeric(_), LiteralKind::Numeric(_)) => {
            match (Numeric::from_literal(a), Numeric::from_literal(b)) {
                (Ok(x), Ok(y)) => numeric_cmp(x, y)?.ok_or_else(|| {
                    QueryError::new(format!("{a} and {b} are not comparable"))
                }),
                _ if a == b => Ok(Ordering::Equal),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }
        (LiteralKind::Numeric(_), _) | (_, LiteralKind::Numeric(_)) => Err(QueryError::new(
            format!("Unable to compare {a} and {b} since only one of them is numeric"),
        )),
        (LiteralKind::String, LiteralKind::String) => Ok(a.value().cmp(b.value())),
        (LiteralKind::Boolean, LiteralKind::Boolean) => {
            match (parse_boolean(a.value()), parse_boolean(b.value())) {
                (Some(x), Some(y)) => Ok(x.cmp(&y)),
                _ => Ok(a.value().cmp(b.value())),
            }
        }
        (LiteralKind::DateTime, LiteralKind::DateTime) => {
            match (a.value().parse::<DateTime>(), b.value().parse::<DateTime>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).ok_or_else(|| {
                    QueryError::new(format!(
                        "{a} and {b} are not comparable since only one of them has a timezone"
                    ))
                }),
                _ => Ok(a.value().cmp(b.value())),
            }
        }
        _ => Ok(a
            .value()
            .cmp(b.value())
            .then_with(|| a.datatype().as_str().cmp(b.datatype().as_str()))
            .then_with(|| a.language().cmp(&b.language()))),
    }
}

/// The families of literals the operators know how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralKind {
    String,
    LanguageString,
    Boolean,
    Numeric(NumericType),
    DateTime,
    Other,
}

impl LiteralKind {
    pub(crate) fn of(literal: &Literal) -> Self {
        if literal.language().is_some() {
            return Self::LanguageString;
        }
        match literal.datatype() {
            xsd::STRING => Self::String,
            xsd::BOOLEAN => Self::Boolean,
            xsd::DATE_TIME => Self::DateTime,
            datatype => match NumericType::from_datatype(datatype) {
                NumericType::NaN => Self::Other,
                kind => Self::Numeric(kind),
            },
        }
    }
}

pub(crate) fn parse_boolean(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn boolean_literal(value: bool) -> Literal {
    Literal::new_typed_literal(if value { "true" } else { "false" }, xsd::BOOLEAN)
}

/// Extracts the lexical form and the language tag of a string literal.
pub(crate) fn to_string_and_language(term: &Term) -> Option<(&str, Option<&str>)> {
    let Term::Literal(literal) = term else {
        return None;
    };
    match LiteralKind::of(literal) {
        LiteralKind::String | LiteralKind::LanguageString => {
            Some((literal.value(), literal.language()))
        }
        _ => None,
    }
}

pub(crate) fn build_plain_literal(value: impl Into<String>, language: Option<&str>) -> Term {
    if let Some(language) = language {
        Literal::new_language_tagged_literal_unchecked(value, language).into()
    } else {
        Literal::new_simple_literal(value).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, NamedNode};

    fn typed(value: &str, datatype: oxrdf::NamedNodeRef<'_>) -> Term {
        Literal::new_typed_literal(value, datatype).into()
    }

    #[test]
    fn test_effective_boolean_value() {
        assert!(effective_boolean_value(None).is_err());
        assert!(effective_boolean_value(Some(&Literal::new_simple_literal("a").into())).unwrap());
        assert!(!effective_boolean_value(Some(&Literal::new_simple_literal("").into())).unwrap());
        assert!(
            effective_boolean_value(Some(
                &Literal::new_language_tagged_literal_unchecked("a", "en").into()
            ))
            .unwrap()
        );
        assert!(effective_boolean_value(Some(&typed("true", xsd::BOOLEAN))).unwrap());
        assert!(!effective_boolean_value(Some(&typed("maybe", xsd::BOOLEAN))).unwrap());
        assert!(!effective_boolean_value(Some(&typed("0.0", xsd::DECIMAL))).unwrap());
        assert!(!effective_boolean_value(Some(&typed("NaN", xsd::DOUBLE))).unwrap());
        assert!(effective_boolean_value(Some(&typed("2", xsd::INT))).unwrap());
        assert!(!effective_boolean_value(Some(&typed("abc", xsd::INTEGER))).unwrap());
        assert!(
            effective_boolean_value(Some(&typed("2020-01-01T00:00:00Z", xsd::DATE_TIME)))
                .is_err()
        );
        assert!(
            effective_boolean_value(Some(&NamedNode::new_unchecked("http://example.com").into()))
                .is_err()
        );
    }

    #[test]
    fn test_equality() {
        assert!(equality(None, Some(&typed("1", xsd::INTEGER))).is_err());
        assert!(equality(None, None).is_err());
        assert!(equality(Some(&typed("1", xsd::INTEGER)), Some(&typed("1.0", xsd::DECIMAL))).unwrap());
        assert!(equality(Some(&typed("01", xsd::INT)), Some(&typed("1E0", xsd::DOUBLE))).unwrap());
        assert!(!equality(Some(&typed("1", xsd::INTEGER)), Some(&typed("1", xsd::STRING))).unwrap());
        assert!(
            !equality(
                Some(&NamedNode::new_unchecked("http://example.com").into()),
                Some(&BlankNode::default().into())
            )
            .unwrap()
        );
        let custom = NamedNode::new_unchecked("http://example.com/dt");
        assert!(equality(Some(&typed("a", custom.as_ref())), Some(&typed("a", custom.as_ref()))).unwrap());
        assert!(equality(Some(&typed("a", custom.as_ref())), Some(&typed("b", custom.as_ref()))).is_err());
        assert!(inequality(Some(&typed("1", xsd::INTEGER)), Some(&typed("2", xsd::INTEGER))).unwrap());
    }

    #[test]
    fn test_comparer() {
        let comparer = TermComparer;
        assert_eq!(comparer.compare(None, None).unwrap(), Ordering::Equal);
        assert_eq!(
            comparer.compare(None, Some(&typed("1", xsd::INTEGER))).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            comparer
                .compare(Some(&typed("2", xsd::INTEGER)), Some(&typed("10", xsd::INTEGER)))
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            comparer
                .compare(Some(&typed("2.5", xsd::DECIMAL)), Some(&typed("2", xsd::INTEGER)))
                .unwrap(),
            Ordering::Greater
        );
        assert!(
            comparer
                .compare(Some(&typed("2", xsd::INTEGER)), Some(&typed("b", xsd::STRING)))
                .is_err()
        );
        assert_eq!(
            comparer
                .compare(
                    Some(&BlankNode::default().into()),
                    Some(&NamedNode::new_unchecked("http://example.com").into())
                )
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            comparer
                .compare(Some(&typed("a", xsd::STRING)), Some(&typed("b", xsd::STRING)))
                .unwrap(),
            Ordering::Less
        );
    }
}

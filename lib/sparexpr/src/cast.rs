//! [XPath casts](https://www.w3.org/TR/sparql11-query/#FunctionMapping) to the XSD datatypes supported by SPARQL.

use crate::error::QueryError;
use crate::numeric::Numeric;
use crate::term::{LiteralKind, boolean_literal, parse_boolean};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term};
use oxsdatatypes::{DateTime, Decimal, Double, Float};

/// A cast function like `xsd:integer(?x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastFunction {
    Boolean,
    DateTime,
    Decimal,
    Double,
    Float,
    Integer,
    Int,
    String,
}

impl CastFunction {
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::DateTime,
        Self::Decimal,
        Self::Double,
        Self::Float,
        Self::Integer,
        Self::Int,
        Self::String,
    ];

    /// The cast function with the given IRI, if any.
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        Some(match iri {
            xsd::BOOLEAN => Self::Boolean,
            xsd::DATE_TIME => Self::DateTime,
            xsd::DECIMAL => Self::Decimal,
            xsd::DOUBLE => Self::Double,
            xsd::FLOAT => Self::Float,
            xsd::INTEGER => Self::Integer,
            xsd::INT => Self::Int,
            xsd::STRING => Self::String,
            _ => return None,
        })
    }

    /// The target datatype, also the IRI of the function.
    pub fn datatype(self) -> NamedNodeRef<'static> {
        match self {
            Self::Boolean => xsd::BOOLEAN,
            Self::DateTime => xsd::DATE_TIME,
            Self::Decimal => xsd::DECIMAL,
            Self::Double => xsd::DOUBLE,
            Self::Float => xsd::FLOAT,
            Self::Integer => xsd::INTEGER,
            Self::Int => xsd::INT,
            Self::String => xsd::STRING,
        }
    }

    pub fn iri(self) -> NamedNode {
        self.datatype().into_owned()
    }

    /// If the cast returns numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Decimal | Self::Double | Self::Float | Self::Integer | Self::Int
        )
    }

    pub(crate) fn evaluate(self, value: Option<Term>) -> Result<Option<Term>, QueryError> {
        let Some(value) = value else {
            return Err(QueryError::new(format!(
                "Cannot cast an unbound value to {}",
                self.datatype()
            )));
        };
        let literal = match value {
            Term::Literal(literal) => literal,
            Term::NamedNode(iri) if self == Self::String => {
                return Ok(Some(Literal::new_simple_literal(iri.into_string()).into()));
            }
            _ => {
                return Err(QueryError::new(format!(
                    "Cannot cast {value} to {} since it is not a literal",
                    self.datatype()
                )));
            }
        };
        let kind = LiteralKind::of(&literal);
        let result = match self {
            Self::String => Literal::new_simple_literal(literal.value()),
            Self::Boolean => boolean_literal(match kind {
                LiteralKind::Boolean | LiteralKind::String => {
                    parse_boolean(literal.value()).ok_or_else(|| invalid(&literal, self))?
                }
                LiteralKind::Numeric(_) => {
                    Numeric::from_literal(&literal)?.effective_boolean_value()
                }
                _ => return Err(invalid(&literal, self)),
            }),
            Self::Integer | Self::Int => {
                let value = match kind {
                    LiteralKind::Numeric(_) => Numeric::from_literal(&literal)?.to_integer()?,
                    LiteralKind::Boolean => {
                        i64::from(parse_boolean(literal.value()).ok_or_else(|| invalid(&literal, self))?)
                    }
                    LiteralKind::String => literal
                        .value()
                        .trim()
                        .parse()
                        .map_err(|e| QueryError::with_cause(invalid(&literal, self).to_string(), e))?,
                    _ => return Err(invalid(&literal, self)),
                };
                if self == Self::Int {
                    let value = i32::try_from(value).map_err(|e| {
                        QueryError::with_cause(invalid(&literal, self).to_string(), e)
                    })?;
                    Literal::new_typed_literal(value.to_string(), xsd::INT)
                } else {
                    Numeric::Integer(value).into_literal()
                }
            }
            Self::Decimal => Numeric::Decimal(match kind {
                LiteralKind::Numeric(_) => Numeric::from_literal(&literal)?.to_decimal()?,
                LiteralKind::Boolean => Decimal::from(
                    parse_boolean(literal.value()).ok_or_else(|| invalid(&literal, self))?,
                ),
                LiteralKind::String => literal
                    .value()
                    .trim()
                    .parse()
                    .map_err(|e| QueryError::with_cause(invalid(&literal, self).to_string(), e))?,
                _ => return Err(invalid(&literal, self)),
            })
            .into_literal(),
            Self::Float => Numeric::Float(match kind {
                LiteralKind::Numeric(_) => Numeric::from_literal(&literal)?.to_float(),
                LiteralKind::Boolean => {
                    if parse_boolean(literal.value()).ok_or_else(|| invalid(&literal, self))? {
                        1.
                    } else {
                        0.
                    }
                }
                LiteralKind::String => literal
                    .value()
                    .trim()
                    .parse::<Float>()
                    .map_err(|e| QueryError::with_cause(invalid(&literal, self).to_string(), e))?
                    .into(),
                _ => return Err(invalid(&literal, self)),
            })
            .into_literal(),
            Self::Double => Numeric::Double(match kind {
                LiteralKind::Numeric(_) => Numeric::from_literal(&literal)?.to_double(),
                LiteralKind::Boolean => {
                    if parse_boolean(literal.value()).ok_or_else(|| invalid(&literal, self))? {
                        1.
                    } else {
                        0.
                    }
                }
                LiteralKind::String => literal
                    .value()
                    .trim()
                    .parse::<Double>()
                    .map_err(|e| QueryError::with_cause(invalid(&literal, self).to_string(), e))?
                    .into(),
                _ => return Err(invalid(&literal, self)),
            })
            .into_literal(),
            Self::DateTime => match kind {
                LiteralKind::DateTime | LiteralKind::String => {
                    let value = literal.value().trim().parse::<DateTime>().map_err(|e| {
                        QueryError::with_cause(invalid(&literal, self).to_string(), e)
                    })?;
                    Literal::new_typed_literal(value.to_string(), xsd::DATE_TIME)
                }
                _ => return Err(invalid(&literal, self)),
            },
        };
        Ok(Some(result.into()))
    }
}

fn invalid(literal: &Literal, cast: CastFunction) -> QueryError {
    QueryError::new(format!("Cannot cast {literal} to {}", cast.datatype()))
}

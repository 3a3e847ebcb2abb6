//! Numeric kinds, the promotion lattice between them and the coercion of RDF terms into numbers.

use crate::error::QueryError;
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef, Term};
use oxsdatatypes::{Decimal, Double, Float, Integer};
use std::fmt;

/// The numeric kinds of SPARQL arithmetic, ordered by promotion.
///
/// The promotion target of a binary operation is the [`max`](Ord::max) of the two operand kinds.
/// [`NumericType::NaN`] marks a value that is not a number at all and never participates in arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum NumericType {
    NaN = -1,
    Integer = 0,
    Decimal = 1,
    Float = 2,
    Double = 3,
}

impl NumericType {
    /// Maps an XSD datatype to its numeric kind.
    ///
    /// All the `xsd:integer` derived types are mapped to [`NumericType::Integer`].
    pub fn from_datatype(datatype: NamedNodeRef<'_>) -> Self {
        match datatype {
            xsd::INTEGER
            | xsd::INT
            | xsd::LONG
            | xsd::SHORT
            | xsd::BYTE
            | xsd::NON_NEGATIVE_INTEGER
            | xsd::NON_POSITIVE_INTEGER
            | xsd::NEGATIVE_INTEGER
            | xsd::POSITIVE_INTEGER
            | xsd::UNSIGNED_LONG
            | xsd::UNSIGNED_INT
            | xsd::UNSIGNED_SHORT
            | xsd::UNSIGNED_BYTE => Self::Integer,
            xsd::DECIMAL => Self::Decimal,
            xsd::FLOAT => Self::Float,
            xsd::DOUBLE => Self::Double,
            _ => Self::NaN,
        }
    }

    /// The canonical datatype of the kind, `None` for [`NumericType::NaN`].
    pub fn datatype(self) -> Option<NamedNodeRef<'static>> {
        match self {
            Self::NaN => None,
            Self::Integer => Some(xsd::INTEGER),
            Self::Decimal => Some(xsd::DECIMAL),
            Self::Float => Some(xsd::FLOAT),
            Self::Double => Some(xsd::DOUBLE),
        }
    }

    /// The type both operands of a binary operation are converted to.
    #[inline]
    #[must_use]
    pub fn promote(self, other: Self) -> Self {
        self.max(other)
    }
}

/// A number of one of the four SPARQL numeric kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
}

impl Numeric {
    /// Coerces a term into a number.
    ///
    /// Only typed literals with a numeric datatype are accepted.
    pub fn from_term(term: Option<&Term>) -> Result<Self, QueryError> {
        let Some(term) = term else {
            return Err(QueryError::new(
                "Cannot evaluate the numeric value of an unbound variable",
            ));
        };
        let Term::Literal(literal) = term else {
            return Err(QueryError::new(format!(
                "Cannot evaluate the numeric value of {term} since it is not a literal"
            )));
        };
        Self::from_literal(literal)
    }

    pub fn from_literal(literal: &Literal) -> Result<Self, QueryError> {
        if literal.language().is_some() {
            return Err(QueryError::new(format!(
                "Cannot evaluate the numeric value of the language tagged literal {literal}"
            )));
        }
        if literal.datatype() == xsd::STRING {
            return Err(QueryError::new(format!(
                "Cannot evaluate the numeric value of the untyped literal {literal}"
            )));
        }
        Self::parse(literal.value(), NumericType::from_datatype(literal.datatype())).map_err(
            |e| match e {
                NumericParseError::NotNumeric => QueryError::new(format!(
                    "Cannot evaluate the numeric value of {literal} since its datatype is not numeric"
                )),
                NumericParseError::Lexical(cause) => QueryError::with_cause(
                    format!("Unable to parse the numeric value of {literal}"),
                    cause,
                ),
            },
        )
    }

    fn parse(value: &str, kind: NumericType) -> Result<Self, NumericParseError> {
        Ok(match kind {
            NumericType::NaN => return Err(NumericParseError::NotNumeric),
            NumericType::Integer => Self::Integer(
                value
                    .parse::<i64>()
                    .map_err(|e| NumericParseError::Lexical(e.into()))?,
            ),
            NumericType::Decimal => Self::Decimal(
                value
                    .parse::<Decimal>()
                    .map_err(|e| NumericParseError::Lexical(e.into()))?,
            ),
            NumericType::Float => Self::Float(
                value
                    .parse::<Float>()
                    .map_err(|e| NumericParseError::Lexical(e.into()))?
                    .into(),
            ),
            NumericType::Double => Self::Double(
                value
                    .parse::<Double>()
                    .map_err(|e| NumericParseError::Lexical(e.into()))?
                    .into(),
            ),
        })
    }

    pub fn numeric_type(&self) -> NumericType {
        match self {
            Self::Integer(_) => NumericType::Integer,
            Self::Decimal(_) => NumericType::Decimal,
            Self::Float(_) => NumericType::Float,
            Self::Double(_) => NumericType::Double,
        }
    }

    /// The integer projection, truncating toward zero.
    pub fn to_integer(self) -> Result<i64, QueryError> {
        match self {
            Self::Integer(value) => Ok(value),
            Self::Decimal(value) => Integer::try_from(value)
                .map(i64::from)
                .map_err(|_| QueryError::new(format!("{value} does not fit in an integer"))),
            Self::Float(value) => Integer::try_from(Float::from(value))
                .map(i64::from)
                .map_err(|_| QueryError::new(format!("{value} is not convertible to an integer"))),
            Self::Double(value) => Integer::try_from(Double::from(value))
                .map(i64::from)
                .map_err(|_| QueryError::new(format!("{value} is not convertible to an integer"))),
        }
    }

    pub fn to_decimal(self) -> Result<Decimal, QueryError> {
        match self {
            Self::Integer(value) => Ok(value.into()),
            Self::Decimal(value) => Ok(value),
            Self::Float(value) => Decimal::try_from(Float::from(value))
                .map_err(|_| QueryError::new(format!("{value} is not convertible to a decimal"))),
            Self::Double(value) => Decimal::try_from(Double::from(value))
                .map_err(|_| QueryError::new(format!("{value} is not convertible to a decimal"))),
        }
    }

    pub fn to_float(self) -> f32 {
        match self {
            Self::Integer(value) => Float::from(Integer::from(value)).into(),
            Self::Decimal(value) => Float::from(value).into(),
            Self::Float(value) => value,
            Self::Double(value) => Float::from(Double::from(value)).into(),
        }
    }

    pub fn to_double(self) -> f64 {
        match self {
            Self::Integer(value) => Double::from(Integer::from(value)).into(),
            Self::Decimal(value) => Double::from(value).into(),
            Self::Float(value) => value.into(),
            Self::Double(value) => value,
        }
    }

    /// The value compared to the zero of its own kind. NaN is `false`.
    pub fn effective_boolean_value(self) -> bool {
        match self {
            Self::Integer(value) => value != 0,
            Self::Decimal(value) => value != Decimal::from(0),
            Self::Float(value) => value != 0. && !value.is_nan(),
            Self::Double(value) => value != 0. && !value.is_nan(),
        }
    }

    pub fn into_literal(self) -> Literal {
        Literal::new_typed_literal(self.to_string(), self.datatype())
    }

    fn datatype(self) -> NamedNodeRef<'static> {
        match self {
            Self::Integer(_) => xsd::INTEGER,
            Self::Decimal(_) => xsd::DECIMAL,
            Self::Float(_) => xsd::FLOAT,
            Self::Double(_) => xsd::DOUBLE,
        }
    }
}

impl fmt::Display for Numeric {
    /// Writes the canonical lexical form of the number.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => fmt::Display::fmt(value, f),
            Self::Decimal(value) => fmt::Display::fmt(value, f),
            Self::Float(value) => fmt::Display::fmt(&Float::from(*value), f),
            Self::Double(value) => fmt::Display::fmt(&Double::from(*value), f),
        }
    }
}

impl From<i32> for Numeric {
    #[inline]
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for Numeric {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for Numeric {
    #[inline]
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<f32> for Numeric {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Numeric {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Numeric> for Literal {
    #[inline]
    fn from(value: Numeric) -> Self {
        value.into_literal()
    }
}

impl From<Numeric> for Term {
    #[inline]
    fn from(value: Numeric) -> Self {
        value.into_literal().into()
    }
}

enum NumericParseError {
    NotNumeric,
    Lexical(Box<dyn std::error::Error + Send + Sync>),
}

/// Decimal integral check used to narrow division results back to integers.
pub(crate) fn decimal_to_exact_integer(value: Decimal) -> Option<i64> {
    let integer = Integer::try_from(value).ok()?;
    (Decimal::from(integer) == value).then(|| integer.into())
}

pub(crate) fn decimal_negate(value: Decimal) -> Option<Decimal> {
    Decimal::from(0).checked_sub(value)
}

/// Rounds a decimal toward negative infinity.
pub(crate) fn decimal_floor(value: Decimal) -> Option<Decimal> {
    let truncated = Decimal::from(Integer::try_from(value).ok()?);
    if truncated > value {
        truncated.checked_sub(1)
    } else {
        Some(truncated)
    }
}

pub(crate) fn decimal_ceil(value: Decimal) -> Option<Decimal> {
    let truncated = Decimal::from(Integer::try_from(value).ok()?);
    if truncated < value {
        truncated.checked_add(1)
    } else {
        Some(truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_promotion_order() {
        assert_eq!(
            NumericType::Integer.promote(NumericType::Decimal),
            NumericType::Decimal
        );
        assert_eq!(
            NumericType::Float.promote(NumericType::Decimal),
            NumericType::Float
        );
        assert_eq!(
            NumericType::Double.promote(NumericType::Integer),
            NumericType::Double
        );
        assert_eq!(
            NumericType::NaN.promote(NumericType::Integer),
            NumericType::Integer
        );
        assert_eq!(NumericType::NaN as i8, -1);
        assert_eq!(NumericType::Double as i8, 3);
    }

    #[test]
    fn test_datatype_mapping() {
        assert_eq!(
            NumericType::from_datatype(xsd::UNSIGNED_BYTE),
            NumericType::Integer
        );
        assert_eq!(NumericType::from_datatype(xsd::DOUBLE), NumericType::Double);
        assert_eq!(NumericType::from_datatype(xsd::STRING), NumericType::NaN);
        assert_eq!(NumericType::from_datatype(xsd::BOOLEAN), NumericType::NaN);
    }

    #[test]
    fn test_coercion_errors() {
        assert!(Numeric::from_term(None).is_err());
        assert!(Numeric::from_term(Some(&Literal::new_simple_literal("1").into())).is_err());
        assert!(
            Numeric::from_term(Some(
                &Literal::new_language_tagged_literal_unchecked("1", "en").into()
            ))
            .is_err()
        );
        assert!(
            Numeric::from_term(Some(&Literal::new_typed_literal("1", xsd::BOOLEAN).into()))
                .is_err()
        );
        let error =
            Numeric::from_term(Some(&Literal::new_typed_literal("foo", xsd::INT).into()))
                .unwrap_err();
        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(
            Numeric::from_term(Some(&Literal::new_typed_literal("12", xsd::SHORT).into()))
                .unwrap(),
            Numeric::Integer(12)
        );
    }

    #[test]
    fn test_projections() {
        let value = Numeric::Decimal(Decimal::from_str("-2.5").unwrap());
        assert_eq!(value.to_integer().unwrap(), -2);
        assert!((value.to_double() + 2.5).abs() < f64::EPSILON);
        assert!(Numeric::Double(f64::NAN).to_integer().is_err());
        assert!(Numeric::Double(f64::INFINITY).to_decimal().is_err());
    }

    #[test]
    fn test_effective_boolean_value() {
        assert!(!Numeric::Integer(0).effective_boolean_value());
        assert!(Numeric::Integer(-3).effective_boolean_value());
        assert!(!Numeric::Double(f64::NAN).effective_boolean_value());
        assert!(!Numeric::Float(0.).effective_boolean_value());
        assert!(Numeric::Decimal(Decimal::from_str("0.1").unwrap()).effective_boolean_value());
    }

    #[test]
    fn test_decimal_helpers() {
        let value = Decimal::from_str("-1.5").unwrap();
        assert_eq!(decimal_floor(value), Some(Decimal::from(-2)));
        assert_eq!(decimal_ceil(value), Some(Decimal::from(-1)));
        assert_eq!(decimal_to_exact_integer(Decimal::from(4)), Some(4));
        assert_eq!(decimal_to_exact_integer(value), None);
        assert_eq!(
            decimal_negate(value),
            Some(Decimal::from_str("1.5").unwrap())
        );
    }

    #[test]
    fn test_lexical_form() {
        assert_eq!(Numeric::Integer(5).to_string(), "5");
        assert_eq!(Numeric::Double(f64::NEG_INFINITY).to_string(), "-INF");
        assert_eq!(
            Numeric::Integer(5).into_literal(),
            Literal::new_typed_literal("5", xsd::INTEGER)
        );
    }
}

//! The [XPath functions](https://www.w3.org/TR/xpath-functions/) usable as SPARQL extension functions.

use crate::aggregate::{AggregateFunction, BuiltinAggregate};
use crate::context::{BindingId, EvaluationContext};
use crate::error::{ParseError, QueryError};
use crate::expression::Expression;
use crate::factory::{CallSite, FunctionArguments, FunctionFactory};
use crate::function::{CallArguments, Function, compile_pattern};
use crate::numeric::{Numeric, decimal_ceil, decimal_floor, decimal_negate, decimal_to_exact_integer};
use crate::term::{LiteralKind, boolean_literal, build_plain_literal};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term};
use oxsdatatypes::{DateTime, Decimal};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

pub const NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions#";

/// An XPath function evaluated by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathFunction {
    Matches,
    Contains,
    StartsWith,
    EndsWith,
    StringLength,
    Concat,
    Substring,
    SubstringBefore,
    SubstringAfter,
    NormalizeSpace,
    NormalizeUnicode,
    UpperCase,
    LowerCase,
    EncodeForUri,
    Replace,
    EscapeHtmlUri,
    Compare,
    Abs,
    Ceiling,
    Floor,
    Round,
    RoundHalfToEven,
    YearFromDateTime,
    MonthFromDateTime,
    DayFromDateTime,
    HoursFromDateTime,
    MinutesFromDateTime,
    SecondsFromDateTime,
    TimezoneFromDateTime,
}

impl XPathFunction {
    pub const ALL: [Self; 29] = [
        Self::Matches,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::StringLength,
        Self::Concat,
        Self::Substring,
        Self::SubstringBefore,
        Self::SubstringAfter,
        Self::NormalizeSpace,
        Self::NormalizeUnicode,
        Self::UpperCase,
        Self::LowerCase,
        Self::EncodeForUri,
        Self::Replace,
        Self::EscapeHtmlUri,
        Self::Compare,
        Self::Abs,
        Self::Ceiling,
        Self::Floor,
        Self::Round,
        Self::RoundHalfToEven,
        Self::YearFromDateTime,
        Self::MonthFromDateTime,
        Self::DayFromDateTime,
        Self::HoursFromDateTime,
        Self::MinutesFromDateTime,
        Self::SecondsFromDateTime,
        Self::TimezoneFromDateTime,
    ];

    /// The local name of the function in the `fn:` namespace.
    pub fn name(self) -> &'static str {
        match self {
            Self::Matches => "matches",
            Self::Contains => "contains",
            Self::StartsWith => "starts-with",
            Self::EndsWith => "ends-with",
            Self::StringLength => "string-length",
            Self::Concat => "concat",
            Self::Substring => "substring",
            Self::SubstringBefore => "substring-before",
            Self::SubstringAfter => "substring-after",
            Self::NormalizeSpace => "normalize-space",
            Self::NormalizeUnicode => "normalize-unicode",
            Self::UpperCase => "upper-case",
            Self::LowerCase => "lower-case",
            Self::EncodeForUri => "encode-for-uri",
            Self::Replace => "replace",
            Self::EscapeHtmlUri => "escape-html-uri",
            Self::Compare => "compare",
            Self::Abs => "abs",
            Self::Ceiling => "ceiling",
            Self::Floor => "floor",
            Self::Round => "round",
            Self::RoundHalfToEven => "round-half-to-even",
            Self::YearFromDateTime => "year-from-dateTime",
            Self::MonthFromDateTime => "month-from-dateTime",
            Self::DayFromDateTime => "day-from-dateTime",
            Self::HoursFromDateTime => "hours-from-dateTime",
            Self::MinutesFromDateTime => "minutes-from-dateTime",
            Self::SecondsFromDateTime => "seconds-from-dateTime",
            Self::TimezoneFromDateTime => "timezone-from-dateTime",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn iri(self) -> NamedNode {
        NamedNode::new_unchecked(format!("{NAMESPACE}{}", self.name()))
    }

    /// If the function always returns a number.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::StringLength
                | Self::Compare
                | Self::Abs
                | Self::Ceiling
                | Self::Floor
                | Self::Round
                | Self::RoundHalfToEven
                | Self::YearFromDateTime
                | Self::MonthFromDateTime
                | Self::DayFromDateTime
                | Self::HoursFromDateTime
                | Self::MinutesFromDateTime
                | Self::SecondsFromDateTime
        )
    }

    /// The accepted argument counts.
    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Matches => (2, 3, "2 or 3"),
            Self::Concat => (2, usize::MAX, "at least 2"),
            Self::Substring => (2, 3, "2 or 3"),
            Self::NormalizeUnicode | Self::RoundHalfToEven => (1, 2, "1 or 2"),
            Self::Replace => (3, 4, "3 or 4"),
            Self::Contains
            | Self::StartsWith
            | Self::EndsWith
            | Self::SubstringBefore
            | Self::SubstringAfter
            | Self::Compare => (2, 2, "2"),
            Self::StringLength
            | Self::NormalizeSpace
            | Self::UpperCase
            | Self::LowerCase
            | Self::EncodeForUri
            | Self::EscapeHtmlUri
            | Self::Abs
            | Self::Ceiling
            | Self::Floor
            | Self::Round
            | Self::YearFromDateTime
            | Self::MonthFromDateTime
            | Self::DayFromDateTime
            | Self::HoursFromDateTime
            | Self::MinutesFromDateTime
            | Self::SecondsFromDateTime
            | Self::TimezoneFromDateTime => (1, 1, "1"),
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
            Self::Matches => {
                let (text, _) = args.string(0)?;
                let (pattern, _) = args.string(1)?;
                let flags = if args.len() > 2 {
                    Some(args.string(2)?.0)
                } else {
                    None
                };
                let regex = compile_pattern(
                    &pattern,
                    flags.as_deref(),
                    context.options().regex_size_limit,
                )?;
                boolean_literal(regex.is_match(&text)).into()
            }
            Self::Contains => {
                let (a, b, _) = args.compatible_strings(0, 1)?;
                boolean_literal(a.contains(&b)).into()
            }
            Self::StartsWith => {
                let (a, b, _) = args.compatible_strings(0, 1)?;
                boolean_literal(a.starts_with(&b)).into()
            }
            Self::EndsWith => {
                let (a, b, _) = args.compatible_strings(0, 1)?;
                boolean_literal(a.ends_with(&b)).into()
            }
            Self::StringLength => {
                let (value, _) = args.string(0)?;
                Numeric::Integer(value.chars().count().try_into().map_err(|e| {
                    QueryError::with_cause("The string is too long to have its length computed", e)
                })?)
                .into()
            }
            Self::Concat => {
                let mut result = String::new();
                let mut language = None;
                for i in 0..args.len() {
                    let (value, value_language) = args.string(i)?;
                    if let Some(lang) = &language {
                        if *lang != value_language {
                            language = Some(None)
                        }
                    } else {
                        language = Some(value_language)
                    }
                    result += &value;
                }
                build_plain_literal(result, language.flatten().as_deref())
            }
            Self::Substring => {
                let (source, language) = args.string(0)?;
                let start = xpath_round(args.double(1)?);
                let end = if args.len() > 2 {
                    Some(start + xpath_round(args.double(2)?))
                } else {
                    None
                };
                // XPath positions are 1-based and compared after rounding
                let result = source
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let position = (*i + 1) as f64;
                        position >= start && end.is_none_or(|end| position < end)
                    })
                    .map(|(_, c)| c)
                    .collect::<String>();
                build_plain_literal(result, language.as_deref())
            }
            Self::SubstringBefore => {
                let (a, b, language) = args.compatible_strings(0, 1)?;
                if let Some(position) = a.find(&b) {
                    build_plain_literal(&a[..position], language.as_deref())
                } else {
                    Literal::new_simple_literal("").into()
                }
            }
            Self::SubstringAfter => {
                let (a, b, language) = args.compatible_strings(0, 1)?;
                if let Some(position) = a.find(&b) {
                    build_plain_literal(&a[position + b.len()..], language.as_deref())
                } else {
                    Literal::new_simple_literal("").into()
                }
            }
            Self::NormalizeSpace => {
                let (value, language) = args.string(0)?;
                build_plain_literal(
                    value.split_whitespace().collect::<Vec<_>>().join(" "),
                    language.as_deref(),
                )
            }
            Self::NormalizeUnicode => {
                let (value, language) = args.string(0)?;
                let form = if args.len() > 1 {
                    args.string(1)?.0.trim().to_ascii_uppercase()
                } else {
                    "NFC".into()
                };
                if !form.is_empty() && !matches!(form.as_str(), "NFC" | "NFD" | "NFKC" | "NFKD") {
                    return Err(QueryError::new(format!(
                        "{form} is not a supported Unicode normalization form"
                    )));
                }
                // ASCII strings are invariant under all the normalization forms
                if !form.is_empty() && !value.is_ascii() {
                    return Err(QueryError::new(format!(
                        "The {form} normalization of non ASCII strings is not supported"
                    )));
                }
                build_plain_literal(value, language.as_deref())
            }
            Self::UpperCase => {
                let (value, language) = args.string(0)?;
                build_plain_literal(value.to_uppercase(), language.as_deref())
            }
            Self::LowerCase => {
                let (value, language) = args.string(0)?;
                build_plain_literal(value.to_lowercase(), language.as_deref())
            }
            Self::EncodeForUri => {
                let (value, _) = args.string(0)?;
                Literal::new_simple_literal(percent_encode(&value, |c| {
                    matches!(c, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~')
                }))
                .into()
            }
            Self::EscapeHtmlUri => {
                let (value, _) = args.string(0)?;
                Literal::new_simple_literal(percent_encode(&value, |c| (32..=126).contains(&c)))
                    .into()
            }
            Self::Replace => {
                let (text, language) = args.string(0)?;
                let (pattern, _) = args.string(1)?;
                let (replacement, _) = args.string(2)?;
                let flags = if args.len() > 3 {
                    Some(args.string(3)?.0)
                } else {
                    None
                };
                let regex = compile_pattern(
                    &pattern,
                    flags.as_deref(),
                    context.options().regex_size_limit,
                )?;
                build_plain_literal(
                    match regex.replace_all(&text, replacement.as_str()) {
                        Cow::Owned(replaced) => replaced,
                        Cow::Borrowed(_) => text,
                    },
                    language.as_deref(),
                )
            }
            Self::Compare => {
                let (a, _) = args.string(0)?;
                let (b, _) = args.string(1)?;
                Numeric::Integer(match a.cmp(&b) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                })
                .into()
            }
            Self::Abs => match args.numeric(0)? {
                Numeric::Integer(value) => Numeric::Integer(value.checked_abs().ok_or_else(|| {
                    QueryError::new(format!("Overflow while computing the absolute value of {value}"))
                })?),
                Numeric::Decimal(value) => Numeric::Decimal(if value < Decimal::from(0) {
                    decimal_negate(value).ok_or_else(|| decimal_overflow(value))?
                } else {
                    value
                }),
                Numeric::Float(value) => Numeric::Float(value.abs()),
                Numeric::Double(value) => Numeric::Double(value.abs()),
            }
            .into(),
            Self::Ceiling => match args.numeric(0)? {
                Numeric::Integer(value) => Numeric::Integer(value),
                Numeric::Decimal(value) => {
                    Numeric::Decimal(decimal_ceil(value).ok_or_else(|| decimal_overflow(value))?)
                }
                Numeric::Float(value) => Numeric::Float(value.ceil()),
                Numeric::Double(value) => Numeric::Double(value.ceil()),
            }
            .into(),
            Self::Floor => match args.numeric(0)? {
                Numeric::Integer(value) => Numeric::Integer(value),
                Numeric::Decimal(value) => {
                    Numeric::Decimal(decimal_floor(value).ok_or_else(|| decimal_overflow(value))?)
                }
                Numeric::Float(value) => Numeric::Float(value.floor()),
                Numeric::Double(value) => Numeric::Double(value.floor()),
            }
            .into(),
            Self::Round => match args.numeric(0)? {
                Numeric::Integer(value) => Numeric::Integer(value),
                Numeric::Decimal(value) => Numeric::Decimal(
                    half()
                        .and_then(|half| value.checked_add(half))
                        .and_then(decimal_floor)
                        .ok_or_else(|| decimal_overflow(value))?,
                ),
                Numeric::Float(value) => Numeric::Float((value + 0.5).floor()),
                Numeric::Double(value) => Numeric::Double(xpath_round(value)),
            }
            .into(),
            Self::RoundHalfToEven => {
                let precision = if args.len() > 1 { args.integer(1)? } else { 0 };
                round_half_to_even(args.numeric(0)?, precision)?.into()
            }
            Self::YearFromDateTime => Numeric::Integer(date_time(&args)?.year()).into(),
            Self::MonthFromDateTime => Numeric::Integer(date_time(&args)?.month().into()).into(),
            Self::DayFromDateTime => Numeric::Integer(date_time(&args)?.day().into()).into(),
            Self::HoursFromDateTime => Numeric::Integer(date_time(&args)?.hour().into()).into(),
            Self::MinutesFromDateTime => {
                Numeric::Integer(date_time(&args)?.minute().into()).into()
            }
            Self::SecondsFromDateTime => Numeric::Decimal(date_time(&args)?.second()).into(),
            Self::TimezoneFromDateTime => {
                let Some(timezone) = date_time(&args)?.timezone() else {
                    return Ok(None);
                };
                Literal::new_typed_literal(timezone.to_string(), xsd::DAY_TIME_DURATION).into()
            }
        }))
    }
}

impl fmt::Display for XPathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn:{}", self.name())
    }
}

/// XPath `round`: halves are rounded toward positive infinity.
fn xpath_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn half() -> Option<Decimal> {
    Decimal::from(1).checked_div(2)
}

fn decimal_overflow(value: Decimal) -> QueryError {
    QueryError::new(format!("Overflow while rounding {value}"))
}

fn percent_encode(value: &str, keep: impl Fn(u8) -> bool) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.bytes() {
        if keep(c) {
            result.push(char::from(c));
        } else {
            result.push('%');
            result.push_str(&hex::encode_upper([c]));
        }
    }
    result
}

fn date_time(args: &CallArguments<'_, '_>) -> Result<DateTime, QueryError> {
    let value = args.term(0)?;
    if let Term::Literal(literal) = &value {
        if LiteralKind::of(literal) == LiteralKind::DateTime {
            return literal.value().parse().map_err(|e| {
                QueryError::with_cause(format!("{literal} is not a valid xsd:dateTime"), e)
            });
        }
    }
    Err(QueryError::new(format!(
        "Expecting an xsd:dateTime literal, found {value}"
    )))
}

/// Number of fractional digits an `xsd:decimal` is able to hold.
const DECIMAL_FRACTION_DIGITS: i64 = 18;

/// Below this precision every representable `xsd:decimal` rounds to zero.
const DECIMAL_ZERO_PRECISION: i64 = -21;

/// Rounds to the given number of decimal digits, halves going to the even neighbour.
///
/// The value is returned unchanged if it has no digit beyond `precision`.
fn round_half_to_even(value: Numeric, precision: i64) -> Result<Numeric, QueryError> {
    let overflow = || QueryError::new(format!("Overflow while rounding {value} to {precision} digits"));
    match value {
        Numeric::Float(value) => Ok(Numeric::Float(
            round_double_half_to_even(value.into(), precision) as f32,
        )),
        Numeric::Double(value) => Ok(Numeric::Double(round_double_half_to_even(value, precision))),
        Numeric::Integer(_) if precision >= 0 => Ok(value),
        Numeric::Integer(_) if precision <= DECIMAL_ZERO_PRECISION => Ok(Numeric::Integer(0)),
        Numeric::Decimal(_) if precision >= DECIMAL_FRACTION_DIGITS => Ok(value),
        Numeric::Decimal(_) if precision <= DECIMAL_ZERO_PRECISION => {
            Ok(Numeric::Decimal(Decimal::from(0)))
        }
        Numeric::Integer(_) | Numeric::Decimal(_) => {
            let decimal = value.to_decimal()?;
            let mut scale = Decimal::from(1);
            for _ in 0..precision.unsigned_abs() {
                scale = scale.checked_mul(10).ok_or_else(overflow)?;
            }
            let scaled = if precision >= 0 {
                decimal.checked_mul(scale)
            } else {
                decimal.checked_div(scale)
            }
            .ok_or_else(overflow)?;
            let floor = decimal_floor(scaled).ok_or_else(overflow)?;
            let remainder = scaled.checked_sub(floor).ok_or_else(overflow)?;
            let floor_is_even = decimal_to_exact_integer(floor).is_some_and(|i| i % 2 == 0);
            let rounded = match remainder.cmp(&half().ok_or_else(overflow)?) {
                Ordering::Less => floor,
                Ordering::Equal if floor_is_even => floor,
                _ => floor.checked_add(1).ok_or_else(overflow)?,
            };
            let result = if precision >= 0 {
                rounded.checked_div(scale)
            } else {
                rounded.checked_mul(scale)
            }
            .ok_or_else(overflow)?;
            Ok(match value {
                Numeric::Integer(_) => {
                    decimal_to_exact_integer(result).map_or(Numeric::Decimal(result), Numeric::Integer)
                }
                _ => Numeric::Decimal(result),
            })
        }
    }
}

fn round_double_half_to_even(value: f64, precision: i64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10_f64.powf(precision as f64);
    if scale == 0. {
        // The precision is far above the magnitude of any double
        return 0.;
    }
    let scaled = value * scale;
    if !scale.is_finite() || !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}

/// Builds the [`fn:`](NAMESPACE) functions and the `fn:string-join` aggregate.
#[derive(Debug, Clone, Copy, Default)]
pub struct XPathFunctionFactory;

impl FunctionFactory for XPathFunctionFactory {
    fn available_functions(&self) -> Vec<NamedNode> {
        ["not", "true", "false"]
            .into_iter()
            .map(|name| NamedNode::new_unchecked(format!("{NAMESPACE}{name}")))
            .chain(XPathFunction::ALL.into_iter().map(XPathFunction::iri))
            .collect()
    }

    fn available_aggregates(&self) -> Vec<NamedNode> {
        vec![AggregateFunction::StringJoin.iri()]
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
        let site = CallSite {
            family: "XPath",
            name,
            arguments,
        };
        Ok(Some(match name {
            "not" => {
                let [arg] = <[Expression; 1]>::try_from(site.exactly(1, "1")?)
                    .map_err(|_| site.arity_error("1"))?;
                Expression::not(arg)
            }
            "true" => {
                site.exactly(0, "0")?;
                Expression::Boolean(true)
            }
            "false" => {
                site.exactly(0, "0")?;
                Expression::Boolean(false)
            }
            "boolean" => {
                site.exactly(1, "1")?;
                return Err(site.unsupported());
            }
            "adjust-dateTime-to-timezone" | "translate" => return Err(site.unsupported()),
            "string-join" => {
                let (args, distinct) = site.aggregate_args(1, 2, "1 or 2")?;
                BuiltinAggregate::new(AggregateFunction::StringJoin, args, distinct).into_expression()
            }
            _ => {
                let Some(xpath) = XPathFunction::from_name(name) else {
                    return Ok(None);
                };
                let (min, max, expected) = xpath.arity();
                Expression::FunctionCall(Function::XPath(xpath), site.between(min, max, expected)?)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryBinder;

    fn call(function: XPathFunction, args: Vec<Expression>) -> Result<Option<Term>, QueryError> {
        let binder = MemoryBinder::new();
        let context = EvaluationContext::new(&binder);
        function.evaluate(&args, &context, 0)
    }

    fn string(value: &str) -> Expression {
        Literal::new_simple_literal(value).into()
    }

    fn integer(value: i64) -> Expression {
        Expression::numeric(value)
    }

    fn decimal(value: &str) -> Expression {
        Literal::new_typed_literal(value, xsd::DECIMAL).into()
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            call(XPathFunction::Substring, vec![string("motor car"), integer(6)]).unwrap(),
            Some(Literal::new_simple_literal(" car").into())
        );
        assert_eq!(
            call(
                XPathFunction::Substring,
                vec![string("12345"), decimal("1.5"), decimal("2.6")]
            )
            .unwrap(),
            Some(Literal::new_simple_literal("234").into())
        );
        assert_eq!(
            call(
                XPathFunction::Concat,
                vec![
                    Literal::new_language_tagged_literal_unchecked("a", "en").into(),
                    Literal::new_language_tagged_literal_unchecked("b", "en").into()
                ]
            )
            .unwrap(),
            Some(Literal::new_language_tagged_literal_unchecked("ab", "en").into())
        );
        assert_eq!(
            call(XPathFunction::NormalizeSpace, vec![string("  a \n b ")]).unwrap(),
            Some(Literal::new_simple_literal("a b").into())
        );
        assert_eq!(
            call(XPathFunction::EncodeForUri, vec![string("a b/c")]).unwrap(),
            Some(Literal::new_simple_literal("a%20b%2Fc").into())
        );
        assert_eq!(
            call(XPathFunction::EscapeHtmlUri, vec![string("a b\u{e9}")]).unwrap(),
            Some(Literal::new_simple_literal("a b%C3%A9").into())
        );
        assert_eq!(
            call(XPathFunction::SubstringAfter, vec![string("tattoo"), string("tat")]).unwrap(),
            Some(Literal::new_simple_literal("too").into())
        );
        assert_eq!(
            call(XPathFunction::Compare, vec![string("a"), string("b")]).unwrap(),
            Some(Numeric::Integer(-1).into())
        );
        assert!(call(XPathFunction::Contains, vec![integer(1), string("1")]).is_err());
    }

    #[test]
    fn test_regex_functions() {
        assert_eq!(
            call(XPathFunction::Matches, vec![string("Abc"), string("^a"), string("i")]).unwrap(),
            Some(boolean_literal(true).into())
        );
        assert_eq!(
            call(
                XPathFunction::Replace,
                vec![string("abcab"), string("b"), string("X")]
            )
            .unwrap(),
            Some(Literal::new_simple_literal("aXcaX").into())
        );
        assert!(call(XPathFunction::Matches, vec![string("a"), string("(")]).is_err());
    }

    #[test]
    fn test_numeric_functions() {
        assert_eq!(
            call(XPathFunction::Abs, vec![integer(-3)]).unwrap(),
            Some(Numeric::Integer(3).into())
        );
        assert_eq!(
            call(XPathFunction::Round, vec![decimal("-2.5")]).unwrap(),
            Some(Numeric::Decimal(Decimal::from(-2)).into())
        );
        assert_eq!(
            call(XPathFunction::Ceiling, vec![decimal("1.2")]).unwrap(),
            Some(Numeric::Decimal(Decimal::from(2)).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![decimal("2.5")]).unwrap(),
            Some(Numeric::Decimal(Decimal::from(2)).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![integer(35), integer(-1)]).unwrap(),
            Some(Numeric::Integer(40).into())
        );
        assert!(call(XPathFunction::Floor, vec![string("1")]).is_err());
    }

    #[test]
    fn test_round_half_to_even_precision_bounds() {
        let double = |value: f64| Expression::numeric(value);
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![decimal("1.5"), integer(25)]).unwrap(),
            Some(Numeric::Decimal("1.5".parse().unwrap()).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![decimal("1.5"), integer(-25)]).unwrap(),
            Some(Numeric::Decimal(Decimal::from(0)).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![integer(1234), integer(30)]).unwrap(),
            Some(Numeric::Integer(1234).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![integer(1234), integer(-30)]).unwrap(),
            Some(Numeric::Integer(0).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![double(1.5), integer(400)]).unwrap(),
            Some(Numeric::Double(1.5).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![double(1.5), integer(-400)]).unwrap(),
            Some(Numeric::Double(0.).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![double(1e300), integer(100)]).unwrap(),
            Some(Numeric::Double(1e300).into())
        );
        assert_eq!(
            call(XPathFunction::RoundHalfToEven, vec![double(2.25), integer(1)]).unwrap(),
            Some(Numeric::Double(2.2).into())
        );
        assert_eq!(
            call(
                XPathFunction::RoundHalfToEven,
                vec![Expression::numeric(2.5_f32), integer(-500)]
            )
            .unwrap(),
            Some(Numeric::Float(0.).into())
        );
    }

    #[test]
    fn test_date_time_functions() {
        let date = Expression::from(Literal::new_typed_literal(
            "2011-01-10T14:45:13.815-05:00",
            xsd::DATE_TIME,
        ));
        assert_eq!(
            call(XPathFunction::YearFromDateTime, vec![date.clone()]).unwrap(),
            Some(Numeric::Integer(2011).into())
        );
        assert_eq!(
            call(XPathFunction::HoursFromDateTime, vec![date.clone()]).unwrap(),
            Some(Numeric::Integer(14).into())
        );
        assert_eq!(
            call(XPathFunction::TimezoneFromDateTime, vec![date]).unwrap(),
            Some(Literal::new_typed_literal("-PT5H", xsd::DAY_TIME_DURATION).into())
        );
        assert_eq!(
            call(
                XPathFunction::TimezoneFromDateTime,
                vec![Literal::new_typed_literal("2011-01-10T14:45:13", xsd::DATE_TIME).into()]
            )
            .unwrap(),
            None
        );
        assert!(call(XPathFunction::DayFromDateTime, vec![string("2011-01-10T14:45:13")]).is_err());
    }

    #[test]
    fn test_factory() {
        let factory = XPathFunctionFactory;
        let iri = |name: &str| NamedNode::new_unchecked(format!("{NAMESPACE}{name}"));
        let x = Expression::variable("x").unwrap();

        assert_eq!(
            factory
                .try_create_expression(&iri("not"), &vec![x.clone()].into())
                .unwrap(),
            Some(Expression::not(x.clone()))
        );
        assert_eq!(
            factory
                .try_create_expression(&iri("true"), &FunctionArguments::default())
                .unwrap(),
            Some(Expression::Boolean(true))
        );
        assert!(matches!(
            factory.try_create_expression(&iri("boolean"), &vec![x.clone()].into()),
            Err(ParseError::Unsupported(_))
        ));
        assert!(matches!(
            factory.try_create_expression(&iri("boolean"), &FunctionArguments::default()),
            Err(ParseError::Arity { .. })
        ));
        assert!(matches!(
            factory.try_create_expression(&iri("abs"), &vec![x.clone(), x.clone()].into()),
            Err(ParseError::Arity { .. })
        ));
        assert!(matches!(
            factory.try_create_expression(&iri("string-join"), &vec![x.clone()].into()),
            Ok(Some(Expression::Aggregate(_)))
        ));
        assert_eq!(
            factory
                .try_create_expression(&iri("unknown"), &vec![x.clone()].into())
                .unwrap(),
            None
        );
        assert_eq!(
            factory
                .try_create_expression(
                    &NamedNode::new_unchecked("http://example.com/abs"),
                    &vec![x].into()
                )
                .unwrap(),
            None
        );
    }
}

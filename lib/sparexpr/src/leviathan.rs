//! The [Leviathan function library](http://www.dotnetrdf.org/leviathan#): hashes, trigonometry and numeric helpers.

use crate::aggregate::{AggregateFunction, BuiltinAggregate};
use crate::context::{BindingId, EvaluationContext};
use crate::error::{ParseError, QueryError};
use crate::expression::Expression;
use crate::factory::{CallSite, FunctionArguments, FunctionFactory};
use crate::function::{CallArguments, Function, double_term, hash};
use crate::numeric::Numeric;
use md5::Md5;
use oxrdf::{NamedNode, Term};
use sha2::Sha256;
use std::fmt;

pub const NAMESPACE: &str = "http://www.dotnetrdf.org/leviathan#";

/// A Leviathan function evaluated by this crate.
///
/// Apart from the hashes and `factorial`, all the functions return `xsd:double` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeviathanFunction {
    Md5Hash,
    Sha256Hash,
    /// `rnd()`, `rnd(max)` or `rnd(min, max)`
    Random,
    Sin,
    Cos,
    Tan,
    Sec,
    Cosec,
    Cotan,
    SinInverse,
    CosInverse,
    TanInverse,
    SecInverse,
    CosecInverse,
    CotanInverse,
    DegreesToRadians,
    RadiansToDegrees,
    /// `log(x)` is the base 10 logarithm, `log(x, base)` the logarithm in the given base
    Log,
    Ln,
    /// `e(x)` is `e` to the power of `x`
    E,
    /// `ten(x)` is 10 to the power of `x`
    Ten,
    Power,
    Square,
    Cube,
    SquareRoot,
    Root,
    Pythagoras,
    /// The euclidean distance between two points given as `(x1, y1, x2, y2)` or `(x1, y1, z1, x2, y2, z2)`
    Cartesian,
    Factorial,
    Reciprocal,
}

impl LeviathanFunction {
    pub const ALL: [Self; 30] = [
        Self::Md5Hash,
        Self::Sha256Hash,
        Self::Random,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Sec,
        Self::Cosec,
        Self::Cotan,
        Self::SinInverse,
        Self::CosInverse,
        Self::TanInverse,
        Self::SecInverse,
        Self::CosecInverse,
        Self::CotanInverse,
        Self::DegreesToRadians,
        Self::RadiansToDegrees,
        Self::Log,
        Self::Ln,
        Self::E,
        Self::Ten,
        Self::Power,
        Self::Square,
        Self::Cube,
        Self::SquareRoot,
        Self::Root,
        Self::Pythagoras,
        Self::Cartesian,
        Self::Factorial,
        Self::Reciprocal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5Hash => "md5hash",
            Self::Sha256Hash => "sha256hash",
            Self::Random => "rnd",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Sec => "sec",
            Self::Cosec => "cosec",
            Self::Cotan => "cotan",
            Self::SinInverse => "sin-1",
            Self::CosInverse => "cos-1",
            Self::TanInverse => "tan-1",
            Self::SecInverse => "sec-1",
            Self::CosecInverse => "cosec-1",
            Self::CotanInverse => "cotan-1",
            Self::DegreesToRadians => "degrees-to-radians",
            Self::RadiansToDegrees => "radians-to-degrees",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::E => "e",
            Self::Ten => "ten",
            Self::Power => "pow",
            Self::Square => "sq",
            Self::Cube => "cube",
            Self::SquareRoot => "sqrt",
            Self::Root => "root",
            Self::Pythagoras => "pythagoras",
            Self::Cartesian => "cartesian",
            Self::Factorial => "factorial",
            Self::Reciprocal => "reciprocal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn iri(self) -> NamedNode {
        NamedNode::new_unchecked(format!("{NAMESPACE}{}", self.name()))
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Md5Hash | Self::Sha256Hash)
    }

    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Random => (0, 2, "between 0 and 2"),
            Self::Log => (1, 2, "1 or 2"),
            Self::Power | Self::Root | Self::Pythagoras => (2, 2, "2"),
            Self::Cartesian => (4, 6, "4 or 6"),
            _ => (1, 1, "1"),
        }
    }

    pub(crate) fn evaluate(
        self,
        args: &[Expression],
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        let args = CallArguments::new(&self, args, context, binding_id);
        let value = match self {
            Self::Md5Hash => return Ok(Some(hash::<Md5>(&args.string(0)?.0))),
            Self::Sha256Hash => return Ok(Some(hash::<Sha256>(&args.string(0)?.0))),
            Self::Factorial => return Ok(Some(factorial(args.integer(0)?)?.into())),
            Self::Random => {
                let (min, max) = match args.len() {
                    0 => (0., 1.),
                    1 => (0., args.double(0)?),
                    _ => (args.double(0)?, args.double(1)?),
                };
                if min > max {
                    return Err(QueryError::new(format!(
                        "Cannot generate a random number between {min} and {max} since the minimum is greater than the maximum"
                    )));
                }
                min + rand::random::<f64>() * (max - min)
            }
            Self::Sin => args.double(0)?.sin(),
            Self::Cos => args.double(0)?.cos(),
            Self::Tan => args.double(0)?.tan(),
            Self::Sec => 1. / args.double(0)?.cos(),
            Self::Cosec => 1. / args.double(0)?.sin(),
            Self::Cotan => 1. / args.double(0)?.tan(),
            Self::SinInverse => args.double(0)?.asin(),
            Self::CosInverse => args.double(0)?.acos(),
            Self::TanInverse => args.double(0)?.atan(),
            Self::SecInverse => (1. / args.double(0)?).acos(),
            Self::CosecInverse => (1. / args.double(0)?).asin(),
            Self::CotanInverse => (1. / args.double(0)?).atan(),
            Self::DegreesToRadians => args.double(0)?.to_radians(),
            Self::RadiansToDegrees => args.double(0)?.to_degrees(),
            Self::Log => {
                if args.len() > 1 {
                    args.double(0)?.log(args.double(1)?)
                } else {
                    args.double(0)?.log10()
                }
            }
            Self::Ln => args.double(0)?.ln(),
            Self::E => args.double(0)?.exp(),
            Self::Ten => 10_f64.powf(args.double(0)?),
            Self::Power => args.double(0)?.powf(args.double(1)?),
            Self::Square => args.double(0)?.powi(2),
            Self::Cube => args.double(0)?.powi(3),
            Self::SquareRoot => args.double(0)?.sqrt(),
            Self::Root => args.double(0)?.powf(1. / args.double(1)?),
            Self::Pythagoras => args.double(0)?.hypot(args.double(1)?),
            Self::Cartesian => {
                let coordinates = (0..args.len())
                    .map(|i| args.double(i))
                    .collect::<Result<Vec<_>, _>>()?;
                let (from, to) = coordinates.split_at(coordinates.len() / 2);
                from.iter()
                    .zip(to)
                    .map(|(a, b)| (b - a).powi(2))
                    .sum::<f64>()
                    .sqrt()
            }
            Self::Reciprocal => 1. / args.double(0)?,
        };
        Ok(Some(double_term(value)))
    }
}

impl fmt::Display for LeviathanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lfn:{}", self.name())
    }
}

fn factorial(value: i64) -> Result<Numeric, QueryError> {
    if value < 0 {
        return Err(QueryError::new(format!(
            "Cannot compute the factorial of the negative number {value}"
        )));
    }
    let mut result = 1_i64;
    for i in 2..=value {
        result = result.checked_mul(i).ok_or_else(|| {
            QueryError::new(format!("Overflow while computing the factorial of {value}"))
        })?;
    }
    Ok(Numeric::Integer(result))
}

/// Builds the [`lfn:`](NAMESPACE) functions and aggregates.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeviathanFunctionFactory;

const AGGREGATES: [AggregateFunction; 7] = [
    AggregateFunction::All,
    AggregateFunction::Any,
    AggregateFunction::None,
    AggregateFunction::NumericMax,
    AggregateFunction::NumericMin,
    AggregateFunction::Mode,
    AggregateFunction::Median,
];

impl FunctionFactory for LeviathanFunctionFactory {
    fn available_functions(&self) -> Vec<NamedNode> {
        LeviathanFunction::ALL
            .into_iter()
            .map(LeviathanFunction::iri)
            .collect()
    }

    fn available_aggregates(&self) -> Vec<NamedNode> {
        AGGREGATES.into_iter().map(AggregateFunction::iri).collect()
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
            family: "Leviathan",
            name,
            arguments,
        };
        if let Some(aggregate) = AGGREGATES
            .into_iter()
            .find(|aggregate| aggregate.iri() == *function)
        {
            let (args, distinct) = site.aggregate_args(1, 1, "1")?;
            return Ok(Some(
                BuiltinAggregate::new(aggregate, args, distinct).into_expression(),
            ));
        }
        let Some(leviathan) = LeviathanFunction::from_name(name) else {
            return Ok(None);
        };
        let args = match leviathan {
            // pow(x) is x squared and root(x) its square root
            LeviathanFunction::Power | LeviathanFunction::Root => {
                let args = site.between(1, 2, "1 or 2")?;
                if args.len() == 1 {
                    let unary = if leviathan == LeviathanFunction::Power {
                        LeviathanFunction::Square
                    } else {
                        LeviathanFunction::SquareRoot
                    };
                    return Ok(Some(Expression::FunctionCall(
                        Function::Leviathan(unary),
                        args,
                    )));
                }
                args
            }
            LeviathanFunction::Cartesian => {
                let args = site.between(4, 6, "4 or 6")?;
                if args.len() == 5 {
                    return Err(site.arity_error("4 or 6"));
                }
                args
            }
            _ => {
                let (min, max, expected) = leviathan.arity();
                site.between(min, max, expected)?
            }
        };
        Ok(Some(Expression::FunctionCall(
            Function::Leviathan(leviathan),
            args,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryBinder;
    use oxrdf::Literal;

    fn call(function: LeviathanFunction, args: &[f64]) -> Result<f64, QueryError> {
        let binder = MemoryBinder::new();
        let context = EvaluationContext::new(&binder);
        let args = args.iter().map(|v| Expression::numeric(*v)).collect::<Vec<_>>();
        let value = function.evaluate(&args, &context, 0)?;
        Numeric::from_term(value.as_ref()).map(Numeric::to_double)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_numeric_functions() {
        assert_close(call(LeviathanFunction::Square, &[3.]).unwrap(), 9.);
        assert_close(call(LeviathanFunction::Cube, &[2.]).unwrap(), 8.);
        assert_close(call(LeviathanFunction::Log, &[1000.]).unwrap(), 3.);
        assert_close(call(LeviathanFunction::Log, &[8., 2.]).unwrap(), 3.);
        assert_close(call(LeviathanFunction::Root, &[27., 3.]).unwrap(), 3.);
        assert_close(call(LeviathanFunction::Pythagoras, &[3., 4.]).unwrap(), 5.);
        assert_close(call(LeviathanFunction::Cartesian, &[0., 0., 3., 4.]).unwrap(), 5.);
        assert_close(call(LeviathanFunction::Cartesian, &[1., 1., 1., 3., 3., 2.]).unwrap(), 3.);
        assert_close(call(LeviathanFunction::Reciprocal, &[4.]).unwrap(), 0.25);
        assert_close(
            call(LeviathanFunction::DegreesToRadians, &[180.]).unwrap(),
            std::f64::consts::PI,
        );
        assert_close(call(LeviathanFunction::Ten, &[2.]).unwrap(), 100.);
    }

    #[test]
    fn test_random() {
        for _ in 0..100 {
            let value = call(LeviathanFunction::Random, &[2., 3.]).unwrap();
            assert!((2. ..=3.).contains(&value));
        }
        assert!(call(LeviathanFunction::Random, &[3., 2.]).is_err());
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0).unwrap(), Numeric::Integer(1));
        assert_eq!(factorial(5).unwrap(), Numeric::Integer(120));
        assert!(factorial(-1).is_err());
        assert!(factorial(100).is_err());
    }

    #[test]
    fn test_hashes() {
        let binder = MemoryBinder::new();
        let context = EvaluationContext::new(&binder);
        let args = [Expression::from(Literal::new_simple_literal("abc"))];
        assert_eq!(
            LeviathanFunction::Sha256Hash.evaluate(&args, &context, 0).unwrap(),
            Some(
                Literal::new_simple_literal(
                    "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                )
                .into()
            )
        );
    }

    #[test]
    fn test_factory() {
        let factory = LeviathanFunctionFactory;
        let iri = |name: &str| NamedNode::new_unchecked(format!("{NAMESPACE}{name}"));
        let x = Expression::variable("x").unwrap();
        assert_eq!(
            factory
                .try_create_expression(&iri("pow"), &vec![x.clone()].into())
                .unwrap(),
            Some(Expression::FunctionCall(
                Function::Leviathan(LeviathanFunction::Square),
                vec![x.clone()]
            ))
        );
        assert!(matches!(
            factory.try_create_expression(&iri("cartesian"), &vec![x.clone(); 5].into()),
            Err(ParseError::Arity { .. })
        ));
        assert!(matches!(
            factory.try_create_expression(&iri("nmax"), &vec![x.clone()].into()),
            Ok(Some(Expression::NumericAggregate(_)))
        ));
        assert!(matches!(
            factory.try_create_expression(
                &iri("all"),
                &vec![Expression::AllModifier, x.clone()].into()
            ),
            Err(ParseError::UnexpectedModifier { .. })
        ));
        assert_eq!(
            factory
                .try_create_expression(&iri("unknown"), &vec![x].into())
                .unwrap(),
            None
        );
    }
}

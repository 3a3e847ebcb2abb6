//! Evaluation of [`Expression`] trees against a solution row.

use crate::context::{BindingId, EvaluationContext};
use crate::error::QueryError;
use crate::expression::Expression;
use crate::numeric::{Numeric, NumericType, decimal_negate, decimal_to_exact_integer};
use crate::term::{TermComparer, boolean_literal, effective_boolean_value, equality, inequality};
use oxrdf::Term;
use oxsdatatypes::Decimal;
use std::cmp::Ordering;
use std::fmt;

impl Expression {
    /// Evaluates the term value of the expression.
    ///
    /// `Ok(None)` means that the expression is an unbound variable.
    pub fn value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        match self {
            Self::Variable(variable) => Ok(context.binder().value(variable, binding_id)),
            Self::Constant(constant) => Ok(Some(constant.term().clone())),
            Self::Boolean(value) => Ok(Some(boolean_literal(*value).into())),
            Self::Numeric(value) => Ok(Some(value.to_term())),
            Self::GraphPattern(_) | Self::DistinctModifier | Self::AllModifier => {
                Err(self.not_evaluable())
            }
            Self::Or(..)
            | Self::And(..)
            | Self::Not(_)
            | Self::Equal(..)
            | Self::NotEqual(..)
            | Self::Less(..)
            | Self::LessOrEqual(..)
            | Self::Greater(..)
            | Self::GreaterOrEqual(..) => Ok(Some(
                boolean_literal(self.effective_boolean_value(context, binding_id)?).into(),
            )),
            Self::Add(..)
            | Self::Subtract(..)
            | Self::Multiply(..)
            | Self::Divide(..)
            | Self::UnaryMinus(_) => Ok(Some(self.numeric_value(context, binding_id)?.into())),
            Self::NumericWrapper(inner) => inner.value(context, binding_id),
            Self::NumericAggregate(aggregate) | Self::Aggregate(aggregate) => {
                aggregate.evaluate(context, binding_id)
            }
            Self::Cast(cast, inner) => cast.evaluate(inner.value(context, binding_id)?),
            Self::FunctionCall(function, args) => function.evaluate(args, context, binding_id),
            Self::UnknownFunction(iri, _) => Err(QueryError::new(format!(
                "The function {iri} is not supported by this engine"
            ))),
        }
    }

    /// Evaluates the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of the expression.
    pub fn effective_boolean_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<bool, QueryError> {
        match self {
            Self::Variable(variable) => {
                let Some(value) = context.binder().value(variable, binding_id) else {
                    return Err(QueryError::new(format!(
                        "Cannot evaluate the effective boolean value of the unbound variable {variable}"
                    )));
                };
                effective_boolean_value(Some(&value))
            }
            Self::Constant(constant) => Ok(constant.effective_boolean_value()),
            Self::Boolean(value) => Ok(*value),
            Self::Numeric(value) => Ok(value.value().effective_boolean_value()),
            Self::GraphPattern(_) | Self::DistinctModifier | Self::AllModifier => {
                Err(self.not_evaluable())
            }
            Self::And(left, right) => match left.effective_boolean_value(context, binding_id) {
                Ok(false) => Ok(false),
                Ok(true) => right.effective_boolean_value(context, binding_id),
                // false && error is false
                Err(error) => match right.effective_boolean_value(context, binding_id) {
                    Ok(false) => Ok(false),
                    _ => Err(error),
                },
            },
            Self::Or(left, right) => match left.effective_boolean_value(context, binding_id) {
                Ok(true) => Ok(true),
                Ok(false) => right.effective_boolean_value(context, binding_id),
                // true || error is true
                Err(error) => match right.effective_boolean_value(context, binding_id) {
                    Ok(true) => Ok(true),
                    _ => Err(error),
                },
            },
            Self::Not(inner) => Ok(!inner.effective_boolean_value(context, binding_id)?),
            Self::Equal(left, right) => equality(
                left.value(context, binding_id)?.as_ref(),
                right.value(context, binding_id)?.as_ref(),
            ),
            Self::NotEqual(left, right) => inequality(
                left.value(context, binding_id)?.as_ref(),
                right.value(context, binding_id)?.as_ref(),
            ),
            Self::Less(left, right) => {
                strict_comparison(left, right, "<", Ordering::Less, context, binding_id)
            }
            Self::Greater(left, right) => {
                strict_comparison(left, right, ">", Ordering::Greater, context, binding_id)
            }
            Self::LessOrEqual(left, right) => {
                loose_comparison(left, right, "<=", Ordering::Greater, context, binding_id)
            }
            Self::GreaterOrEqual(left, right) => {
                loose_comparison(left, right, ">=", Ordering::Less, context, binding_id)
            }
            Self::Add(..)
            | Self::Subtract(..)
            | Self::Multiply(..)
            | Self::Divide(..)
            | Self::UnaryMinus(_)
            | Self::NumericWrapper(_)
            | Self::NumericAggregate(_) => match self.numeric_value(context, binding_id) {
                Ok(value) => Ok(value.effective_boolean_value()),
                Err(_) => effective_boolean_value(self.value(context, binding_id)?.as_ref()),
            },
            Self::Aggregate(_)
            | Self::Cast(..)
            | Self::FunctionCall(..)
            | Self::UnknownFunction(..) => {
                effective_boolean_value(self.value(context, binding_id)?.as_ref())
            }
        }
    }

    /// Evaluates the expression as a number.
    ///
    /// Fails if the node is not able to produce numbers (see [`Expression::is_numeric`]) or if the value is not numeric.
    pub fn numeric_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Numeric, QueryError> {
        match self {
            Self::Numeric(value) => Ok(value.value()),
            Self::Variable(variable) => {
                let Some(value) = context.binder().value(variable, binding_id) else {
                    return Err(QueryError::new(format!(
                        "Cannot evaluate the numeric value of the unbound variable {variable}"
                    )));
                };
                Numeric::from_term(Some(&value))
            }
            Self::Add(left, right) => {
                arithmetic(ArithmeticOperator::Add, left, right, context, binding_id)
            }
            Self::Subtract(left, right) => {
                arithmetic(ArithmeticOperator::Subtract, left, right, context, binding_id)
            }
            Self::Multiply(left, right) => {
                arithmetic(ArithmeticOperator::Multiply, left, right, context, binding_id)
            }
            Self::Divide(left, right) => divide(left, right, context, binding_id),
            Self::UnaryMinus(inner) => negate(inner.numeric_value(context, binding_id)?),
            Self::NumericWrapper(inner) => {
                Numeric::from_term(inner.value(context, binding_id)?.as_ref())
            }
            _ if self.is_numeric() => Numeric::from_term(self.value(context, binding_id)?.as_ref()),
            _ => Err(QueryError::new(format!(
                "{self} is not a numeric expression"
            ))),
        }
    }

    /// The numeric kind of the value, [`NumericType::NaN`] if the value is not a number.
    pub fn numeric_type(&self, context: &EvaluationContext<'_>, binding_id: BindingId) -> NumericType {
        if let Self::Numeric(value) = self {
            return value.numeric_type();
        }
        self.numeric_value(context, binding_id)
            .map_or(NumericType::NaN, |value| value.numeric_type())
    }

    pub fn integer_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<i64, QueryError> {
        if let Self::Numeric(value) = self {
            return value.integer().ok_or_else(|| {
                QueryError::new(format!("{value} is not convertible to an integer"))
            });
        }
        self.numeric_value(context, binding_id)?.to_integer()
    }

    pub fn decimal_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Decimal, QueryError> {
        if let Self::Numeric(value) = self {
            return value.decimal().ok_or_else(|| {
                QueryError::new(format!("{value} is not convertible to a decimal"))
            });
        }
        self.numeric_value(context, binding_id)?.to_decimal()
    }

    pub fn float_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<f32, QueryError> {
        if let Self::Numeric(value) = self {
            return Ok(value.float());
        }
        Ok(self.numeric_value(context, binding_id)?.to_float())
    }

    pub fn double_value(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<f64, QueryError> {
        if let Self::Numeric(value) = self {
            return Ok(value.double());
        }
        Ok(self.numeric_value(context, binding_id)?.to_double())
    }

    fn not_evaluable(&self) -> QueryError {
        match self {
            Self::GraphPattern(_) => QueryError::new(
                "A graph pattern has no value: EXISTS is evaluated by the query engine",
            ),
            _ => QueryError::new(format!(
                "The {self} modifier has no value, it is only allowed as the first argument of an aggregate"
            )),
        }
    }
}

/// `<` and `>`: the left operand must be bound.
fn strict_comparison(
    left: &Expression,
    right: &Expression,
    operator: &str,
    expected: Ordering,
    context: &EvaluationContext<'_>,
    binding_id: BindingId,
) -> Result<bool, QueryError> {
    let a = left.value(context, binding_id)?;
    let b = right.value(context, binding_id)?;
    if a.is_none() {
        return Err(QueryError::new(format!(
            "Cannot evaluate a {operator} comparison when the left operand is unbound"
        )));
    }
    Ok(TermComparer.compare(a.as_ref(), b.as_ref())? == expected)
}

/// `<=` and `>=`: two unbound operands are equal.
fn loose_comparison(
    left: &Expression,
    right: &Expression,
    operator: &str,
    rejected: Ordering,
    context: &EvaluationContext<'_>,
    binding_id: BindingId,
) -> Result<bool, QueryError> {
    let a = left.value(context, binding_id)?;
    let b = right.value(context, binding_id)?;
    if a.is_none() {
        return if b.is_none() {
            Ok(true)
        } else {
            Err(QueryError::new(format!(
                "Cannot evaluate a {operator} comparison when the left operand is unbound"
            )))
        };
    }
    Ok(TermComparer.compare(a.as_ref(), b.as_ref())? != rejected)
}

#[derive(Clone, Copy)]
enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
        })
    }
}

/// Finds the type both operands are promoted to.
///
/// Fails before evaluating anything if one of the operands is not a numeric node.
fn promoted_type(
    operator: &dyn fmt::Display,
    left: &Expression,
    right: &Expression,
    context: &EvaluationContext<'_>,
    binding_id: BindingId,
) -> Result<NumericType, QueryError> {
    if !left.is_numeric() || !right.is_numeric() {
        return Err(QueryError::new(format!(
            "Cannot apply the {operator} operator to {left} and {right} since one of them is not a numeric expression"
        )));
    }
    let kind = left
        .numeric_type(context, binding_id)
        .promote(right.numeric_type(context, binding_id));
    if kind == NumericType::NaN {
        // Surfaces the actual coercion error
        left.numeric_value(context, binding_id)?;
        right.numeric_value(context, binding_id)?;
        return Err(QueryError::new(format!(
            "Cannot apply the {operator} operator to operands whose numeric type is unknown"
        )));
    }
    Ok(kind)
}

fn arithmetic(
    operator: ArithmeticOperator,
    left: &Expression,
    right: &Expression,
    context: &EvaluationContext<'_>,
    binding_id: BindingId,
) -> Result<Numeric, QueryError> {
    let overflow = || QueryError::new(format!("Overflow while evaluating {left} {operator} {right}"));
    Ok(
        match promoted_type(&operator, left, right, context, binding_id)? {
            NumericType::Integer => {
                let a = left.integer_value(context, binding_id)?;
                let b = right.integer_value(context, binding_id)?;
                Numeric::Integer(
                    match operator {
                        ArithmeticOperator::Add => a.checked_add(b),
                        ArithmeticOperator::Subtract => a.checked_sub(b),
                        ArithmeticOperator::Multiply => a.checked_mul(b),
                    }
                    .ok_or_else(overflow)?,
                )
            }
            NumericType::Decimal => {
                let a = left.decimal_value(context, binding_id)?;
                let b = right.decimal_value(context, binding_id)?;
                Numeric::Decimal(
                    match operator {
                        ArithmeticOperator::Add => a.checked_add(b),
                        ArithmeticOperator::Subtract => a.checked_sub(b),
                        ArithmeticOperator::Multiply => a.checked_mul(b),
                    }
                    .ok_or_else(overflow)?,
                )
            }
            NumericType::Float => {
                let a = left.float_value(context, binding_id)?;
                let b = right.float_value(context, binding_id)?;
                Numeric::Float(match operator {
                    ArithmeticOperator::Add => a + b,
                    ArithmeticOperator::Subtract => a - b,
                    ArithmeticOperator::Multiply => a * b,
                })
            }
            NumericType::Double | NumericType::NaN => {
                let a = left.double_value(context, binding_id)?;
                let b = right.double_value(context, binding_id)?;
                Numeric::Double(match operator {
                    ArithmeticOperator::Add => a + b,
                    ArithmeticOperator::Subtract => a - b,
                    ArithmeticOperator::Multiply => a * b,
                })
            }
        },
    )
}

/// Integer and decimal divisions are done with decimals, the result being narrowed back to an integer if exact.
fn divide(
    left: &Expression,
    right: &Expression,
    context: &EvaluationContext<'_>,
    binding_id: BindingId,
) -> Result<Numeric, QueryError> {
    Ok(match promoted_type(&"/", left, right, context, binding_id)? {
        NumericType::Integer | NumericType::Decimal => {
            let a = left.decimal_value(context, binding_id)?;
            let b = right.decimal_value(context, binding_id)?;
            if b == Decimal::from(0) {
                return Err(QueryError::new(
                    "Cannot evaluate a division where the divisor is zero",
                ));
            }
            let result = a.checked_div(b).ok_or_else(|| {
                QueryError::new(format!("Overflow while evaluating {left} / {right}"))
            })?;
            decimal_to_exact_integer(result).map_or(Numeric::Decimal(result), Numeric::Integer)
        }
        NumericType::Float => Numeric::Float(
            left.float_value(context, binding_id)? / right.float_value(context, binding_id)?,
        ),
        NumericType::Double | NumericType::NaN => Numeric::Double(
            left.double_value(context, binding_id)? / right.double_value(context, binding_id)?,
        ),
    })
}

/// Negation at the operand's own type.
fn negate(value: Numeric) -> Result<Numeric, QueryError> {
    Ok(match value {
        Numeric::Integer(value) => Numeric::Integer(value.checked_neg().ok_or_else(|| {
            QueryError::new(format!("Overflow while evaluating -{value}"))
        })?),
        Numeric::Decimal(value) => {
            if value == Decimal::from(0) {
                // No negative zero for decimals
                Numeric::Decimal(Decimal::from(0))
            } else {
                Numeric::Decimal(decimal_negate(value).ok_or_else(|| {
                    QueryError::new(format!("Overflow while evaluating -{value}"))
                })?)
            }
        }
        Numeric::Float(value) => Numeric::Float(if value.is_nan() {
            f32::NAN
        } else if value == f32::INFINITY {
            f32::NEG_INFINITY
        } else if value == f32::NEG_INFINITY {
            f32::INFINITY
        } else {
            -value
        }),
        Numeric::Double(value) => Numeric::Double(if value.is_nan() {
            f64::NAN
        } else if value == f64::INFINITY {
            f64::NEG_INFINITY
        } else if value == f64::NEG_INFINITY {
            f64::INFINITY
        } else {
            -value
        }),
    })
}

use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNode, Term, Variable};
use sparexpr::{
    Aggregate, Binder, BindingId, EvaluationContext, Expression, FunctionArguments,
    FunctionRegistry, MemoryBinder, QueryError, SharedAggregate,
};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Records the binder group context flag seen during the computation and then fails.
#[derive(Debug, Default)]
struct FlagRecorder {
    group_context: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl fmt::Display for FlagRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<http://example.com/recorder>()")
    }
}

impl Aggregate for FlagRecorder {
    fn functor(&self) -> Cow<'_, str> {
        "http://example.com/recorder".into()
    }

    fn arguments(&self) -> &[Expression] {
        &[]
    }

    fn apply_to_group(
        &self,
        context: &EvaluationContext<'_>,
        _: &[BindingId],
    ) -> Result<Option<Term>, QueryError> {
        self.group_context
            .store(context.binder().is_group_context(), Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(QueryError::new("recorder failure"))
    }
}

fn leviathan(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{name}", sparexpr::LEVIATHAN_NAMESPACE))
}

fn aggregate(function: NamedNode, arguments: impl IntoIterator<Item = Expression>) -> Result<Expression, Box<dyn Error>> {
    Ok(FunctionRegistry::global().create_expression(
        &function,
        &FunctionArguments::new(arguments),
        &[],
    )?)
}

/// Rows binding `?x` to the given values, plus a group of all of them.
fn binder_with_group(values: impl IntoIterator<Item = Term>) -> Result<(MemoryBinder, BindingId), Box<dyn Error>> {
    let x = Variable::new("x")?;
    let mut binder = MemoryBinder::new();
    let rows = values
        .into_iter()
        .map(|value| binder.push_row([(x.clone(), value)]))
        .collect::<Vec<_>>();
    let group = binder.push_group(rows);
    Ok((binder, group))
}

fn integer(value: i64) -> Term {
    Literal::from(value).into()
}

fn string(value: &str) -> Term {
    Literal::new_simple_literal(value).into()
}

#[test]
fn test_group_context_flag_is_set_during_group_computation() -> Result<(), Box<dyn Error>> {
    let recorder = FlagRecorder::default();
    let group_context = Arc::clone(&recorder.group_context);
    let calls = Arc::clone(&recorder.calls);
    let expression = Expression::NumericAggregate(SharedAggregate::new(recorder));
    let (binder, group) = binder_with_group([integer(1), integer(2)])?;
    let context = EvaluationContext::new(&binder);

    assert!(!binder.is_group_context());
    assert!(expression.value(&context, group).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(group_context.load(Ordering::SeqCst));
    assert!(!binder.is_group_context());

    // The same through the numeric evaluation path
    assert!(expression.numeric_value(&context, group).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(group_context.load(Ordering::SeqCst));
    assert!(!binder.is_group_context());
    Ok(())
}

#[test]
fn test_plain_row_uses_the_whole_sequence() -> Result<(), Box<dyn Error>> {
    let recorder = FlagRecorder::default();
    let group_context = Arc::clone(&recorder.group_context);
    group_context.store(true, Ordering::SeqCst);
    let expression = Expression::Aggregate(SharedAggregate::new(recorder));
    let (binder, _) = binder_with_group([integer(1)])?;
    let context = EvaluationContext::new(&binder);

    assert!(expression.value(&context, 0).is_err());
    assert!(!group_context.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_group_keys_are_only_visible_in_group_context() -> Result<(), Box<dyn Error>> {
    let (binder, group) = binder_with_group([integer(1)])?;
    let x = Variable::new("x")?;
    assert_eq!(binder.value(&x, group), None);
    binder.set_group_context(true);
    assert_eq!(binder.value(&x, group), Some(integer(1)));
    binder.set_group_context(false);
    Ok(())
}

#[test]
fn test_boolean_aggregates() -> Result<(), Box<dyn Error>> {
    let (binder, group) =
        binder_with_group([Term::from(Literal::from(true)), Literal::from(false).into()])?;
    let context = EvaluationContext::new(&binder);
    let x = || Expression::variable("x");

    assert!(!aggregate(leviathan("all"), [x()?])?.effective_boolean_value(&context, group)?);
    assert!(aggregate(leviathan("any"), [x()?])?.effective_boolean_value(&context, group)?);
    assert!(!aggregate(leviathan("none"), [x()?])?.effective_boolean_value(&context, group)?);

    let (binder, group) = binder_with_group([integer(0), string("")])?;
    let context = EvaluationContext::new(&binder);
    assert!(aggregate(leviathan("none"), [x()?])?.effective_boolean_value(&context, group)?);
    Ok(())
}

#[test]
fn test_numeric_extrema() -> Result<(), Box<dyn Error>> {
    let decimal: Term = Literal::new_typed_literal("2.5", xsd::DECIMAL).into();
    let (binder, group) = binder_with_group([integer(1), decimal.clone(), string("a"), integer(-3)])?;
    let context = EvaluationContext::new(&binder);

    let max = aggregate(leviathan("nmax"), [Expression::variable("x")?])?;
    assert!(max.is_numeric());
    assert_eq!(max.value(&context, group)?, Some(decimal));
    let min = aggregate(leviathan("nmin"), [Expression::variable("x")?])?;
    assert_eq!(min.value(&context, group)?, Some(integer(-3)));
    assert_eq!(min.integer_value(&context, group)?, -3);
    Ok(())
}

#[test]
fn test_median_and_mode() -> Result<(), Box<dyn Error>> {
    let (binder, group) = binder_with_group([integer(3), integer(1), integer(3), integer(2)])?;
    let context = EvaluationContext::new(&binder);
    let x = || Expression::variable("x");

    assert_eq!(
        aggregate(leviathan("median"), [x()?])?.value(&context, group)?,
        Some(integer(2))
    );
    assert_eq!(
        aggregate(leviathan("median"), [Expression::DistinctModifier, x()?])?.value(&context, group)?,
        Some(integer(2))
    );
    assert_eq!(
        aggregate(leviathan("mode"), [x()?])?.value(&context, group)?,
        Some(integer(3))
    );

    let empty = MemoryBinder::new();
    let context = EvaluationContext::new(&empty);
    assert_eq!(aggregate(leviathan("median"), [x()?])?.value(&context, 0)?, None);
    Ok(())
}

#[test]
fn test_string_join() -> Result<(), Box<dyn Error>> {
    let (binder, group) = binder_with_group([string("a"), string("b"), string("a")])?;
    let context = EvaluationContext::new(&binder);
    let string_join = NamedNode::new("http://www.w3.org/2005/xpath-functions#string-join")?;
    let x = || Expression::variable("x");

    assert_eq!(
        aggregate(string_join.clone(), [x()?, Literal::new_simple_literal(", ").into()])?.value(&context, group)?,
        Some(string("a, b, a"))
    );
    assert_eq!(
        aggregate(
            string_join.clone(),
            [Expression::DistinctModifier, x()?, Literal::new_simple_literal("-").into()]
        )?
        .value(&context, group)?,
        Some(string("a-b"))
    );
    assert_eq!(
        aggregate(string_join.clone(), [x()?])?.value(&context, group)?,
        Some(string("aba"))
    );

    let (binder, group) = binder_with_group([string("a"), Term::from(NamedNode::new("http://example.com")?)])?;
    let context = EvaluationContext::new(&binder);
    assert!(
        aggregate(string_join, [x()?])?
            .value(&context, group)
            .is_err()
    );
    Ok(())
}

#[test]
fn test_whole_sequence_evaluation() -> Result<(), Box<dyn Error>> {
    let x = Variable::new("x")?;
    let mut binder = MemoryBinder::new();
    for value in [4, 8, 6] {
        binder.push_row([(x.clone(), integer(value))]);
    }
    let context = EvaluationContext::new(&binder);
    let max = aggregate(leviathan("nmax"), [Expression::Variable(x)])?;
    assert_eq!(max.value(&context, 0)?, Some(integer(8)));
    assert_eq!(max.value(&context, 2)?, Some(integer(8)));
    Ok(())
}

#[test]
fn test_aggregate_modifiers() -> Result<(), Box<dyn Error>> {
    let registry = FunctionRegistry::global();
    assert!(
        registry
            .create_expression(
                &leviathan("median"),
                &FunctionArguments::new([Expression::AllModifier]),
                &[]
            )
            .is_err()
    );
    assert!(
        registry
            .create_expression(
                &leviathan("mode"),
                &FunctionArguments::new([Expression::variable("x")?, Expression::variable("y")?]),
                &[]
            )
            .is_err()
    );
    let distinct = aggregate(
        leviathan("mode"),
        [Expression::DistinctModifier, Expression::variable("x")?],
    )?;
    let Expression::Aggregate(mode) = &distinct else {
        return Err("mode should be a plain aggregate".into());
    };
    assert!(mode.is_distinct());
    assert_eq!(mode.functor(), "http://www.dotnetrdf.org/leviathan#mode");
    Ok(())
}

use oxrdf::{Literal, Variable};
use sparexpr::{
    EvaluationContext, Expression, ExpressionTransformer, MemoryBinder, PrimaryExpressionSubstituter,
    VariableSubstitution,
};
use std::error::Error;

/// Replaces `?x` by `true` and counts the visited primaries.
#[derive(Default)]
struct TrueForX {
    visited: usize,
}

impl PrimaryExpressionSubstituter for TrueForX {
    fn substitute_primary(&mut self, expression: &Expression) -> Expression {
        self.visited += 1;
        match expression {
            Expression::Variable(variable) if variable.as_str() == "x" => Expression::Boolean(true),
            _ => expression.clone(),
        }
    }
}

/// Turns additions into subtractions.
struct AddToSubtract;

impl ExpressionTransformer for AddToSubtract {
    fn transform(&mut self, expression: &Expression) -> Expression {
        if let Expression::Add(left, right) = expression {
            Expression::Subtract(Box::new(self.transform(left)), Box::new(self.transform(right)))
        } else {
            expression.transform(self)
        }
    }
}

#[test]
fn test_primary_substitution_rebuilds_composites() -> Result<(), Box<dyn Error>> {
    let original = Expression::and(
        Expression::variable("x")?,
        Expression::not(Expression::variable("y")?),
    );
    let mut substituter = TrueForX::default();
    let transformed = substituter.transform(&original);

    assert_eq!(
        transformed,
        Expression::and(
            Expression::Boolean(true),
            Expression::not(Expression::variable("y")?)
        )
    );
    assert_eq!(substituter.visited, 2);
    // The input is left untouched
    assert_eq!(
        original,
        Expression::and(
            Expression::variable("x")?,
            Expression::not(Expression::variable("y")?)
        )
    );
    Ok(())
}

#[test]
fn test_transformer_recursion() -> Result<(), Box<dyn Error>> {
    let expression = Expression::Multiply(
        Box::new(Expression::Add(
            Box::new(Expression::numeric(5)),
            Box::new(Expression::numeric(3)),
        )),
        Box::new(Expression::Add(
            Box::new(Expression::numeric(1)),
            Box::new(Expression::numeric(1)),
        )),
    );
    let transformed = AddToSubtract.transform(&expression);
    assert_eq!(transformed.functor(), "*");
    assert!(
        transformed
            .arguments()
            .iter()
            .all(|argument| argument.functor() == "-")
    );

    let binder = MemoryBinder::new();
    let context = EvaluationContext::new(&binder);
    assert_eq!(transformed.integer_value(&context, 0)?, 0);
    assert_eq!(expression.integer_value(&context, 0)?, 16);
    Ok(())
}

#[test]
fn test_variable_substitution() -> Result<(), Box<dyn Error>> {
    let x = Variable::new("x")?;
    let y = Variable::new("y")?;
    let mut substitution = VariableSubstitution::default();
    assert!(substitution.is_empty());
    assert_eq!(substitution.insert_term(x.clone(), Literal::from(2)), None);
    assert!(
        substitution
            .insert(y.clone(), Expression::Variable(Variable::new("z")?))
            .is_none()
    );
    assert_eq!(substitution.len(), 2);

    let expression = Expression::Less(
        Box::new(Expression::Variable(x.clone())),
        Box::new(Expression::Variable(y)),
    );
    let transformed = substitution.transform(&expression);
    assert_eq!(
        transformed,
        Expression::Less(
            Box::new(Expression::constant(Literal::from(2))),
            Box::new(Expression::variable("z")?)
        )
    );

    let mut binder = MemoryBinder::new();
    let row = binder.push_row([(Variable::new("z")?, Literal::from(3).into())]);
    let context = EvaluationContext::new(&binder);
    assert!(transformed.effective_boolean_value(&context, row)?);
    // ?x is unbound in the row
    assert!(expression.effective_boolean_value(&context, row).is_err());

    // The last insertion wins
    assert!(substitution.insert_term(x, Literal::from(5)).is_some());
    assert_eq!(substitution.len(), 2);
    assert!(!substitution.transform(&expression).effective_boolean_value(&context, row)?);
    Ok(())
}

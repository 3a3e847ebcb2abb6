//! Rewriting of expression trees.

use crate::expression::{Expression, ExpressionType};
use oxrdf::{Term, Variable};
use rustc_hash::FxHashMap;

/// Rewrites an expression tree node by node.
///
/// Implementations usually call [`Expression::transform`] on the nodes they do not rewrite themselves
/// so that the rewrite recurses into the children.
pub trait ExpressionTransformer {
    fn transform(&mut self, expression: &Expression) -> Expression;
}

/// A transformer that only rewrites the primary nodes (variables, constants...).
///
/// Composite nodes are rebuilt around the substituted leaves.
pub trait PrimaryExpressionSubstituter {
    fn substitute_primary(&mut self, expression: &Expression) -> Expression;
}

impl<T: PrimaryExpressionSubstituter + ?Sized> ExpressionTransformer for T {
    fn transform(&mut self, expression: &Expression) -> Expression {
        if expression.expression_type() == ExpressionType::Primary {
            self.substitute_primary(expression)
        } else {
            expression.transform(self)
        }
    }
}

/// Replaces variables with expressions.
///
/// ```
/// use oxrdf::{Literal, Variable};
/// use sparexpr::{Expression, ExpressionTransformer, VariableSubstitution};
///
/// let mut substitution = VariableSubstitution::default();
/// substitution.insert_term(Variable::new("x")?, Literal::from(1));
/// let expression = Expression::and(Expression::variable("x")?, Expression::variable("y")?);
/// assert_eq!(
///     substitution.transform(&expression).to_string(),
///     "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer> && ?y"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableSubstitution {
    substitutions: FxHashMap<Variable, Expression>,
}

impl VariableSubstitution {
    pub fn insert(&mut self, variable: Variable, expression: Expression) -> Option<Expression> {
        self.substitutions.insert(variable, expression)
    }

    /// Replaces the variable with a constant.
    pub fn insert_term(&mut self, variable: Variable, term: impl Into<Term>) -> Option<Expression> {
        self.insert(variable, Expression::constant(term))
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

impl PrimaryExpressionSubstituter for VariableSubstitution {
    fn substitute_primary(&mut self, expression: &Expression) -> Expression {
        if let Expression::Variable(variable) = expression {
            if let Some(substitution) = self.substitutions.get(variable) {
                return substitution.clone();
            }
        }
        expression.clone()
    }
}

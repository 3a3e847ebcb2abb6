use crate::context::{BindingId, EvaluationContext, GroupContextGuard};
use crate::error::QueryError;
use crate::expression::{Expression, write_arg_list};
use crate::numeric::Numeric;
use crate::term::{TermComparer, boolean_literal, numeric_cmp};
use oxrdf::{Literal, NamedNode, Term};
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::trace;

/// An aggregate computation embedded in an expression tree.
///
/// Implementations only compute values: the switch between whole solution sequence and `GROUP BY` group evaluation
/// is done by the [`Expression::Aggregate`] and [`Expression::NumericAggregate`] nodes.
pub trait Aggregate: fmt::Debug + fmt::Display + Send + Sync {
    /// The name or IRI of the aggregate.
    fn functor(&self) -> Cow<'_, str>;

    fn arguments(&self) -> &[Expression];

    /// The expression the aggregate is computed over.
    fn expression(&self) -> Option<&Expression> {
        self.arguments().first()
    }

    fn is_distinct(&self) -> bool {
        false
    }

    /// Computes the aggregate over the whole solution sequence.
    fn apply(&self, context: &EvaluationContext<'_>) -> Result<Option<Term>, QueryError> {
        self.apply_to_group(context, &context.binder().binding_ids())
    }

    /// Computes the aggregate over the given rows.
    fn apply_to_group(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> Result<Option<Term>, QueryError>;
}

/// A shared reference to an [`Aggregate`].
#[derive(Clone)]
pub struct SharedAggregate(Arc<dyn Aggregate>);

impl SharedAggregate {
    pub fn new(aggregate: impl Aggregate + 'static) -> Self {
        Self(Arc::new(aggregate))
    }

    /// Evaluates the aggregate for the given row.
    ///
    /// If the row is a group, the aggregate is computed over the group members with the binder group context flag
    /// set during the computation.
    pub(crate) fn evaluate(
        &self,
        context: &EvaluationContext<'_>,
        binding_id: BindingId,
    ) -> Result<Option<Term>, QueryError> {
        let binder = context.binder();
        if binder.is_group(binding_id) {
            let members = binder.group_members(binding_id).unwrap_or_default();
            trace!(
                aggregate = %self.0,
                group = binding_id,
                members = members.len(),
                "Computing aggregate over a group"
            );
            let _guard = GroupContextGuard::enter(binder);
            self.0.apply_to_group(context, &members)
        } else {
            self.0.apply(context)
        }
    }
}

impl From<Arc<dyn Aggregate>> for SharedAggregate {
    #[inline]
    fn from(aggregate: Arc<dyn Aggregate>) -> Self {
        Self(aggregate)
    }
}

impl Deref for SharedAggregate {
    type Target = dyn Aggregate;

    #[inline]
    fn deref(&self) -> &(dyn Aggregate + 'static) {
        &*self.0
    }
}

impl PartialEq for SharedAggregate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.functor() == other.0.functor()
                && self.0.is_distinct() == other.0.is_distinct()
                && self.0.arguments() == other.0.arguments())
    }
}

impl fmt::Debug for SharedAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// The aggregates provided by the built-in function factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// `lfn:all`: all the rows have a true effective boolean value
    All,
    /// `lfn:any`: a row has a true effective boolean value
    Any,
    /// `lfn:none`: no row has a true effective boolean value
    None,
    /// `lfn:nmax`
    NumericMax,
    /// `lfn:nmin`
    NumericMin,
    /// `lfn:mode`: the most frequent value
    Mode,
    /// `lfn:median`
    Median,
    /// `fn:string-join`
    StringJoin,
}

impl AggregateFunction {
    pub fn iri(self) -> NamedNode {
        let (namespace, name) = match self {
            Self::All => (crate::leviathan::NAMESPACE, "all"),
            Self::Any => (crate::leviathan::NAMESPACE, "any"),
            Self::None => (crate::leviathan::NAMESPACE, "none"),
            Self::NumericMax => (crate::leviathan::NAMESPACE, "nmax"),
            Self::NumericMin => (crate::leviathan::NAMESPACE, "nmin"),
            Self::Mode => (crate::leviathan::NAMESPACE, "mode"),
            Self::Median => (crate::leviathan::NAMESPACE, "median"),
            Self::StringJoin => (crate::xpath::NAMESPACE, "string-join"),
        };
        NamedNode::new_unchecked(format!("{namespace}{name}"))
    }

    /// If the aggregate always returns a number.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::NumericMax | Self::NumericMin)
    }
}

/// An aggregate computed by [`AggregateFunction`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinAggregate {
    function: AggregateFunction,
    arguments: Vec<Expression>,
    distinct: bool,
}

impl BuiltinAggregate {
    pub fn new(function: AggregateFunction, arguments: Vec<Expression>, distinct: bool) -> Self {
        Self {
            function,
            arguments,
            distinct,
        }
    }

    #[inline]
    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    /// Wraps the aggregate into the expression node matching its result type.
    pub fn into_expression(self) -> Expression {
        if self.function.is_numeric() {
            Expression::NumericAggregate(SharedAggregate::new(self))
        } else {
            Expression::Aggregate(SharedAggregate::new(self))
        }
    }

    /// The bound values of the first argument, without duplicates if `DISTINCT`.
    ///
    /// Rows where the argument fails to evaluate are skipped.
    fn values(&self, context: &EvaluationContext<'_>, binding_ids: &[BindingId]) -> Vec<Term> {
        let Some(expression) = self.arguments.first() else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        let mut values = Vec::new();
        for binding_id in binding_ids {
            let Ok(Some(value)) = expression.value(context, *binding_id) else {
                continue;
            };
            if !self.distinct || seen.insert(value.clone()) {
                values.push(value);
            }
        }
        values
    }

    fn count_true(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> (usize, usize) {
        let Some(expression) = self.arguments.first() else {
            return (0, 0);
        };
        let matching = binding_ids
            .iter()
            .filter(|id| {
                expression
                    .effective_boolean_value(context, **id)
                    .unwrap_or(false)
            })
            .count();
        (matching, binding_ids.len())
    }

    fn numeric_extremum(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
        wanted: Ordering,
    ) -> Result<Option<Term>, QueryError> {
        let mut best: Option<(Numeric, Term)> = None;
        for value in self.values(context, binding_ids) {
            // Non numeric values are ignored
            let Ok(number) = Numeric::from_term(Some(&value)) else {
                continue;
            };
            let replace = match &best {
                Some((current, _)) => numeric_cmp(number, *current)? == Some(wanted),
                None => true,
            };
            if replace {
                best = Some((number, value));
            }
        }
        Ok(best.map(|(_, value)| value))
    }

    fn mode(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> Result<Option<Term>, QueryError> {
        let values = self.values(context, binding_ids);
        let mut counts = FxHashMap::<&Term, usize>::default();
        for value in &values {
            *counts.entry(value).or_default() += 1;
        }
        let mut best: Option<(&Term, usize)> = None;
        for value in &values {
            let count = counts.get(value).copied().unwrap_or_default();
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        Ok(best.map(|(value, _)| value.clone()))
    }

    fn median(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> Result<Option<Term>, QueryError> {
        let mut values = self.values(context, binding_ids);
        let mut error = None;
        values.sort_by(|a, b| {
            TermComparer
                .compare(Some(a), Some(b))
                .unwrap_or_else(|e| {
                    error.get_or_insert(e);
                    Ordering::Equal
                })
        });
        if let Some(error) = error {
            return Err(error);
        }
        if values.is_empty() {
            return Ok(None);
        }
        let middle = (values.len() - 1) / 2;
        Ok(Some(values.swap_remove(middle)))
    }

    fn string_join(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> Result<Option<Term>, QueryError> {
        let separator = match (self.arguments.get(1), binding_ids.first()) {
            (Some(separator), Some(binding_id)) => match separator.value(context, *binding_id)? {
                Some(Term::Literal(separator)) => separator.value().to_owned(),
                Some(separator) => {
                    return Err(QueryError::new(format!(
                        "The string-join separator must be a literal, found {separator}"
                    )));
                }
                None => String::new(),
            },
            _ => String::new(),
        };
        let mut result = String::new();
        for (i, value) in self.values(context, binding_ids).into_iter().enumerate() {
            let Term::Literal(value) = value else {
                return Err(QueryError::new(format!(
                    "string-join is only able to join literals, found {value}"
                )));
            };
            if i > 0 {
                result.push_str(&separator);
            }
            result.push_str(value.value());
        }
        Ok(Some(Literal::new_simple_literal(result).into()))
    }
}

impl Aggregate for BuiltinAggregate {
    fn functor(&self) -> Cow<'_, str> {
        self.function.iri().into_string().into()
    }

    fn arguments(&self) -> &[Expression] {
        &self.arguments
    }

    fn is_distinct(&self) -> bool {
        self.distinct
    }

    fn apply_to_group(
        &self,
        context: &EvaluationContext<'_>,
        binding_ids: &[BindingId],
    ) -> Result<Option<Term>, QueryError> {
        match self.function {
            AggregateFunction::All => {
                let (matching, total) = self.count_true(context, binding_ids);
                Ok(Some(boolean_literal(matching == total).into()))
            }
            AggregateFunction::Any => {
                let (matching, _) = self.count_true(context, binding_ids);
                Ok(Some(boolean_literal(matching > 0).into()))
            }
            AggregateFunction::None => {
                let (matching, _) = self.count_true(context, binding_ids);
                Ok(Some(boolean_literal(matching == 0).into()))
            }
            AggregateFunction::NumericMax => {
                self.numeric_extremum(context, binding_ids, Ordering::Greater)
            }
            AggregateFunction::NumericMin => {
                self.numeric_extremum(context, binding_ids, Ordering::Less)
            }
            AggregateFunction::Mode => self.mode(context, binding_ids),
            AggregateFunction::Median => self.median(context, binding_ids),
            AggregateFunction::StringJoin => self.string_join(context, binding_ids),
        }
    }
}

impl fmt::Display for BuiltinAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function.iri())?;
        if self.distinct {
            f.write_str("(DISTINCT ")?;
            let mut args = self.arguments.iter();
            if let Some(first) = args.next() {
                fmt::Display::fmt(first, f)?;
            }
            for arg in args {
                write!(f, ", {arg}")?;
            }
            f.write_str(")")
        } else {
            write_arg_list(&self.arguments, f)
        }
    }
}

#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod aggregate;
mod arq;
mod cast;
mod context;
mod error;
mod eval;
mod expression;
mod factory;
mod function;
mod leviathan;
mod numeric;
mod options;
mod registry;
mod term;
mod transform;
mod xpath;

pub use crate::aggregate::{Aggregate, AggregateFunction, BuiltinAggregate, SharedAggregate};
pub use crate::arq::{ArqFunction, ArqFunctionFactory, NAMESPACE as ARQ_NAMESPACE};
pub use crate::cast::CastFunction;
pub use crate::context::{Binder, BindingId, EvaluationContext, MemoryBinder};
pub use crate::error::{ParseError, QueryError};
pub use crate::expression::{ConstantTerm, Expression, ExpressionType, NumericConstant};
pub use crate::factory::{ArgumentModifier, FunctionArguments, FunctionFactory};
pub use crate::function::{CustomFunction, Function};
pub use crate::leviathan::{
    LeviathanFunction, LeviathanFunctionFactory, NAMESPACE as LEVIATHAN_NAMESPACE,
};
pub use crate::numeric::{Numeric, NumericType};
pub use crate::options::ExpressionOptions;
pub use crate::registry::FunctionRegistry;
pub use crate::term::{TermComparer, effective_boolean_value, equality, inequality, numeric_cmp};
pub use crate::transform::{ExpressionTransformer, PrimaryExpressionSubstituter, VariableSubstitution};
pub use crate::xpath::{NAMESPACE as XPATH_NAMESPACE, XPathFunction, XPathFunctionFactory};

use crate::aggregate::SharedAggregate;
use crate::cast::CastFunction;
use crate::error::ParseError;
use crate::function::Function;
use crate::numeric::{Numeric, NumericType};
use crate::term::{LiteralKind, effective_boolean_value};
use crate::transform::ExpressionTransformer;
use oxrdf::{Literal, NamedNode, Term, Variable};
use oxsdatatypes::Decimal;
use spargebra::algebra::GraphPattern;
use std::fmt;

/// A SPARQL expression tree.
///
/// Nodes are immutable: [`Expression::transform`] builds a new tree.
/// Trees are [`Send`] and [`Sync`] so a single tree can be evaluated against many rows from many threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A variable, without its `?` or `$` sigil
    Variable(Variable),
    /// A fixed RDF term
    Constant(ConstantTerm),
    /// A fixed boolean
    Boolean(bool),
    /// A fixed number
    Numeric(NumericConstant),
    /// The graph pattern of an `EXISTS` or `NOT EXISTS`, evaluated by the query engine
    GraphPattern(Box<GraphPattern>),
    /// The `DISTINCT` marker of an aggregate call
    DistinctModifier,
    /// The `*` marker of an aggregate call
    AllModifier,
    /// [Logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or).
    Or(Box<Self>, Box<Self>),
    /// [Logical-and](https://www.w3.org/TR/sparql11-query/#func-logical-and).
    And(Box<Self>, Box<Self>),
    /// [fn:not](https://www.w3.org/TR/xpath-functions-31/#func-not).
    Not(Box<Self>),
    /// [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) and all the XSD equalities.
    Equal(Box<Self>, Box<Self>),
    NotEqual(Box<Self>, Box<Self>),
    Less(Box<Self>, Box<Self>),
    LessOrEqual(Box<Self>, Box<Self>),
    Greater(Box<Self>, Box<Self>),
    GreaterOrEqual(Box<Self>, Box<Self>),
    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add).
    Add(Box<Self>, Box<Self>),
    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract).
    Subtract(Box<Self>, Box<Self>),
    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply).
    Multiply(Box<Self>, Box<Self>),
    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide).
    Divide(Box<Self>, Box<Self>),
    /// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus).
    UnaryMinus(Box<Self>),
    /// Reads the value of any expression as a number
    NumericWrapper(Box<Self>),
    /// An aggregate whose result is a number
    NumericAggregate(SharedAggregate),
    /// An aggregate with an arbitrary result
    Aggregate(SharedAggregate),
    /// An XSD cast like `xsd:integer(?x)`
    Cast(CastFunction, Box<Self>),
    /// A call to a function built by a [`FunctionFactory`](crate::FunctionFactory)
    FunctionCall(Function, Vec<Self>),
    /// A call to a function nothing is able to evaluate
    UnknownFunction(NamedNode, Vec<Self>),
}

/// The structural category of an [`Expression`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    Primary,
    UnaryOperator,
    BinaryOperator,
    Function,
    Aggregate,
    SetOperator,
    GraphOperator,
}

impl Expression {
    /// Builds a variable reference, stripping the `?` or `$` sigil if present.
    pub fn variable(name: &str) -> Result<Self, ParseError> {
        let name = name
            .strip_prefix('?')
            .or_else(|| name.strip_prefix('$'))
            .unwrap_or(name);
        Ok(Self::Variable(Variable::new(name)?))
    }

    #[inline]
    pub fn constant(term: impl Into<Term>) -> Self {
        Self::Constant(ConstantTerm::new(term))
    }

    #[inline]
    pub fn numeric(value: impl Into<Numeric>) -> Self {
        Self::Numeric(NumericConstant::new(value))
    }

    #[inline]
    pub fn graph_pattern(pattern: GraphPattern) -> Self {
        Self::GraphPattern(Box::new(pattern))
    }

    #[inline]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    #[inline]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    #[inline]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    #[inline]
    pub fn unary_minus(inner: Self) -> Self {
        Self::UnaryMinus(Box::new(inner))
    }

    #[inline]
    pub fn numeric_wrapper(inner: Self) -> Self {
        Self::NumericWrapper(Box::new(inner))
    }

    /// The structural category of this node.
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Self::Variable(_)
            | Self::Constant(_)
            | Self::Boolean(_)
            | Self::Numeric(_)
            | Self::GraphPattern(_)
            | Self::DistinctModifier
            | Self::AllModifier => ExpressionType::Primary,
            Self::Not(_) | Self::UnaryMinus(_) | Self::NumericWrapper(_) => {
                ExpressionType::UnaryOperator
            }
            Self::Or(..)
            | Self::And(..)
            | Self::Equal(..)
            | Self::NotEqual(..)
            | Self::Less(..)
            | Self::LessOrEqual(..)
            | Self::Greater(..)
            | Self::GreaterOrEqual(..)
            | Self::Add(..)
            | Self::Subtract(..)
            | Self::Multiply(..)
            | Self::Divide(..) => ExpressionType::BinaryOperator,
            Self::NumericAggregate(_) | Self::Aggregate(_) => ExpressionType::Aggregate,
            Self::Cast(..) | Self::FunctionCall(..) | Self::UnknownFunction(..) => {
                ExpressionType::Function
            }
        }
    }

    /// The operator symbol or the function IRI of this node. Empty for primaries.
    pub fn functor(&self) -> String {
        match self {
            Self::Variable(_)
            | Self::Constant(_)
            | Self::Boolean(_)
            | Self::Numeric(_)
            | Self::GraphPattern(_)
            | Self::DistinctModifier
            | Self::AllModifier => String::new(),
            Self::Or(..) => "||".into(),
            Self::And(..) => "&&".into(),
            Self::Not(_) => "!".into(),
            Self::Equal(..) => "=".into(),
            Self::NotEqual(..) => "!=".into(),
            Self::Less(..) => "<".into(),
            Self::LessOrEqual(..) => "<=".into(),
            Self::Greater(..) => ">".into(),
            Self::GreaterOrEqual(..) => ">=".into(),
            Self::Add(..) => "+".into(),
            Self::Subtract(..) | Self::UnaryMinus(_) => "-".into(),
            Self::Multiply(..) => "*".into(),
            Self::Divide(..) => "/".into(),
            Self::NumericWrapper(inner) => inner.functor(),
            Self::NumericAggregate(aggregate) | Self::Aggregate(aggregate) => {
                aggregate.functor().into_owned()
            }
            Self::Cast(cast, _) => cast.datatype().as_str().into(),
            Self::FunctionCall(function, _) => function.iri().into_string(),
            Self::UnknownFunction(iri, _) => iri.as_str().into(),
        }
    }

    /// The direct children of this node, in evaluation order.
    ///
    /// Aggregates own their arguments and expose them through [`Aggregate::arguments`](crate::Aggregate::arguments).
    pub fn arguments(&self) -> Vec<&Self> {
        match self {
            Self::Variable(_)
            | Self::Constant(_)
            | Self::Boolean(_)
            | Self::Numeric(_)
            | Self::GraphPattern(_)
            | Self::DistinctModifier
            | Self::AllModifier
            | Self::NumericAggregate(_)
            | Self::Aggregate(_) => Vec::new(),
            Self::Not(inner)
            | Self::UnaryMinus(inner)
            | Self::NumericWrapper(inner)
            | Self::Cast(_, inner) => vec![inner],
            Self::Or(a, b)
            | Self::And(a, b)
            | Self::Equal(a, b)
            | Self::NotEqual(a, b)
            | Self::Less(a, b)
            | Self::LessOrEqual(a, b)
            | Self::Greater(a, b)
            | Self::GreaterOrEqual(a, b)
            | Self::Add(a, b)
            | Self::Subtract(a, b)
            | Self::Multiply(a, b)
            | Self::Divide(a, b) => vec![a, b],
            Self::FunctionCall(_, args) | Self::UnknownFunction(_, args) => args.iter().collect(),
        }
    }

    /// The variables used in this tree, including the ones of nested aggregates and graph patterns.
    ///
    /// A variable used twice is returned twice.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut variables = Vec::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables<'a>(&'a self, variables: &mut Vec<&'a Variable>) {
        match self {
            Self::Variable(variable) => variables.push(variable),
            Self::GraphPattern(pattern) => pattern.on_in_scope_variable(|v| variables.push(v)),
            Self::NumericAggregate(aggregate) | Self::Aggregate(aggregate) => {
                for arg in aggregate.arguments() {
                    arg.collect_variables(variables);
                }
            }
            _ => {
                for child in self.arguments() {
                    child.collect_variables(variables);
                }
            }
        }
    }

    /// If the node is able to produce a number.
    ///
    /// This is a structural property checked by the arithmetic operators before evaluating anything.
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Variable(_)
            | Self::Numeric(_)
            | Self::Add(..)
            | Self::Subtract(..)
            | Self::Multiply(..)
            | Self::Divide(..)
            | Self::UnaryMinus(_)
            | Self::NumericWrapper(_)
            | Self::NumericAggregate(_) => true,
            Self::Constant(constant) => constant.is_numeric(),
            Self::Cast(cast, _) => cast.is_numeric(),
            Self::FunctionCall(function, _) => function.is_numeric(),
            _ => false,
        }
    }

    /// Rebuilds this node with each child replaced by `transformer.transform(child)`.
    ///
    /// Primaries and aggregates are returned unchanged.
    #[must_use]
    pub fn transform<T: ExpressionTransformer + ?Sized>(&self, transformer: &mut T) -> Self {
        let mut t = |e: &Self| Box::new(transformer.transform(e));
        match self {
            Self::Variable(_)
            | Self::Constant(_)
            | Self::Boolean(_)
            | Self::Numeric(_)
            | Self::GraphPattern(_)
            | Self::DistinctModifier
            | Self::AllModifier
            | Self::NumericAggregate(_)
            | Self::Aggregate(_) => self.clone(),
            Self::Or(a, b) => Self::Or(t(a), t(b)),
            Self::And(a, b) => Self::And(t(a), t(b)),
            Self::Not(inner) => Self::Not(t(inner)),
            Self::Equal(a, b) => Self::Equal(t(a), t(b)),
            Self::NotEqual(a, b) => Self::NotEqual(t(a), t(b)),
            Self::Less(a, b) => Self::Less(t(a), t(b)),
            Self::LessOrEqual(a, b) => Self::LessOrEqual(t(a), t(b)),
            Self::Greater(a, b) => Self::Greater(t(a), t(b)),
            Self::GreaterOrEqual(a, b) => Self::GreaterOrEqual(t(a), t(b)),
            Self::Add(a, b) => Self::Add(t(a), t(b)),
            Self::Subtract(a, b) => Self::Subtract(t(a), t(b)),
            Self::Multiply(a, b) => Self::Multiply(t(a), t(b)),
            Self::Divide(a, b) => Self::Divide(t(a), t(b)),
            Self::UnaryMinus(inner) => Self::UnaryMinus(t(inner)),
            Self::NumericWrapper(inner) => Self::NumericWrapper(t(inner)),
            Self::Cast(cast, inner) => Self::Cast(*cast, t(inner)),
            Self::FunctionCall(function, args) => {
                Self::FunctionCall(function.clone(), args.iter().map(|a| *t(a)).collect())
            }
            Self::UnknownFunction(iri, args) => {
                Self::UnknownFunction(iri.clone(), args.iter().map(|a| *t(a)).collect())
            }
        }
    }
}

impl From<Variable> for Expression {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<bool> for Expression {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Literal> for Expression {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::constant(literal)
    }
}

impl From<NamedNode> for Expression {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::constant(node)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => fmt::Display::fmt(variable, f),
            Self::Constant(constant) => fmt::Display::fmt(constant.term(), f),
            Self::Boolean(value) => fmt::Display::fmt(value, f),
            Self::Numeric(value) => fmt::Display::fmt(value, f),
            Self::GraphPattern(pattern) => write!(f, "{{ {pattern} }}"),
            Self::DistinctModifier => f.write_str("DISTINCT"),
            Self::AllModifier => f.write_str("*"),
            Self::Or(a, b) => write_binary(f, a, "||", b),
            Self::And(a, b) => write_binary(f, a, "&&", b),
            Self::Equal(a, b) => write_binary(f, a, "=", b),
            Self::NotEqual(a, b) => write_binary(f, a, "!=", b),
            Self::Less(a, b) => write_binary(f, a, "<", b),
            Self::LessOrEqual(a, b) => write_binary(f, a, "<=", b),
            Self::Greater(a, b) => write_binary(f, a, ">", b),
            Self::GreaterOrEqual(a, b) => write_binary(f, a, ">=", b),
            Self::Add(a, b) => write_binary(f, a, "+", b),
            Self::Subtract(a, b) => write_binary(f, a, "-", b),
            Self::Multiply(a, b) => write_binary(f, a, "*", b),
            Self::Divide(a, b) => write_binary(f, a, "/", b),
            Self::Not(inner) => write!(f, "!{}", Operand(inner)),
            Self::UnaryMinus(inner) => write!(f, "-{}", Operand(inner)),
            Self::NumericWrapper(inner) => fmt::Display::fmt(inner, f),
            Self::NumericAggregate(aggregate) | Self::Aggregate(aggregate) => fmt::Display::fmt(aggregate, f),
            Self::Cast(cast, inner) => write!(f, "<{}>({inner})", cast.datatype().as_str()),
            Self::FunctionCall(function, args) => {
                write!(f, "{}", function.iri())?;
                write_arg_list(args, f)
            }
            Self::UnknownFunction(iri, args) => {
                write!(f, "{iri}")?;
                write_arg_list(args, f)
            }
        }
    }
}

/// Parenthesizes binary operator children.
struct Operand<'a>(&'a Expression);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.expression_type() == ExpressionType::BinaryOperator {
            write!(f, "({})", self.0)
        } else {
            fmt::Display::fmt(self.0, f)
        }
    }
}

fn write_binary(
    f: &mut fmt::Formatter<'_>,
    left: &Expression,
    operator: &str,
    right: &Expression,
) -> fmt::Result {
    write!(f, "{} {operator} {}", Operand(left), Operand(right))
}

pub(crate) fn write_arg_list(
    params: impl IntoIterator<Item = impl fmt::Display>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.write_str("(")?;
    let mut cont = false;
    for p in params {
        if cont {
            f.write_str(", ")?;
        }
        p.fmt(f)?;
        cont = true;
    }
    f.write_str(")")
}

/// A fixed term with its effective boolean value computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantTerm {
    term: Term,
    effective_boolean_value: bool,
    numeric: bool,
}

impl ConstantTerm {
    /// Wraps a term. Terms without a valid effective boolean value get `false`.
    pub fn new(term: impl Into<Term>) -> Self {
        let term = term.into();
        let effective_boolean_value = effective_boolean_value(Some(&term)).unwrap_or(false);
        let numeric = matches!(&term, Term::Literal(literal) if matches!(LiteralKind::of(literal), LiteralKind::Numeric(_)));
        Self {
            term,
            effective_boolean_value,
            numeric,
        }
    }

    #[inline]
    pub fn term(&self) -> &Term {
        &self.term
    }

    #[inline]
    pub fn effective_boolean_value(&self) -> bool {
        self.effective_boolean_value
    }

    /// If the term is a literal with a numeric datatype.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

/// A fixed number with its four projections computed once.
///
/// Projections that can't represent the value, like the integer projection of NaN, are errors when read.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericConstant {
    value: Numeric,
    integer: Option<i64>,
    decimal: Option<Decimal>,
    float: f32,
    double: f64,
}

impl NumericConstant {
    pub fn new(value: impl Into<Numeric>) -> Self {
        let value = value.into();
        Self {
            value,
            integer: value.to_integer().ok(),
            decimal: value.to_decimal().ok(),
            float: value.to_float(),
            double: value.to_double(),
        }
    }

    #[inline]
    pub fn value(&self) -> Numeric {
        self.value
    }

    #[inline]
    pub fn numeric_type(&self) -> NumericType {
        self.value.numeric_type()
    }

    #[inline]
    pub fn integer(&self) -> Option<i64> {
        self.integer
    }

    #[inline]
    pub fn decimal(&self) -> Option<Decimal> {
        self.decimal
    }

    #[inline]
    pub fn float(&self) -> f32 {
        self.float
    }

    #[inline]
    pub fn double(&self) -> f64 {
        self.double
    }

    pub fn to_term(&self) -> Term {
        self.value.into()
    }
}

impl fmt::Display for NumericConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value.into_literal(), f)
    }
}

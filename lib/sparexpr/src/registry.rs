use crate::arq::ArqFunctionFactory;
use crate::cast::CastFunction;
use crate::error::ParseError;
use crate::expression::Expression;
use crate::factory::{FunctionArguments, FunctionFactory};
use crate::leviathan::LeviathanFunctionFactory;
use crate::options::ExpressionOptions;
use crate::xpath::XPathFunctionFactory;
use oxrdf::NamedNode;
use std::any::TypeId;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

/// The set of [`FunctionFactory`] used to turn function calls into expression nodes.
///
/// Factories are consulted in registration order and at most one factory of each type is registered.
///
/// ```
/// use oxrdf::NamedNode;
/// use sparexpr::{Expression, FunctionArguments, FunctionRegistry};
///
/// let registry = FunctionRegistry::new();
/// let expression = registry.create_expression(
///     &NamedNode::new("http://www.w3.org/2005/xpath-functions#upper-case")?,
///     &FunctionArguments::new([Expression::variable("name")?]),
///     &[],
/// )?;
/// assert_eq!(
///     expression.to_string(),
///     "<http://www.w3.org/2005/xpath-functions#upper-case>(?name)"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct FunctionRegistry {
    factories: RwLock<Vec<(TypeId, Arc<dyn FunctionFactory>)>>,
    options: ExpressionOptions,
}

impl FunctionRegistry {
    /// A registry with the XPath, Leviathan and ARQ factories.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.add_factory(XPathFunctionFactory);
        registry.add_factory(LeviathanFunctionFactory);
        registry.add_factory(ArqFunctionFactory);
        registry
    }

    /// A registry without any factory: only casts are resolved.
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
            options: ExpressionOptions::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: ExpressionOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &ExpressionOptions {
        &self.options
    }

    /// The registry shared by the whole process, seeded like [`FunctionRegistry::new`].
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<FunctionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers a factory after the existing ones.
    ///
    /// Returns `false` and does nothing if a factory of the same type is already registered.
    pub fn add_factory<F: FunctionFactory>(&self, factory: F) -> bool {
        let type_id = TypeId::of::<F>();
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if factories.iter().any(|(id, _)| *id == type_id) {
            debug!(
                factory = std::any::type_name::<F>(),
                "Function factory already registered"
            );
            return false;
        }
        factories.push((type_id, Arc::new(factory)));
        debug!(
            factory = std::any::type_name::<F>(),
            count = factories.len(),
            "Function factory registered"
        );
        true
    }

    /// The registered factories in consultation order.
    pub fn factories(&self) -> Vec<Arc<dyn FunctionFactory>> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, factory)| Arc::clone(factory))
            .collect()
    }

    pub fn available_functions(&self) -> Vec<NamedNode> {
        self.factories()
            .iter()
            .flat_map(|factory| factory.available_functions())
            .collect()
    }

    pub fn available_aggregates(&self) -> Vec<NamedNode> {
        self.factories()
            .iter()
            .flat_map(|factory| factory.available_aggregates())
            .collect()
    }

    /// Builds the expression node for a call to the function `function`.
    ///
    /// Casts to the XSD datatypes are resolved first, then the registered factories are tried in order
    /// and then the `local` factories given for this call only.
    /// If no factory is able to build the function, an [`Expression::UnknownFunction`] node is returned if
    /// [`ExpressionOptions::allow_unknown_functions`] is set.
    ///
    /// The built-in factories only support positional arguments: they decline calls with named arguments.
    pub fn create_expression(
        &self,
        function: &NamedNode,
        arguments: &FunctionArguments,
        local: &[&dyn FunctionFactory],
    ) -> Result<Expression, ParseError> {
        if let Some(cast) = CastFunction::from_iri(function.as_ref()) {
            if let Some(modifier) = arguments.modifier() {
                return Err(ParseError::UnexpectedModifier {
                    function: format!("cast to {function}"),
                    modifier: modifier.as_str(),
                });
            }
            let [inner] = arguments.positional() else {
                return Err(ParseError::CastArity {
                    datatype: cast.iri(),
                    actual: arguments.len(),
                });
            };
            trace!(function = %function, "Resolved as a cast");
            return Ok(Expression::Cast(cast, Box::new(inner.clone())));
        }
        for factory in self.factories() {
            if let Some(expression) = factory.try_create_expression(function, arguments)? {
                trace!(function = %function, "Resolved by a registered factory");
                return Ok(expression);
            }
        }
        for factory in local {
            if let Some(expression) = factory.try_create_expression(function, arguments)? {
                trace!(function = %function, "Resolved by a local factory");
                return Ok(expression);
            }
        }
        if self.options.allow_unknown_functions {
            debug!(function = %function, "No factory is able to build the function, keeping it as unknown");
            return Ok(Expression::UnknownFunction(
                function.clone(),
                arguments.positional().to_vec(),
            ));
        }
        Err(ParseError::UnresolvedFunction(function.clone()))
    }
}

impl Default for FunctionRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

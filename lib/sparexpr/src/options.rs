/// Options controlling how expressions are built and evaluated
///
/// # Example
///
/// ```
/// use sparexpr::ExpressionOptions;
///
/// // Accept calls to functions no factory knows about
/// let options = ExpressionOptions::lenient();
/// assert!(options.allow_unknown_functions);
///
/// // Or tune a single option
/// let custom = ExpressionOptions {
///     regex_size_limit: 10_000,
///     ..ExpressionOptions::default()
/// };
/// assert!(!custom.allow_unknown_functions);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionOptions {
    /// Build a placeholder node for function IRIs no factory is able to resolve
    ///
    /// The placeholder fails at evaluation time instead of failing the parsing.
    /// Default: `false`
    pub allow_unknown_functions: bool,

    /// Maximum size of the compiled regular expressions used by `matches` and `replace`
    ///
    /// Default: 1,000,000 bytes
    pub regex_size_limit: usize,
}

impl Default for ExpressionOptions {
    fn default() -> Self {
        Self {
            allow_unknown_functions: false,
            regex_size_limit: 1_000_000,
        }
    }
}

impl ExpressionOptions {
    /// Creates a new instance with the default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options rejecting unknown functions at parsing time and limiting regular expressions to 100KB
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_unknown_functions: false,
            regex_size_limit: 100_000,
        }
    }

    /// Options accepting unknown functions
    #[inline]
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            allow_unknown_functions: true,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_unknown_functions_allowed(mut self, allowed: bool) -> Self {
        self.allow_unknown_functions = allowed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExpressionOptions::default();
        assert!(!options.allow_unknown_functions);
        assert_eq!(options.regex_size_limit, 1_000_000);
        assert_eq!(options, ExpressionOptions::new());
    }

    #[test]
    fn test_presets() {
        assert!(ExpressionOptions::lenient().allow_unknown_functions);
        assert!(!ExpressionOptions::strict().allow_unknown_functions);
        assert!(
            ExpressionOptions::strict().regex_size_limit
                < ExpressionOptions::default().regex_size_limit
        );
        assert!(
            ExpressionOptions::new()
                .with_unknown_functions_allowed(true)
                .allow_unknown_functions
        );
    }
}

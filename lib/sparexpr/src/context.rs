use crate::options::ExpressionOptions;
use oxrdf::{Term, Variable};
use oxsdatatypes::DateTime;
use rustc_hash::FxHashMap;
use std::cell::Cell;

/// Identifier of a solution row or of a group of rows.
pub type BindingId = usize;

/// Gives access to the variable bindings of the solutions an expression is evaluated against.
///
/// The group context flag is toggled by aggregate nodes while they compute a group: lookups made during that time
/// may resolve variables across the whole group. Implementations use interior mutability for it, one binder being
/// used by a single evaluation thread.
pub trait Binder {
    /// The value bound to the variable in the given row, `None` if the variable is unbound.
    fn value(&self, variable: &Variable, binding_id: BindingId) -> Option<Term>;

    /// All the row identifiers of the solution sequence.
    fn binding_ids(&self) -> Vec<BindingId>;

    /// If the identifier is the one of a group built by `GROUP BY`.
    fn is_group(&self, binding_id: BindingId) -> bool;

    /// The rows of a group, `None` if the identifier is not a group.
    fn group_members(&self, binding_id: BindingId) -> Option<Vec<BindingId>>;

    fn is_group_context(&self) -> bool;

    fn set_group_context(&self, value: bool);
}

/// The context an expression is evaluated in.
#[derive(Clone)]
pub struct EvaluationContext<'a> {
    binder: &'a dyn Binder,
    options: ExpressionOptions,
    now: DateTime,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(binder: &'a dyn Binder) -> Self {
        Self {
            binder,
            options: ExpressionOptions::default(),
            now: DateTime::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: ExpressionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the time returned by time related functions like `afn:now()`.
    #[inline]
    #[must_use]
    pub fn with_now(mut self, now: DateTime) -> Self {
        self.now = now;
        self
    }

    #[inline]
    pub fn binder(&self) -> &'a dyn Binder {
        self.binder
    }

    #[inline]
    pub fn options(&self) -> &ExpressionOptions {
        &self.options
    }

    #[inline]
    pub fn now(&self) -> DateTime {
        self.now
    }
}

/// Sets the group context flag of a binder and resets it when dropped, even if the computation failed or panicked.
pub(crate) struct GroupContextGuard<'a> {
    binder: &'a dyn Binder,
}

impl<'a> GroupContextGuard<'a> {
    pub(crate) fn enter(binder: &'a dyn Binder) -> Self {
        binder.set_group_context(true);
        Self { binder }
    }
}

impl Drop for GroupContextGuard<'_> {
    fn drop(&mut self) {
        self.binder.set_group_context(false);
    }
}

/// A [`Binder`] keeping its solutions in memory.
///
/// ```
/// use oxrdf::{Literal, Variable};
/// use sparexpr::{Binder, MemoryBinder};
///
/// let mut binder = MemoryBinder::new();
/// let x = Variable::new("x")?;
/// let row = binder.push_row([(x.clone(), Literal::from(1).into())]);
/// let group = binder.push_group([row]);
/// assert!(binder.is_group(group));
/// assert_eq!(binder.value(&x, row), Some(Literal::from(1).into()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryBinder {
    // Group identifiers take a `None` slot so rows and groups share one identifier space
    rows: Vec<Option<FxHashMap<Variable, Term>>>,
    groups: FxHashMap<BindingId, Vec<BindingId>>,
    group_context: Cell<bool>,
}

impl MemoryBinder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solution row and returns its identifier.
    pub fn push_row(&mut self, bindings: impl IntoIterator<Item = (Variable, Term)>) -> BindingId {
        self.rows.push(Some(bindings.into_iter().collect()));
        self.rows.len() - 1
    }

    /// Adds a group of already pushed rows and returns its identifier.
    ///
    /// Rows and groups share the same identifier space.
    pub fn push_group(&mut self, members: impl IntoIterator<Item = BindingId>) -> BindingId {
        self.rows.push(None);
        let id = self.rows.len() - 1;
        self.groups.insert(id, members.into_iter().collect());
        id
    }
}

impl Binder for MemoryBinder {
    fn value(&self, variable: &Variable, binding_id: BindingId) -> Option<Term> {
        if let Some(members) = self.groups.get(&binding_id) {
            if !self.group_context.get() {
                return None;
            }
            // The group keys are shared by all the members
            return members
                .iter()
                .find_map(|id| self.rows.get(*id)?.as_ref()?.get(variable).cloned());
        }
        self.rows.get(binding_id)?.as_ref()?.get(variable).cloned()
    }

    fn binding_ids(&self) -> Vec<BindingId> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(id, row)| row.is_some().then_some(id))
            .collect()
    }

    fn is_group(&self, binding_id: BindingId) -> bool {
        self.groups.contains_key(&binding_id)
    }

    fn group_members(&self, binding_id: BindingId) -> Option<Vec<BindingId>> {
        self.groups.get(&binding_id).cloned()
    }

    fn is_group_context(&self) -> bool {
        self.group_context.get()
    }

    fn set_group_context(&self, value: bool) {
        self.group_context.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Literal;

    #[test]
    fn test_row_lookup() {
        let mut binder = MemoryBinder::new();
        let x = Variable::new_unchecked("x");
        let y = Variable::new_unchecked("y");
        let row = binder.push_row([(x.clone(), Literal::from(1).into())]);
        assert_eq!(binder.value(&x, row), Some(Literal::from(1).into()));
        assert_eq!(binder.value(&y, row), None);
        assert_eq!(binder.value(&x, 42), None);
        assert_eq!(binder.binding_ids(), vec![row]);
    }

    #[test]
    fn test_group_lookup_requires_group_context() {
        let mut binder = MemoryBinder::new();
        let x = Variable::new_unchecked("x");
        let first = binder.push_row([]);
        let second = binder.push_row([(x.clone(), Literal::new_simple_literal("a").into())]);
        let group = binder.push_group([first, second]);
        assert_ne!(group, first);
        assert_ne!(group, second);
        let third = binder.push_row([]);
        assert_ne!(group, third);
        assert_eq!(binder.binding_ids(), vec![first, second, third]);
        assert_eq!(binder.group_members(group), Some(vec![first, second]));
        assert_eq!(binder.value(&x, group), None);
        {
            let _guard = GroupContextGuard::enter(&binder);
            assert!(binder.is_group_context());
            assert_eq!(binder.value(&x, group), Some(Literal::new_simple_literal("a").into()));
        }
        assert!(!binder.is_group_context());
    }
}

//! Named query variables and the solutions that bind them.

use std::collections::HashMap;
use std::fmt;

/// A partial assignment of variable names to constant values.
///
/// Join operators grow one of these per upstream match and hand it to
/// [`crate::pattern::TriplePattern::apply`] to specialize the next pattern.
pub type Solution = HashMap<String, String>;

/// A named free placeholder occupying a pattern field.
///
/// Two occurrences with the same name denote the same unknown across the
/// patterns of one query, which is how joins are expressed. Equality and
/// hashing go by name alone; a field holding a variable never counts as
/// bound, whatever the name says.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(String);

impl Variable {
    /// Creates a variable with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether `solution` already carries a value for this variable.
    pub fn is_bound_in(&self, solution: &Solution) -> bool {
        solution.contains_key(&self.0)
    }

    /// Whether binding this variable to `value` is consistent with
    /// `solution`. Unbound variables accept any value; bound ones only
    /// their current value.
    pub fn is_bindable(&self, solution: &Solution, value: &str) -> bool {
        match solution.get(&self.0) {
            Some(bound) => bound == value,
            None => true,
        }
    }

    /// Returns a copy of `solution` extended with this variable bound to
    /// `value`. The input solution is left untouched so sibling matches can
    /// branch from it.
    pub fn bind(&self, solution: &Solution, value: impl Into<String>) -> Solution {
        let mut extended = solution.clone();
        extended.insert(self.0.clone(), value.into());
        extended
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

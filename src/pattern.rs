//! Triple patterns, the building blocks of a conjunctive query.
//!
//! A pattern constrains each of the three triple fields independently: a
//! field is either a bound constant, a named variable, or left entirely
//! unconstrained. Patterns are planning inputs and stay immutable; the
//! planner annotates copies and never rewrites caller fields.

use crate::variable::{Solution, Variable};
use std::fmt;

/// The three roles a field can occupy in a triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// The entity the triple is about.
    Subject,
    /// The relation between subject and object.
    Predicate,
    /// The value or entity the relation points at.
    Object,
}

impl FieldRole {
    /// All roles in subject, predicate, object order.
    pub const ALL: [FieldRole; 3] = [FieldRole::Subject, FieldRole::Predicate, FieldRole::Object];

    /// Lowercase role name.
    pub fn name(&self) -> &'static str {
        match self {
            FieldRole::Subject => "subject",
            FieldRole::Predicate => "predicate",
            FieldRole::Object => "object",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field of a triple pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Term {
    /// No constraint; every stored value matches.
    #[default]
    Unbound,
    /// Bound constant; only triples carrying this exact value match.
    Const(String),
    /// Named variable; unbound for index purposes, shared by name across
    /// patterns to express a join.
    Var(Variable),
}

impl Term {
    /// Whether this term is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Whether this term is a bound constant. Variables do not count as
    /// bound no matter their name.
    pub fn is_bound(&self) -> bool {
        matches!(self, Term::Const(_))
    }

    /// The constant value, if this term is bound.
    pub fn as_const(&self) -> Option<&str> {
        match self {
            Term::Const(value) => Some(value),
            _ => None,
        }
    }

    /// The variable, if this term holds one.
    pub fn as_var(&self) -> Option<&Variable> {
        match self {
            Term::Var(var) => Some(var),
            _ => None,
        }
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Const(value.to_string())
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::Const(value)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Var(var)
    }
}

/// A single triple pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    /// Subject constraint.
    pub subject: Term,
    /// Predicate constraint.
    pub predicate: Term,
    /// Object constraint.
    pub object: Term,
}

impl TriplePattern {
    /// A pattern with every field unconstrained.
    pub fn new() -> Self {
        TriplePattern::default()
    }

    /// Sets the subject constraint.
    pub fn with_subject(mut self, term: impl Into<Term>) -> Self {
        self.subject = term.into();
        self
    }

    /// Sets the predicate constraint.
    pub fn with_predicate(mut self, term: impl Into<Term>) -> Self {
        self.predicate = term.into();
        self
    }

    /// Sets the object constraint.
    pub fn with_object(mut self, term: impl Into<Term>) -> Self {
        self.object = term.into();
        self
    }

    /// The term occupying `role`.
    pub fn term(&self, role: FieldRole) -> &Term {
        match role {
            FieldRole::Subject => &self.subject,
            FieldRole::Predicate => &self.predicate,
            FieldRole::Object => &self.object,
        }
    }

    /// Whether the field in `role` is a bound constant.
    pub fn is_bound(&self, role: FieldRole) -> bool {
        self.term(role).is_bound()
    }

    /// The constant bound in `role`, if any.
    pub fn constant(&self, role: FieldRole) -> Option<&str> {
        self.term(role).as_const()
    }

    /// Roles holding bound constants, in subject, predicate, object order.
    pub fn bound_roles(&self) -> Vec<FieldRole> {
        FieldRole::ALL
            .iter()
            .copied()
            .filter(|role| self.is_bound(*role))
            .collect()
    }

    /// Number of bound fields, 0 through 3.
    pub fn bound_count(&self) -> usize {
        FieldRole::ALL
            .iter()
            .filter(|role| self.is_bound(**role))
            .count()
    }

    /// Variable names per role in subject, predicate, object order, `None`
    /// where the field holds a constant or is unconstrained.
    ///
    /// Two patterns with equal masks bind the same variables in the same
    /// roles, which is what makes their index scans mergeable.
    pub fn variable_mask(&self) -> [Option<&str>; 3] {
        FieldRole::ALL.map(|role| self.term(role).as_var().map(Variable::name))
    }

    /// All variables appearing in the pattern, in role order.
    pub fn variables(&self) -> Vec<&Variable> {
        FieldRole::ALL
            .iter()
            .filter_map(|role| self.term(*role).as_var())
            .collect()
    }

    /// Returns a copy with every variable bound in `solution` replaced by
    /// its constant value. Variables the solution does not cover stay
    /// variables.
    pub fn apply(&self, solution: &Solution) -> TriplePattern {
        let substitute = |term: &Term| match term {
            Term::Var(var) => match solution.get(var.name()) {
                Some(value) => Term::Const(value.clone()),
                None => term.clone(),
            },
            other => other.clone(),
        };
        TriplePattern {
            subject: substitute(&self.subject),
            predicate: substitute(&self.predicate),
            object: substitute(&self.object),
        }
    }
}

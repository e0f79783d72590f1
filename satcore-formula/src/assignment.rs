//! A partial boolean assignment over a fixed set of variables.
//!
//! This is the data-model level assignment: a plain mapping from variable to
//! value, used to represent solver results and to check a candidate model
//! against a formula. The solver's internal search-time assignment (coupled
//! to the decision trail) lives in `satcore::trail`.

use crate::cnf::CnfFormula;
use crate::lit::{Lit, Var};
use crate::xor::XorClause;

/// A partial mapping from variable to boolean value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<Option<bool>>,
}

impl Assignment {
    /// Creates an assignment with all of `var_count` variables unassigned.
    pub fn with_var_count(var_count: usize) -> Assignment {
        Assignment {
            values: vec![None; var_count],
        }
    }

    /// Number of variables this assignment has room for.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Grows the assignment to cover at least `var_count` variables.
    pub fn ensure_var_count(&mut self, var_count: usize) {
        if self.values.len() < var_count {
            self.values.resize(var_count, None);
        }
    }

    /// Assigns a value to `var`.
    pub fn assign(&mut self, var: Var, value: bool) {
        self.ensure_var_count(var.index() + 1);
        self.values[var.index()] = Some(value);
    }

    /// Removes the assignment of `var`, if any.
    pub fn unassign(&mut self, var: Var) {
        if var.index() < self.values.len() {
            self.values[var.index()] = None;
        }
    }

    /// Whether `var` currently has a value.
    pub fn is_assigned(&self, var: Var) -> bool {
        self.values.get(var.index()).copied().flatten().is_some()
    }

    /// The value of `var`, if assigned.
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values.get(var.index()).copied().flatten()
    }

    /// The value of a literal, if its variable is assigned.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var()).map(|v| v ^ lit.is_negative())
    }

    /// Whether every literal of `clause` evaluates to true under this
    /// (possibly partial) assignment.
    ///
    /// An unassigned literal is treated as not satisfying the clause; a
    /// clause with only unassigned literals is therefore not "satisfied"
    /// even though it is not falsified either.
    pub fn satisfies(&self, clause: &[Lit]) -> bool {
        clause.iter().any(|&lit| self.lit_value(lit) == Some(true))
    }

    /// Whether every literal of `clause` is assigned false, i.e. the clause
    /// conflicts with the assignment.
    pub fn conflicts_with(&self, clause: &[Lit]) -> bool {
        !clause.is_empty() && clause.iter().all(|&lit| self.lit_value(lit) == Some(false))
    }

    /// Whether this assignment satisfies every clause of `formula`.
    pub fn satisfies_formula(&self, formula: &CnfFormula) -> bool {
        formula.iter().all(|clause| self.satisfies(clause))
    }

    /// Whether this assignment satisfies the parity constraint of `xor`.
    pub fn satisfies_xor(&self, xor: &XorClause) -> bool {
        let mut parity = false;
        for &var in xor.vars() {
            match self.value(var) {
                Some(v) => parity ^= v,
                None => return false,
            }
        }
        parity == xor.parity()
    }

    /// Iterator over `(Var, bool)` pairs for every assigned variable.
    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.map(|v| (Var::from_index(index), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_clause_with_one_true_literal() {
        let mut a = Assignment::with_var_count(2);
        a.assign(Var::from_index(0), false);
        a.assign(Var::from_index(1), true);
        let clause = vec![Lit::from_dimacs(1), Lit::from_dimacs(2)];
        assert!(a.satisfies(&clause));
    }

    #[test]
    fn conflicts_with_all_false_clause() {
        let mut a = Assignment::with_var_count(2);
        a.assign(Var::from_index(0), false);
        a.assign(Var::from_index(1), false);
        let clause = vec![Lit::from_dimacs(1), Lit::from_dimacs(2)];
        assert!(a.conflicts_with(&clause));
    }

    #[test]
    fn partial_clause_neither_satisfied_nor_conflicting() {
        let mut a = Assignment::with_var_count(2);
        a.assign(Var::from_index(0), false);
        let clause = vec![Lit::from_dimacs(1), Lit::from_dimacs(2)];
        assert!(!a.satisfies(&clause));
        assert!(!a.conflicts_with(&clause));
    }
}

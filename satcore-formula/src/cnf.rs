//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::iter::Extend;
use std::ops::Range;

use crate::lit::Lit;

/// A formula in conjunctive normal form (CNF).
///
/// Equivalent to `Vec<Vec<Lit>>` but more efficient, as all literals are
/// stored in a single buffer instead of one allocation per clause.
#[derive(Default, Clone, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    /// Creates an empty CNF formula.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Number of variables in the formula.
    ///
    /// This also counts variables that never occur if a variable with a
    /// higher index is present, so a `Vec` of this length can be indexed by
    /// any variable index appearing in the formula.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Increases the variable count. A no-op if `count` is not larger than
    /// the current count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count);
    }

    /// Number of clauses in the formula.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    /// Whether the formula has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Appends a clause to the formula.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        for &lit in self.literals[begin..end].iter() {
            self.var_count = max(lit.index() + 1, self.var_count);
        }

        self.clause_ranges.push(begin..end);
    }

    /// Iterator over all clauses.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }

    /// Whether the formula contains the empty clause, i.e. is trivially
    /// unsatisfiable.
    pub fn contains_empty_clause(&self) -> bool {
        self.iter().any(|clause| clause.is_empty())
    }
}

/// Converts any iterable of `Lit` iterables into a `CnfFormula`.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.var_count(), f)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count() == other.var_count()
            && self.clause_ranges.len() == other.clause_ranges.len()
            && self
                .clause_ranges
                .iter()
                .zip(other.clause_ranges.iter())
                .all(|(a, b)| self.literals[a.clone()] == other.literals[b.clone()])
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        let clause_lens = collection::vec(collection::vec(Just(()), clause_len), clauses);
        (vars, clause_lens).prop_flat_map(move |(vars, clause_lens)| {
            let total_lits: usize = clause_lens.iter().map(|l| l.len()).sum();
            collection::vec(lit(0..vars.max(1)), total_lits).prop_map(move |literals| {
                let mut clause_ranges = Vec::with_capacity(clause_lens.len());
                let mut offset = 0;
                for len in clause_lens.iter() {
                    clause_ranges.push(offset..offset + len.len());
                    offset += len.len();
                }

                CnfFormula {
                    var_count: vars,
                    literals,
                    clause_ranges,
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clause_tracks_var_count() {
        let mut formula = CnfFormula::new();
        formula.add_clause(vec![Lit::from_dimacs(1), Lit::from_dimacs(-3)]);
        assert_eq!(formula.var_count(), 3);
        assert_eq!(formula.len(), 1);
    }

    #[test]
    fn empty_clause_is_detected() {
        let mut formula = CnfFormula::new();
        formula.add_clause(Vec::<Lit>::new());
        assert!(formula.contains_empty_clause());
    }

    #[test]
    fn no_clauses_is_not_empty_clause() {
        let formula = CnfFormula::new();
        assert!(!formula.contains_empty_clause());
        assert!(formula.is_empty());
    }
}

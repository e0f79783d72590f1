//! Watchlists used to detect clauses that became unit.
//!
//! Each long clause always has exactly two watches pointing to it, one in
//! each of two of its literals' watchlists. The watched literals are always
//! kept at positions 0 and 1 of the clause. When a clause is unit under the
//! current assignment the true (propagating) literal is watched at position
//! 0 and the literal with the highest decision level at position 1; when a
//! clause is satisfied by a non-watched literal the watches may lag behind
//! without harm. Unassigning variables during backtracking never invalidates
//! these invariants, so watchlists need no maintenance on backtrack.
//!
//! As in the teacher, each watch stores a blocking literal: any literal of
//! the clause other than the one being watched. When the blocking literal is
//! true the clause is already satisfied and [`crate::propagate`] can skip it
//! without touching the clause database at all.

use satcore_formula::lit::Lit;

use crate::clause::ClauseRef;

/// A watch on a long clause.
#[derive(Copy, Clone, Debug)]
pub struct Watch {
    pub cref: ClauseRef,
    pub blocking: Lit,
}

/// Per-literal watchlists.
#[derive(Default)]
pub struct Watchlists {
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, Vec::new());
    }

    /// Starts watching a clause on its first two literals.
    pub fn watch_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for i in 0..2 {
            let watch = Watch {
                cref,
                blocking: lits[i ^ 1],
            };
            self.watches[(!lits[i]).code()].push(watch);
        }
    }

    pub fn watched_by(&self, lit: Lit) -> &[Watch] {
        &self.watches[lit.code()]
    }

    /// Takes ownership of a literal's watch list, leaving an empty one in
    /// its place. [`crate::propagate::propagate_long`] drains this list,
    /// re-adding entries that still belong, and restores whatever remains.
    pub fn take(&mut self, lit: Lit) -> Vec<Watch> {
        std::mem::take(&mut self.watches[lit.code()])
    }

    pub fn restore(&mut self, lit: Lit, watches: Vec<Watch>) {
        self.watches[lit.code()] = watches;
    }

    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_formula::lit::Var;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn watch_clause_registers_both_watched_literals() {
        let mut watchlists = Watchlists::default();
        watchlists.set_var_count(2);
        let cref = ClauseRef::from_index(0);
        watchlists.watch_clause(cref, [lit(0, true), lit(1, false)]);

        let watches_a = watchlists.watched_by(lit(0, false));
        assert_eq!(watches_a.len(), 1);
        assert_eq!(watches_a[0].blocking, lit(1, false));

        let watches_b = watchlists.watched_by(lit(1, true));
        assert_eq!(watches_b.len(), 1);
        assert_eq!(watches_b[0].blocking, lit(0, true));
    }

    #[test]
    fn take_leaves_empty_list_behind() {
        let mut watchlists = Watchlists::default();
        watchlists.set_var_count(2);
        let cref = ClauseRef::from_index(0);
        watchlists.watch_clause(cref, [lit(0, true), lit(1, false)]);

        let taken = watchlists.take(lit(0, false));
        assert_eq!(taken.len(), 1);
        assert!(watchlists.watched_by(lit(0, false)).is_empty());
    }
}

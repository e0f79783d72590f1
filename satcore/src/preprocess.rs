//! Root-level clause loading and simplification.
//!
//! Adapted from the teacher's `load::load_clause`: deduplicate and sort the
//! incoming literals, drop the clause outright if it is tautological or
//! already satisfied by the level-0 assignment, drop any literal already
//! false at level 0, and dispatch on what remains. Unlike the teacher, there
//! is no binary-clause special case — this crate's watch scheme treats every
//! clause of length >= 2 uniformly, so the dispatch collapses to three cases
//! instead of four.

use satcore_formula::lit::Lit;

use crate::clause::db::ClauseDb;
use crate::clause::ClauseRef;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// What happened when a clause was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// Tautological, or already satisfied at level 0: not added.
    Satisfied,
    /// Every literal was false at level 0: the formula is unsatisfiable.
    Conflict,
    /// Simplified to a single literal, enqueued as a level-0 unit.
    Unit,
    /// Added as a watched clause.
    Added(ClauseRef),
}

/// Loads one original clause into the solver, simplifying it against the
/// current (level-0) assignment first. Must be called with `trail` at
/// decision level 0.
pub fn load_clause(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    lits: &[Lit],
) -> LoadResult {
    debug_assert_eq!(trail.current_level(), 0);

    let mut simplified: Vec<Lit> = lits.to_vec();
    simplified.sort_unstable();
    simplified.dedup();

    for window in simplified.windows(2) {
        if window[0] == !window[1] {
            return LoadResult::Satisfied;
        }
    }

    if simplified
        .iter()
        .any(|&lit| trail.assignment().lit_is_true(lit))
    {
        return LoadResult::Satisfied;
    }

    simplified.retain(|&lit| !trail.assignment().lit_is_false(lit));

    match simplified.len() {
        0 => LoadResult::Conflict,
        1 => {
            let unit = simplified[0];
            if trail.assignment().lit_is_unknown(unit) {
                trail.enqueue(unit, Reason::Decision);
            }
            LoadResult::Unit
        }
        _ => {
            let cref = db.add_original_clause(&simplified);
            watchlists.watch_clause(cref, [simplified[0], simplified[1]]);
            LoadResult::Added(cref)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_formula::lit::Var;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    fn setup(var_count: usize) -> (Trail, Watchlists, ClauseDb) {
        let mut trail = Trail::default();
        trail.set_var_count(var_count);
        let mut watchlists = Watchlists::default();
        watchlists.set_var_count(var_count);
        (trail, watchlists, ClauseDb::new())
    }

    #[test]
    fn tautological_clause_is_dropped() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        let result = load_clause(&mut trail, &mut watchlists, &mut db, &[lit(0, true), lit(0, false)]);
        assert_eq!(result, LoadResult::Satisfied);
        assert_eq!(db.iter_all().count(), 0);
    }

    #[test]
    fn empty_clause_is_unsat() {
        let (mut trail, mut watchlists, mut db) = setup(1);
        let result = load_clause(&mut trail, &mut watchlists, &mut db, &[]);
        assert_eq!(result, LoadResult::Conflict);
    }

    #[test]
    fn unit_clause_is_enqueued() {
        let (mut trail, mut watchlists, mut db) = setup(1);
        let result = load_clause(&mut trail, &mut watchlists, &mut db, &[lit(0, true)]);
        assert_eq!(result, LoadResult::Unit);
        assert!(trail.assignment().lit_is_true(lit(0, true)));
    }

    #[test]
    fn false_literal_is_removed_before_dispatch() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        trail.enqueue(lit(0, false), Reason::Decision);
        let result = load_clause(&mut trail, &mut watchlists, &mut db, &[lit(0, true), lit(1, true)]);
        assert_eq!(result, LoadResult::Unit);
        assert!(trail.assignment().lit_is_true(lit(1, true)));
    }

    #[test]
    fn clause_already_satisfied_at_level_zero_is_dropped() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        trail.enqueue(lit(0, true), Reason::Decision);
        let result = load_clause(&mut trail, &mut watchlists, &mut db, &[lit(0, true), lit(1, false)]);
        assert_eq!(result, LoadResult::Satisfied);
    }

    #[test]
    fn long_clause_is_added_and_watched() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        let result = load_clause(
            &mut trail,
            &mut watchlists,
            &mut db,
            &[lit(0, true), lit(1, true), lit(2, true)],
        );
        assert!(matches!(result, LoadResult::Added(_)));
        assert_eq!(db.iter_all().count(), 1);
    }
}

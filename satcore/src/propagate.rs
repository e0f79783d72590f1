//! Unit propagation via two-watched-literals.
//!
//! A safe reimplementation of the teacher's `prop::long::propagate_long`,
//! which manipulates clause storage and watchlists through raw pointers for
//! speed. Here the same algorithm is expressed with
//! [`crate::watch::Watchlists::take`]/`restore` and ordinary slice
//! indexing: a literal's watchlist is taken out of the structure for the
//! duration of the scan (so it can be read while the clause arena, also
//! reachable from the same `Solver`, is mutated) and a fresh vector of
//! surviving watches is built up and restored at the end, exactly mirroring
//! the pointer dance in the original without `unsafe`.

use satcore_formula::lit::Lit;

use crate::clause::db::ClauseDb;
use crate::trail::{Conflict, Reason, Trail};
use crate::watch::{Watch, Watchlists};

/// Propagates every consequence of the literals already on the trail,
/// stopping at the first conflict.
pub fn propagate(trail: &mut Trail, watchlists: &mut Watchlists, db: &mut ClauseDb) -> Result<(), Conflict> {
    while let Some(lit) = trail.pop_queue() {
        if let Err(conflict) = propagate_long(trail, watchlists, db, lit) {
            return Err(conflict);
        }
    }
    Ok(())
}

/// Propagates the clauses watched by `lit` becoming newly false, enqueueing
/// any resulting forced assignments onto the trail.
fn propagate_long(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    lit: Lit,
) -> Result<(), Conflict> {
    let false_lit = !lit;
    let watches = watchlists.take(lit);
    let mut kept = Vec::with_capacity(watches.len());

    let mut iter = watches.into_iter();
    while let Some(watch) = iter.next() {
        if trail.assignment().lit_is_true(watch.blocking) {
            kept.push(watch);
            continue;
        }

        let cref = watch.cref;
        let lits = db.arena_mut().clause_mut(cref).lits_mut();

        if lits[0] == false_lit {
            lits.swap(0, 1);
        }
        let first = lits[0];

        let new_watch = Watch {
            cref,
            blocking: first,
        };

        if first != watch.blocking && trail.assignment().lit_is_true(first) {
            kept.push(new_watch);
            continue;
        }

        let mut replaced = false;
        for i in 2..lits.len() {
            if !trail.assignment().lit_is_false(lits[i]) {
                let rest_lit = lits[i];
                lits[1] = rest_lit;
                lits[i] = false_lit;
                watchlists.add_watch(!rest_lit, new_watch);
                replaced = true;
                break;
            }
        }
        if replaced {
            continue;
        }

        kept.push(new_watch);

        if trail.assignment().lit_is_false(first) {
            kept.extend(iter);
            watchlists.restore(lit, kept);
            return Err(Conflict(cref));
        }

        trail.enqueue(first, Reason::Propagated(cref));
    }

    watchlists.restore(lit, kept);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::Trail;
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

    fn add_clause(db: &mut ClauseDb, watchlists: &mut Watchlists, lits: &[Lit]) -> crate::clause::ClauseRef {
        let cref = db.add_original_clause(lits);
        watchlists.watch_clause(cref, [lits[0], lits[1]]);
        cref
    }

    #[test]
    fn unit_propagation_forces_remaining_literal() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        add_clause(&mut db, &mut watchlists, &[lit(0, false), lit(1, true), lit(2, true)]);

        trail.new_decision_level();
        trail.enqueue(lit(0, true), Reason::Decision);
        trail.new_decision_level();
        trail.enqueue(lit(1, false), Reason::Decision);

        propagate(&mut trail, &mut watchlists, &mut db).unwrap();

        assert!(trail.assignment().lit_is_true(lit(2, true)));
    }

    #[test]
    fn conflicting_clause_is_detected() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        add_clause(&mut db, &mut watchlists, &[lit(0, false), lit(1, false)]);

        trail.new_decision_level();
        trail.enqueue(lit(0, true), Reason::Decision);
        trail.new_decision_level();
        trail.enqueue(lit(1, true), Reason::Decision);

        let result = propagate(&mut trail, &mut watchlists, &mut db);
        assert!(result.is_err());
    }

    #[test]
    fn satisfied_clause_is_skipped() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        add_clause(&mut db, &mut watchlists, &[lit(0, true), lit(1, true), lit(2, true)]);

        trail.new_decision_level();
        trail.enqueue(lit(0, true), Reason::Decision);

        propagate(&mut trail, &mut watchlists, &mut db).unwrap();
        assert!(trail.assignment().lit_is_unknown(lit(1, true)));
        assert!(trail.assignment().lit_is_unknown(lit(2, true)));
    }
}

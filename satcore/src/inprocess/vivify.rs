//! Vivification: shortening clauses by testing whether a prefix of their
//! negated literals already reaches a conflict under unit propagation.
//!
//! No teacher counterpart. Grounded in spec §4.7 phase 1: rather than
//! building a temporary CNF and running a full SAT call (the spec's heavier
//! alternative), this assumes the negation of each literal of a clause in
//! turn directly on the real trail (always at decision level 0, so this is
//! safe and cheap to undo) and stops as soon as propagation conflicts —
//! at that point every literal not yet assumed is redundant, and the clause
//! can be replaced by the prefix that was assumed.

use satcore_formula::lit::Lit;

use crate::clause::db::ClauseDb;
use crate::clause::ClauseRef;
use crate::propagate::propagate;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// A clause currently serving as some trail literal's propagation reason
/// must not be strengthened out from under it: conflict analysis can still
/// walk back through it later.
fn is_locked(trail: &Trail, db: &ClauseDb, cref: ClauseRef) -> bool {
    let lits = db.lits(cref);
    if lits.is_empty() {
        return false;
    }
    let var = lits[0].var();
    trail.assignment().var_value(var).is_some() && trail.reason_of(var) == Reason::Propagated(cref)
}

/// Unwatches both watched literals of a clause about to be replaced; safe to
/// call even if the clause is unit (no watches) or already unwatched.
fn unwatch(watchlists: &mut Watchlists, lits: &[Lit], cref: ClauseRef) {
    if lits.len() < 2 {
        return;
    }
    for &lit in &lits[..2] {
        let kept: Vec<_> = watchlists
            .take(!lit)
            .into_iter()
            .filter(|w| w.cref != cref)
            .collect();
        watchlists.restore(!lit, kept);
    }
}

/// Attempts to shorten one clause. Must be called with `trail` at decision
/// level 0; restores it to level 0 before returning. Returns the
/// strengthened literal vector if the clause could be shortened.
fn vivify_clause(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    cref: ClauseRef,
) -> Option<Vec<Lit>> {
    let lits: Vec<Lit> = db.lits(cref).to_vec();
    if lits.len() < 3 {
        return None;
    }

    trail.new_decision_level();
    let mut shortened = None;

    for (i, &lit) in lits.iter().enumerate() {
        let neg = !lit;
        if trail.assignment().lit_is_true(neg) {
            continue;
        }
        if trail.assignment().lit_is_false(neg) {
            // `lit` is already forced true by the assumptions so far: the
            // clause is satisfied regardless of the rest, nothing to learn.
            break;
        }
        trail.enqueue(neg, Reason::Decision);
        if propagate(trail, watchlists, db).is_err() {
            shortened = Some(lits[..=i].to_vec());
            break;
        }
    }

    trail.backtrack_to(0, |_| {});
    shortened.filter(|s| s.len() < lits.len() && !s.is_empty())
}

/// Result of one vivification pass.
#[derive(Default)]
pub struct VivifyResult {
    pub strengthened: usize,
    /// Set if re-asserting a clause shortened down to a unit itself
    /// conflicted, proving the formula unsatisfiable at level 0.
    pub contradiction: bool,
}

/// Runs vivification over every clause of length >= 3 in the database
/// (originals and learned alike), within `budget` attempts.
pub fn run(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    budget: usize,
) -> VivifyResult {
    debug_assert_eq!(trail.current_level(), 0);

    let candidates: Vec<ClauseRef> = db
        .iter_all()
        .filter(|&cref| db.lits(cref).len() >= 3)
        .take(budget)
        .collect();

    let mut result = VivifyResult::default();
    for cref in candidates {
        if result.contradiction || db.is_deleted(cref) {
            continue;
        }
        if let Some(new_lits) = vivify_clause(trail, watchlists, db, cref) {
            if is_locked(trail, db, cref) {
                continue;
            }
            let old_lits = db.lits(cref).to_vec();
            let new_cref = db.strengthen_clause(cref, &new_lits);
            unwatch(watchlists, &old_lits, cref);
            if new_lits.len() >= 2 {
                watchlists.watch_clause(new_cref, [new_lits[0], new_lits[1]]);
            } else {
                let unit = new_lits[0];
                if trail.assignment().lit_is_false(unit) {
                    result.contradiction = true;
                } else {
                    if trail.assignment().lit_is_unknown(unit) {
                        trail.enqueue(unit, Reason::Decision);
                    }
                    if propagate(trail, watchlists, db).is_err() {
                        result.contradiction = true;
                    }
                }
            }
            result.strengthened += 1;
        }
    }
    result
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
    fn shortens_clause_implied_by_a_prefix() {
        let (mut trail, mut watchlists, mut db) = setup(3);

        // (a v b) already forces c, so (a v b v c) is equivalent to (a v b).
        let binary = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(binary, [lit(0, true), lit(1, true)]);
        let implying = db.add_original_clause(&[lit(0, false), lit(1, false), lit(2, true)]);
        watchlists.watch_clause(implying, [lit(0, false), lit(1, false)]);

        let target = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, true)]);
        watchlists.watch_clause(target, [lit(0, true), lit(1, true)]);

        let result = run(&mut trail, &mut watchlists, &mut db, 100);
        assert!(result.strengthened >= 1);
        assert!(!result.contradiction);
        assert!(db.is_deleted(target));
        assert_eq!(trail.current_level(), 0);
    }

    #[test]
    fn leaves_clauses_with_no_redundant_literal_untouched() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        let cref = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, true)]);
        watchlists.watch_clause(cref, [lit(0, true), lit(1, true)]);

        let result = run(&mut trail, &mut watchlists, &mut db, 100);
        assert_eq!(result.strengthened, 0);
        assert!(!db.is_deleted(cref));
    }

    #[test]
    fn reasserting_a_shortened_unit_that_conflicts_is_reported() {
        let (mut trail, mut watchlists, mut db) = setup(5);
        // p, q, r, s, t named by index 0..5. s is forced false up front, so
        // vivifying (p v q v r) against the helper clause (p v s) shortens
        // it to the unit (p). Reasserting p=true then propagates through
        // (~p v t) and (~p v ~t), which conflict with each other.
        trail.enqueue(lit(3, false), Reason::Decision);

        let helper = db.add_original_clause(&[lit(0, true), lit(3, true)]);
        watchlists.watch_clause(helper, [lit(0, true), lit(3, true)]);
        let implies_t = db.add_original_clause(&[lit(0, false), lit(4, true)]);
        watchlists.watch_clause(implies_t, [lit(0, false), lit(4, true)]);
        let implies_not_t = db.add_original_clause(&[lit(0, false), lit(4, false)]);
        watchlists.watch_clause(implies_not_t, [lit(0, false), lit(4, false)]);

        let target = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, true)]);
        watchlists.watch_clause(target, [lit(0, true), lit(1, true)]);

        let result = run(&mut trail, &mut watchlists, &mut db, 100);
        assert!(result.contradiction);
    }
}

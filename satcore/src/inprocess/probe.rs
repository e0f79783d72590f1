//! Failed-literal probing and hyper-binary resolution.
//!
//! No teacher counterpart. Grounded in spec §4.7 phase 4: assume a literal at
//! decision level 0, propagate, and if that reaches a conflict the literal's
//! negation is a unit of the formula. While a probe is in effect, any clause
//! propagated down to a single non-probe literal by a chain of binary
//! implications yields, via hyper-binary resolution, a new binary clause
//! between the probe's negation and that literal.

use satcore_formula::lit::Lit;

use crate::clause::db::ClauseDb;
use crate::propagate::propagate;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

#[derive(Default)]
pub struct ProbeResult {
    pub units_found: usize,
    pub hyper_binaries_learned: usize,
    /// Set if asserting a failed probe literal's negation itself conflicted,
    /// proving the formula unsatisfiable at level 0.
    pub contradiction: bool,
}

/// Probes every candidate literal (both polarities, when `double` is set)
/// within `budget` attempts. Must be called with `trail` at decision level 0;
/// leaves it there on return.
pub fn run(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    candidates: &[Lit],
    double: bool,
    budget: usize,
) -> ProbeResult {
    debug_assert_eq!(trail.current_level(), 0);
    let mut result = ProbeResult::default();
    let mut probed = 0;

    for &lit in candidates {
        if probed >= budget || result.contradiction {
            break;
        }
        if !trail.assignment().lit_is_unknown(lit) {
            continue;
        }
        probed += 1;

        if probe_one(trail, watchlists, db, lit, &mut result) {
            // `lit` failed: its negation is now a level-0 unit. Re-probing
            // the opposite polarity would be redundant.
            continue;
        }

        if double && !result.contradiction && trail.assignment().lit_is_unknown(!lit) {
            probed += 1;
            probe_one(trail, watchlists, db, !lit, &mut result);
        }
    }

    result
}

/// Probes a single literal. Returns `true` if it failed (its negation was
/// learned as a unit).
fn probe_one(
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    lit: Lit,
    result: &mut ProbeResult,
) -> bool {
    let before = trail.trail().len();
    trail.new_decision_level();
    trail.enqueue(lit, Reason::Decision);

    match propagate(trail, watchlists, db) {
        Err(_) => {
            trail.backtrack_to(0, |_| {});
            if trail.assignment().lit_is_unknown(!lit) {
                trail.enqueue(!lit, Reason::Decision);
                if propagate(trail, watchlists, db).is_err() {
                    result.contradiction = true;
                }
                result.units_found += 1;
            } else if trail.assignment().lit_is_false(!lit) {
                // `lit` is already forced true at level 0, yet assuming it
                // also conflicts: the formula is unsatisfiable outright.
                result.contradiction = true;
            }
            true
        }
        Ok(()) => {
            // Hyper-binary resolution: every literal forced by a chain of
            // binary clauses rooted at this decision (reason level 1, i.e.
            // forced directly or transitively only by this probe) implies a
            // direct binary clause `~lit v forced`, letting future search
            // skip the intermediate chain.
            let forced: Vec<Lit> = trail.trail()[before + 1..].to_vec();
            trail.backtrack_to(0, |_| {});

            for forced_lit in forced {
                if forced_lit == lit {
                    continue;
                }
                let binary = vec![!lit, forced_lit];
                if !clause_already_present(db, &binary) {
                    let cref = db.add_original_clause(&binary);
                    watchlists.watch_clause(cref, [binary[0], binary[1]]);
                    result.hyper_binaries_learned += 1;
                }
            }
            false
        }
    }
}

fn clause_already_present(db: &ClauseDb, lits: &[Lit]) -> bool {
    db.iter_all().any(|cref| {
        let existing = db.lits(cref);
        existing.len() == lits.len() && lits.iter().all(|l| existing.contains(l))
    })
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
    fn failed_literal_becomes_a_unit() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // (~a v b), (~a v ~b): assuming a=true forces b=true and b=false,
        // a conflict, so a must be false.
        let c1 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, false), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, false)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, false)]);

        let result = run(&mut trail, &mut watchlists, &mut db, &[lit(0, true)], false, 10);
        assert_eq!(result.units_found, 1);
        assert!(trail.assignment().lit_is_true(lit(0, false)));
        assert_eq!(trail.current_level(), 0);
    }

    #[test]
    fn non_failing_literal_leaves_trail_at_level_zero() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);

        let result = run(&mut trail, &mut watchlists, &mut db, &[lit(0, true)], false, 10);
        assert_eq!(result.units_found, 0);
        assert_eq!(trail.current_level(), 0);
    }

    #[test]
    fn both_polarities_failing_is_reported_as_contradiction() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // (~a v b), (~a v ~b): a=true conflicts, forcing a=false.
        // (a v b), (a v ~b): a=false also conflicts, so the formula itself
        // is unsatisfiable and probing must surface that, not just record a
        // second unit.
        let c1 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, false), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, false)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, false)]);
        let c3 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c3, [lit(0, true), lit(1, true)]);
        let c4 = db.add_original_clause(&[lit(0, true), lit(1, false)]);
        watchlists.watch_clause(c4, [lit(0, true), lit(1, false)]);

        let result = run(&mut trail, &mut watchlists, &mut db, &[lit(0, true)], false, 10);
        assert!(result.contradiction);
    }
}

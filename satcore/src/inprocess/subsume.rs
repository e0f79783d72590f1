//! Subsumption and self-subsumption.
//!
//! No teacher counterpart. Grounded in spec §4.7 phase 2: build per-literal
//! occurrence lists, then for each clause (processed shortest-first) look at
//! clauses sharing its rarest literal as subsumption/self-subsumption
//! candidates — the standard occurrence-list restriction that avoids an
//! all-pairs scan.

use rustc_hash::{FxHashMap, FxHashSet};

use satcore_formula::lit::Lit;

use crate::clause::db::ClauseDb;
use crate::clause::ClauseRef;
use crate::propagate::propagate;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// A clause currently serving as some trail literal's propagation reason
/// (the propagated literal always sits at index 0) must not be removed or
/// rewritten: conflict analysis can still walk back through it later.
fn is_locked(trail: &Trail, db: &ClauseDb, cref: ClauseRef) -> bool {
    let lits = db.lits(cref);
    if lits.is_empty() {
        return false;
    }
    let var = lits[0].var();
    trail.assignment().var_value(var).is_some() && trail.reason_of(var) == Reason::Propagated(cref)
}

/// Result of one subsumption/self-subsumption pass.
#[derive(Default)]
pub struct SubsumeStats {
    pub subsumed: usize,
    pub strengthened: usize,
    /// Set if strengthening a clause down to a unit (or empty) resolvent
    /// proved the formula unsatisfiable at level 0.
    pub contradiction: bool,
}

fn rebuild_occurrences(db: &ClauseDb, crefs: &[ClauseRef]) -> FxHashMap<Lit, Vec<ClauseRef>> {
    let mut occ: FxHashMap<Lit, Vec<ClauseRef>> = FxHashMap::default();
    for &cref in crefs {
        for &lit in db.lits(cref) {
            occ.entry(lit).or_default().push(cref);
        }
    }
    occ
}

/// Unwatches both watched literals of a clause about to be removed or
/// replaced; safe to call even if the clause is unit (no watches) or
/// already unwatched.
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

/// Runs one subsumption/self-subsumption pass over every clause in the
/// database. `to_visit` bounds how many clauses are used as the subsuming
/// (smaller) side, for the per-round time budget.
pub fn run(
    trail: &mut Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    to_visit: usize,
) -> SubsumeStats {
    let mut crefs: Vec<ClauseRef> = db.iter_all().collect();
    crefs.sort_by_key(|&cref| db.lits(cref).len());

    let occ = rebuild_occurrences(db, &crefs);

    let mut removed: FxHashSet<ClauseRef> = FxHashSet::default();
    let mut strengthen: Vec<(ClauseRef, Vec<Lit>)> = Vec::new();

    for &c1 in crefs.iter().take(to_visit) {
        if removed.contains(&c1) {
            continue;
        }
        let lits1 = db.lits(c1).to_vec();
        if lits1.is_empty() {
            continue;
        }

        let rarest = *lits1
            .iter()
            .min_by_key(|&&l| occ.get(&l).map(Vec::len).unwrap_or(0))
            .unwrap();
        let set1: FxHashSet<Lit> = lits1.iter().copied().collect();

        for &c2 in occ.get(&rarest).into_iter().flatten() {
            if c2 == c1 || removed.contains(&c2) || db.is_deleted(c2) {
                continue;
            }
            let lits2 = db.lits(c2).to_vec();
            if lits2.len() < lits1.len() {
                continue;
            }
            let set2: FxHashSet<Lit> = lits2.iter().copied().collect();

            if set1.iter().all(|l| set2.contains(l)) {
                removed.insert(c2);
                continue;
            }

            // Self-subsumption: C1 and C2 agree on every literal except one
            // complementary pair; the resolvent strengthens C2 by dropping
            // that literal.
            let mut complement: Option<Lit> = None;
            let mut compatible = true;
            for &l in &set1 {
                if set2.contains(&l) {
                    continue;
                }
                if set2.contains(&!l) && complement.is_none() {
                    complement = Some(l);
                } else {
                    compatible = false;
                    break;
                }
            }

            if compatible {
                if let Some(l) = complement {
                    let new_lits: Vec<Lit> =
                        lits2.iter().copied().filter(|&x| x != !l).collect();
                    strengthen.push((c2, new_lits));
                    removed.insert(c2);
                }
            }
        }
    }

    let mut stats = SubsumeStats::default();

    for (cref, new_lits) in strengthen {
        if stats.contradiction {
            break;
        }
        if db.is_deleted(cref) || is_locked(trail, db, cref) {
            continue;
        }

        let old_lits = db.lits(cref).to_vec();
        let new_cref = db.strengthen_clause(cref, &new_lits);
        unwatch(watchlists, &old_lits, cref);

        match new_lits.len() {
            0 => stats.contradiction = true,
            1 => {
                let unit = new_lits[0];
                if trail.assignment().lit_is_false(unit) {
                    stats.contradiction = true;
                } else {
                    if trail.assignment().lit_is_unknown(unit) {
                        trail.enqueue(unit, Reason::Decision);
                    }
                    if propagate(trail, watchlists, db).is_err() {
                        stats.contradiction = true;
                    }
                }
            }
            _ => watchlists.watch_clause(new_cref, [new_lits[0], new_lits[1]]),
        }

        stats.strengthened += 1;
    }

    for cref in removed {
        if db.is_deleted(cref) || is_locked(trail, db, cref) {
            continue;
        }
        let lits = db.lits(cref).to_vec();
        unwatch(watchlists, &lits, cref);
        db.remove_clause(cref);
        stats.subsumed += 1;
    }

    stats
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
    fn smaller_clause_subsumes_larger_superset() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        let small = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(small, [lit(0, true), lit(1, true)]);
        let big = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, true)]);
        watchlists.watch_clause(big, [lit(0, true), lit(1, true)]);

        let stats = run(&mut trail, &mut db, &mut watchlists, 100);
        assert_eq!(stats.subsumed, 1);
        assert!(db.is_deleted(big));
        assert!(!db.is_deleted(small));
    }

    #[test]
    fn self_subsumption_strengthens_clause() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        // (a v b) and (~a v b v c) share b, differ on a/~a: resolvent is
        // (b v c), which strengthens the second clause.
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, true), lit(2, true)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, true)]);

        let stats = run(&mut trail, &mut db, &mut watchlists, 100);
        assert_eq!(stats.strengthened, 1);
        assert!(db.is_deleted(c2));

        let surviving: Vec<ClauseRef> = db.originals().filter(|&cref| cref != c1).collect();
        assert_eq!(surviving.len(), 1);
        assert_eq!(db.lits(surviving[0]).len(), 2);
    }

    #[test]
    fn self_subsumption_to_a_unit_is_propagated() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // (a v b) and (~a v b): resolvent is the unit (b), which must be
        // asserted on the trail, not just left sitting unwatched.
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, true)]);

        let stats = run(&mut trail, &mut db, &mut watchlists, 100);
        assert_eq!(stats.strengthened, 1);
        assert!(!stats.contradiction);
        assert!(trail.assignment().lit_is_true(lit(1, true)));
    }
}

//! Bounded variable elimination (BVE) and pure-literal elimination.
//!
//! No teacher counterpart. Grounded in spec §4.7 phase 3: rank elimination
//! candidates by the classic `|pos|*|neg| - |pos| - |neg|` cost (a variable
//! with few occurrences of each polarity is cheap to resolve away), generate
//! every non-tautological resolvent, and only commit the elimination if none
//! of them exceeds a size bound. Eliminated variables are not simply
//! dropped: each keeps enough of its original clauses to let the final model
//! be extended back to a full assignment (the standard BVE witness
//! construction).

use rustc_hash::FxHashSet;

use satcore_formula::lit::{Lit, Var};

use crate::clause::db::ClauseDb;
use crate::clause::ClauseRef;
use crate::propagate::propagate;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// A clause currently serving as some trail literal's propagation reason
/// must not be removed: conflict analysis can still walk back through it.
fn is_locked(trail: &Trail, db: &ClauseDb, cref: ClauseRef) -> bool {
    let lits = db.lits(cref);
    if lits.is_empty() {
        return false;
    }
    let var = lits[0].var();
    trail.assignment().var_value(var).is_some() && trail.reason_of(var) == Reason::Propagated(cref)
}

/// Enough of an eliminated variable's original clauses to extend a model of
/// the reduced formula back to a value for this variable.
pub struct EliminatedVar {
    pub var: Var,
    /// Set for a pure literal: the fixed value the variable must take,
    /// skipping the general resolution-based reconstruction below.
    forced: Option<bool>,
    /// Clauses that contained `var` positively, with `var` removed.
    pos_rest: Vec<Vec<Lit>>,
    /// Clauses that contained `var` negatively, with `var` removed.
    neg_rest: Vec<Vec<Lit>>,
}

impl EliminatedVar {
    /// Extends a satisfying assignment of the reduced formula with a value
    /// for this variable. `value_of` must already answer for every other
    /// variable appearing in the stored clauses.
    pub fn reconstruct(&self, value_of: impl Fn(Lit) -> bool) -> bool {
        if let Some(value) = self.forced {
            return value;
        }
        let satisfied = |clause: &[Lit]| clause.iter().any(|&lit| value_of(lit));
        // Setting var=true satisfies every `pos_rest` clause outright; it's
        // safe only if every `neg_rest` clause is already satisfied by the
        // rest of the assignment (since var=true falsifies ~var there).
        if self.neg_rest.iter().all(|c| satisfied(c)) {
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
pub struct BveResult {
    pub eliminated: Vec<EliminatedVar>,
    /// Set if a resolvent collapsed to a unit (or empty) clause that, once
    /// propagated, proved the formula unsatisfiable at level 0.
    pub contradiction: bool,
}

fn occurrences(db: &ClauseDb, var_count: usize) -> (Vec<Vec<ClauseRef>>, Vec<Vec<ClauseRef>>) {
    let mut pos = vec![Vec::new(); var_count];
    let mut neg = vec![Vec::new(); var_count];
    for cref in db.iter_all() {
        for &lit in db.lits(cref) {
            if lit.is_positive() {
                pos[lit.index()].push(cref);
            } else {
                neg[lit.index()].push(cref);
            }
        }
    }
    (pos, neg)
}

fn is_tautological(lits: &[Lit]) -> bool {
    let set: FxHashSet<Lit> = lits.iter().copied().collect();
    lits.iter().any(|&l| set.contains(&!l))
}

/// Drops any resolvent that is a (non-strict) superset of another resolvent
/// in the same set: the smaller clause already subsumes it, so keeping both
/// only bloats the simplified formula.
fn drop_subsumed(resolvents: Vec<Vec<Lit>>) -> Vec<Vec<Lit>> {
    let sets: Vec<FxHashSet<Lit>> = resolvents
        .iter()
        .map(|c| c.iter().copied().collect())
        .collect();

    resolvents
        .iter()
        .enumerate()
        .filter(|&(i, clause)| {
            !sets.iter().enumerate().any(|(j, other)| {
                j != i && (other.len() < clause.len() || (other.len() == clause.len() && j < i))
                    && other.iter().all(|l| sets[i].contains(l))
            })
        })
        .map(|(_, clause)| clause.clone())
        .collect()
}

fn resolve(pos_clause: &[Lit], neg_clause: &[Lit], var: Var) -> Vec<Lit> {
    let mut out: Vec<Lit> = pos_clause
        .iter()
        .copied()
        .filter(|l| l.var() != var)
        .collect();
    for &lit in neg_clause {
        if lit.var() != var && !out.contains(&lit) {
            out.push(lit);
        }
    }
    out
}

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

/// Removes `to_remove` and adds `to_add` in their place. Returns `true` if a
/// resolvent in `to_add` forced a unit that, once enqueued and propagated,
/// conflicted — meaning the formula is unsatisfiable.
fn remove_and_add(
    trail: &mut Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    to_remove: &[ClauseRef],
    to_add: &[Vec<Lit>],
) -> bool {
    for &cref in to_remove {
        let lits = db.lits(cref).to_vec();
        unwatch(watchlists, &lits, cref);
        db.remove_clause(cref);
    }
    for lits in to_add {
        let cref = db.add_original_clause(lits);
        match lits.len() {
            0 => return true,
            1 => {
                let unit = lits[0];
                if trail.assignment().lit_is_false(unit) {
                    return true;
                }
                if trail.assignment().lit_is_unknown(unit) {
                    trail.enqueue(unit, Reason::Decision);
                }
                if propagate(trail, watchlists, db).is_err() {
                    return true;
                }
            }
            _ => watchlists.watch_clause(cref, [lits[0], lits[1]]),
        }
    }
    false
}

/// Runs bounded variable elimination over every unassigned variable whose
/// elimination cost (`|pos|*|neg| - |pos| - |neg|`) is at or below
/// `cost_threshold`, up to `candidate_budget` attempts. `max_resolvent_size`
/// bounds how large a single resolvent clause may grow before the
/// elimination is abandoned.
pub fn run(
    trail: &mut Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    var_count: usize,
    max_resolvent_size: usize,
    cost_threshold: isize,
    candidate_budget: usize,
) -> BveResult {
    let (pos, neg) = occurrences(db, var_count);

    let mut candidates: Vec<(Var, i64)> = (0..var_count)
        .map(Var::from_index)
        .filter(|&var| trail.assignment().var_value(var).is_none())
        .map(|var| {
            let p = pos[var.index()].len() as i64;
            let n = neg[var.index()].len() as i64;
            (var, p * n - p - n)
        })
        .filter(|&(_, cost)| cost <= cost_threshold as i64)
        .collect();
    candidates.sort_by_key(|&(_, cost)| cost);

    let mut result = BveResult::default();
    let mut eliminated: FxHashSet<Var> = FxHashSet::default();

    for (var, _cost) in candidates.into_iter().take(candidate_budget) {
        if eliminated.contains(&var) {
            continue;
        }
        let pos_crefs: Vec<ClauseRef> = pos[var.index()]
            .iter()
            .copied()
            .filter(|&c| !db.is_deleted(c))
            .collect();
        let neg_crefs: Vec<ClauseRef> = neg[var.index()]
            .iter()
            .copied()
            .filter(|&c| !db.is_deleted(c))
            .collect();

        if pos_crefs.is_empty() && neg_crefs.is_empty() {
            continue;
        }
        if pos_crefs
            .iter()
            .chain(neg_crefs.iter())
            .any(|&c| is_locked(trail, db, c))
        {
            // Eliminating var would remove a clause another literal still
            // depends on as its propagation reason; skip this candidate.
            continue;
        }

        // Pure literal: only one polarity occurs, so the whole clause set
        // using it can be dropped and the variable fixed.
        if neg_crefs.is_empty() {
            remove_and_add(trail, db, watchlists, &pos_crefs, &[]);
            eliminated.insert(var);
            result.eliminated.push(EliminatedVar {
                var,
                forced: Some(true),
                pos_rest: Vec::new(),
                neg_rest: Vec::new(),
            });
            continue;
        }
        if pos_crefs.is_empty() {
            remove_and_add(trail, db, watchlists, &neg_crefs, &[]);
            eliminated.insert(var);
            result.eliminated.push(EliminatedVar {
                var,
                forced: Some(false),
                pos_rest: Vec::new(),
                neg_rest: Vec::new(),
            });
            continue;
        }

        let pos_lits: Vec<Vec<Lit>> = pos_crefs.iter().map(|&c| db.lits(c).to_vec()).collect();
        let neg_lits: Vec<Vec<Lit>> = neg_crefs.iter().map(|&c| db.lits(c).to_vec()).collect();

        let mut resolvents = Vec::new();
        let mut too_large = false;
        for p in &pos_lits {
            for n in &neg_lits {
                let resolvent = resolve(p, n, var);
                if resolvent.len() > max_resolvent_size {
                    too_large = true;
                    break;
                }
                if !is_tautological(&resolvent) {
                    resolvents.push(resolvent);
                }
            }
            if too_large {
                break;
            }
        }
        if too_large {
            continue;
        }
        let resolvents = drop_subsumed(resolvents);

        let mut to_remove = pos_crefs.clone();
        to_remove.extend(neg_crefs.iter().copied());
        let conflict = remove_and_add(trail, db, watchlists, &to_remove, &resolvents);

        eliminated.insert(var);
        result.eliminated.push(EliminatedVar {
            var,
            forced: None,
            pos_rest: pos_lits
                .into_iter()
                .map(|c| c.into_iter().filter(|l| l.var() != var).collect())
                .collect(),
            neg_rest: neg_lits
                .into_iter()
                .map(|c| c.into_iter().filter(|l| l.var() != var).collect())
                .collect(),
        });

        if conflict {
            result.contradiction = true;
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn eliminates_variable_with_single_resolvent() {
        let (mut trail, mut watchlists, mut db) = setup(3);
        // (x v a), (~x v b): resolving on x gives (a v b).
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(2, true)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(2, true)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 3, 10, 10, 10);
        assert_eq!(result.eliminated.len(), 1);
        assert_eq!(result.eliminated[0].var, Var::from_index(0));

        let remaining: Vec<Vec<Lit>> = db.iter_all().map(|c| db.lits(c).to_vec()).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].len(), 2);
    }

    #[test]
    fn tautological_resolvent_is_dropped_not_kept() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // (x v a), (~x v ~a): resolving gives (a v ~a), a tautology, so no
        // clause should be added, only the originals removed.
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, false)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, false)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 2, 10, 10, 10);
        assert_eq!(result.eliminated.len(), 1);
        assert_eq!(db.iter_all().count(), 0);
    }

    #[test]
    fn pure_literal_is_eliminated_without_resolvents() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 2, 10, 10, 10);
        assert_eq!(result.eliminated.len(), 1);
        assert_eq!(db.iter_all().count(), 0);
    }

    #[test]
    fn pure_negative_literal_reconstructs_to_false() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // x occurs only negatively; eliminating it must fix it to false, not
        // true, since true would falsify (~x v a) whenever a is false.
        let c1 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, false), lit(1, true)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 2, 10, 10, 10);
        assert_eq!(result.eliminated.len(), 1);
        assert!(!result.eliminated[0].reconstruct(|_| false));
    }

    #[test]
    fn unit_resolvent_is_propagated_not_left_unwatched() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // (x v a), (~x v a): resolving on x gives the unit (a), which must
        // end up asserted on the trail, not just sitting in the database.
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, true)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 2, 10, 10, 10);
        assert_eq!(result.eliminated.len(), 1);
        assert!(!result.contradiction);
        assert!(trail.assignment().lit_is_true(lit(1, true)));
    }

    #[test]
    fn resolvent_conflicting_with_existing_unit_is_unsat() {
        let (mut trail, mut watchlists, mut db) = setup(2);
        // a is already forced false; (x v a), (~x v a) resolve to the unit
        // (a), which now conflicts with the trail.
        trail.enqueue(lit(1, false), crate::trail::Reason::Decision);
        let c1 = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        watchlists.watch_clause(c1, [lit(0, true), lit(1, true)]);
        let c2 = db.add_original_clause(&[lit(0, false), lit(1, true)]);
        watchlists.watch_clause(c2, [lit(0, false), lit(1, true)]);

        let result = run(&mut trail, &mut db, &mut watchlists, 2, 10, 10, 10);
        assert!(result.contradiction);
    }
}

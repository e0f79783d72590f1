//! Promotion out of the `Recent` protection tier and LBD/activity-aware
//! deletion of learned clauses.
//!
//! Grounded in the teacher's `clause::reduce` (`reduce_locals`/`reduce_mids`
//! sort-and-drop-half scheme), generalized per the spec: this crate's
//! `Recent` tier (the teacher has no direct equivalent; closest is its
//! un-aged `Local` tier) ages clauses by conflict count before handing them
//! to their permanent tier, and threshold selection is adaptive on median
//! activity rather than the teacher's fixed "delete half" rule.

use satcore_formula::lit::Lit;

use crate::clause::activity::median_activity;
use crate::clause::db::ClauseDb;
use crate::clause::{ClauseRef, Tier};
use crate::config::SolverConfig;
use crate::stats::SolverStatistics;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// A clause is locked when it is the current propagation reason for an
/// assigned trail literal: deleting it would leave that literal's
/// `Reason::Propagated` dangling, and conflict analysis walking back through
/// it later would index into a tombstoned clause's emptied literal vector.
/// The propagated literal is always stored at index 0 (see
/// `Trail::enqueue`'s callers), so checking it is enough.
fn is_locked(trail: &Trail, db: &ClauseDb, cref: ClauseRef) -> bool {
    let lits = db.lits(cref);
    if lits.is_empty() {
        return false;
    }
    let var = lits[0].var();
    trail.assignment().var_value(var).is_some() && trail.reason_of(var) == Reason::Propagated(cref)
}

/// Unwatches and tombstones a learned clause, keeping the watchlists and the
/// database's tier accounting consistent.
fn unwatch_and_delete(db: &mut ClauseDb, watchlists: &mut Watchlists, cref: ClauseRef) {
    let lits = db.lits(cref);
    if lits.len() >= 2 {
        let (a, b) = (lits[0], lits[1]);
        remove_watch(watchlists, !a, cref);
        remove_watch(watchlists, !b, cref);
    }
    db.delete_clause(cref);
}

fn remove_watch(watchlists: &mut Watchlists, lit: Lit, cref: ClauseRef) {
    let watches = watchlists.take(lit);
    let kept: Vec<_> = watches.into_iter().filter(|w| w.cref != cref).collect();
    watchlists.restore(lit, kept);
}

/// Moves every `Recent`-tier clause old enough (per
/// `config.recent_protection_age`) into its permanent tier, determined by
/// the LBD it was learned with.
pub fn promote_recent(db: &mut ClauseDb, config: &SolverConfig, current_conflict_count: u64) {
    let candidates: Vec<ClauseRef> = db.iter_tier(Tier::Recent).collect();
    for cref in candidates {
        if db.age(cref, current_conflict_count) >= config.recent_protection_age {
            let lbd = db.arena().header(cref).lbd();
            db.set_tier(cref, Tier::for_lbd(lbd));
        }
    }
}

/// Runs a reduction pass if the learned-clause database has grown past
/// `config.max_learned`: promotes aged `Recent` clauses first, then deletes
/// local-tier clauses by an activity/size threshold and mid-tier clauses by
/// a stricter activity threshold, until the total is back under the target.
///
/// Never touches originals, unit clauses, the `Core` (glue) tier, or a
/// clause currently locked as some trail literal's propagation reason.
pub fn reduce_if_needed(
    trail: &Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    config: &SolverConfig,
    stats: &mut SolverStatistics,
    current_conflict_count: u64,
) {
    promote_recent(db, config, current_conflict_count);

    if db.total_learned() <= config.max_learned {
        return;
    }

    let target = config.max_learned * 3 / 4;
    let mut deleted = 0u64;

    deleted += reduce_local(trail, db, watchlists, config, target, current_conflict_count);
    if db.total_learned() > target {
        deleted += reduce_mid(trail, db, watchlists, config, target, current_conflict_count);
    }

    stats.record_deleted_clauses(deleted);
    db.compact_tier_lists();
}

/// Local-tier clauses are deleted aggressively: anything whose activity is
/// below the tier's median, or whose length exceeds
/// `config.local_size_threshold`, is dropped first (longest/least-active
/// first), until the database is back at `target` or the tier is exhausted.
fn reduce_local(
    trail: &Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    config: &SolverConfig,
    target: usize,
    current_conflict_count: u64,
) -> u64 {
    let threshold = median_activity(db, Tier::Local).unwrap_or(0.0);
    let mut candidates: Vec<ClauseRef> = db
        .iter_tier(Tier::Local)
        .filter(|&cref| db.age(cref, current_conflict_count) > 0)
        .filter(|&cref| !is_locked(trail, db, cref))
        .filter(|&cref| {
            let header = db.arena().header(cref);
            header.activity() < threshold || db.lits(cref).len() > config.local_size_threshold
        })
        .collect();
    candidates.sort_by(|&a, &b| {
        db.lits(a)
            .len()
            .cmp(&db.lits(b).len())
            .then(
                db.arena()
                    .header(a)
                    .activity()
                    .partial_cmp(&db.arena().header(b).activity())
                    .unwrap(),
            )
            .reverse()
    });

    let mut deleted = 0u64;
    for cref in candidates {
        if db.total_learned() <= target {
            break;
        }
        unwatch_and_delete(db, watchlists, cref);
        deleted += 1;
    }
    deleted
}

/// Mid-tier clauses are deleted more carefully: only those with activity
/// below a threshold set somewhat above the local one (scaled by the
/// glue-clause proportion: a formula leaning heavily on glue clauses gets a
/// higher keep-ratio, i.e. a lower mid-tier deletion threshold).
fn reduce_mid(
    trail: &Trail,
    db: &mut ClauseDb,
    watchlists: &mut Watchlists,
    _config: &SolverConfig,
    target: usize,
    current_conflict_count: u64,
) -> u64 {
    let median = median_activity(db, Tier::Mid).unwrap_or(0.0);
    let glue_ratio = if db.total_learned() == 0 {
        0.0
    } else {
        db.count_by_tier(Tier::Core) as f32 / db.total_learned() as f32
    };
    // A high glue proportion signals the search is learning good clauses
    // broadly, so keep more of the mid tier (raise the bar to delete).
    let threshold = median * (1.0 - glue_ratio.min(0.9));

    let mut candidates: Vec<ClauseRef> = db
        .iter_tier(Tier::Mid)
        .filter(|&cref| db.age(cref, current_conflict_count) > 0)
        .filter(|&cref| !is_locked(trail, db, cref))
        .filter(|&cref| db.arena().header(cref).activity() < threshold)
        .collect();
    candidates.sort_by(|&a, &b| {
        db.arena()
            .header(a)
            .activity()
            .partial_cmp(&db.arena().header(b).activity())
            .unwrap()
    });

    let mut deleted = 0u64;
    for cref in candidates {
        if db.total_learned() <= target {
            break;
        }
        unwatch_and_delete(db, watchlists, cref);
        deleted += 1;
    }
    deleted
}

//! Lazy/chronological backtracking and ILB reimplication.
//!
//! The teacher backtracks unconditionally to the analysis-chosen level via
//! `prop::assignment::backtrack` (see [`crate::trail::Trail::backtrack_to`],
//! adapted from it directly). The two optimization paths below — stepwise
//! chronological backtracking and reimplication — are additions with no
//! teacher counterpart; they are gated to only apply when the jump is
//! shallow and are never required for correctness (the standard path is
//! always a safe fallback), per the performance-optimization framing of this
//! module's target behavior.

use satcore_formula::lit::Var;

use crate::clause::db::ClauseDb;
use crate::propagate::propagate;
use crate::stats::SolverStatistics;
use crate::trail::{Reason, Trail};
use crate::watch::Watchlists;

/// Tracks the adaptive chronological-backtracking threshold and its recent
/// success rate.
pub struct BacktrackPolicy {
    threshold: usize,
    recent_outcomes: Vec<bool>,
    reimplication_success_ratio: f64,
}

impl BacktrackPolicy {
    pub fn new(config: &crate::config::SolverConfig) -> BacktrackPolicy {
        BacktrackPolicy {
            threshold: config.chronological_threshold,
            recent_outcomes: Vec::new(),
            reimplication_success_ratio: config.reimplication_success_ratio,
        }
    }

    fn record_outcome(&mut self, success: bool) {
        self.recent_outcomes.push(success);
        if self.recent_outcomes.len() > 100 {
            self.recent_outcomes.remove(0);
        }

        let successes = self.recent_outcomes.iter().filter(|&&ok| ok).count();
        let rate = successes as f64 / self.recent_outcomes.len() as f64;

        if rate < 0.5 && self.threshold > 1 {
            self.threshold -= 1;
        } else if rate > 0.8 {
            self.threshold += 1;
        }
    }

    /// Backjumps from the current decision level to `target_level`,
    /// choosing between the standard path and, when the jump is shallow
    /// enough, one of the two optimization paths. Always leaves the trail
    /// in a state consistent with `target_level`.
    pub fn backjump(
        &mut self,
        trail: &mut Trail,
        watchlists: &mut Watchlists,
        db: &mut ClauseDb,
        heuristic_make_available: impl FnMut(Var),
        target_level: usize,
        stats: &mut SolverStatistics,
    ) {
        let current = trail.current_level();
        let gap = current.saturating_sub(target_level);

        if gap == 0 || gap > self.threshold {
            trail.backtrack_to(target_level, heuristic_make_available);
            return;
        }

        stats.chronological_attempts += 1;

        if self.try_reimplication(trail, watchlists, db, heuristic_make_available, target_level, stats) {
            return;
        }

        // Fall back to the standard path; the trail may already have been
        // partially rewound by a failed reimplication attempt above, so
        // this is still correct (backtrack_to is idempotent past the target
        // level).
        trail.backtrack_to(target_level, |_| {});
        self.record_outcome(false);
        stats.lazy_backtracks += 1;
    }

    /// Reimplication (ILB): unassigns everything above `target_level`,
    /// re-decides the literals that were originally decisions in that range
    /// (in their original order, propagating after each one), and checks
    /// whether most of the previously implied literals above `target_level`
    /// re-emerge. Succeeds (and leaves the trail re-propagated) when at
    /// least `reimplication_success_ratio` of them are re-derived; otherwise
    /// the caller falls back to a standard backtrack.
    fn try_reimplication(
        &mut self,
        trail: &mut Trail,
        watchlists: &mut Watchlists,
        db: &mut ClauseDb,
        heuristic_make_available: impl FnMut(Var),
        target_level: usize,
        stats: &mut SolverStatistics,
    ) -> bool {
        let prior_implied: Vec<_> = trail
            .trail()
            .iter()
            .filter(|lit| trail.level_of(lit.var()) > target_level)
            .copied()
            .collect();
        let prior_count = prior_implied.len();
        if prior_count == 0 {
            return false;
        }

        let prior_decisions: Vec<_> = prior_implied
            .iter()
            .filter(|&&lit| trail.reason_of(lit.var()) == Reason::Decision)
            .copied()
            .collect();

        trail.backtrack_to(target_level, heuristic_make_available);

        for lit in prior_decisions {
            if !trail.assignment().lit_is_unknown(lit) {
                continue;
            }
            trail.new_decision_level();
            trail.enqueue(lit, Reason::Decision);
            if propagate(trail, watchlists, db).is_err() {
                return false;
            }
        }

        let re_derived = prior_implied
            .iter()
            .filter(|&&lit| trail.assignment().lit_is_true(lit))
            .count();

        let ratio = re_derived as f64 / prior_count as f64;
        if ratio >= self.reimplication_success_ratio {
            stats.reimplication_successes += 1;
            stats.chronological_successes += 1;
            self.record_outcome(true);
            true
        } else {
            false
        }
    }
}

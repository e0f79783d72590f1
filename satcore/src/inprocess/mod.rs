//! Inprocessing: periodic decision-level-0 simplification passes.
//!
//! No teacher counterpart (varisat's `simplify.rs` only removes satisfied
//! clauses and fixed literals at level 0); grounded in spec §4.7's four-phase
//! pipeline. Each phase only ever runs at decision level 0 and only ever
//! shrinks or removes clauses, so it is always safe to call between conflicts
//! as long as the trail is backtracked to level 0 first.

pub mod bve;
pub mod probe;
pub mod subsume;
pub mod vivify;

use satcore_formula::lit::{Lit, Var};

use crate::clause::db::ClauseDb;
use crate::config::SolverConfig;
use crate::heuristic::DecisionHeuristic;
use crate::stats::SolverStatistics;
use crate::trail::Trail;
use crate::watch::Watchlists;

/// Gates how often a full inprocessing round runs: the gap between rounds
/// grows when the previous round found little to simplify, and shrinks when
/// it was effective, so a formula that has already been fully simplified
/// isn't rescanned every few thousand conflicts for nothing.
#[derive(Default)]
pub struct InprocessGate {
    last_run_at: u64,
    next_gap: u64,
}

impl InprocessGate {
    pub fn new(config: &SolverConfig) -> InprocessGate {
        InprocessGate {
            last_run_at: 0,
            next_gap: config.inprocess_gap,
        }
    }

    pub fn should_run(&self, conflict_count: u64) -> bool {
        conflict_count.saturating_sub(self.last_run_at) >= self.next_gap
    }

    /// Updates the gate after a round, widening the gap when nothing changed
    /// and tightening it back to the configured baseline otherwise.
    fn record_round(&mut self, config: &SolverConfig, conflict_count: u64, changes: usize) {
        self.last_run_at = conflict_count;
        self.next_gap = if changes == 0 {
            (self.next_gap * 2).min(config.inprocess_gap * 8)
        } else {
            config.inprocess_gap
        };
    }
}

/// Eliminated-variable witnesses accumulated across every BVE round, needed
/// to extend a satisfying assignment of the simplified formula back to the
/// original variable set.
#[derive(Default)]
pub struct EliminationWitness {
    pub eliminated: Vec<bve::EliminatedVar>,
}

impl EliminationWitness {
    /// Extends `value_of` (answering for every surviving variable) with a
    /// value for every eliminated one, processing witnesses in reverse
    /// elimination order since later eliminations may reference variables
    /// eliminated earlier only through clauses already folded away.
    pub fn reconstruct(&self, mut value_of: impl FnMut(Var) -> Option<bool>) -> Vec<(Var, bool)> {
        let mut out = Vec::new();
        for witness in self.eliminated.iter().rev() {
            let get = |lit: Lit| -> bool {
                value_of(lit.var())
                    .map(|v| v ^ lit.is_negative())
                    .unwrap_or(false)
            };
            let value = witness.reconstruct(get);
            out.push((witness.var, value));
        }
        out
    }
}

/// Outcome of one inprocessing round.
#[derive(Default)]
pub struct InprocessResult {
    pub changes: usize,
    /// Set if any phase discovered, during its own propagation, that the
    /// formula is unsatisfiable at level 0.
    pub contradiction: bool,
}

/// Runs one full inprocessing round, gated by `gate`: vivification,
/// subsumption, bounded variable elimination, and failed-literal probing,
/// each additionally gated by its own `SolverConfig` toggle. A no-op (and no
/// change to `gate`'s schedule) if the gate isn't due yet. Must be called
/// with `trail` at decision level 0. Rebuilds nothing beyond watchlists
/// (already kept consistent by each phase); re-bumps heuristic activity for
/// every literal still in the formula afterward, a cheap way to keep
/// variables touched by any phase from looking stale to the decision
/// heuristic. Stops early, with `contradiction` set, the moment any phase
/// proves unsatisfiability.
pub fn run(
    gate: &mut InprocessGate,
    trail: &mut Trail,
    watchlists: &mut Watchlists,
    db: &mut ClauseDb,
    heuristic: &mut DecisionHeuristic,
    witness: &mut EliminationWitness,
    config: &SolverConfig,
    stats: &mut SolverStatistics,
    conflict_count: u64,
    var_count: usize,
) -> InprocessResult {
    if !gate.should_run(conflict_count) {
        return InprocessResult::default();
    }
    debug_assert_eq!(trail.current_level(), 0);
    let mut result = InprocessResult::default();

    if config.vivification_enabled {
        let vivify_result = vivify::run(trail, watchlists, db, usize::MAX);
        result.changes += vivify_result.strengthened;
        result.contradiction |= vivify_result.contradiction;
    }

    if !result.contradiction && config.subsumption_enabled {
        let subsume_result = subsume::run(trail, db, watchlists, usize::MAX);
        result.changes += subsume_result.subsumed + subsume_result.strengthened;
        result.contradiction |= subsume_result.contradiction;
    }

    if !result.contradiction && config.bve_enabled {
        let bve_result = bve::run(
            trail,
            db,
            watchlists,
            var_count,
            config.bve_max_resolvent_size,
            config.bve_cost_threshold,
            var_count,
        );
        stats.variables_eliminated += bve_result.eliminated.len() as u64;
        result.changes += bve_result.eliminated.len();
        result.contradiction |= bve_result.contradiction;
        witness.eliminated.extend(bve_result.eliminated);
    }

    if !result.contradiction && config.probing_enabled {
        let candidates: Vec<Lit> = (0..var_count)
            .map(Var::from_index)
            .filter(|&var| trail.assignment().var_value(var).is_none())
            .map(|var| var.lit(true))
            .collect();
        let probe_result = probe::run(
            trail,
            watchlists,
            db,
            &candidates,
            config.probing_double,
            var_count,
        );
        result.changes += probe_result.units_found + probe_result.hyper_binaries_learned;
        result.contradiction |= probe_result.contradiction;
    }

    for cref in db.iter_all() {
        for &lit in db.lits(cref) {
            heuristic.bump(lit.var());
        }
    }

    stats.inprocess_runs += 1;
    stats.clauses_reduced += result.changes as u64;
    gate.record_round(config, conflict_count, result.changes);
    result
}

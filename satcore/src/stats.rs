//! Solving statistics, reported to the caller alongside every result.

use rustc_hash::FxHashMap;

/// Counters and running averages accumulated over the lifetime of a solver
/// instance. Cheap to update (plain integer/float fields, no locking) since
/// they are touched on the hot path of propagation and conflict analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStatistics {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub restarts: u64,

    pub learned_clauses: u64,
    pub deleted_clauses: u64,
    pub glue_clauses: u64,
    pub avg_lbd: f64,
    pub lbd_distribution: FxHashMap<u32, u64>,

    pub inprocess_runs: u64,
    pub clauses_reduced: u64,
    pub variables_eliminated: u64,
    pub inprocessing_time_ns: u64,

    pub lazy_backtracks: u64,
    pub reimplication_successes: u64,
    pub chronological_attempts: u64,
    pub chronological_successes: u64,

    pub time_elapsed_ns: u64,
}

impl SolverStatistics {
    pub fn new() -> SolverStatistics {
        SolverStatistics::default()
    }

    /// Folds a freshly learned clause's glue (LBD) value into the running
    /// average and the per-value distribution histogram.
    pub fn record_learned_clause(&mut self, lbd: u32, is_glue: bool) {
        self.learned_clauses += 1;
        if is_glue {
            self.glue_clauses += 1;
        }
        *self.lbd_distribution.entry(lbd).or_insert(0) += 1;

        let n = self.learned_clauses as f64;
        self.avg_lbd += (f64::from(lbd) - self.avg_lbd) / n;
    }

    pub fn record_deleted_clauses(&mut self, count: u64) {
        self.deleted_clauses += count;
    }
}

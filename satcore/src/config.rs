//! Solver configuration.
//!
//! All tunables live on a single [`SolverConfig`] passed in at construction,
//! following the teacher workspace's `varisat::config::SolverConfig` pattern
//! of one flat struct with every default documented inline — but without a
//! `DocDefault`-style derive macro, since this crate has no proc-macro
//! dependency of its own.

use std::time::Duration;

/// Configurable parameters used during solving.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Weight of the VSIDS term in the combined decision score. (Default: 0.7)
    pub vsids_weight: f32,
    /// Weight of the LRB term in the combined decision score. (Default: 0.3)
    pub lrb_weight: f32,
    /// Multiplicative decay for the VSIDS decision heuristic. (Default: 0.95)
    pub vsids_decay: f32,
    /// Multiplicative decay for the LRB decision heuristic. (Default: 0.8)
    pub lrb_decay: f32,
    /// Conflict age, in conflicts, after which a variable's aging factor
    /// starts shrinking its score. (Default: 100)
    pub aging_grace_period: u64,
    /// Time constant of the aging exponential decay, in conflicts. (Default: 1000)
    pub aging_time_constant: f64,
    /// Number of conflicts between adaptive decay retuning passes. (Default: 1000)
    pub decay_adapt_interval: u64,
    /// Bounds the VSIDS/LRB decay may be adapted into. (Default: (0.8, 0.99))
    pub decay_adapt_bounds: (f32, f32),

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_activity_decay: f32,

    /// Base unit (in conflicts) for the Luby restart schedule. (Default: 100)
    pub luby_base_unit: u64,
    /// Minimum number of restarts before the Glucose adaptive trigger is
    /// allowed to fire. (Default: 10)
    pub glucose_min_restarts: u64,
    /// Smoothing factor for the fast (short-window) conflict EMA. (Default: 0.1)
    pub glucose_fast_alpha: f64,
    /// Smoothing factor for the slow (long-window) conflict EMA. (Default: 0.01)
    pub glucose_slow_alpha: f64,
    /// Initial Glucose adaptive restart threshold τ. (Default: 1.4)
    pub glucose_threshold: f64,
    /// Number of restarts between τ retuning passes. (Default: 10)
    pub glucose_tau_adapt_interval: u64,

    /// Maximum number of learned clauses before a reduction pass runs. (Default: 2000)
    pub max_learned: usize,
    /// Number of conflicts a newly learned clause spends in the `recent`
    /// protection tier before being promoted to its permanent tier. (Default: 1000)
    pub recent_protection_age: u64,
    /// Clause length above which a local-tier clause is eligible for
    /// deletion regardless of activity. (Default: 30)
    pub local_size_threshold: usize,

    /// Number of conflicts since the last inprocessing run, scaled by
    /// formula size, that must elapse before the gate fires again. (Default: 4000)
    pub inprocess_gap: u64,
    pub vivification_enabled: bool,
    pub subsumption_enabled: bool,
    pub bve_enabled: bool,
    pub probing_enabled: bool,
    /// Maximum resolvent size kept by bounded variable elimination. (Default: 16)
    pub bve_max_resolvent_size: usize,
    /// Elimination-cost ceiling below which a BVE candidate is accepted. (Default: 12)
    pub bve_cost_threshold: isize,
    /// Whether failed-literal probing probes both polarities of a candidate. (Default: false)
    pub probing_double: bool,
    /// Per-round time budget for a single inprocessing phase. (Default: 500ms)
    pub inprocess_round_budget: Duration,

    /// Whether the XOR/Gauss-Jordan extension is enabled at all. (Default: true)
    pub xor_enabled: bool,
    /// Minimum XOR clause arity considered by Gaussian elimination. (Default: 3)
    pub xor_min_arity: usize,
    /// Maximum XOR clause arity considered by Gaussian elimination. (Default: 20)
    pub xor_max_arity: usize,
    /// Number of conflicts between Gaussian elimination runs. (Default: 5000)
    pub gauss_run_interval: u64,
    /// Minimum number of runs before the auto-disable heuristic is consulted. (Default: 5)
    pub gauss_min_runs_before_disable: u64,

    /// Decision level difference below which chronological/ILB backtracking
    /// may be used instead of a full backjump. (Default: 100)
    pub chronological_threshold: usize,
    /// Fraction of prior implications that must re-emerge for a
    /// reimplication (ILB) backtrack to be considered successful. (Default: 0.8)
    pub reimplication_success_ratio: f64,

    /// Hard ceiling on the number of conflicts a single `solve` call may use. (Default: 10_000_000)
    pub conflict_budget: u64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            vsids_weight: 0.7,
            lrb_weight: 0.3,
            vsids_decay: 0.95,
            lrb_decay: 0.8,
            aging_grace_period: 100,
            aging_time_constant: 1000.0,
            decay_adapt_interval: 1000,
            decay_adapt_bounds: (0.8, 0.99),

            clause_activity_decay: 0.999,

            luby_base_unit: 100,
            glucose_min_restarts: 10,
            glucose_fast_alpha: 0.1,
            glucose_slow_alpha: 0.01,
            glucose_threshold: 1.4,
            glucose_tau_adapt_interval: 10,

            max_learned: 2000,
            recent_protection_age: 1000,
            local_size_threshold: 30,

            inprocess_gap: 4000,
            vivification_enabled: true,
            subsumption_enabled: true,
            bve_enabled: true,
            probing_enabled: true,
            bve_max_resolvent_size: 16,
            bve_cost_threshold: 12,
            probing_double: false,
            inprocess_round_budget: Duration::from_millis(500),

            xor_enabled: true,
            xor_min_arity: 3,
            xor_max_arity: 20,
            gauss_run_interval: 5000,
            gauss_min_runs_before_disable: 5,

            chronological_threshold: 100,
            reimplication_success_ratio: 0.8,

            conflict_budget: 10_000_000,
        }
    }
}

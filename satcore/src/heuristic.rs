//! Combined VSIDS+LRB decision heuristic with polarity caching and aging.
//!
//! Grounded in the teacher's `decision::vsids::Vsids` for the bump/decay/
//! rescale-on-overflow scheme (here applied to the VSIDS term only), but the
//! teacher's binary heap is dropped: the combined score mixes VSIDS, an LRB
//! term, and a per-variable exponential aging factor that all move between
//! conflicts, which would require re-heapifying on every decision. Instead
//! [`DecisionHeuristic::pick`] does a linear scan over unassigned variables,
//! computing the combined score directly.

use satcore_formula::lit::{Lit, Var};

use crate::config::SolverConfig;

fn rescale_limit() -> f32 {
    f32::MAX / 1e30
}

/// Per-variable decision state plus the heuristic's global tuning knobs.
pub struct DecisionHeuristic {
    vsids_activity: Vec<f32>,
    lrb_score: Vec<f32>,
    polarity_score: Vec<f32>,
    /// `Some(sign)` once a phase has been recorded for a variable (true =
    /// the variable was positive when it last participated in a conflict).
    phase_cache: Vec<Option<bool>>,
    last_participated: Vec<u64>,

    available: Vec<bool>,

    vsids_bump: f32,
    vsids_inv_decay: f32,
    lrb_decay: f32,
    vsids_weight: f32,
    lrb_weight: f32,

    conflict_count: u64,
    aging_grace_period: u64,
    aging_time_constant: f64,

    decay_adapt_interval: u64,
    decay_adapt_bounds: (f32, f32),
    conflicts_since_decay_adapt: u64,
}

impl DecisionHeuristic {
    pub fn new(config: &SolverConfig, var_count: usize) -> DecisionHeuristic {
        let mut heuristic = DecisionHeuristic {
            vsids_activity: Vec::new(),
            lrb_score: Vec::new(),
            polarity_score: Vec::new(),
            phase_cache: Vec::new(),
            last_participated: Vec::new(),
            available: Vec::new(),

            vsids_bump: 1.0,
            vsids_inv_decay: 1.0 / config.vsids_decay,
            lrb_decay: config.lrb_decay,
            vsids_weight: config.vsids_weight,
            lrb_weight: config.lrb_weight,

            conflict_count: 0,
            aging_grace_period: config.aging_grace_period,
            aging_time_constant: config.aging_time_constant,

            decay_adapt_interval: config.decay_adapt_interval,
            decay_adapt_bounds: config.decay_adapt_bounds,
            conflicts_since_decay_adapt: 0,
        };
        heuristic.set_var_count(var_count);
        heuristic
    }

    pub fn set_var_count(&mut self, count: usize) {
        self.vsids_activity.resize(count, 0.0);
        self.lrb_score.resize(count, 0.0);
        self.polarity_score.resize(count, 0.0);
        self.phase_cache.resize(count, None);
        self.last_participated.resize(count, 0);
        self.available.resize(count, true);
    }

    pub fn make_available(&mut self, var: Var) {
        self.available[var.index()] = true;
    }

    pub fn make_unavailable(&mut self, var: Var) {
        self.available[var.index()] = false;
    }

    /// Bumps a variable's VSIDS activity; called once per literal touched
    /// during conflict analysis (conflict-clause literals and every
    /// resolved-upon reason literal), matching the teacher's `Vsids::bump`
    /// call sites in `analyze_conflict::add_literal`.
    pub fn bump(&mut self, var: Var) {
        let activity = &mut self.vsids_activity[var.index()];
        *activity += self.vsids_bump;
        if *activity >= rescale_limit() {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        let factor = 1.0 / rescale_limit();
        for activity in &mut self.vsids_activity {
            *activity *= factor;
        }
        self.vsids_bump *= factor;
    }

    /// Per-conflict update: decays the shared VSIDS bump value (equivalent
    /// to decaying every stored activity) and periodically retunes the
    /// decay factors based on mean activity.
    pub fn decay(&mut self) {
        self.vsids_bump *= self.vsids_inv_decay;
        if self.vsids_bump >= rescale_limit() {
            self.rescale();
        }

        self.conflicts_since_decay_adapt += 1;
        if self.conflicts_since_decay_adapt >= self.decay_adapt_interval {
            self.conflicts_since_decay_adapt = 0;
            self.adapt_decay();
        }
    }

    /// Records that `lit`'s variable took part in the current conflict:
    /// updates its LRB score, polarity score, phase cache, and
    /// last-participated conflict index. Must be called once per
    /// conflict-involved literal, after `bump`.
    pub fn record_participation(&mut self, lit: Lit, conflict_count: u64) {
        self.conflict_count = conflict_count;
        let index = lit.index();

        let lrb = &mut self.lrb_score[index];
        *lrb = self.lrb_decay * *lrb + (1.0 - self.lrb_decay);

        self.polarity_score[index] += if lit.is_positive() { 0.1 } else { -0.1 };
        self.phase_cache[index] = Some(lit.is_positive());
        self.last_participated[index] = conflict_count;
    }

    fn aging_factor(&self, var: Var) -> f64 {
        let age = self.conflict_count.saturating_sub(self.last_participated[var.index()]);
        if age > self.aging_grace_period {
            (-((age - self.aging_grace_period) as f64) / self.aging_time_constant).exp()
        } else {
            1.0
        }
    }

    fn combined_score(&self, var: Var) -> f64 {
        let index = var.index();
        let raw = f64::from(self.vsids_weight) * f64::from(self.vsids_activity[index])
            + f64::from(self.lrb_weight) * f64::from(self.lrb_score[index]);
        raw * self.aging_factor(var)
    }

    /// Picks the unassigned variable maximizing the combined VSIDS+LRB
    /// score (ties broken by lowest variable index), and the literal to
    /// assign it following the cached phase, falling back to the polarity
    /// score's sign, falling back to positive.
    pub fn pick(&self, var_value: impl Fn(Var) -> Option<bool>) -> Option<Lit> {
        let mut best: Option<(Var, f64)> = None;

        for index in 0..self.vsids_activity.len() {
            let var = Var::from_index(index);
            if !self.available[index] || var_value(var).is_some() {
                continue;
            }
            let score = self.combined_score(var);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((var, score)),
            }
        }

        best.map(|(var, _)| {
            let polarity = match self.phase_cache[var.index()] {
                Some(sign) => sign,
                None if self.polarity_score[var.index()] != 0.0 => {
                    self.polarity_score[var.index()] > 0.0
                }
                None => true,
            };
            var.lit(polarity)
        })
    }

    /// Every `decay_adapt_interval` conflicts, nudge the VSIDS decay within
    /// its configured bounds based on mean activity: a low mean activity
    /// (little recent conflict-driven signal) relaxes decay towards slower
    /// forgetting, a high one tightens it.
    fn adapt_decay(&mut self) {
        if self.vsids_activity.is_empty() {
            return;
        }
        let mean: f64 = self
            .vsids_activity
            .iter()
            .map(|&a| f64::from(a))
            .sum::<f64>()
            / self.vsids_activity.len() as f64;

        let (low, high) = self.decay_adapt_bounds;
        let current_decay = 1.0 / self.vsids_inv_decay;
        let next_decay = if mean > 1.0 {
            (current_decay - 0.01).max(low)
        } else {
            (current_decay + 0.01).min(high)
        };
        self.vsids_inv_decay = 1.0 / next_decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_variable_with_highest_combined_score() {
        let config = SolverConfig::default();
        let mut heuristic = DecisionHeuristic::new(&config, 3);
        heuristic.bump(Var::from_index(1));
        heuristic.bump(Var::from_index(1));
        heuristic.bump(Var::from_index(0));

        let picked = heuristic.pick(|_| None).unwrap();
        assert_eq!(picked.var(), Var::from_index(1));
    }

    #[test]
    fn skips_assigned_variables() {
        let config = SolverConfig::default();
        let heuristic = DecisionHeuristic::new(&config, 2);
        let picked = heuristic
            .pick(|var| if var == Var::from_index(0) { Some(true) } else { None })
            .unwrap();
        assert_eq!(picked.var(), Var::from_index(1));
    }

    #[test]
    fn phase_cache_overrides_default_polarity() {
        let config = SolverConfig::default();
        let mut heuristic = DecisionHeuristic::new(&config, 1);
        heuristic.record_participation(Var::from_index(0).negative(), 1);

        let picked = heuristic.pick(|_| None).unwrap();
        assert!(picked.is_negative());
    }

    #[test]
    fn aging_reduces_score_of_stale_variables() {
        let config = SolverConfig::default();
        let mut heuristic = DecisionHeuristic::new(&config, 1);
        heuristic.bump(Var::from_index(0));
        heuristic.last_participated[0] = 0;
        heuristic.conflict_count = 2000;

        assert!(heuristic.aging_factor(Var::from_index(0)) < 0.5);
    }
}

//! Restart policy: Luby sequence union'd with a Glucose-style adaptive
//! trigger.
//!
//! The Luby sequence itself is the teacher's `schedule::luby::LubySequence`
//! (Knuth 2012's "reluctant doubling" method, OEIS A182105) kept essentially
//! verbatim: it is a standard published algorithm, not something specific to
//! the teacher's design. Everything around it — the EMA-based Glucose
//! trigger, adaptive τ retuning — is new, grounded in spec-level restart
//! policy rather than in the teacher (whose restart policy is plain Luby,
//! see `schedule::schedule_step`).

/// Infinite iterator yielding the Luby sequence via reluctant doubling.
pub struct LubySequence {
    u: u64,
    v: u64,
}

impl Default for LubySequence {
    fn default() -> LubySequence {
        LubySequence { u: 1, v: 1 }
    }
}

impl LubySequence {
    pub fn advance(&mut self) -> u64 {
        let result = self.v;
        if (self.u & self.u.wrapping_neg()) == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v <<= 1;
        }
        result
    }
}

/// Tracks Luby scheduling state and the Glucose adaptive EMA trigger, and
/// decides when to restart.
pub struct RestartPolicy {
    base_unit: u64,
    luby: LubySequence,
    next_restart: u64,
    cumulative_conflicts: u64,

    restarts: u64,
    min_restarts: u64,

    fast_alpha: f64,
    slow_alpha: f64,
    fast_ema: f64,
    slow_ema: f64,
    conflicts_since_last_restart: u64,

    threshold: f64,
    tau_adapt_interval: u64,
    window: Vec<u64>,
}

impl RestartPolicy {
    pub fn new(config: &crate::config::SolverConfig) -> RestartPolicy {
        let mut luby = LubySequence::default();
        let next_restart = config.luby_base_unit * luby.advance();
        RestartPolicy {
            base_unit: config.luby_base_unit,
            luby,
            next_restart,
            cumulative_conflicts: 0,

            restarts: 0,
            min_restarts: config.glucose_min_restarts,

            fast_alpha: config.glucose_fast_alpha,
            slow_alpha: config.glucose_slow_alpha,
            fast_ema: 0.0,
            slow_ema: 0.0,
            conflicts_since_last_restart: 0,

            threshold: config.glucose_threshold,
            tau_adapt_interval: config.glucose_tau_adapt_interval,
            window: Vec::new(),
        }
    }

    /// Records one conflict, updating the EMAs used by the Glucose trigger.
    pub fn record_conflict(&mut self) {
        self.cumulative_conflicts += 1;
        self.conflicts_since_last_restart += 1;

        let sample = self.conflicts_since_last_restart as f64;
        self.fast_ema = self.fast_alpha * sample + (1.0 - self.fast_alpha) * self.fast_ema;
        self.slow_ema = self.slow_alpha * sample + (1.0 - self.slow_alpha) * self.slow_ema;
    }

    /// Whether a restart should happen now, evaluated at conflict-analysis
    /// boundaries (after each conflict is learned from).
    pub fn should_restart(&self) -> bool {
        let glucose_trigger = self.restarts > self.min_restarts
            && self.slow_ema > 0.0
            && self.fast_ema > self.threshold * self.slow_ema;
        let luby_trigger = self.next_restart <= self.cumulative_conflicts;
        glucose_trigger || luby_trigger
    }

    /// Call after a restart is performed: advances the Luby schedule and
    /// periodically retunes τ.
    pub fn on_restart(&mut self) {
        self.restarts += 1;
        self.next_restart += self.base_unit * self.luby.advance();

        self.window.push(self.conflicts_since_last_restart);
        self.conflicts_since_last_restart = 0;

        if self.window.len() as u64 >= self.tau_adapt_interval {
            let average: f64 =
                self.window.iter().map(|&c| c as f64).sum::<f64>() / self.window.len() as f64;
            if average > self.fast_ema {
                self.threshold *= 1.05;
            } else {
                self.threshold *= 0.95;
            }
            self.window.clear();
        }
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_sequence_matches_known_prefix() {
        let mut luby = LubySequence::default();
        let terms: Vec<_> = std::iter::repeat_with(|| luby.advance()).take(15).collect();
        assert_eq!(terms, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
    }

    #[test]
    fn luby_trigger_fires_once_base_schedule_elapses() {
        let config = crate::config::SolverConfig::default();
        let mut policy = RestartPolicy::new(&config);
        assert!(!policy.should_restart());
        for _ in 0..config.luby_base_unit {
            policy.record_conflict();
        }
        assert!(policy.should_restart());
    }

    #[test]
    fn glucose_trigger_requires_minimum_restarts() {
        let config = crate::config::SolverConfig::default();
        let mut policy = RestartPolicy::new(&config);
        policy.fast_ema = 1000.0;
        policy.slow_ema = 1.0;
        assert!(!policy.should_restart());
    }
}

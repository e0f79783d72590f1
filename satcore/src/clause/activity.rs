//! Clause activity bumping and decay.
//!
//! Follows the teacher's `clause::activity` scheme: a single global `bump`
//! value is added to a clause's activity whenever it participates in a
//! conflict, and is itself multiplied by `1 / decay` on every decay step so
//! that decaying all clauses at once is a single scalar update instead of a
//! pass over the whole database. When `bump` would overflow, every stored
//! activity (and `bump` itself) is rescaled back down.

use super::db::ClauseDb;
use super::{ClauseRef, Tier};

/// Tracks the shared bump/decay state for clause activities.
pub struct ClauseActivity {
    bump: f32,
    inv_decay: f32,
}

impl ClauseActivity {
    pub fn new(decay: f32) -> ClauseActivity {
        ClauseActivity {
            bump: 1.0,
            inv_decay: 1.0 / decay,
        }
    }

    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0 && decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }

    /// Increases a clause's activity by the current bump amount, rescaling
    /// everything if that would overflow.
    pub fn bump_clause(&mut self, db: &mut ClauseDb, cref: ClauseRef) {
        let activity = db.arena().header(cref).activity() + self.bump;
        db.arena_mut().header_mut(cref).set_activity(activity);

        if activity > rescale_limit() {
            self.rescale(db);
        }
    }

    /// Scales the shared bump amount up, implicitly decaying every stored
    /// activity relative to it.
    pub fn decay(&mut self, db: &mut ClauseDb) {
        self.bump *= self.inv_decay;
        if self.bump >= rescale_limit() {
            self.rescale(db);
        }
    }

    fn rescale(&mut self, db: &mut ClauseDb) {
        let factor = 1.0 / rescale_limit();
        db.for_each_learned_header_mut(|header| {
            let activity = header.activity() * factor;
            header.set_activity(activity);
        });
        self.bump *= factor;
    }
}

fn rescale_limit() -> f32 {
    f32::MAX / 16.0
}

/// Median clause activity among clauses currently in the given tier, used by
/// the reduction pass to pick an adaptive deletion threshold. Returns `None`
/// if the tier is empty.
pub fn median_activity(db: &ClauseDb, tier: Tier) -> Option<f32> {
    let mut activities: Vec<f32> = db
        .iter_tier(tier)
        .map(|cref| db.arena().header(cref).activity())
        .collect();
    if activities.is_empty() {
        return None;
    }
    activities.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Some(activities[activities.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_formula::lit::Var;

    fn lit(i: usize, polarity: bool) -> satcore_formula::lit::Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn bumping_increases_activity() {
        let mut db = ClauseDb::new();
        let mut activity = ClauseActivity::new(0.999);
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 0);

        assert_eq!(db.arena().header(cref).activity(), 0.0);
        activity.bump_clause(&mut db, cref);
        assert!(db.arena().header(cref).activity() > 0.0);
    }

    #[test]
    fn median_activity_is_none_for_empty_tier() {
        let db = ClauseDb::new();
        assert_eq!(median_activity(&db, Tier::Core), None);
    }

    #[test]
    fn median_activity_picks_middle_value() {
        let mut db = ClauseDb::new();
        let mut activity = ClauseActivity::new(0.999);
        for _ in 0..3 {
            let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 0);
            db.set_tier(cref, Tier::Core);
            activity.bump_clause(&mut db, cref);
        }
        assert!(median_activity(&db, Tier::Core).unwrap() > 0.0);
    }
}

//! The tiered database of long clauses.
//!
//! Mirrors the teacher's `clause::db::ClauseDb` partitioning of clauses into
//! tiers with delayed removal (a tier list may contain stale or deleted
//! `ClauseRef`s; callers must check `header().deleted()`), generalized from
//! the teacher's 4-tier `Irred/Core/Mid/Local` split to this crate's
//! `originals` (never deleted, never tiered) plus `Recent/Core/Mid/Local`
//! learned-clause tiers with an explicit protection age.

use rustc_hash::FxHashMap;

use satcore_formula::lit::Lit;

use super::{ClauseArena, ClauseRef, Tier};

/// Database of long clauses: original clauses (kept forever) plus the four
/// tiers of learned clauses.
#[derive(Default)]
pub struct ClauseDb {
    arena: ClauseArena,
    originals: Vec<ClauseRef>,
    by_tier: [Vec<ClauseRef>; 4],
    count_by_tier: [usize; 4],
    birth: FxHashMap<ClauseRef, u64>,
}

impl ClauseDb {
    pub fn new() -> ClauseDb {
        ClauseDb::default()
    }

    pub fn arena(&self) -> &ClauseArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ClauseArena {
        &mut self.arena
    }

    /// Applies `f` to the header of every non-deleted learned clause. Used
    /// by [`super::activity::ClauseActivity::rescale`] to rewrite every
    /// stored activity in one pass.
    pub fn for_each_learned_header_mut(&mut self, mut f: impl FnMut(&mut super::ClauseHeader)) {
        for tier_list in self.by_tier.iter() {
            for &cref in tier_list {
                if !self.arena.header(cref).deleted() {
                    f(self.arena.header_mut(cref));
                }
            }
        }
    }

    pub fn lits(&self, cref: ClauseRef) -> &[Lit] {
        self.arena.lits(cref)
    }

    pub fn is_deleted(&self, cref: ClauseRef) -> bool {
        self.arena.header(cref).deleted()
    }

    /// Adds a never-deleted original clause, outside the tiered population.
    pub fn add_original_clause(&mut self, lits: &[Lit]) -> ClauseRef {
        let cref = self.arena.add_original_clause(lits);
        self.originals.push(cref);
        cref
    }

    pub fn originals(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        self.originals
            .iter()
            .copied()
            .filter(move |&cref| !self.arena.header(cref).deleted())
    }

    /// Adds a learned clause, starting in the `Recent` protection tier.
    pub fn add_learned_clause(&mut self, lits: &[Lit], lbd: u32, conflict_count: u64) -> ClauseRef {
        let cref = self.arena.add_learned_clause(lits, lbd, conflict_count);
        self.by_tier[Tier::Recent as usize].push(cref);
        self.count_by_tier[Tier::Recent as usize] += 1;
        self.birth.insert(cref, conflict_count);
        cref
    }

    /// Moves a clause into a new tier. No-op if already there.
    pub fn set_tier(&mut self, cref: ClauseRef, tier: Tier) {
        let header = self.arena.header_mut(cref);
        let old_tier = header.tier();
        if old_tier == tier {
            return;
        }
        header.set_tier(tier);
        self.count_by_tier[old_tier as usize] -= 1;
        self.count_by_tier[tier as usize] += 1;
        self.by_tier[tier as usize].push(cref);
    }

    pub fn count_by_tier(&self, tier: Tier) -> usize {
        self.count_by_tier[tier as usize]
    }

    pub fn total_learned(&self) -> usize {
        (0..4).map(|t| self.count_by_tier[t]).sum()
    }

    /// Clauses in a given tier, skipping stale/deleted entries (see module
    /// docs: tier lists may contain duplicates or deleted clauses).
    pub fn iter_tier(&self, tier: Tier) -> impl Iterator<Item = ClauseRef> + '_ {
        self.by_tier[tier as usize]
            .iter()
            .copied()
            .filter(move |&cref| {
                let header = self.arena.header(cref);
                !header.deleted() && header.tier() == tier
            })
    }

    /// Conflicts elapsed since a clause entered the `Recent` tier.
    pub fn age(&self, cref: ClauseRef, current_conflict_count: u64) -> u64 {
        current_conflict_count.saturating_sub(self.birth.get(&cref).copied().unwrap_or(0))
    }

    pub fn delete_clause(&mut self, cref: ClauseRef) {
        let header = self.arena.header(cref);
        debug_assert!(!header.deleted(), "delete_clause on already deleted clause");
        let tier = header.tier();
        self.arena.delete(cref);
        self.count_by_tier[tier as usize] -= 1;
        self.birth.remove(&cref);
    }

    /// Periodically compacts each `by_tier` list, dropping stale/deleted
    /// entries so the lists don't grow without bound across many reduction
    /// passes. Unlike the teacher's `collect_garbage`, this never touches
    /// the literal storage itself (no compaction, no `ClauseRef` rewriting).
    pub fn compact_tier_lists(&mut self) {
        for tier_index in 0..4 {
            let tier = match tier_index {
                0 => Tier::Recent,
                1 => Tier::Core,
                2 => Tier::Mid,
                _ => Tier::Local,
            };
            let arena = &self.arena;
            self.by_tier[tier_index].retain(|&cref| {
                let header = arena.header(cref);
                !header.deleted() && header.tier() == tier
            });
        }
    }

    pub fn bytes_allocated(&self) -> usize {
        self.arena.bytes_allocated()
    }

    /// Iterates every non-deleted clause in the database: originals followed
    /// by learned clauses of every tier. Used by the inprocessor, which
    /// (unlike search-time code) must see the whole formula regardless of
    /// tier.
    pub fn iter_all(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        self.originals().chain(
            [Tier::Recent, Tier::Core, Tier::Mid, Tier::Local]
                .into_iter()
                .flat_map(move |tier| self.iter_tier(tier)),
        )
    }

    /// Whether `cref` names an original (never-deleted, never-tiered)
    /// clause, as opposed to a learned one.
    pub fn is_original(&self, cref: ClauseRef) -> bool {
        !self.arena.header(cref).learned()
    }

    /// Removes a clause found to be subsumed or eliminated during
    /// inprocessing. Unlike [`ClauseDb::delete_clause`] (the search-time
    /// deletion-policy path, which only ever touches learned clauses and
    /// must update tier accounting), this also accepts original clauses:
    /// inprocessing operates over the whole formula regardless of origin.
    pub fn remove_clause(&mut self, cref: ClauseRef) {
        if self.is_original(cref) {
            self.arena.delete(cref);
        } else {
            self.delete_clause(cref);
        }
    }

    /// Replaces a clause with a strengthened (strictly shorter) version,
    /// preserving its originality and, for learned clauses, its tier and
    /// LBD. Per spec §9's resolved open question, self-subsumption and
    /// vivification produce a new clause and tombstone the old one rather
    /// than mutating literals in place, which keeps every outstanding
    /// `ClauseRef` (watchlists, trail reasons) pointing at a stable,
    /// never-resized clause. Returns the new clause's `ClauseRef`.
    pub fn strengthen_clause(&mut self, cref: ClauseRef, new_lits: &[Lit]) -> ClauseRef {
        let is_original = self.is_original(cref);
        let new_cref = if is_original {
            self.add_original_clause(new_lits)
        } else {
            let header = self.arena.header(cref).clone();
            let new_cref = self.add_learned_clause(new_lits, header.lbd(), header.birth());
            self.set_tier(new_cref, header.tier());
            new_cref
        };
        self.remove_clause(cref);
        new_cref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_formula::lit::Var;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn learned_clauses_start_in_recent_tier() {
        let mut db = ClauseDb::new();
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 10);
        assert_eq!(db.count_by_tier(Tier::Recent), 1);
        assert_eq!(db.arena().header(cref).tier(), Tier::Recent);
    }

    #[test]
    fn set_tier_moves_between_tiers() {
        let mut db = ClauseDb::new();
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 0);
        db.set_tier(cref, Tier::Core);
        assert_eq!(db.count_by_tier(Tier::Recent), 0);
        assert_eq!(db.count_by_tier(Tier::Core), 1);
        assert_eq!(db.iter_tier(Tier::Core).collect::<Vec<_>>(), vec![cref]);
    }

    #[test]
    fn delete_clause_updates_tier_count_and_tombstones() {
        let mut db = ClauseDb::new();
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 0);
        db.delete_clause(cref);
        assert_eq!(db.count_by_tier(Tier::Recent), 0);
        assert!(db.is_deleted(cref));
        assert!(db.lits(cref).is_empty());
    }

    #[test]
    fn originals_are_not_tiered() {
        let mut db = ClauseDb::new();
        let cref = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, false)]);
        assert_eq!(db.total_learned(), 0);
        assert_eq!(db.originals().collect::<Vec<_>>(), vec![cref]);
    }

    #[test]
    fn age_counts_conflicts_since_birth() {
        let mut db = ClauseDb::new();
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true)], 2, 100);
        assert_eq!(db.age(cref, 150), 50);
    }

    #[test]
    fn remove_clause_tombstones_original_without_touching_tier_counts() {
        let mut db = ClauseDb::new();
        let cref = db.add_original_clause(&[lit(0, true), lit(1, true)]);
        db.remove_clause(cref);
        assert!(db.is_deleted(cref));
        assert_eq!(db.originals().collect::<Vec<_>>(), Vec::<ClauseRef>::new());
    }

    #[test]
    fn strengthen_clause_preserves_originality() {
        let mut db = ClauseDb::new();
        let cref = db.add_original_clause(&[lit(0, true), lit(1, true), lit(2, true)]);
        let new_cref = db.strengthen_clause(cref, &[lit(0, true), lit(1, true)]);
        assert!(db.is_deleted(cref));
        assert!(db.is_original(new_cref));
        assert_eq!(db.lits(new_cref), &[lit(0, true), lit(1, true)]);
    }

    #[test]
    fn strengthen_clause_preserves_tier_for_learned() {
        let mut db = ClauseDb::new();
        let cref = db.add_learned_clause(&[lit(0, true), lit(1, true), lit(2, true)], 2, 0);
        db.set_tier(cref, Tier::Core);
        let new_cref = db.strengthen_clause(cref, &[lit(0, true), lit(1, true)]);
        assert_eq!(db.arena().header(new_cref).tier(), Tier::Core);
        assert_eq!(db.count_by_tier(Tier::Core), 1);
    }
}

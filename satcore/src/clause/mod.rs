//! Clause storage.
//!
//! The teacher crate stores clauses in a byte-packed [`ClauseAlloc`] bump
//! allocator and addresses them with raw byte offsets, reclaiming space with
//! a compacting garbage collector that rewrites every live clause into a
//! fresh buffer. That scheme needs `unsafe` to reinterpret the backing
//! `[LitIdx]` storage as `Clause`/`ClauseHeader` values and requires every
//! long-lived `ClauseRef` (including ones held on the trail as propagation
//! reasons) to be fixed up across a collection pass.
//!
//! Here clauses live in a plain `Vec<ClauseData>` arena and are addressed by
//! a stable index (`ClauseRef`, a `u32` that never changes once issued).
//! Deleted clauses are tombstoned in place (`header.deleted = true`, literals
//! cleared) rather than compacted; this trades some wasted memory for a
//! representation simple enough to reason about without running the
//! allocator through a compiler.

pub mod activity;
pub mod db;

use satcore_formula::lit::Lit;

/// A stable reference to a clause stored in a [`ClauseArena`].
///
/// Never reused: once an index is issued it identifies the same logical
/// clause (possibly later tombstoned) for the lifetime of the arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClauseRef(u32);

impl ClauseRef {
    pub(crate) fn from_index(index: usize) -> ClauseRef {
        ClauseRef(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The four partitions long learned clauses pass through, following the
/// tiered learned-clause scheme (core/mid/local, with an extra `Recent`
/// protection tier for clauses not yet old enough to be judged). Original
/// (non-learned) clauses are never tiered: they live outside this enum in
/// [`db::ClauseDb::originals`] and are never deleted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Tier {
    /// Newly learned, not yet old enough (in conflicts) for tier assignment.
    Recent = 0,
    /// Glue clauses and other consistently useful clauses; rarely deleted.
    Core = 1,
    /// Moderately useful clauses, reduced under memory/size pressure.
    Mid = 2,
    /// Clauses kept only until the next reduction pass, the first to go.
    Local = 3,
}

impl Tier {
    pub const fn count() -> usize {
        4
    }

    /// Maps a freshly computed LBD to the permanent tier a clause is
    /// promoted into once it leaves the `Recent` protection window: LBD<=2
    /// is glue/core, 3..=6 is mid, anything higher is local.
    pub fn for_lbd(lbd: u32) -> Tier {
        if lbd <= 2 {
            Tier::Core
        } else if lbd <= 6 {
            Tier::Mid
        } else {
            Tier::Local
        }
    }
}

/// Metadata about a clause, stored alongside its literals.
#[derive(Debug, Clone)]
pub struct ClauseHeader {
    tier: Tier,
    deleted: bool,
    learned: bool,
    /// Literal block distance computed at learning time (glue).
    lbd: u32,
    activity: f32,
    /// Conflict count at the moment this clause was learned, used to judge
    /// how long a `Recent`-tier clause has been under protection.
    birth: u64,
}

impl ClauseHeader {
    fn original() -> ClauseHeader {
        ClauseHeader {
            tier: Tier::Core,
            deleted: false,
            learned: false,
            lbd: 0,
            activity: 0.0,
            birth: 0,
        }
    }

    fn learned(lbd: u32, birth: u64) -> ClauseHeader {
        ClauseHeader {
            tier: Tier::Recent,
            deleted: false,
            learned: true,
            lbd,
            activity: 0.0,
            birth,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn learned(&self) -> bool {
        self.learned
    }

    pub fn lbd(&self) -> u32 {
        self.lbd
    }

    pub fn set_lbd(&mut self, lbd: u32) {
        self.lbd = lbd;
    }

    pub fn activity(&self) -> f32 {
        self.activity
    }

    pub fn set_activity(&mut self, activity: f32) {
        self.activity = activity;
    }

    pub fn birth(&self) -> u64 {
        self.birth
    }

    /// A clause with LBD at most 2 is treated as a "glue" clause and
    /// protected from size/activity-based deletion.
    pub fn is_glue(&self) -> bool {
        self.lbd <= 2
    }
}

/// A stored clause: its header plus its literals.
#[derive(Debug, Clone)]
pub struct ClauseData {
    header: ClauseHeader,
    lits: Vec<Lit>,
}

impl ClauseData {
    pub fn header(&self) -> &ClauseHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut ClauseHeader {
        &mut self.header
    }

    pub fn lits(&self) -> &[Lit] {
        if self.header.deleted {
            &[]
        } else {
            &self.lits
        }
    }

    pub fn lits_mut(&mut self) -> &mut [Lit] {
        &mut self.lits
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }
}

/// Backing storage for all long clauses (original and learned), addressed by
/// stable [`ClauseRef`] indices. Never compacts; tombstones deleted clauses
/// in place by clearing their literals and setting `header.deleted`.
#[derive(Default)]
pub struct ClauseArena {
    clauses: Vec<ClauseData>,
}

impl ClauseArena {
    pub fn new() -> ClauseArena {
        ClauseArena::default()
    }

    pub fn add_original_clause(&mut self, lits: &[Lit]) -> ClauseRef {
        let cref = ClauseRef::from_index(self.clauses.len());
        self.clauses.push(ClauseData {
            header: ClauseHeader::original(),
            lits: lits.to_vec(),
        });
        cref
    }

    pub fn add_learned_clause(&mut self, lits: &[Lit], lbd: u32, birth: u64) -> ClauseRef {
        let cref = ClauseRef::from_index(self.clauses.len());
        self.clauses.push(ClauseData {
            header: ClauseHeader::learned(lbd, birth),
            lits: lits.to_vec(),
        });
        cref
    }

    pub fn clause(&self, cref: ClauseRef) -> &ClauseData {
        &self.clauses[cref.index()]
    }

    pub fn clause_mut(&mut self, cref: ClauseRef) -> &mut ClauseData {
        &mut self.clauses[cref.index()]
    }

    pub fn header(&self, cref: ClauseRef) -> &ClauseHeader {
        &self.clauses[cref.index()].header
    }

    pub fn header_mut(&mut self, cref: ClauseRef) -> &mut ClauseHeader {
        &mut self.clauses[cref.index()].header
    }

    pub fn lits(&self, cref: ClauseRef) -> &[Lit] {
        self.clauses[cref.index()].lits()
    }

    /// Tombstones a clause: clears its literals and marks it deleted. The
    /// `ClauseRef` stays valid (and `deleted()` true) so stale references
    /// held elsewhere (e.g. mid-reduction watch lists) fail safe rather than
    /// aliasing a reused slot.
    pub fn delete(&mut self, cref: ClauseRef) {
        let data = &mut self.clauses[cref.index()];
        debug_assert!(!data.header.deleted, "double delete of {:?}", cref);
        data.header.deleted = true;
        data.lits.clear();
        data.lits.shrink_to_fit();
    }

    pub fn bytes_allocated(&self) -> usize {
        self.clauses
            .iter()
            .map(|c| c.lits.capacity() * std::mem::size_of::<Lit>())
            .sum()
    }
}

//! The CDCL search loop and the public [`Solver`] trait.
//!
//! Grounded in the teacher's `solver::Solver` facade and `cdcl::conflict_step`/
//! `find_conflict` loop: a flat struct holding every piece of search state
//! rather than the teacher's macro-generated `partial_ref::Context` (this
//! crate has no proc-macro dependency to generate the equivalent borrow
//! splitting), with the same overall iteration shape — propagate, handle a
//! conflict by analyzing/learning/backjumping, otherwise decide.

use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use satcore_formula::cnf::CnfFormula;
use satcore_formula::lit::{Lit, Var};
use satcore_formula::xor::{ExtendedCnfFormula, XorClause};

use crate::analyze::AnalyzeConflict;
use crate::backtrack::BacktrackPolicy;
use crate::clause::activity::ClauseActivity;
use crate::clause::db::ClauseDb;
use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::heuristic::DecisionHeuristic;
use crate::inprocess::{self, EliminationWitness, InprocessGate};
use crate::preprocess::{self, LoadResult};
use crate::propagate::propagate;
use crate::reduce::reduce_if_needed;
use crate::restart::RestartPolicy;
use crate::result::SolverResult;
use crate::stats::SolverStatistics;
use crate::trail::{Conflict, Reason, Trail};
use crate::watch::Watchlists;
use crate::xor_prop::{self, XorStep};

/// The current outcome of the search, following the teacher's `state::SatState`.
/// There is no `UnsatUnderAssumptions` variant: this crate has no assumptions
/// interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SatState {
    Unknown,
    Sat,
    Unsat,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// The public interface a CDCL engine exposes to callers. Kept small and
/// abstract so alternative backends (e.g. a future portfolio solver) could
/// implement it alongside [`CdclSolver`].
pub trait Solver {
    /// Solves the clauses and XOR constraints loaded so far, with no time
    /// limit beyond `config.conflict_budget`.
    fn solve(&mut self) -> SolverResult;

    /// Solves with an additional wall-clock deadline.
    fn solve_with_timeout(&mut self, timeout: Duration) -> SolverResult;

    /// Adds one more original clause once search has already produced a
    /// result, restarting from decision level 0. Returns
    /// `SolverError::IncrementalUnsupported` if the underlying engine (or its
    /// configuration) does not support incremental use; [`CdclSolver`] always
    /// supports it.
    fn add_clause(&mut self, lits: &[Lit]) -> Result<(), SolverError>;

    fn statistics(&self) -> &SolverStatistics;

    /// Resets the solver to an empty formula with no accumulated learned
    /// clauses, keeping its configuration.
    fn reset(&mut self);

    fn name(&self) -> &str;
}

/// Capability trait for solvers that additionally accept XOR constraints,
/// kept separate from [`Solver`] so a backend without Gaussian elimination
/// (e.g. a plain DPLL solver) need not implement it.
pub trait ExtendedSolver: Solver {
    /// Replaces the current formula with `ecnf`'s clauses and XOR
    /// constraints and solves it, with no time limit beyond
    /// `config.conflict_budget`.
    fn solve_extended(&mut self, ecnf: &ExtendedCnfFormula) -> SolverResult;

    /// As [`ExtendedSolver::solve_extended`], with an additional wall-clock
    /// deadline.
    fn solve_extended_with_timeout(
        &mut self,
        ecnf: &ExtendedCnfFormula,
        timeout: Duration,
    ) -> SolverResult;
}

impl ExtendedSolver for CdclSolver {
    fn solve_extended(&mut self, ecnf: &ExtendedCnfFormula) -> SolverResult {
        *self = CdclSolver::from_extended_cnf(self.config.clone(), ecnf);
        self.solve()
    }

    fn solve_extended_with_timeout(
        &mut self,
        ecnf: &ExtendedCnfFormula,
        timeout: Duration,
    ) -> SolverResult {
        *self = CdclSolver::from_extended_cnf(self.config.clone(), ecnf);
        self.solve_with_timeout(timeout)
    }
}

/// A self-contained CDCL solver: two-watched-literal propagation, First-UIP
/// analysis with clause minimization, VSIDS+LRB decisions, Luby/Glucose
/// restarts, tiered clause deletion, periodic inprocessing, and an optional
/// XOR/Gaussian-elimination extension.
pub struct CdclSolver {
    config: SolverConfig,

    trail: Trail,
    watchlists: Watchlists,
    db: ClauseDb,
    heuristic: DecisionHeuristic,
    analyze: AnalyzeConflict,
    clause_activity: ClauseActivity,
    backtrack_policy: BacktrackPolicy,
    restart_policy: RestartPolicy,
    inprocess_gate: InprocessGate,
    witness: EliminationWitness,

    gauss: crate::gauss::GaussianEliminator,
    xor_clauses: Vec<XorClause>,
    conflicts_since_gauss: u64,

    var_count: usize,
    sat_state: SatState,
    unsat: bool,
    stats: SolverStatistics,
}

impl CdclSolver {
    /// Creates a solver over `var_count` variables with the given
    /// configuration.
    pub fn new(config: SolverConfig, var_count: usize) -> CdclSolver {
        let mut trail = Trail::default();
        trail.set_var_count(var_count);
        let mut watchlists = Watchlists::default();
        watchlists.set_var_count(var_count);
        let mut analyze = AnalyzeConflict::default();
        analyze.set_var_count(var_count);
        let heuristic = DecisionHeuristic::new(&config, var_count);
        let clause_activity = ClauseActivity::new(config.clause_activity_decay);
        let backtrack_policy = BacktrackPolicy::new(&config);
        let restart_policy = RestartPolicy::new(&config);
        let inprocess_gate = InprocessGate::new(&config);

        CdclSolver {
            config,
            trail,
            watchlists,
            db: ClauseDb::new(),
            heuristic,
            analyze,
            clause_activity,
            backtrack_policy,
            restart_policy,
            inprocess_gate,
            witness: EliminationWitness::default(),
            gauss: crate::gauss::GaussianEliminator::new(),
            xor_clauses: Vec::new(),
            conflicts_since_gauss: 0,
            var_count,
            sat_state: SatState::Unknown,
            unsat: false,
            stats: SolverStatistics::new(),
        }
    }

    /// Creates a solver preloaded with every clause of `cnf`.
    pub fn from_cnf(config: SolverConfig, cnf: &CnfFormula) -> CdclSolver {
        let mut solver = CdclSolver::new(config, cnf.var_count());
        for clause in cnf.iter() {
            solver.add_cnf_clause(clause);
        }
        solver
    }

    /// Creates a solver preloaded with every clause and XOR constraint of
    /// `ecnf`, turning on the XOR/Gaussian-elimination extension regardless
    /// of the configuration's default.
    pub fn from_extended_cnf(mut config: SolverConfig, ecnf: &ExtendedCnfFormula) -> CdclSolver {
        config.xor_enabled = true;
        let mut solver = CdclSolver::new(config, ecnf.var_count());
        for clause in ecnf.cnf().iter() {
            solver.add_cnf_clause(clause);
        }
        for xor in ecnf.xor_clauses() {
            solver.add_xor_clause(xor.vars().to_vec(), xor.parity());
        }
        solver
    }

    /// Grows the solver's variable pool, if `var_count` is larger than the
    /// current one.
    pub fn ensure_var_count(&mut self, var_count: usize) {
        if var_count <= self.var_count {
            return;
        }
        self.var_count = var_count;
        self.trail.set_var_count(var_count);
        self.watchlists.set_var_count(var_count);
        self.analyze.set_var_count(var_count);
        self.heuristic.set_var_count(var_count);
    }

    /// Loads one original CNF clause, must be called at decision level 0.
    pub fn add_cnf_clause(&mut self, lits: &[Lit]) {
        if self.unsat {
            return;
        }
        for &lit in lits {
            self.ensure_var_count(lit.index() + 1);
        }
        match preprocess::load_clause(&mut self.trail, &mut self.watchlists, &mut self.db, lits) {
            LoadResult::Conflict => self.unsat = true,
            LoadResult::Satisfied | LoadResult::Unit | LoadResult::Added(_) => {}
        }
    }

    /// Loads one original XOR constraint.
    pub fn add_xor_clause(&mut self, vars: Vec<Var>, parity: bool) {
        if self.unsat {
            return;
        }
        for &var in &vars {
            self.ensure_var_count(var.index() + 1);
        }
        let id = self.xor_clauses.len() as u64;
        self.xor_clauses.push(XorClause::new(id, vars, parity));
    }

    /// Number of distinct decision levels among `lits`' variables, the same
    /// LBD glue measure [`crate::analyze::AnalyzeConflict`] computes for a
    /// CDCL-learned clause.
    fn lbd_of(&self, lits: &[Lit]) -> u32 {
        let levels: FxHashSet<usize> = lits.iter().map(|l| self.trail.level_of(l.var())).collect();
        levels.len() as u32
    }

    /// Runs a plain CNF propagation round followed by, if the XOR extension
    /// is enabled, alternating XOR propagation with further CNF propagation
    /// until neither side has anything left, per spec §4.10 step 4.
    ///
    /// Returns the clause (synthesized on the fly for an XOR-forced literal,
    /// via [`xor_prop::reason_clause_for_force`]) responsible for a conflict,
    /// if any.
    fn propagate_all(&mut self) -> Result<(), Conflict> {
        loop {
            propagate(&mut self.trail, &mut self.watchlists, &mut self.db)?;

            if !self.config.xor_enabled || self.xor_clauses.is_empty() {
                return Ok(());
            }

            match xor_prop::propagate_xor(&self.trail, &self.xor_clauses) {
                None => return Ok(()),
                Some(XorStep::Forces(forced)) => {
                    let reason_lits =
                        xor_prop::reason_clause_for_force(&self.trail, &self.xor_clauses, forced);
                    // Learned, not original: this clause is only ever consulted
                    // as `forced`'s propagation reason during conflict analysis
                    // and would otherwise sit in the permanently-protected
                    // originals tier forever, growing the arena without bound
                    // on a long XOR-heavy search. As a learned clause it starts
                    // in the `Recent` tier and is eligible for reduction once
                    // it stops being anyone's reason (the `is_locked` guard in
                    // `reduce.rs` keeps it alive for exactly as long as it's
                    // needed).
                    let lbd = self.lbd_of(&reason_lits);
                    let cref = self.db.add_learned_clause(&reason_lits, lbd, self.stats.conflicts);
                    self.trail.enqueue(forced, Reason::Propagated(cref));
                    self.stats.propagations += 1;
                }
                Some(XorStep::Conflict(conflict)) => {
                    let lbd = self.lbd_of(&conflict.clause);
                    let cref = self
                        .db
                        .add_learned_clause(&conflict.clause, lbd, self.stats.conflicts);
                    return Err(Conflict(cref));
                }
            }
        }
    }

    /// Handles one conflict: analyzes it, learns the resulting clause,
    /// bumps heuristic/clause activity, and backjumps. Returns `false` if
    /// the conflict occurred at decision level 0 (the formula is UNSAT).
    fn handle_conflict(&mut self, conflict: Conflict) -> bool {
        self.stats.conflicts += 1;
        self.restart_policy.record_conflict();

        if self.trail.current_level() == 0 {
            return false;
        }

        let analysis = self.analyze.analyze(&self.trail, &self.db, &mut self.heuristic, conflict);

        for &cref in &analysis.involved {
            self.clause_activity.bump_clause(&mut self.db, cref);
        }
        self.clause_activity.decay(&mut self.db);

        for &lit in &analysis.clause {
            self.heuristic.record_participation(lit, self.stats.conflicts);
        }

        let is_glue = analysis.lbd <= 2;
        self.stats.record_learned_clause(analysis.lbd, is_glue);

        let heuristic = &mut self.heuristic;
        self.backtrack_policy.backjump(
            &mut self.trail,
            &mut self.watchlists,
            &mut self.db,
            |var| heuristic.make_available(var),
            analysis.backtrack_level,
            &mut self.stats,
        );

        match analysis.clause.len() {
            1 => {
                let unit = analysis.clause[0];
                self.trail.enqueue(unit, Reason::Decision);
            }
            _ => {
                let cref = self
                    .db
                    .add_learned_clause(&analysis.clause, analysis.lbd, self.stats.conflicts);
                self.watchlists
                    .watch_clause(cref, [analysis.clause[0], analysis.clause[1]]);
                self.trail.enqueue(analysis.clause[0], Reason::Propagated(cref));
            }
        }

        reduce_if_needed(
            &self.trail,
            &mut self.db,
            &mut self.watchlists,
            &self.config,
            &mut self.stats,
            self.stats.conflicts,
        );

        true
    }

    /// Runs inprocessing and, if due, Gaussian elimination, both gated to
    /// decision level 0. Returns `false` if either phase found a
    /// contradiction.
    fn inprocess_at_root(&mut self) -> bool {
        debug_assert_eq!(self.trail.current_level(), 0);

        let result = inprocess::run(
            &mut self.inprocess_gate,
            &mut self.trail,
            &mut self.watchlists,
            &mut self.db,
            &mut self.heuristic,
            &mut self.witness,
            &self.config,
            &mut self.stats,
            self.stats.conflicts,
            self.var_count,
        );

        if result.contradiction {
            return false;
        }

        if self.config.xor_enabled
            && !self.xor_clauses.is_empty()
            && self.conflicts_since_gauss >= self.config.gauss_run_interval
        {
            self.conflicts_since_gauss = 0;
            let result = self.gauss.run(
                &self.trail,
                &self.xor_clauses,
                self.config.xor_min_arity,
                self.config.xor_max_arity,
                self.config.gauss_min_runs_before_disable,
            );

            if result.contradiction {
                return false;
            }
            for (var, value) in result.units {
                if self.trail.assignment().var_value(var).is_none() {
                    self.trail.enqueue(var.lit(value), Reason::Decision);
                }
            }
            for learned in result.learned {
                let id = self.xor_clauses.len() as u64;
                self.xor_clauses
                    .push(XorClause::new(id, learned.vars().to_vec(), learned.parity()));
            }
        }

        true
    }

    /// Builds the final variable -> value map once every variable is
    /// assigned, extending it with values reconstructed for every variable
    /// bounded-variable elimination removed along the way.
    fn build_assignment(&self) -> FxHashMap<Var, bool> {
        let mut assignment: FxHashMap<Var, bool> = (0..self.var_count)
            .map(Var::from_index)
            .filter_map(|var| self.trail.assignment().var_value(var).map(|v| (var, v)))
            .collect();

        for (var, value) in self
            .witness
            .reconstruct(|var| assignment.get(&var).copied())
        {
            assignment.insert(var, value);
        }

        assignment
    }

    /// One full `solve` run, optionally bounded by a wall-clock `deadline`.
    fn run(&mut self, deadline: Option<Instant>) -> SolverResult {
        let start = Instant::now();

        if self.unsat {
            self.sat_state = SatState::Unsat;
            return self.finish(SolverResult::unsat(self.stats.clone()), start);
        }

        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    log::info!("satcore: timed out after {} conflicts", self.stats.conflicts);
                    return self.finish(
                        SolverResult::error(SolverError::Timeout, self.stats.clone()),
                        start,
                    );
                }
            }

            if self.stats.conflicts >= self.config.conflict_budget {
                log::info!("satcore: conflict budget exhausted");
                return self.finish(
                    SolverResult::error(SolverError::ConflictLimitReached, self.stats.clone()),
                    start,
                );
            }

            if self.trail.current_level() == 0 && !self.inprocess_at_root() {
                self.sat_state = SatState::Unsat;
                return self.finish(SolverResult::unsat(self.stats.clone()), start);
            }

            match self.propagate_all() {
                Err(conflict) => {
                    self.conflicts_since_gauss += 1;
                    if !self.handle_conflict(conflict) {
                        self.sat_state = SatState::Unsat;
                        return self.finish(SolverResult::unsat(self.stats.clone()), start);
                    }

                    if self.restart_policy.should_restart() {
                        let heuristic = &mut self.heuristic;
                        self.trail
                            .backtrack_to(0, |var| heuristic.make_available(var));
                        self.restart_policy.on_restart();
                        self.stats.restarts = self.restart_policy.restarts();
                    }
                }
                Ok(()) => match self.heuristic.pick(|var| self.trail.assignment().var_value(var)) {
                    None => {
                        self.sat_state = SatState::Sat;
                        let assignment = self.build_assignment();
                        return self.finish(SolverResult::sat(assignment, self.stats.clone()), start);
                    }
                    Some(decision) => {
                        self.trail.new_decision_level();
                        self.trail.enqueue(decision, Reason::Decision);
                        self.stats.decisions += 1;
                    }
                },
            }
        }
    }

    fn finish(&mut self, mut result: SolverResult, start: Instant) -> SolverResult {
        self.stats.time_elapsed_ns += start.elapsed().as_nanos() as u64;
        result.statistics = self.stats.clone();
        result
    }
}

impl Solver for CdclSolver {
    fn solve(&mut self) -> SolverResult {
        self.run(None)
    }

    fn solve_with_timeout(&mut self, timeout: Duration) -> SolverResult {
        self.run(Some(Instant::now() + timeout))
    }

    fn add_clause(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        if self.trail.current_level() != 0 {
            let heuristic = &mut self.heuristic;
            self.trail.backtrack_to(0, |var| heuristic.make_available(var));
        }
        self.add_cnf_clause(lits);
        self.sat_state = SatState::Unknown;
        Ok(())
    }

    fn statistics(&self) -> &SolverStatistics {
        &self.stats
    }

    fn reset(&mut self) {
        let var_count = self.var_count;
        let config = self.config.clone();
        *self = CdclSolver::new(config, var_count);
    }

    fn name(&self) -> &str {
        "satcore-cdcl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn contradictory_units_are_unsat_at_level_zero() {
        let mut solver = CdclSolver::new(SolverConfig::default(), 1);
        solver.add_cnf_clause(&[lit(0, true)]);
        solver.add_cnf_clause(&[lit(0, false)]);

        let result = solver.solve();
        assert!(!result.satisfiable);
        assert!(result.error.is_none());
    }

    #[test]
    fn single_clause_is_satisfiable() {
        let mut solver = CdclSolver::new(SolverConfig::default(), 2);
        solver.add_cnf_clause(&[lit(0, true), lit(1, false)]);

        let result = solver.solve();
        assert!(result.satisfiable);
        let assignment = result.assignment.unwrap();
        assert!(assignment[&Var::from_index(0)] || !assignment[&Var::from_index(1)]);
    }

    #[test]
    fn pigeonhole_three_into_two_is_unsat() {
        // Pigeons 0,1,2 into holes A,B: var layout p_i_h = i*2 + h.
        let mut solver = CdclSolver::new(SolverConfig::default(), 6);
        for pigeon in 0..3 {
            solver.add_cnf_clause(&[lit(pigeon * 2, true), lit(pigeon * 2 + 1, true)]);
        }
        for hole in 0..2 {
            for p1 in 0..3 {
                for p2 in (p1 + 1)..3 {
                    solver.add_cnf_clause(&[lit(p1 * 2 + hole, false), lit(p2 * 2 + hole, false)]);
                }
            }
        }

        let result = solver.solve();
        assert!(!result.satisfiable);
    }

    #[test]
    fn implication_chain_forces_unsat_contradiction() {
        // (A -> B) & A & !B, encoded directly as clauses: (!A | B), (A), (!B).
        let mut solver = CdclSolver::new(SolverConfig::default(), 2);
        solver.add_cnf_clause(&[lit(0, false), lit(1, true)]);
        solver.add_cnf_clause(&[lit(0, true)]);
        solver.add_cnf_clause(&[lit(1, false)]);

        let result = solver.solve();
        assert!(!result.satisfiable);
    }

    #[test]
    fn xor_chain_is_satisfied_with_consistent_parity() {
        let mut config = SolverConfig::default();
        config.xor_enabled = true;
        let mut solver = CdclSolver::new(config, 3);
        solver.add_xor_clause(vec![Var::from_index(0), Var::from_index(1)], true);
        solver.add_cnf_clause(&[lit(0, true)]);

        let result = solver.solve();
        assert!(result.satisfiable);
        let assignment = result.assignment.unwrap();
        assert_ne!(assignment[&Var::from_index(0)], assignment[&Var::from_index(1)]);
    }

    #[test]
    fn reset_clears_learned_state() {
        let mut solver = CdclSolver::new(SolverConfig::default(), 2);
        solver.add_cnf_clause(&[lit(0, true), lit(1, true)]);
        let _ = solver.solve();
        solver.reset();
        assert_eq!(solver.statistics().conflicts, 0);
    }

    #[test]
    fn from_cnf_loads_every_clause() {
        let mut cnf = CnfFormula::new();
        cnf.add_clause(vec![lit(0, true), lit(1, false)]);
        cnf.add_clause(vec![lit(1, true)]);

        let mut solver = CdclSolver::from_cnf(SolverConfig::default(), &cnf);
        let result = solver.solve();
        assert!(result.satisfiable);
        assert!(result.assignment.unwrap()[&Var::from_index(1)]);
    }

    mod property {
        use super::*;

        use proptest::prelude::*;

        use satcore_formula::test::{sat_formula, sgen_unsat_formula};

        proptest! {
            #[test]
            fn sat_formula_is_always_satisfiable(
                formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0),
            ) {
                let mut solver = CdclSolver::from_cnf(SolverConfig::default(), &formula);
                let result = solver.solve();

                prop_assert!(result.satisfiable);
                let assignment = result.assignment.unwrap();
                for clause in formula.iter() {
                    prop_assert!(clause
                        .iter()
                        .any(|&lit| assignment.get(&lit.var()).copied() == Some(lit.is_positive())));
                }
            }

            #[test]
            fn sgen_formula_is_always_unsatisfiable(
                formula in sgen_unsat_formula(1..4usize),
            ) {
                let mut solver = CdclSolver::from_cnf(SolverConfig::default(), &formula);
                let result = solver.solve();

                prop_assert!(!result.satisfiable);
                prop_assert!(result.statistics.conflicts > 0);
            }
        }
    }

    #[test]
    fn solve_extended_accepts_an_xor_chain() {
        let mut ecnf = ExtendedCnfFormula::new();
        ecnf.add_xor_clause(vec![Var::from_index(0), Var::from_index(1)], true);
        ecnf.cnf_mut().add_clause(vec![lit(0, true)]);

        let mut config = SolverConfig::default();
        config.xor_enabled = true;
        let mut solver = CdclSolver::new(config, 0);
        let result = solver.solve_extended(&ecnf);

        assert!(result.satisfiable);
        let assignment = result.assignment.unwrap();
        assert_ne!(assignment[&Var::from_index(0)], assignment[&Var::from_index(1)]);
    }
}

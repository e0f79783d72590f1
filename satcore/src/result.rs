//! The outcome of a `solve` call, returned to the caller alongside
//! statistics regardless of whether the formula was satisfiable.

use rustc_hash::FxHashMap;

use satcore_formula::lit::Var;

use crate::error::SolverError;
use crate::stats::SolverStatistics;

/// Result of one `Solver::solve`/`solve_with_timeout` call.
///
/// `satisfiable` and `assignment` answer the search question; `error` is
/// `Some` only for `Timeout`/`ConflictLimitReached` (in which case
/// `satisfiable` is `false` and `assignment` is `None`) since those aren't
/// logic answers. `statistics` is always populated, even on early exit, so a
/// caller can tell how much work was done before a timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    pub satisfiable: bool,
    pub assignment: Option<FxHashMap<Var, bool>>,
    pub statistics: SolverStatistics,
    pub error: Option<SolverError>,
}

impl SolverResult {
    pub fn sat(assignment: FxHashMap<Var, bool>, statistics: SolverStatistics) -> SolverResult {
        SolverResult {
            satisfiable: true,
            assignment: Some(assignment),
            statistics,
            error: None,
        }
    }

    pub fn unsat(statistics: SolverStatistics) -> SolverResult {
        SolverResult {
            satisfiable: false,
            assignment: None,
            statistics,
            error: None,
        }
    }

    pub fn error(error: SolverError, statistics: SolverStatistics) -> SolverResult {
        SolverResult {
            satisfiable: false,
            assignment: None,
            statistics,
            error: Some(error),
        }
    }
}

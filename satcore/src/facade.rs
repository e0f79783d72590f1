//! `SATSystem`: the `satcore`-side half of the `LogicSystem` interface
//! defined by `satcore-ast`, registered under the name `"sat"`.
//!
//! No teacher counterpart (`varisat` has no expression front end at all);
//! grounded in spec §6's external-interfaces note that the core depends on
//! `satcore-ast` only for `Expr` and the `LogicSystem` trait it implements.
//! This is intentionally thin: validation and classical evaluation are
//! delegated straight to `satcore-ast`'s own `BasicValidator`/`BasicEvaluator`,
//! since those are external collaborators this crate consumes rather than
//! owns.

use std::collections::HashMap;

use satcore_ast::{
    BasicEvaluator, BasicValidator, ClassicalEvaluator, Expr, ExpressionError, ExpressionValidator,
    LogicSystem, VarName,
};

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::solver::{CdclSolver, Solver};
use crate::tseitin::TseitinConverter;

/// The operators `Expr` can express, for `LogicSystem::supported_operators`.
const SUPPORTED_OPERATORS: &[&str] = &[
    "and", "or", "not", "xor", "nand", "nor", "implies", "iff",
];

/// Solves boolean-expression satisfiability by Tseitin-converting the
/// expression into CNF and handing it to a [`CdclSolver`].
pub struct SATSystem {
    config: SolverConfig,
    validator: BasicValidator,
    evaluator: BasicEvaluator,
}

impl SATSystem {
    pub fn new(config: SolverConfig) -> SATSystem {
        SATSystem {
            config,
            validator: BasicValidator,
            evaluator: BasicEvaluator,
        }
    }

    /// Validates, Tseitin-converts, and solves `expr`, translating the
    /// solver's per-`Var` assignment back into one keyed by the original
    /// variable names.
    pub fn solve(&self, expr: &Expr) -> Result<SatOutcome, ExpressionError> {
        self.validator.validate(expr)?;

        let mut converter = TseitinConverter::new();
        let formula = converter.convert(expr);

        let mut solver = CdclSolver::from_extended_cnf(self.config.clone(), &formula);
        let result = solver.solve();

        if let Some(error) = result.error {
            return Ok(SatOutcome {
                satisfiable: false,
                assignment: None,
                error: Some(error),
            });
        }

        let named_assignment = result.assignment.map(|by_var| {
            converter
                .named_vars()
                .iter()
                .map(|(name, &var)| (name.clone(), by_var.get(&var).copied().unwrap_or(false)))
                .collect::<HashMap<VarName, bool>>()
        });

        Ok(SatOutcome {
            satisfiable: result.satisfiable,
            assignment: named_assignment,
            error: None,
        })
    }

    /// Checks a candidate assignment against `expr` directly, without
    /// invoking the solver. Used to cross-check a [`SatOutcome`]'s
    /// assignment independent of the CDCL engine that produced it.
    pub fn verify_solution(
        &self,
        expr: &Expr,
        assignment: &HashMap<VarName, bool>,
    ) -> Result<bool, ExpressionError> {
        self.evaluator.evaluate(expr, assignment)
    }
}

/// The result of [`SATSystem::solve`]: a `SolverError` (e.g. `Timeout`) is
/// reported in `error` rather than as an `Err`, since it isn't a logic error
/// about the expression itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SatOutcome {
    pub satisfiable: bool,
    pub assignment: Option<HashMap<VarName, bool>>,
    pub error: Option<SolverError>,
}

impl LogicSystem for SATSystem {
    fn name(&self) -> &str {
        "sat"
    }

    fn evaluate(
        &self,
        expr: &Expr,
        assignment: &HashMap<VarName, bool>,
    ) -> Result<bool, ExpressionError> {
        self.evaluator.evaluate(expr, assignment)
    }

    fn validate(&self, expr: &Expr) -> Result<(), ExpressionError> {
        self.validator.validate(expr)
    }

    fn supported_operators(&self) -> &[&'static str] {
        SUPPORTED_OPERATORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_ast::SourcePos;

    fn pos() -> SourcePos {
        SourcePos::default()
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_owned(), pos())
    }

    #[test]
    fn contradiction_is_unsatisfiable() {
        let system = SATSystem::new(SolverConfig::default());
        let expr = Expr::And(
            vec![var("a"), Expr::Not(Box::new(var("a")), pos())],
            pos(),
        );

        let outcome = system.solve(&expr).unwrap();
        assert!(!outcome.satisfiable);
        assert!(outcome.assignment.is_none());
    }

    #[test]
    fn excluded_middle_is_satisfiable_and_verifies() {
        let system = SATSystem::new(SolverConfig::default());
        let expr = Expr::Or(vec![var("a"), Expr::Not(Box::new(var("a")), pos())], pos());

        let outcome = system.solve(&expr).unwrap();
        assert!(outcome.satisfiable);
        let assignment = outcome.assignment.unwrap();
        assert!(system.verify_solution(&expr, &assignment).unwrap());
    }

    #[test]
    fn name_is_sat() {
        let system = SATSystem::new(SolverConfig::default());
        assert_eq!(LogicSystem::name(&system), "sat");
    }
}

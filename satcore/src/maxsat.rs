//! Weighted MAX-SAT via binary search over successive SAT calls.
//!
//! No teacher counterpart (`varisat` has no optimization layer); grounded
//! directly in spec §4.12. Each weighted clause is tried as a hard
//! constraint; clauses below the current threshold are relaxed with a fresh
//! "may be false" variable so the probe formula stays satisfiable whenever
//! the hard subset alone is, and the actual satisfied weight is recomputed
//! against the *original*, unrelaxed clauses.

use satcore_formula::lit::{Lit, Var};

use crate::config::SolverConfig;
use crate::solver::{CdclSolver, Solver};

/// One clause of a weighted MAX-SAT instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedClause {
    pub id: u64,
    pub literals: Vec<Lit>,
    pub weight: f64,
}

impl WeightedClause {
    pub fn new(id: u64, literals: Vec<Lit>, weight: f64) -> WeightedClause {
        WeightedClause { id, literals, weight }
    }
}

/// A weighted MAX-SAT instance: an (unweighted-clause) hard constraint is
/// simply a [`WeightedClause`] with a weight no binary-search threshold will
/// ever fall below, since `precision` keeps the search strictly inside
/// `[0, total_weight]`.
#[derive(Debug, Clone, Default)]
pub struct WeightedCnf {
    pub var_count: usize,
    pub clauses: Vec<WeightedClause>,
}

impl WeightedCnf {
    pub fn new() -> WeightedCnf {
        WeightedCnf::default()
    }

    pub fn add_clause(&mut self, id: u64, literals: Vec<Lit>, weight: f64) {
        for &lit in &literals {
            self.var_count = self.var_count.max(lit.index() + 1);
        }
        self.clauses.push(WeightedClause::new(id, literals, weight));
    }

    fn total_weight(&self) -> f64 {
        self.clauses.iter().map(|c| c.weight).sum()
    }
}

/// The outcome of one [`solve_max_sat`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSatResult {
    pub assignment: Vec<bool>,
    pub satisfied_count: usize,
    pub satisfied_weight: f64,
    pub unsatisfied_clause_ids: Vec<u64>,
}

/// Precision the binary search over the weight threshold stops at, per
/// spec §4.12.
const PRECISION: f64 = 0.01;

/// Solves `instance` for the assignment maximizing total satisfied weight,
/// by binary-searching the weight threshold θ that separates "hard" from
/// "soft" clauses in successive SAT calls.
pub fn solve_max_sat(config: &SolverConfig, instance: &WeightedCnf) -> MaxSatResult {
    let total_weight = instance.total_weight();

    let mut best = evaluate(instance, &[]);

    if instance.clauses.is_empty() || total_weight == 0.0 {
        return best;
    }

    let mut lo = 0.0_f64;
    let mut hi = total_weight;

    while hi - lo > PRECISION {
        let theta = lo + (hi - lo) / 2.0;

        match probe(config, instance, theta) {
            Some(assignment) => {
                let candidate = evaluate(instance, &assignment);
                if candidate.satisfied_weight > best.satisfied_weight {
                    best = candidate;
                }
                lo = theta;
            }
            None => {
                hi = theta;
            }
        }
    }

    best
}

/// Builds the probe CNF for threshold `theta` (clauses with weight >= theta
/// are hard; the rest are relaxed with a fresh variable) and solves it.
/// Returns the satisfying assignment (indexed by `Var::index`), if any.
fn probe(config: &SolverConfig, instance: &WeightedCnf, theta: f64) -> Option<Vec<bool>> {
    let mut var_count = instance.var_count;
    let mut clauses: Vec<Vec<Lit>> = Vec::with_capacity(instance.clauses.len());

    for clause in &instance.clauses {
        if clause.weight >= theta {
            clauses.push(clause.literals.clone());
        } else {
            let relax_var = Var::from_index(var_count);
            var_count += 1;
            let mut relaxed = clause.literals.clone();
            relaxed.push(relax_var.positive());
            clauses.push(relaxed);
        }
    }

    let mut solver = CdclSolver::new(config.clone(), var_count);
    for clause in &clauses {
        solver.add_cnf_clause(clause);
    }

    let result = solver.solve();
    if !result.satisfiable {
        return None;
    }

    let assignment = result.assignment.unwrap_or_default();
    Some(
        (0..instance.var_count)
            .map(|index| {
                assignment
                    .get(&Var::from_index(index))
                    .copied()
                    .unwrap_or(false)
            })
            .collect(),
    )
}

/// Scores `assignment` against the *original* (unrelaxed) clauses of
/// `instance`. An empty assignment (used as the initial "nothing satisfied
/// yet" baseline) scores every clause as unsatisfied.
fn evaluate(instance: &WeightedCnf, assignment: &[bool]) -> MaxSatResult {
    let value_of = |lit: Lit| -> bool {
        assignment
            .get(lit.index())
            .copied()
            .map(|v| v ^ lit.is_negative())
            .unwrap_or(false)
    };

    let mut satisfied_count = 0;
    let mut satisfied_weight = 0.0;
    let mut unsatisfied_clause_ids = Vec::new();

    for clause in &instance.clauses {
        if clause.literals.iter().any(|&lit| value_of(lit)) {
            satisfied_count += 1;
            satisfied_weight += clause.weight;
        } else {
            unsatisfied_clause_ids.push(clause.id);
        }
    }

    MaxSatResult {
        assignment: assignment.to_vec(),
        satisfied_count,
        satisfied_weight,
        unsatisfied_clause_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn unit_weight_conflict_satisfies_two_of_three() {
        let mut instance = WeightedCnf::new();
        instance.add_clause(0, vec![lit(0, true)], 1.0);
        instance.add_clause(1, vec![lit(0, false)], 1.0);
        instance.add_clause(2, vec![lit(1, true)], 1.0);

        let result = solve_max_sat(&SolverConfig::default(), &instance);

        assert_eq!(result.satisfied_count, 2);
        assert_eq!(result.unsatisfied_clause_ids.len(), 1);
        assert!(result.unsatisfied_clause_ids[0] == 0 || result.unsatisfied_clause_ids[0] == 1);
        assert!(result.assignment[1]);
    }

    #[test]
    fn fully_satisfiable_instance_leaves_nothing_unsatisfied() {
        let mut instance = WeightedCnf::new();
        instance.add_clause(0, vec![lit(0, true), lit(1, true)], 2.0);
        instance.add_clause(1, vec![lit(0, false)], 1.0);

        let result = solve_max_sat(&SolverConfig::default(), &instance);

        assert!(result.unsatisfied_clause_ids.is_empty());
        assert_eq!(result.satisfied_weight, 3.0);
    }

    #[test]
    fn empty_instance_is_trivially_satisfied() {
        let instance = WeightedCnf::new();
        let result = solve_max_sat(&SolverConfig::default(), &instance);
        assert_eq!(result.satisfied_count, 0);
        assert!(result.unsatisfied_clause_ids.is_empty());
    }
}

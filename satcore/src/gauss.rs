//! Gauss-Jordan elimination over GF(2) for XOR constraints.
//!
//! No teacher counterpart (varisat carries no XOR extension); grounded
//! directly in spec §4.8. The matrix itself is the textbook row-reduction
//! algorithm; what is specific to this crate is how rows are built (one per
//! eligible [`XorClause`], folding already-assigned variables into the
//! augmented RHS column) and how reduced rows are read back out as unit
//! implications, a contradiction, or shorter learned XOR clauses.

use rustc_hash::FxHashMap;

use satcore_formula::lit::Var;
use satcore_formula::xor::XorClause;

use crate::trail::Trail;

/// One row of the matrix: which (unassigned) variable-columns participate,
/// plus the augmented right-hand side.
#[derive(Clone)]
struct Row {
    columns: Vec<bool>,
    rhs: bool,
    /// Original variables this row's columns correspond to, for reading
    /// results back out; `columns[i]` is the coefficient of `vars[i]`.
    source_xor: u64,
}

/// Outcome of one elimination run.
#[derive(Default)]
pub struct GaussResult {
    /// Variables forced to a value by a row with exactly one remaining
    /// column.
    pub units: Vec<(Var, bool)>,
    /// Whether an all-zero row with RHS=1 was found (the formula is
    /// unsatisfiable given the current partial assignment).
    pub contradiction: bool,
    /// Shorter XOR clauses extracted from rows with few remaining columns
    /// (more than one, fewer than the original clause), learned as new
    /// `XorClause`s.
    pub learned: Vec<XorClause>,
}

/// Tracks run statistics used for the auto-disable heuristic of spec §4.8.
#[derive(Default)]
pub struct GaussianEliminator {
    runs: u64,
    total_eliminations: u64,
    total_unit_propagations: u64,
    disabled: bool,
}

impl GaussianEliminator {
    pub fn new() -> GaussianEliminator {
        GaussianEliminator::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Runs Gauss-Jordan elimination over every XOR clause whose arity falls
    /// in `[min_arity, max_arity]`, over the columns of its currently
    /// unassigned variables. Folds the result into the auto-disable running
    /// averages.
    pub fn run(
        &mut self,
        trail: &Trail,
        xor_clauses: &[XorClause],
        min_arity: usize,
        max_arity: usize,
        min_runs_before_disable: u64,
    ) -> GaussResult {
        if self.disabled {
            return GaussResult::default();
        }

        let eligible: Vec<&XorClause> = xor_clauses
            .iter()
            .filter(|xor| xor.len() >= min_arity && xor.len() <= max_arity)
            .collect();

        let mut var_to_column: FxHashMap<Var, usize> = FxHashMap::default();
        let mut columns: Vec<Var> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();

        for xor in &eligible {
            let mut parity = xor.parity();
            let mut row_columns: Vec<bool> = Vec::new();
            let mut row_vars = Vec::new();

            for &var in xor.vars() {
                match trail.assignment().var_value(var) {
                    Some(value) => parity ^= value,
                    None => row_vars.push(var),
                }
            }

            if row_vars.is_empty() {
                if parity {
                    return GaussResult {
                        contradiction: true,
                        ..GaussResult::default()
                    };
                }
                continue;
            }

            for &var in &row_vars {
                let column = *var_to_column.entry(var).or_insert_with(|| {
                    columns.push(var);
                    columns.len() - 1
                });
                if column >= row_columns.len() {
                    row_columns.resize(column + 1, false);
                }
                row_columns[column] = true;
            }

            rows.push(Row {
                columns: row_columns,
                rhs: parity,
                source_xor: xor.id(),
            });
        }

        for row in &mut rows {
            row.columns.resize(columns.len(), false);
        }

        let contradiction = reduce(&mut rows);

        self.runs += 1;
        let mut result = GaussResult {
            contradiction,
            ..GaussResult::default()
        };

        if contradiction {
            self.total_eliminations += 1;
            return result;
        }

        let eligible_len_by_id: FxHashMap<u64, usize> =
            eligible.iter().map(|xor| (xor.id(), xor.len())).collect();

        for row in &rows {
            let set_columns: Vec<usize> = row
                .columns
                .iter()
                .enumerate()
                .filter(|&(_, &bit)| bit)
                .map(|(i, _)| i)
                .collect();

            match set_columns.len() {
                0 => {
                    if row.rhs {
                        result.contradiction = true;
                    }
                }
                1 => {
                    result.units.push((columns[set_columns[0]], row.rhs));
                    self.total_unit_propagations += 1;
                }
                n if n < *eligible_len_by_id.get(&row.source_xor).unwrap_or(&usize::MAX) => {
                    let vars: Vec<Var> = set_columns.iter().map(|&i| columns[i]).collect();
                    result
                        .learned
                        .push(XorClause::new(row.source_xor, vars, row.rhs));
                    self.total_eliminations += 1;
                }
                _ => {}
            }
        }

        if self.runs >= min_runs_before_disable {
            let avg_elim = self.total_eliminations as f64 / self.runs as f64;
            let avg_units = self.total_unit_propagations as f64 / self.runs as f64;
            if avg_elim < 0.1 && avg_units < 0.5 {
                self.disabled = true;
            }
        }

        result
    }
}

/// Reduces `rows` to row-echelon form over GF(2) in place via Gauss-Jordan
/// elimination. Returns `true` if an all-zero row with `rhs == true` is
/// found (a contradiction).
fn reduce(rows: &mut [Row]) -> bool {
    if rows.is_empty() {
        return false;
    }
    let col_count = rows[0].columns.len();
    let mut pivot_row = 0;

    for col in 0..col_count {
        let found = match (pivot_row..rows.len()).find(|&r| rows[r].columns[col]) {
            Some(found) => found,
            None => continue,
        };
        rows.swap(pivot_row, found);

        for r in 0..rows.len() {
            if r != pivot_row && rows[r].columns[col] {
                xor_rows(rows, r, pivot_row);
            }
        }
        pivot_row += 1;
        if pivot_row == rows.len() {
            break;
        }
    }

    rows.iter()
        .any(|row| row.rhs && row.columns.iter().all(|&bit| !bit))
}

fn xor_rows(rows: &mut [Row], dst: usize, src: usize) {
    let (rhs_src, columns_src) = (rows[src].rhs, rows[src].columns.clone());
    let dst_row = &mut rows[dst];
    for (bit, &src_bit) in dst_row.columns.iter_mut().zip(columns_src.iter()) {
        *bit ^= src_bit;
    }
    dst_row.rhs ^= rhs_src;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(i: usize) -> Var {
        Var::from_index(i)
    }

    #[test]
    fn solves_triangular_system_to_units() {
        let trail = Trail::default();
        // A ^ B = 1, B ^ C = 0, C = 0(i.e. unit xor with one var) forces
        // C=false, then B=false, then A=true.
        let xors = vec![
            XorClause::new(0, vec![var(0), var(1)], true),
            XorClause::new(1, vec![var(1), var(2)], false),
            XorClause::new(2, vec![var(2)], false),
        ];
        let mut trail_sized = trail;
        trail_sized.set_var_count(3);

        let mut eliminator = GaussianEliminator::new();
        let result = eliminator.run(&trail_sized, &xors, 1, 20, 5);
        assert!(!result.contradiction);

        let mut units: Vec<_> = result.units;
        units.sort_by_key(|&(v, _)| v.index());
        assert_eq!(units, vec![(var(0), true), (var(1), false), (var(2), false)]);
    }

    #[test]
    fn detects_contradiction() {
        let mut trail = Trail::default();
        trail.set_var_count(1);
        let xors = vec![
            XorClause::new(0, vec![var(0)], true),
            XorClause::new(1, vec![var(0)], false),
        ];
        let mut eliminator = GaussianEliminator::new();
        let result = eliminator.run(&trail, &xors, 1, 20, 5);
        assert!(result.contradiction);
    }

    #[test]
    fn auto_disables_after_ineffective_runs() {
        let mut trail = Trail::default();
        trail.set_var_count(4);
        // A 4-variable XOR with no propagatable structure across many runs.
        let xors = vec![XorClause::new(0, vec![var(0), var(1), var(2), var(3)], false)];
        let mut eliminator = GaussianEliminator::new();
        for _ in 0..6 {
            eliminator.run(&trail, &xors, 4, 20, 5);
        }
        assert!(eliminator.is_disabled());
    }
}

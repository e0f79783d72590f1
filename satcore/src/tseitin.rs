//! Tseitin transformation: compiles a [`satcore_ast::Expr`] tree into an
//! equisatisfiable [`ExtendedCnfFormula`].
//!
//! The teacher has no AST or circuit-to-CNF front end of its own (it only
//! ever reads DIMACS); this module is grounded in how Tseitin conversion is
//! normally done in the wider ecosystem: one fresh auxiliary variable per
//! subexpression, a handful of clauses per operator pinning the auxiliary
//! variable's truth value to its children's, and a single final unit clause
//! asserting the root. Operators are implemented in terms of two primitives
//! (`encode_and`, `encode_or`) wherever the boolean algebra allows it, rather
//! than writing out bespoke clauses per operator.

use rustc_hash::FxHashMap;

use satcore_ast::{Expr, VarName};
use satcore_formula::lit::{Lit, Var};
use satcore_formula::xor::ExtendedCnfFormula;

/// Bounds how large a chain of nested binary XOR nodes may grow before
/// falling back to a plain CNF encoding, mirroring the XOR extension's own
/// `xor_min_arity`/`xor_max_arity` window.
const MAX_DIRECT_XOR_ARITY: usize = 10;

/// Converts [`Expr`] trees into CNF, allocating one [`Var`] per named
/// variable (in first-occurrence order) plus one fresh auxiliary variable per
/// compound subexpression.
#[derive(Default)]
pub struct TseitinConverter {
    named_vars: FxHashMap<VarName, Var>,
    next_index: usize,
}

impl TseitinConverter {
    pub fn new() -> TseitinConverter {
        TseitinConverter::default()
    }

    /// The interned `VarName -> Var` table built up by `convert`, so a
    /// caller can translate a solver assignment (keyed by `Var`) back into
    /// one keyed by the original variable names.
    pub fn named_vars(&self) -> &FxHashMap<VarName, Var> {
        &self.named_vars
    }

    fn var_for_name(&mut self, name: &VarName) -> Var {
        if let Some(&var) = self.named_vars.get(name) {
            return var;
        }
        let var = Var::from_index(self.next_index);
        self.next_index += 1;
        self.named_vars.insert(name.clone(), var);
        var
    }

    fn fresh_var(&mut self) -> Var {
        let var = Var::from_index(self.next_index);
        self.next_index += 1;
        var
    }

    /// Converts a single expression into a formula asserting it as true: a
    /// fresh Tseitin formula plus one unit clause on the encoded root.
    pub fn convert(&mut self, expr: &Expr) -> ExtendedCnfFormula {
        let mut formula = ExtendedCnfFormula::new();
        let root = self.encode(expr, &mut formula);
        formula.cnf_mut().add_clause(vec![root]);
        formula
    }

    fn encode(&mut self, expr: &Expr, formula: &mut ExtendedCnfFormula) -> Lit {
        match expr {
            Expr::Variable(name, _) => self.var_for_name(name).positive(),
            Expr::Constant(value, _) => {
                // A fresh variable pinned by a unit clause, so every
                // subexpression can be referred to by literal alone.
                let var = self.fresh_var();
                formula.cnf_mut().add_clause(vec![var.lit(*value)]);
                var.positive()
            }
            Expr::Not(inner, _) => !self.encode(inner, formula),
            Expr::And(children, _) => {
                let lits: Vec<Lit> = children.iter().map(|c| self.encode(c, formula)).collect();
                let aux = self.fresh_var().positive();
                encode_and(aux, &lits, formula);
                aux
            }
            Expr::Or(children, _) => {
                let lits: Vec<Lit> = children.iter().map(|c| self.encode(c, formula)).collect();
                let aux = self.fresh_var().positive();
                encode_or(aux, &lits, formula);
                aux
            }
            Expr::Nand(children, _) => {
                let lits: Vec<Lit> = children
                    .iter()
                    .map(|c| !self.encode(c, formula))
                    .collect();
                let aux = self.fresh_var().positive();
                encode_or(aux, &lits, formula);
                aux
            }
            Expr::Nor(children, _) => {
                let lits: Vec<Lit> = children
                    .iter()
                    .map(|c| !self.encode(c, formula))
                    .collect();
                let aux = self.fresh_var().positive();
                encode_and(aux, &lits, formula);
                aux
            }
            Expr::Implies(a, b, _) => {
                let a_lit = self.encode(a, formula);
                let b_lit = self.encode(b, formula);
                let aux = self.fresh_var().positive();
                encode_or(aux, &[!a_lit, b_lit], formula);
                aux
            }
            Expr::Iff(a, b, _) => {
                let a_lit = self.encode(a, formula);
                let b_lit = self.encode(b, formula);
                let aux = self.fresh_var().positive();
                formula.cnf_mut().add_clause(vec![!aux, !a_lit, b_lit]);
                formula.cnf_mut().add_clause(vec![!aux, a_lit, !b_lit]);
                formula.cnf_mut().add_clause(vec![aux, a_lit, b_lit]);
                formula.cnf_mut().add_clause(vec![aux, !a_lit, !b_lit]);
                aux
            }
            Expr::Xor(a, b, _) => self.encode_xor(expr, a, b, formula),
        }
    }

    /// Flattens a chain of nested binary `Xor` nodes (e.g. `Xor(Xor(a,b),c)`)
    /// into its leaves, as long as the result stays within
    /// [`MAX_DIRECT_XOR_ARITY`]. Returns `None` if the chain is longer, in
    /// which case the caller falls back to a plain CNF encoding.
    fn flatten_xor<'e>(&self, expr: &'e Expr) -> Option<Vec<&'e Expr>> {
        fn walk<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) -> bool {
            match expr {
                Expr::Xor(a, b, _) => walk(a, out) && walk(b, out),
                other => {
                    out.push(other);
                    out.len() <= MAX_DIRECT_XOR_ARITY
                }
            }
        }
        let mut out = Vec::new();
        if walk(expr, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn encode_xor(
        &mut self,
        expr: &Expr,
        a: &Expr,
        b: &Expr,
        formula: &mut ExtendedCnfFormula,
    ) -> Lit {
        if let Some(leaves) = self.flatten_xor(expr) {
            let lits: Vec<Lit> = leaves.iter().map(|e| self.encode(e, formula)).collect();
            let aux = self.fresh_var();

            let neg_count = lits.iter().filter(|l| l.is_negative()).count();
            let parity = neg_count % 2 == 1;

            let mut vars: Vec<Var> = lits.iter().map(|l| l.var()).collect();
            vars.push(aux);
            formula.add_xor_clause(vars, parity);
            return aux.positive();
        }

        let a_lit = self.encode(a, formula);
        let b_lit = self.encode(b, formula);
        let aux = self.fresh_var().positive();
        formula.cnf_mut().add_clause(vec![!aux, a_lit, b_lit]);
        formula.cnf_mut().add_clause(vec![!aux, !a_lit, !b_lit]);
        formula.cnf_mut().add_clause(vec![aux, !a_lit, b_lit]);
        formula.cnf_mut().add_clause(vec![aux, a_lit, !b_lit]);
        aux
    }
}

/// Clauses pinning `aux <-> (y1 /\ y2 /\ ... /\ yn)`.
fn encode_and(aux: Lit, children: &[Lit], formula: &mut ExtendedCnfFormula) {
    for &y in children {
        formula.cnf_mut().add_clause(vec![!aux, y]);
    }
    let mut clause = vec![aux];
    clause.extend(children.iter().map(|&y| !y));
    formula.cnf_mut().add_clause(clause);
}

/// Clauses pinning `aux <-> (y1 \/ y2 \/ ... \/ yn)`.
fn encode_or(aux: Lit, children: &[Lit], formula: &mut ExtendedCnfFormula) {
    for &y in children {
        formula.cnf_mut().add_clause(vec![!y, aux]);
    }
    let mut clause = vec![!aux];
    clause.extend(children.iter().copied());
    formula.cnf_mut().add_clause(clause);
}

#[cfg(test)]
mod tests {
    use super::*;
    use satcore_ast::SourcePos;
    use satcore_formula::assignment::Assignment;

    fn pos() -> SourcePos {
        SourcePos::default()
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_owned(), pos())
    }

    fn all_satisfying_assignments(formula: &ExtendedCnfFormula) -> Vec<Vec<bool>> {
        let n = formula.var_count();
        let mut satisfying = Vec::new();
        for mask in 0u32..(1 << n) {
            let values: Vec<bool> = (0..n).map(|i| (mask >> i) & 1 == 1).collect();
            let mut assignment = Assignment::with_var_count(n);
            for (i, &v) in values.iter().enumerate() {
                assignment.assign(satcore_formula::lit::Var::from_index(i), v);
            }
            if assignment.satisfies_formula(formula.cnf())
                && formula.xor_clauses().iter().all(|x| assignment.satisfies_xor(x))
            {
                satisfying.push(values);
            }
        }
        satisfying
    }

    #[test]
    fn and_of_two_variables_is_satisfiable_only_when_both_true() {
        let expr = Expr::And(vec![var("a"), var("b")], pos());
        let mut converter = TseitinConverter::new();
        let formula = converter.convert(&expr);

        let satisfying = all_satisfying_assignments(&formula);
        assert!(!satisfying.is_empty());
        for values in &satisfying {
            assert!(values[0] && values[1]);
        }
    }

    #[test]
    fn xor_chain_within_bound_uses_direct_xor_clause() {
        let expr = Expr::Xor(
            Box::new(Expr::Xor(Box::new(var("a")), Box::new(var("b")), pos())),
            Box::new(var("c")),
            pos(),
        );
        let mut converter = TseitinConverter::new();
        let formula = converter.convert(&expr);

        assert_eq!(formula.xor_clauses().len(), 1);
        assert!(formula.cnf().is_empty() || formula.cnf().len() == 1);
    }

    #[test]
    fn implies_is_satisfiable_when_antecedent_false() {
        let expr = Expr::Implies(Box::new(var("a")), Box::new(var("b")), pos());
        let mut converter = TseitinConverter::new();
        let formula = converter.convert(&expr);

        let satisfying = all_satisfying_assignments(&formula);
        assert!(satisfying.iter().any(|v| !v[0]));
        assert!(satisfying.iter().all(|v| !v[0] || v[1]));
    }
}

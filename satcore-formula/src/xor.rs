//! XOR constraints and CNF formulas extended with them.
use crate::cnf::CnfFormula;
use crate::lit::Var;

/// A linear equation over GF(2): the sum (XOR) of a set of variables equals
/// a fixed parity bit.
///
/// `parity = true` means the variables must XOR to `1` (an odd number of
/// them must be true); `parity = false` means they must XOR to `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorClause {
    id: u64,
    vars: Vec<Var>,
    parity: bool,
    learned: bool,
}

impl XorClause {
    /// Creates a new (non-learned) XOR clause.
    pub fn new(id: u64, vars: Vec<Var>, parity: bool) -> XorClause {
        XorClause {
            id,
            vars,
            parity,
            learned: false,
        }
    }

    /// The clause's unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The variables participating in the constraint.
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    /// The required parity of the sum of `vars`.
    pub fn parity(&self) -> bool {
        self.parity
    }

    /// Whether this XOR clause was derived during search (as opposed to
    /// being part of the original input).
    pub fn learned(&self) -> bool {
        self.learned
    }

    /// Marks the clause as learned.
    pub fn set_learned(&mut self, learned: bool) {
        self.learned = learned;
    }

    /// Number of variables in the constraint.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the constraint has no variables.
    ///
    /// An empty XOR clause with `parity == true` is unsatisfiable (0 = 1);
    /// with `parity == false` it is trivially true.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A CNF formula extended with a set of XOR constraints sharing its variable
/// namespace.
#[derive(Debug, Clone, Default)]
pub struct ExtendedCnfFormula {
    cnf: CnfFormula,
    xor_clauses: Vec<XorClause>,
    next_xor_id: u64,
}

impl ExtendedCnfFormula {
    /// Creates an empty extended formula.
    pub fn new() -> ExtendedCnfFormula {
        ExtendedCnfFormula::default()
    }

    /// Creates an extended formula with no XOR constraints from a plain CNF
    /// formula.
    pub fn from_cnf(cnf: CnfFormula) -> ExtendedCnfFormula {
        ExtendedCnfFormula {
            cnf,
            xor_clauses: vec![],
            next_xor_id: 0,
        }
    }

    /// The plain-clause part of the formula.
    pub fn cnf(&self) -> &CnfFormula {
        &self.cnf
    }

    /// Mutable access to the plain-clause part of the formula.
    pub fn cnf_mut(&mut self) -> &mut CnfFormula {
        &mut self.cnf
    }

    /// The XOR constraints of the formula.
    pub fn xor_clauses(&self) -> &[XorClause] {
        &self.xor_clauses
    }

    /// Adds an XOR constraint and returns its id.
    pub fn add_xor_clause(&mut self, vars: Vec<Var>, parity: bool) -> u64 {
        let id = self.next_xor_id;
        self.next_xor_id += 1;
        let max_index = vars.iter().map(|v| v.index() + 1).max().unwrap_or(0);
        self.cnf.set_var_count(max_index);
        self.xor_clauses.push(XorClause::new(id, vars, parity));
        id
    }

    /// Number of variables across both the CNF and XOR parts.
    pub fn var_count(&self) -> usize {
        self.cnf.var_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lit::Var;

    #[test]
    fn xor_clause_records_parity_and_vars() {
        let xor = XorClause::new(0, vec![Var::from_index(0), Var::from_index(1)], true);
        assert_eq!(xor.len(), 2);
        assert!(xor.parity());
        assert!(!xor.learned());
    }

    #[test]
    fn extended_formula_tracks_var_count_from_xor() {
        let mut ext = ExtendedCnfFormula::new();
        ext.add_xor_clause(vec![Var::from_index(4)], false);
        assert_eq!(ext.var_count(), 5);
    }
}

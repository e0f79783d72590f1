//! XOR-constraint propagation and conflict-to-clause conversion.
//!
//! The teacher has no XOR extension; this module is grounded directly in
//! spec §4.9, built the way the rest of this crate's search-time components
//! are: plain structs operated on by free functions taking explicit
//! `&mut`/`&` references, matching [`crate::propagate::propagate`]'s shape
//! rather than the teacher's `partial_ref`-threaded `Context`.
//!
//! Unlike CNF propagation, a single call only ever reports the *first*
//! interesting XOR outcome (one forced literal, or a violation) rather than
//! draining every clause: the caller is expected to enqueue the forced
//! literal, run CNF propagation again (a CNF clause may itself now force
//! something an XOR clause depends on), and call back in, alternating until
//! neither side has anything left to propagate. This keeps the function
//! signature a plain `&Trail` reader — an XOR clause never needs to know how
//! `Trail::enqueue` works, just what it would enqueue.

use satcore_formula::lit::{Lit, Var};
use satcore_formula::xor::XorClause;

use crate::trail::Trail;

/// The outcome of XOR-propagating a single constraint.
enum XorOutcome {
    /// Either already satisfied, or has more than one unassigned variable.
    Nothing,
    /// Exactly one variable unassigned; propagates `forced`.
    Forces(Lit),
    /// Every variable assigned and the parity constraint is violated.
    Violated,
}

fn evaluate(trail: &Trail, xor: &XorClause) -> XorOutcome {
    let mut parity = false;
    let mut unassigned: Option<Var> = None;
    let mut unassigned_count = 0;

    for &var in xor.vars() {
        match trail.assignment().var_value(var) {
            Some(value) => parity ^= value,
            None => {
                unassigned_count += 1;
                unassigned = Some(var);
            }
        }
    }

    match unassigned_count {
        0 if parity != xor.parity() => XorOutcome::Violated,
        0 => XorOutcome::Nothing,
        1 => {
            let var = unassigned.unwrap();
            // The unassigned variable must take the value that makes the
            // running parity match the required one.
            let forced_positive = parity != xor.parity();
            XorOutcome::Forces(var.lit(forced_positive))
        }
        _ => XorOutcome::Nothing,
    }
}

/// A violated XOR clause, converted to a CDCL-compatible conflict clause per
/// spec §4.9: the negations of every currently-assigned variable.
pub struct XorConflict {
    pub clause: Vec<Lit>,
}

/// Converts the current (fully assigned) state of a violated XOR clause into
/// the literals of an equivalent CNF clause: the negations of every
/// currently-assigned variable of the constraint.
fn to_conflict_clause(trail: &Trail, xor: &XorClause) -> Vec<Lit> {
    let mut clause = Vec::with_capacity(xor.vars().len());
    for &var in xor.vars() {
        if let Some(value) = trail.assignment().var_value(var) {
            clause.push(var.lit(!value));
        }
    }
    clause
}

/// One step of XOR propagation: either a literal that must be enqueued, or a
/// violated constraint converted to a conflict clause.
pub enum XorStep {
    Forces(Lit),
    Conflict(XorConflict),
}

/// Scans every XOR clause once, stopping at the first one that either forces
/// a literal or is violated. Returns `None` if every XOR clause is already
/// satisfied or has more than one unassigned variable (a fixpoint as far as
/// the XOR side is concerned).
pub fn propagate_xor(trail: &Trail, xor_clauses: &[XorClause]) -> Option<XorStep> {
    for xor in xor_clauses {
        match evaluate(trail, xor) {
            XorOutcome::Nothing => {}
            XorOutcome::Violated => {
                return Some(XorStep::Conflict(XorConflict {
                    clause: to_conflict_clause(trail, xor),
                }));
            }
            XorOutcome::Forces(lit) => return Some(XorStep::Forces(lit)),
        }
    }
    None
}

/// Builds a CDCL-compatible reason clause for a literal forced by XOR
/// propagation: `forced` at index 0 plus the negations of the other,
/// currently-assigned variables of whichever XOR clause forces it, so the
/// clause is false everywhere except the forced literal and can be used as
/// an ordinary [`crate::trail::Reason::Propagated`] justification during
/// conflict analysis. Re-scans `xor_clauses` for the constraint that
/// currently forces `forced`, so it must be called before anything else
/// changes the assignment.
pub fn reason_clause_for_force(trail: &Trail, xor_clauses: &[XorClause], forced: Lit) -> Vec<Lit> {
    for xor in xor_clauses {
        if let XorOutcome::Forces(lit) = evaluate(trail, xor) {
            if lit == forced {
                let mut clause = vec![forced];
                for &var in xor.vars() {
                    if var == forced.var() {
                        continue;
                    }
                    if let Some(value) = trail.assignment().var_value(var) {
                        clause.push(var.lit(!value));
                    }
                }
                return clause;
            }
        }
    }
    vec![forced]
}

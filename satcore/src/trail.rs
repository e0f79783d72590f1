//! Partial assignment, the propagation trail, and the implication graph.
//!
//! Adapted from the teacher's `prop::assignment::{Assignment, Trail}` and
//! `prop::graph::{ImplGraph, ImplNode, Reason}`, merged into one module and
//! generalized: the teacher special-cases binary clauses with their own
//! `Reason::Binary`/watch structures (`prop/binary.rs`); here every clause of
//! length >= 2 is a [`crate::clause::ClauseRef`] in the long-clause watch
//! scheme, so `Reason` only distinguishes a decision/unit source from a
//! clause-backed propagation.

use satcore_formula::lit::{Lit, LitIdx, Var};

use crate::clause::ClauseRef;

/// Why a literal's value was forced.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// Assigned by a decision, or forced by a true unit clause.
    Decision,
    /// Forced by unit propagation on the given clause; the propagated
    /// literal is always stored at index 0 of that clause.
    Propagated(ClauseRef),
}

/// A clause whose every literal is false, found during propagation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Conflict(pub ClauseRef);

#[derive(Copy, Clone, Debug)]
struct ImplNode {
    reason: Reason,
    level: LitIdx,
    /// Trail position at the moment this literal was assigned, used by
    /// conflict analysis to process literals in reverse assignment order.
    depth: LitIdx,
}

impl Default for ImplNode {
    fn default() -> ImplNode {
        ImplNode {
            reason: Reason::Decision,
            level: 0,
            depth: 0,
        }
    }
}

/// Current partial assignment over all variables.
#[derive(Default)]
pub struct Assignment {
    values: Vec<Option<bool>>,
    /// The phase a variable had when last unassigned, used for phase saving.
    last_value: Vec<bool>,
}

impl Assignment {
    pub fn set_var_count(&mut self, count: usize) {
        self.values.resize(count, None);
        self.last_value.resize(count, false);
    }

    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    pub fn last_var_value(&self, var: Var) -> bool {
        self.last_value[var.index()]
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.index()].map(|value| value ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.lit_value(lit) == Some(true)
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.lit_value(lit) == Some(false)
    }

    pub fn lit_is_unknown(&self, lit: Lit) -> bool {
        self.values[lit.index()].is_none()
    }

    fn assign_lit(&mut self, lit: Lit) {
        self.values[lit.index()] = Some(lit.is_positive());
    }

    fn unassign(&mut self, lit: Lit) {
        self.last_value[lit.index()] = self.values[lit.index()] == Some(true);
        self.values[lit.index()] = None;
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    assignment: Assignment,
    nodes: Vec<ImplNode>,

    trail: Vec<Lit>,
    queue_head_pos: usize,
    /// Trail index at which each decision level began.
    decisions: Vec<LitIdx>,
}

impl Trail {
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.set_var_count(count);
        self.nodes.resize(count, ImplNode::default());
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    pub fn level_of(&self, var: Var) -> usize {
        self.nodes[var.index()].level as usize
    }

    pub fn depth_of(&self, var: Var) -> usize {
        self.nodes[var.index()].depth as usize
    }

    pub fn reason_of(&self, var: Var) -> Reason {
        self.nodes[var.index()].reason
    }

    /// True once every enqueued literal has been passed to the propagator.
    pub fn fully_propagated(&self) -> bool {
        self.queue_head_pos == self.trail.len()
    }

    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).copied()
    }

    pub fn pop_queue(&mut self) -> Option<Lit> {
        let head = self.queue_head();
        if head.is_some() {
            self.queue_head_pos += 1;
        }
        head
    }

    /// Starts a new decision level. Does not enqueue the decision literal
    /// itself; call [`Trail::enqueue`] right after with `Reason::Decision`.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx);
    }

    /// Enqueues `lit` as true with the given reason. `lit` must currently be
    /// unassigned.
    pub fn enqueue(&mut self, lit: Lit, reason: Reason) {
        debug_assert!(self.assignment.lit_value(lit).is_none());

        self.assignment.assign_lit(lit);
        self.trail.push(lit);

        let node = &mut self.nodes[lit.index()];
        node.reason = reason;
        node.level = self.decisions.len() as LitIdx;
        node.depth = self.trail.len() as LitIdx;
    }

    /// Undoes every assignment belonging to a decision level deeper than
    /// `level`, restoring their last-assigned phase for phase saving.
    pub fn backtrack_to(&mut self, level: usize, mut make_available: impl FnMut(Var)) {
        if level >= self.decisions.len() {
            return;
        }

        let new_len = self.decisions[level] as usize;
        self.queue_head_pos = new_len;
        self.decisions.truncate(level);

        for &lit in &self.trail[new_len..] {
            make_available(lit.var());
            self.assignment.unassign(lit);
        }
        self.trail.truncate(new_len);
    }

    /// Number of assignments fixed at decision level 0, these never get
    /// undone by a restart.
    pub fn top_level_assignment_count(&self) -> usize {
        self.decisions.get(0).map(|&n| n as usize).unwrap_or(self.trail.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: usize, polarity: bool) -> Lit {
        Var::from_index(i).lit(polarity)
    }

    #[test]
    fn enqueue_then_backtrack_restores_unassigned() {
        let mut trail = Trail::default();
        trail.set_var_count(4);

        trail.new_decision_level();
        trail.enqueue(lit(0, true), Reason::Decision);
        trail.new_decision_level();
        trail.enqueue(lit(1, false), Reason::Decision);

        assert_eq!(trail.current_level(), 2);
        assert!(trail.assignment().lit_is_true(lit(0, true)));
        assert!(trail.assignment().lit_is_true(lit(1, false)));

        let mut available = vec![];
        trail.backtrack_to(1, |var| available.push(var));

        assert_eq!(trail.current_level(), 1);
        assert!(trail.assignment().lit_is_unknown(lit(1, false)));
        assert!(trail.assignment().lit_is_true(lit(0, true)));
        assert_eq!(available, vec![Var::from_index(1)]);
    }

    #[test]
    fn backtrack_saves_last_phase() {
        let mut trail = Trail::default();
        trail.set_var_count(2);
        trail.new_decision_level();
        trail.enqueue(lit(0, false), Reason::Decision);
        trail.backtrack_to(0, |_| {});

        assert!(!trail.assignment().last_var_value(Var::from_index(0)));
    }

    #[test]
    fn queue_advances_and_reports_fully_propagated() {
        let mut trail = Trail::default();
        trail.set_var_count(2);
        trail.new_decision_level();
        trail.enqueue(lit(0, true), Reason::Decision);

        assert!(!trail.fully_propagated());
        assert_eq!(trail.pop_queue(), Some(lit(0, true)));
        assert!(trail.fully_propagated());
        assert_eq!(trail.pop_queue(), None);
    }
}

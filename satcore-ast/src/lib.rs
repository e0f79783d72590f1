//! Expression AST and the logic-system interfaces the satcore CDCL solver
//! consumes but does not implement.
//!
//! This crate intentionally stays outside "the core": it defines the shape
//! of the input the Tseitin converter expects (`Expr`) and the collaborator
//! interfaces (`ExpressionValidator`, `ClassicalEvaluator`, `LogicSystem`)
//! without providing a hand-written lexer/parser or a full circuit
//! simulator. The small default implementations here exist only so the
//! `SATSystem` facade in `satcore` is runnable end to end; they are
//! external collaborators, not part of the CDCL core.

use std::collections::HashMap;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// A variable name as produced by an external lexer/parser.
pub type VarName = String;

/// A position in the original source text, attached to every AST node for
/// error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

/// A boolean expression tree, as produced by an external parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Variable(VarName, SourcePos),
    Constant(bool, SourcePos),
    Not(Box<Expr>, SourcePos),
    And(Vec<Expr>, SourcePos),
    Or(Vec<Expr>, SourcePos),
    Xor(Box<Expr>, Box<Expr>, SourcePos),
    Nand(Vec<Expr>, SourcePos),
    Nor(Vec<Expr>, SourcePos),
    Implies(Box<Expr>, Box<Expr>, SourcePos),
    Iff(Box<Expr>, Box<Expr>, SourcePos),
}

impl Expr {
    /// The source position this node was parsed from.
    pub fn pos(&self) -> SourcePos {
        match self {
            Expr::Variable(_, p)
            | Expr::Constant(_, p)
            | Expr::Not(_, p)
            | Expr::And(_, p)
            | Expr::Or(_, p)
            | Expr::Xor(_, _, p)
            | Expr::Nand(_, p)
            | Expr::Nor(_, p)
            | Expr::Implies(_, _, p)
            | Expr::Iff(_, _, p) => *p,
        }
    }
}

/// Errors surfaced by the AST-facing collaborators.
///
/// `ParseFailure` is raised by the (external) parser before a solver is ever
/// invoked; `UndefinedVariable` is raised only by `ClassicalEvaluator::evaluate`
/// when an assignment is missing a variable the expression refers to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("parse failure at line {line}, column {column}: {message}")]
    ParseFailure {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("undefined variable `{0}`")]
    UndefinedVariable(VarName),
}

/// Validates that an expression is well-formed before it reaches the
/// Tseitin converter.
///
/// This is an external collaborator interface: the `satcore` crate calls
/// into it but does not own its implementation.
pub trait ExpressionValidator {
    fn validate(&self, expr: &Expr) -> Result<(), ExpressionError>;
}

/// A structural validator checking only the invariants the Tseitin converter
/// itself relies on (n-ary operators need at least one operand).
///
/// This is a minimal stand-in for whatever validation an external parser
/// front-end performs; it is not a general well-formedness checker.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicValidator;

impl ExpressionValidator for BasicValidator {
    fn validate(&self, expr: &Expr) -> Result<(), ExpressionError> {
        match expr {
            Expr::And(children, pos)
            | Expr::Or(children, pos)
            | Expr::Nand(children, pos)
            | Expr::Nor(children, pos) => {
                if children.is_empty() {
                    return Err(ExpressionError::ParseFailure {
                        message: "n-ary operator requires at least one operand".to_owned(),
                        line: pos.line,
                        column: pos.column,
                    });
                }
                for child in children {
                    self.validate(child)?;
                }
                Ok(())
            }
            Expr::Not(inner, _) => self.validate(inner),
            Expr::Xor(a, b, _) | Expr::Implies(a, b, _) | Expr::Iff(a, b, _) => {
                self.validate(a)?;
                self.validate(b)
            }
            Expr::Variable(..) | Expr::Constant(..) => Ok(()),
        }
    }
}

/// Evaluates an expression under a full assignment.
///
/// Used only by `verify_solution`-style checks, never by the solver itself.
pub trait ClassicalEvaluator {
    fn evaluate(
        &self,
        expr: &Expr,
        assignment: &HashMap<VarName, bool>,
    ) -> Result<bool, ExpressionError>;
}

/// A direct recursive evaluator over a full variable assignment.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicEvaluator;

impl ClassicalEvaluator for BasicEvaluator {
    fn evaluate(
        &self,
        expr: &Expr,
        assignment: &HashMap<VarName, bool>,
    ) -> Result<bool, ExpressionError> {
        match expr {
            Expr::Variable(name, _) => assignment
                .get(name)
                .copied()
                .ok_or_else(|| ExpressionError::UndefinedVariable(name.clone())),
            Expr::Constant(value, _) => Ok(*value),
            Expr::Not(inner, _) => Ok(!self.evaluate(inner, assignment)?),
            Expr::And(children, _) => {
                for child in children {
                    if !self.evaluate(child, assignment)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(children, _) => {
                for child in children {
                    if self.evaluate(child, assignment)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Nand(children, pos) => {
                Ok(!self.evaluate(&Expr::And(children.clone(), *pos), assignment)?)
            }
            Expr::Nor(children, pos) => {
                Ok(!self.evaluate(&Expr::Or(children.clone(), *pos), assignment)?)
            }
            Expr::Xor(a, b, _) => {
                Ok(self.evaluate(a, assignment)? ^ self.evaluate(b, assignment)?)
            }
            Expr::Implies(a, b, _) => {
                Ok(!self.evaluate(a, assignment)? || self.evaluate(b, assignment)?)
            }
            Expr::Iff(a, b, _) => {
                Ok(self.evaluate(a, assignment)? == self.evaluate(b, assignment)?)
            }
        }
    }
}

/// A named logic system exposing generic evaluate/validate/supported-operator
/// operations, registered in a `LogicRegistry` by name.
pub trait LogicSystem {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        expr: &Expr,
        assignment: &HashMap<VarName, bool>,
    ) -> Result<bool, ExpressionError>;

    fn validate(&self, expr: &Expr) -> Result<(), ExpressionError>;

    fn supported_operators(&self) -> &[&'static str];
}

/// A name -> system registry, so callers can look up a logic system (e.g.
/// `"sat"`) without depending on its concrete type.
#[derive(Default)]
pub struct LogicRegistry {
    systems: FxHashMap<String, Box<dyn LogicSystem>>,
}

impl LogicRegistry {
    pub fn new() -> LogicRegistry {
        LogicRegistry::default()
    }

    /// Registers a logic system under its own `name()`.
    pub fn register(&mut self, system: Box<dyn LogicSystem>) {
        self.systems.insert(system.name().to_owned(), system);
    }

    /// Looks up a previously registered logic system by name.
    pub fn get(&self, name: &str) -> Option<&dyn LogicSystem> {
        self.systems.get(name).map(|system| system.as_ref())
    }
}

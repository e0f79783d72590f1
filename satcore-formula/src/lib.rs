//! Basic formula data types used by the satcore CDCL solver.
//!
//! This crate has no notion of a solver; it only defines the data that a
//! solver consumes and produces: literals, CNF formulas, XOR constraints and
//! partial assignments.

pub mod assignment;
pub mod cnf;
pub mod lit;
pub mod xor;


pub use assignment::Assignment;
pub use cnf::CnfFormula;
pub use lit::{Lit, LitIdx, Var};
pub use xor::{ExtendedCnfFormula, XorClause};

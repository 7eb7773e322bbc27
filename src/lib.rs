//! # symtab-rs: Scoped symbol tables with symbolic ranges
//!
//! **`symtab-rs`** provides the symbol table used by compiler passes that walk an
//! intermediate representation in dataflow order and need to know, for every
//! variable in scope, how it was defined and which values it can take.
//!
//! ## What is tracked?
//!
//! For every bound variable, the [`SymbolTable`][crate::symtab::SymbolTable] keeps an
//! [`Entry`][crate::symtab::Entry] holding:
//!
//! - the defining expression (for single-result statements),
//! - a symbolic scalar form of that expression ([`ScalExp`][crate::scalar::ScalExp]), when one exists,
//! - a conservative symbolic [`Range`][crate::scalar::Range] `[lower, upper]`,
//! - the loop nesting depth at which it was bound, and whether it is a loop variable,
//! - a user-defined annotation computed at insertion time.
//!
//! ## Range refinement
//!
//! When the traversal enters a branch, [`update_bounds`][crate::symtab::SymbolTable::update_bounds]
//! tightens the ranges of the variables constrained by the branch condition.
//! The negated condition is normalized into a disjunction of relations; every
//! disjunct must be false, and each resulting fact is solved for its most local
//! variable. Derived bounds are merged with `min`/`max`, so ranges never widen.
//!
//! ## Basic Usage
//!
//! ```rust
//! use symtab_rs::ir::{CmpOp, Exp, Ident, SubExp, Type};
//! use symtab_rs::scalar::ScalExp;
//! use symtab_rs::symtab::SymbolTable;
//! use symtab_rs::types::Name;
//!
//! let n = Name::new("n", 1);
//! let table = SymbolTable::plain().insert_parameter(&Ident::new(n.clone(), Type::int()));
//!
//! // Inside `if n < 10 { ... }`:
//! let cond = Exp::CmpOp(CmpOp::Lt, SubExp::var(n.clone(), Type::int()), SubExp::int(10));
//! let inner = table.clone().update_bounds(true, &cond);
//! assert_eq!(inner.lookup_range(&n).upper, Some(ScalExp::int(9)));
//!
//! // The outer table is unaffected.
//! assert!(table.lookup_range(&n).is_unknown());
//! ```
//!
//! ## Core Components
//!
//! - **[`symtab`]**: The symbol table, its insertion rules and the refinement engine.
//! - **[`algebra`]**: Simplification, elimination-candidate selection and linear solving over scalar expressions.
//! - **[`scalar`]**: Symbolic scalar expressions and ranges.
//! - **[`translate`]**: Translation of IR expressions into scalar expressions.
//! - **[`ir`]**: The IR fragment consumed by the table.

pub mod algebra;
pub mod ir;
pub mod scalar;
pub mod symtab;
pub mod translate;
pub mod types;

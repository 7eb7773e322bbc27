//! Algebraic simplification and solving over [`ScalExp`].
//!
//! Three operations are provided to the range-refinement engine:
//!
//! - [`simplify`]: normalizes integer arithmetic into a sorted sum of monomials,
//!   folds min/max nodes, and turns boolean structure into disjunctive normal
//!   form with negations pushed down to the relations.
//! - [`pick_elimination_candidate`]: chooses which symbol of an expression to solve for.
//! - [`linear_form`]: decomposes an expression into `a * sym + b`.
//!
//! All operations take a [`RangeContext`], the known ranges (and binding depths)
//! of the variables in scope, which is used as a source of facts during
//! simplification.
//!
//! # Termination
//!
//! Simplification is a single bottom-up pass, without rewriting to a fixpoint.
//! The only super-linear step is the distribution of conjunctions over
//! disjunctions, which is bounded by [`Limits::max_dnf_terms`].

use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::scalar::{Range, ScalExp};
use crate::types::{Name, PrimType, SrcLoc};

mod poly;
mod simplify;
mod solve;

pub use simplify::simplify;
pub use solve::{linear_form, pick_elimination_candidate};

/// Resource limits for the simplifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Limits {
    /// Maximal number of disjuncts in a normalized boolean expression.
    pub max_dnf_terms: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_dnf_terms: 64 }
    }
}

/// Known range and binding depth of a single variable.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeInfo {
    pub depth: usize,
    pub range: Range,
}

/// Range facts available to the simplifier.
#[derive(Debug, Clone, Default)]
pub struct RangeContext {
    ranges: FxHashMap<Name, RangeInfo>,
    limits: Limits,
}

impl RangeContext {
    pub fn new(limits: Limits) -> Self {
        RangeContext {
            ranges: FxHashMap::default(),
            limits,
        }
    }

    pub fn insert(&mut self, name: Name, depth: usize, range: Range) {
        self.ranges.insert(name, RangeInfo { depth, range });
    }

    pub fn get(&self, name: &Name) -> Option<&RangeInfo> {
        self.ranges.get(name)
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.ranges.contains_key(name)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Constant lower and upper bounds of `name`, if its bounds simplify to constants.
    ///
    /// Bounds are simplified without any range facts, so this never recurses
    /// through the context.
    pub(crate) fn constant_bounds(&self, name: &Name) -> (Option<BigInt>, Option<BigInt>) {
        let Some(info) = self.ranges.get(name) else {
            return (None, None);
        };
        let bare = RangeContext::new(self.limits);
        let eval = |bound: &Option<ScalExp>| {
            let bound = bound.as_ref()?;
            if bound.scalar_type() != PrimType::Int {
                return None;
            }
            simplify(bound, SrcLoc::default(), &bare).ok()?.as_int().cloned()
        };
        (eval(&info.range.lower), eval(&info.range.upper))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimplifyError {
    #[error("{loc}: expected a {expected} expression, found `{expr}`")]
    IllTyped {
        loc: SrcLoc,
        expr: String,
        expected: PrimType,
    },

    #[error("{loc}: normal form of `{expr}` exceeds {limit} disjuncts")]
    TooManyDisjuncts { loc: SrcLoc, expr: String, limit: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error(transparent)]
    Simplify(#[from] SimplifyError),
}

pub type Result<T, E = SimplifyError> = std::result::Result<T, E>;

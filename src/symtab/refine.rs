//! Range refinement from branch conditions.

use log::{debug, trace};
use num_traits::ToPrimitive;
use rustc_hash::FxHashSet;

use super::{Entry, SymbolTable};
use crate::algebra::{linear_form, pick_elimination_candidate, simplify, RangeContext};
use crate::ir::Exp;
use crate::scalar::{RelOp0, ScalExp};
use crate::translate::to_scalar;
use crate::types::{Name, PrimType, SrcLoc};

/// A bound derived from a single `e <= 0` fact.
enum Candidate {
    Lower(Name, ScalExp),
    Upper(Name, ScalExp),
}

impl<A, F> SymbolTable<A, F>
where
    A: Clone,
    F: Fn(&Entry<()>) -> A,
{
    /// Refines the table for the branch of a conditional guarded by `cond`.
    ///
    /// In the false branch (`is_true_branch == false`), the negation of `cond`
    /// is assumed instead. If `cond` has no symbolic form, the table is
    /// returned unchanged.
    pub fn update_bounds(self, is_true_branch: bool, cond: &Exp) -> Self {
        let translated = to_scalar(cond, &|n: &Name| self.resolve_scalar(n));
        let Some(cond) = translated else {
            trace!("condition has no symbolic form, nothing to refine");
            return self;
        };
        let cond = if is_true_branch { cond } else { ScalExp::not(cond) };
        self.assume(&cond, SrcLoc::default())
    }

    /// Tightens the ranges of the variables constrained by `cond`, which is known to hold.
    ///
    /// Since `cond` holds, every disjunct of the normal form of `!cond` is
    /// false. Each false relation `e < 0` (resp. `e <= 0`) yields the fact
    /// `-e <= 0` (resp. `1 - e <= 0`), which is solved for its most local
    /// variable. Facts that cannot be simplified, have no candidate variable,
    /// or are not of the form `±sym + b <= 0` are dropped.
    pub fn assume(self, cond: &ScalExp, loc: SrcLoc) -> Self {
        let ctx = self.ranges();
        let negated = match simplify(&ScalExp::not(cond.clone()), loc, &ctx) {
            Ok(e) => e,
            Err(err) => {
                debug!("no refinement from {}: {}", cond, err);
                return self;
            }
        };
        trace!("assume {}: negation normalizes to {}", cond, negated);

        let candidates: Vec<Candidate> = negated
            .disjuncts()
            .into_iter()
            .filter_map(|disjunct| match disjunct {
                ScalExp::Rel(op, e) if e.scalar_type() == PrimType::Int => {
                    let fact = match op {
                        RelOp0::Lth0 => ScalExp::neg((**e).clone()),
                        RelOp0::Leq0 => ScalExp::minus(ScalExp::int(1), (**e).clone()),
                    };
                    bound_from_fact(&fact, loc, &ctx)
                }
                _ => {
                    trace!("skipping non-relational disjunct {}", disjunct);
                    None
                }
            })
            .collect();

        candidates.into_iter().fold(self, |table, candidate| match candidate {
            Candidate::Lower(name, bound) => {
                debug!("derived {} >= {}", name, bound);
                table.set_lower_bound(&name, bound)
            }
            Candidate::Upper(name, bound) => {
                debug!("derived {} <= {}", name, bound);
                table.set_upper_bound(&name, bound)
            }
        })
    }
}

/// Turns the fact `fact <= 0` into a bound on one variable.
fn bound_from_fact(fact: &ScalExp, loc: SrcLoc, ctx: &RangeContext) -> Option<Candidate> {
    let fact = match simplify(fact, loc, ctx) {
        Ok(fact) => fact,
        Err(err) => {
            debug!("dropping fact {} <= 0: {}", fact, err);
            return None;
        }
    };
    let Some(name) = pick_elimination_candidate(ctx, &FxHashSet::default(), &fact) else {
        trace!("dropping fact {} <= 0: no variable to solve for", fact);
        return None;
    };
    let (a, b) = match linear_form(&name, &fact, loc, ctx) {
        Ok(Some(form)) => form,
        Ok(None) => {
            trace!("dropping fact {} <= 0: not linear in {}", fact, name);
            return None;
        }
        Err(err) => {
            debug!("dropping fact {} <= 0: {}", fact, err);
            return None;
        }
    };
    match a.as_int().and_then(|a| a.to_i8()) {
        // -sym + b <= 0
        Some(-1) => Some(Candidate::Lower(name, b)),
        // sym + b <= 0
        Some(1) => match simplify(&ScalExp::neg(b), loc, ctx) {
            Ok(upper) => Some(Candidate::Upper(name, upper)),
            Err(err) => {
                debug!("dropping upper bound of {}: {}", name, err);
                None
            }
        },
        _ => {
            trace!("dropping fact {} <= 0: coefficient {} of {} is not a unit", fact, a, name);
            None
        }
    }
}

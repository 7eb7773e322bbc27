use log::trace;
use rustc_hash::FxHashSet;

use super::poly::{Atom, Poly, Term};
use super::simplify::normalize;
use super::{RangeContext, SolveError};
use crate::scalar::ScalExp;
use crate::types::{Name, PrimType, SrcLoc};

/// Picks the symbol of `e` to eliminate first.
///
/// Candidates are the free names of `e` that are not `excluded` and have an
/// entry in `ctx`. The most deeply bound (most local) candidate wins; among
/// equally deep candidates, the first occurrence in `e` wins.
pub fn pick_elimination_candidate(ctx: &RangeContext, excluded: &FxHashSet<Name>, e: &ScalExp) -> Option<Name> {
    let mut best: Option<(usize, Name)> = None;
    for name in e.free_names() {
        if excluded.contains(&name) {
            continue;
        }
        let Some(info) = ctx.get(&name) else {
            continue;
        };
        if best.as_ref().map_or(true, |(depth, _)| info.depth > *depth) {
            best = Some((info.depth, name));
        }
    }
    best.map(|(_, name)| name)
}

/// Decomposes `e` into `a * name + b`, where neither `a` nor `b` mentions `name`.
///
/// Returns `Ok(None)` if `e` is not linear in `name` (including when `name`
/// does not occur at all, or occurs under a min/max or a division).
pub fn linear_form(
    name: &Name,
    e: &ScalExp,
    loc: SrcLoc,
    ctx: &RangeContext,
) -> Result<Option<(ScalExp, ScalExp)>, SolveError> {
    if e.scalar_type() != PrimType::Int {
        return Ok(None);
    }

    let poly = normalize(e, loc, ctx)?;

    let mut coeff = Vec::new();
    let mut rest = Vec::new();
    for term in poly.terms() {
        let occurrences = term.atoms.iter().filter(|a| matches!(a, Atom::Sym(s) if s == name)).count();
        let hidden = term.atoms.iter().any(|a| matches!(a, Atom::Opaque(_)) && a.mentions(name));
        match (occurrences, hidden) {
            (_, true) => return Ok(None),
            (0, false) => rest.push(term.clone()),
            (1, false) => coeff.push(Term {
                coeff: term.coeff.clone(),
                atoms: term.atoms.iter().filter(|a| !matches!(a, Atom::Sym(s) if s == name)).cloned().collect(),
            }),
            _ => return Ok(None),
        }
    }
    if coeff.is_empty() {
        return Ok(None);
    }

    let a = Poly::from_terms(coeff).to_scalar();
    let b = Poly::from_terms(rest).to_scalar();
    trace!("linear_form({}, {}) = ({}) * {} + ({})", name, e, a, name, b);
    Ok(Some((a, b)))
}

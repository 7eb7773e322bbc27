use log::trace;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use super::poly::{Atom, Poly};
use super::{RangeContext, Result, SimplifyError};
use crate::scalar::{MinMax, RelOp0, ScalExp};
use crate::types::{PrimType, PrimValue, SrcLoc};

/// Disjunction of conjunctions of literals.
type Dnf = Vec<Vec<ScalExp>>;

/// Simplifies `e` using the range facts of `ctx`.
///
/// Integer expressions come back as a canonical sum of monomials, boolean
/// expressions as a disjunction of conjunctions of literals (relations and
/// boolean variables), and floating-point expressions with constants folded.
pub fn simplify(e: &ScalExp, loc: SrcLoc, ctx: &RangeContext) -> Result<ScalExp> {
    let simplifier = Simplifier { loc, ctx };
    let result = match e.scalar_type() {
        PrimType::Int => simplifier.poly(e)?.to_scalar(),
        PrimType::Bool => dnf_to_scalar(simplifier.dnf(e, false)?),
        PrimType::Float => fold_constants(e),
    };
    trace!("simplify({}) = {}", e, result);
    Ok(result)
}

/// Normal form of an integer expression, as a polynomial.
pub(super) fn normalize(e: &ScalExp, loc: SrcLoc, ctx: &RangeContext) -> Result<Poly> {
    Simplifier { loc, ctx }.poly(e)
}

struct Simplifier<'a> {
    loc: SrcLoc,
    ctx: &'a RangeContext,
}

impl Simplifier<'_> {
    fn ill_typed(&self, e: &ScalExp, expected: PrimType) -> SimplifyError {
        SimplifyError::IllTyped {
            loc: self.loc,
            expr: e.to_string(),
            expected,
        }
    }

    fn poly(&self, e: &ScalExp) -> Result<Poly> {
        match e {
            ScalExp::Val(PrimValue::Int(n)) => Ok(Poly::constant(n.clone())),
            ScalExp::Id(name, PrimType::Int) => Ok(Poly::atom(Atom::Sym(name.clone()))),
            ScalExp::Neg(a) => Ok(self.poly(a)?.neg()),
            ScalExp::Plus(a, b) => Ok(self.poly(a)?.add(&self.poly(b)?)),
            ScalExp::Minus(a, b) => Ok(self.poly(a)?.sub(&self.poly(b)?)),
            ScalExp::Times(a, b) => Ok(self.poly(a)?.mul(&self.poly(b)?)),
            ScalExp::Div(a, b) => self.div(a, b),
            ScalExp::MaxMin(kind, es) => self.max_min(*kind, es),
            ScalExp::Val(_)
            | ScalExp::Id(..)
            | ScalExp::Not(_)
            | ScalExp::Rel(..)
            | ScalExp::And(..)
            | ScalExp::Or(..) => Err(self.ill_typed(e, PrimType::Int)),
        }
    }

    fn div(&self, a: &ScalExp, b: &ScalExp) -> Result<Poly> {
        let pa = self.poly(a)?;
        let pb = self.poly(b)?;
        match (pa.as_constant(), pb.as_constant()) {
            (Some(x), Some(y)) if !y.is_zero() => Ok(Poly::constant(x.div_floor(&y))),
            (_, Some(y)) if y.is_one() => Ok(pa),
            _ => Ok(Poly::atom(Atom::Opaque(ScalExp::Div(
                Box::new(pa.to_scalar()),
                Box::new(pb.to_scalar()),
            )))),
        }
    }

    fn max_min(&self, kind: MinMax, es: &[ScalExp]) -> Result<Poly> {
        let mut operands: Vec<Poly> = Vec::with_capacity(es.len());
        for e in es {
            let p = self.poly(e)?;
            match p.as_opaque() {
                Some(ScalExp::MaxMin(k, inner)) if *k == kind => {
                    for x in inner {
                        operands.push(self.poly(x)?);
                    }
                }
                _ => operands.push(p),
            }
        }

        let mut constant: Option<BigInt> = None;
        let mut symbolic: Vec<Poly> = Vec::new();
        for p in operands {
            match p.as_constant() {
                Some(c) => {
                    constant = Some(match constant {
                        None => c,
                        Some(prev) => match kind {
                            MinMax::Min => prev.min(c),
                            MinMax::Max => prev.max(c),
                        },
                    })
                }
                None if !symbolic.contains(&p) => symbolic.push(p),
                None => {}
            }
        }
        symbolic.extend(constant.map(Poly::constant));

        // Drop operands that can never be selected, keeping the first of equals.
        let mut kept: Vec<(Poly, Bounds)> = Vec::with_capacity(symbolic.len());
        for p in symbolic {
            let b = self.bounds(&p);
            if kept.iter().any(|(_, k)| dominates(kind, k, &b)) {
                continue;
            }
            kept.retain(|(_, k)| !dominates(kind, &b, k));
            kept.push((p, b));
        }

        match kept.len() {
            0 => Err(self.ill_typed(&ScalExp::MaxMin(kind, es.to_vec()), PrimType::Int)),
            1 => Ok(kept.remove(0).0),
            _ => Ok(Poly::atom(Atom::Opaque(ScalExp::MaxMin(
                kind,
                kept.iter().map(|(p, _)| p.to_scalar()).collect(),
            )))),
        }
    }

    /// Constant interval of a polynomial, from the constant bounds of its linear symbols.
    fn bounds(&self, p: &Poly) -> Bounds {
        let mut lo = Some(BigInt::zero());
        let mut hi = Some(BigInt::zero());
        for term in p.terms() {
            let (l, h) = match term.atoms.as_slice() {
                [] => (Some(term.coeff.clone()), Some(term.coeff.clone())),
                [Atom::Sym(name)] => {
                    let (l, h) = self.ctx.constant_bounds(name);
                    let l = l.map(|x| &term.coeff * x);
                    let h = h.map(|x| &term.coeff * x);
                    if term.coeff.is_negative() {
                        (h, l)
                    } else {
                        (l, h)
                    }
                }
                _ => (None, None),
            };
            lo = lo.zip(l).map(|(a, b)| a + b);
            hi = hi.zip(h).map(|(a, b)| a + b);
        }
        Bounds { lo, hi }
    }

    /// Decides `p op 0` from the constant interval of `p`, if possible.
    fn decide(&self, op: RelOp0, p: &Poly) -> Option<bool> {
        let Bounds { lo, hi } = self.bounds(p);
        let zero = BigInt::zero();
        match op {
            RelOp0::Lth0 if hi.as_ref().is_some_and(|h| *h < zero) => Some(true),
            RelOp0::Lth0 if lo.as_ref().is_some_and(|l| *l >= zero) => Some(false),
            RelOp0::Leq0 if hi.as_ref().is_some_and(|h| *h <= zero) => Some(true),
            RelOp0::Leq0 if lo.as_ref().is_some_and(|l| *l > zero) => Some(false),
            _ => None,
        }
    }

    /// Normal form of `e` (or of its negation, if `negated`).
    fn dnf(&self, e: &ScalExp, negated: bool) -> Result<Dnf> {
        match e {
            ScalExp::Val(PrimValue::Bool(b)) => Ok(constant_dnf(*b != negated)),
            ScalExp::Id(_, PrimType::Bool) => {
                let lit = if negated { ScalExp::Not(Box::new(e.clone())) } else { e.clone() };
                Ok(vec![vec![lit]])
            }
            ScalExp::Not(a) => self.dnf(a, !negated),
            ScalExp::And(a, b) | ScalExp::Or(a, b) => {
                let da = self.dnf(a, negated)?;
                let db = self.dnf(b, negated)?;
                // De Morgan: a negated conjunction is a disjunction and vice versa.
                let conjunctive = matches!(e, ScalExp::And(..)) != negated;
                if conjunctive {
                    self.conjoin(e, da, db)
                } else {
                    self.disjoin(e, da, db)
                }
            }
            ScalExp::Rel(op, a) => self.relation(*op, a, negated),
            _ => Err(self.ill_typed(e, PrimType::Bool)),
        }
    }

    fn relation(&self, op: RelOp0, a: &ScalExp, negated: bool) -> Result<Dnf> {
        match a.scalar_type() {
            PrimType::Int => {
                let p = self.poly(a)?;
                // !(e < 0) is -e <= 0, and !(e <= 0) is -e < 0.
                let (op, p) = match (negated, op) {
                    (false, op) => (op, p),
                    (true, RelOp0::Lth0) => (RelOp0::Leq0, p.neg()),
                    (true, RelOp0::Leq0) => (RelOp0::Lth0, p.neg()),
                };
                match self.decide(op, &p) {
                    Some(b) => Ok(constant_dnf(b)),
                    None => Ok(vec![vec![ScalExp::Rel(op, Box::new(p.to_scalar()))]]),
                }
            }
            PrimType::Float => {
                let rel = ScalExp::Rel(op, Box::new(fold_constants(a)));
                let lit = if negated { ScalExp::Not(Box::new(rel)) } else { rel };
                Ok(vec![vec![lit]])
            }
            PrimType::Bool => Err(self.ill_typed(a, PrimType::Int)),
        }
    }

    fn check_size(&self, e: &ScalExp, size: usize) -> Result<()> {
        let limit = self.ctx.limits().max_dnf_terms;
        if size > limit {
            return Err(SimplifyError::TooManyDisjuncts {
                loc: self.loc,
                expr: e.to_string(),
                limit,
            });
        }
        Ok(())
    }

    fn disjoin(&self, e: &ScalExp, a: Dnf, b: Dnf) -> Result<Dnf> {
        let mut result: Dnf = Vec::with_capacity(a.len() + b.len());
        for conj in a.into_iter().chain(b) {
            if conj.is_empty() {
                return Ok(constant_dnf(true));
            }
            if !result.contains(&conj) {
                result.push(conj);
            }
        }
        self.check_size(e, result.len())?;
        Ok(result)
    }

    fn conjoin(&self, e: &ScalExp, a: Dnf, b: Dnf) -> Result<Dnf> {
        self.check_size(e, a.len() * b.len())?;
        let mut result: Dnf = Vec::with_capacity(a.len() * b.len());
        for x in &a {
            for y in &b {
                let mut conj = x.clone();
                for lit in y {
                    if !conj.contains(lit) {
                        conj.push(lit.clone());
                    }
                }
                if !result.contains(&conj) {
                    result.push(conj);
                }
            }
        }
        Ok(result)
    }
}

#[derive(Debug, Clone)]
struct Bounds {
    lo: Option<BigInt>,
    hi: Option<BigInt>,
}

/// Whether `a` always wins over `b` in a `kind` node.
fn dominates(kind: MinMax, a: &Bounds, b: &Bounds) -> bool {
    match kind {
        MinMax::Min => matches!((&a.hi, &b.lo), (Some(h), Some(l)) if h <= l),
        MinMax::Max => matches!((&a.lo, &b.hi), (Some(l), Some(h)) if l >= h),
    }
}

fn constant_dnf(value: bool) -> Dnf {
    if value {
        vec![vec![]]
    } else {
        vec![]
    }
}

fn dnf_to_scalar(dnf: Dnf) -> ScalExp {
    dnf.into_iter()
        .map(|conj| conj.into_iter().reduce(ScalExp::and).unwrap_or_else(|| ScalExp::bool(true)))
        .reduce(ScalExp::or)
        .unwrap_or_else(|| ScalExp::bool(false))
}

/// Rebuilds `e` bottom-up through the folding constructors.
fn fold_constants(e: &ScalExp) -> ScalExp {
    match e {
        ScalExp::Val(_) | ScalExp::Id(..) => e.clone(),
        ScalExp::Neg(a) => ScalExp::neg(fold_constants(a)),
        ScalExp::Not(a) => ScalExp::not(fold_constants(a)),
        ScalExp::Plus(a, b) => ScalExp::plus(fold_constants(a), fold_constants(b)),
        ScalExp::Minus(a, b) => ScalExp::minus(fold_constants(a), fold_constants(b)),
        ScalExp::Times(a, b) => ScalExp::times(fold_constants(a), fold_constants(b)),
        ScalExp::Div(a, b) => ScalExp::Div(Box::new(fold_constants(a)), Box::new(fold_constants(b))),
        ScalExp::Rel(op, a) => ScalExp::rel(*op, fold_constants(a)),
        ScalExp::And(a, b) => ScalExp::and(fold_constants(a), fold_constants(b)),
        ScalExp::Or(a, b) => ScalExp::or(fold_constants(a), fold_constants(b)),
        ScalExp::MaxMin(kind, es) => ScalExp::MaxMin(*kind, es.iter().map(fold_constants).collect()),
    }
}

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::scalar::ScalExp;
use crate::types::{Name, PrimType, PrimValue};

/// Factor of a monomial.
///
/// `Opaque` holds an already simplified non-polynomial node (min/max, division)
/// that is treated as an uninterpreted symbol.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Atom {
    Sym(Name),
    Opaque(ScalExp),
}

impl Atom {
    fn to_scalar(&self) -> ScalExp {
        match self {
            Atom::Sym(name) => ScalExp::id(name.clone(), PrimType::Int),
            Atom::Opaque(e) => e.clone(),
        }
    }

    pub(crate) fn mentions(&self, name: &Name) -> bool {
        match self {
            Atom::Sym(s) => s == name,
            Atom::Opaque(e) => e.mentions(name),
        }
    }
}

fn cmp_atoms(a: &Atom, b: &Atom) -> Ordering {
    match (a, b) {
        (Atom::Sym(x), Atom::Sym(y)) => x.cmp(y),
        (Atom::Sym(_), Atom::Opaque(_)) => Ordering::Less,
        (Atom::Opaque(_), Atom::Sym(_)) => Ordering::Greater,
        (Atom::Opaque(x), Atom::Opaque(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// Constant term goes last.
fn cmp_monomials(a: &[Atom], b: &[Atom]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            for (x, y) in a.iter().zip(b) {
                let ord = cmp_atoms(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Term {
    pub(crate) coeff: BigInt,
    /// Sorted factors; empty for the constant term.
    pub(crate) atoms: Vec<Atom>,
}

/// Integer polynomial in normal form: terms sorted by monomial, like terms merged, no zero coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Poly {
    terms: Vec<Term>,
}

impl Poly {
    #[cfg(test)]
    pub(crate) fn zero() -> Self {
        Poly::default()
    }

    pub(crate) fn constant(value: BigInt) -> Self {
        Poly::from_terms(vec![Term { coeff: value, atoms: Vec::new() }])
    }

    pub(crate) fn atom(atom: Atom) -> Self {
        Poly::from_terms(vec![Term { coeff: BigInt::one(), atoms: vec![atom] }])
    }

    pub(crate) fn from_terms(mut terms: Vec<Term>) -> Self {
        for term in terms.iter_mut() {
            term.atoms.sort_by(cmp_atoms);
        }
        terms.sort_by(|a, b| cmp_monomials(&a.atoms, &b.atoms));

        let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.last_mut() {
                Some(last) if last.atoms == term.atoms => {
                    last.coeff += term.coeff;
                }
                _ => merged.push(term),
            }
        }
        merged.retain(|t| !t.coeff.is_zero());
        Poly { terms: merged }
    }

    pub(crate) fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns the value if the polynomial is a constant.
    pub(crate) fn as_constant(&self) -> Option<BigInt> {
        match self.terms.as_slice() {
            [] => Some(BigInt::zero()),
            [t] if t.atoms.is_empty() => Some(t.coeff.clone()),
            _ => None,
        }
    }

    /// Returns the single opaque atom if the polynomial is exactly that atom.
    pub(crate) fn as_opaque(&self) -> Option<&ScalExp> {
        match self.terms.as_slice() {
            [t] if t.coeff.is_one() => match t.atoms.as_slice() {
                [Atom::Opaque(e)] => Some(e),
                _ => None,
            },
            _ => None,
        }
    }

    pub(crate) fn add(&self, other: &Poly) -> Poly {
        Poly::from_terms(self.terms.iter().chain(&other.terms).cloned().collect())
    }

    pub(crate) fn neg(&self) -> Poly {
        self.scale(&-BigInt::one())
    }

    pub(crate) fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.neg())
    }

    pub(crate) fn scale(&self, factor: &BigInt) -> Poly {
        Poly::from_terms(
            self.terms
                .iter()
                .map(|t| Term { coeff: &t.coeff * factor, atoms: t.atoms.clone() })
                .collect(),
        )
    }

    pub(crate) fn mul(&self, other: &Poly) -> Poly {
        let mut terms = Vec::with_capacity(self.terms.len() * other.terms.len());
        for a in &self.terms {
            for b in &other.terms {
                let mut atoms = a.atoms.clone();
                atoms.extend(b.atoms.iter().cloned());
                terms.push(Term { coeff: &a.coeff * &b.coeff, atoms });
            }
        }
        Poly::from_terms(terms)
    }

    /// Converts back into a scalar expression, e.g. `n - 10` or `-(2 * m) + k`.
    pub(crate) fn to_scalar(&self) -> ScalExp {
        let mut result: Option<ScalExp> = None;
        for term in &self.terms {
            let magnitude = term.coeff.abs();
            let body = if term.atoms.is_empty() {
                ScalExp::Val(PrimValue::Int(magnitude.clone()))
            } else {
                let mono = term
                    .atoms
                    .iter()
                    .map(Atom::to_scalar)
                    .reduce(|acc, x| ScalExp::Times(Box::new(acc), Box::new(x)))
                    .unwrap_or_else(|| ScalExp::int(1));
                if magnitude.is_one() {
                    mono
                } else {
                    ScalExp::Times(Box::new(ScalExp::Val(PrimValue::Int(magnitude.clone()))), Box::new(mono))
                }
            };
            let negative = term.coeff.is_negative();
            result = Some(match result {
                None if negative && term.atoms.is_empty() => ScalExp::Val(PrimValue::Int(term.coeff.clone())),
                None if negative => ScalExp::Neg(Box::new(body)),
                None => body,
                Some(acc) if negative => ScalExp::Minus(Box::new(acc), Box::new(body)),
                Some(acc) => ScalExp::Plus(Box::new(acc), Box::new(body)),
            });
        }
        result.unwrap_or_else(|| ScalExp::int(0))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn sym(base: &str, tag: u32) -> Poly {
        Poly::atom(Atom::Sym(Name::new(base, tag)))
    }

    fn c(n: i64) -> Poly {
        Poly::constant(BigInt::from(n))
    }

    #[test]
    fn test_like_terms_cancel() {
        let n = sym("n", 1);
        let p = n.add(&c(3)).sub(&n);
        assert_eq!(p.as_constant(), Some(BigInt::from(3)));
        assert_eq!(n.sub(&n), Poly::zero());
    }

    #[test]
    fn test_normal_form_is_order_independent() {
        let a = sym("a", 1);
        let b = sym("b", 2);
        let p = a.add(&b).add(&c(1));
        let q = c(1).add(&b).add(&a);
        assert_eq!(p, q);
        assert_eq!(a.mul(&b), b.mul(&a));
    }

    #[test]
    fn test_to_scalar_layout() {
        let n = sym("n", 1);
        assert_eq!(n.sub(&c(10)).to_scalar().to_string(), "(n_1 - 10)");
        assert_eq!(c(10).sub(&n).to_scalar().to_string(), "(-n_1 + 10)");
        assert_eq!(n.scale(&BigInt::from(-2)).to_scalar().to_string(), "-(2 * n_1)");
        assert_eq!(Poly::zero().to_scalar(), ScalExp::int(0));
        assert_eq!(c(-4).to_scalar(), ScalExp::int(-4));
    }

    #[test]
    fn test_distribution() {
        let a = sym("a", 1);
        let p = a.add(&c(1)).mul(&a.sub(&c(1)));
        // (a + 1)(a - 1) = a*a - 1
        assert_eq!(p.terms().len(), 2);
        assert_eq!(p.terms()[0].atoms.len(), 2);
        assert_eq!(p.terms()[1].coeff, BigInt::from(-1));
    }
}

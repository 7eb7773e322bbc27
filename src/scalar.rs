//! Symbolic scalar expressions and ranges.
//!
//! A [`ScalExp`] is the symbolic form of an integer/boolean computation,
//! used for reasoning about variable bounds. Relations are always kept
//! in the canonical "compared against zero" shape (`e < 0`, `e <= 0`), so
//! `a <= b` is represented as `a - b <= 0`.
//!
//! The constructors in this module fold constant-constant arithmetic
//! eagerly, but never evaluate a [`ScalExp::MaxMin`] node with symbolic
//! operands: bounds combined via `min`/`max` stay symbolic until the
//! simplifier (see [`crate::algebra`]) decides otherwise.

use std::fmt;

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use crate::types::{Name, PrimType, PrimValue};

/// Relation of an expression to zero.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RelOp0 {
    /// `e < 0`
    Lth0,
    /// `e <= 0`
    Leq0,
}

/// Kind of a [`ScalExp::MaxMin`] node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MinMax {
    Min,
    Max,
}

/// Symbolic scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalExp {
    Val(PrimValue),
    Id(Name, PrimType),
    Neg(Box<ScalExp>),
    Not(Box<ScalExp>),
    Plus(Box<ScalExp>, Box<ScalExp>),
    Minus(Box<ScalExp>, Box<ScalExp>),
    Times(Box<ScalExp>, Box<ScalExp>),
    /// Integer division, rounding towards negative infinity.
    Div(Box<ScalExp>, Box<ScalExp>),
    Rel(RelOp0, Box<ScalExp>),
    And(Box<ScalExp>, Box<ScalExp>),
    Or(Box<ScalExp>, Box<ScalExp>),
    MaxMin(MinMax, Vec<ScalExp>),
}

impl ScalExp {
    pub fn int(value: impl Into<BigInt>) -> Self {
        ScalExp::Val(PrimValue::int(value))
    }

    pub fn bool(value: bool) -> Self {
        ScalExp::Val(PrimValue::Bool(value))
    }

    pub fn id(name: Name, ty: PrimType) -> Self {
        ScalExp::Id(name, ty)
    }

    pub fn as_value(&self) -> Option<&PrimValue> {
        match self {
            ScalExp::Val(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        self.as_value().and_then(PrimValue::as_int)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(PrimValue::as_bool)
    }

    /// Scalar type of the expression.
    pub fn scalar_type(&self) -> PrimType {
        match self {
            ScalExp::Val(v) => v.prim_type(),
            ScalExp::Id(_, t) => *t,
            ScalExp::Neg(e) => e.scalar_type(),
            ScalExp::Plus(a, _) | ScalExp::Minus(a, _) | ScalExp::Times(a, _) | ScalExp::Div(a, _) => {
                a.scalar_type()
            }
            ScalExp::Not(_) | ScalExp::Rel(..) | ScalExp::And(..) | ScalExp::Or(..) => PrimType::Bool,
            ScalExp::MaxMin(_, es) => es.first().map_or(PrimType::Int, ScalExp::scalar_type),
        }
    }

    /// Free names in order of first occurrence, without duplicates.
    pub fn free_names(&self) -> Vec<Name> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<Name>) {
        match self {
            ScalExp::Val(_) => {}
            ScalExp::Id(name, _) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            ScalExp::Neg(e) | ScalExp::Not(e) | ScalExp::Rel(_, e) => e.collect_names(names),
            ScalExp::Plus(a, b)
            | ScalExp::Minus(a, b)
            | ScalExp::Times(a, b)
            | ScalExp::Div(a, b)
            | ScalExp::And(a, b)
            | ScalExp::Or(a, b) => {
                a.collect_names(names);
                b.collect_names(names);
            }
            ScalExp::MaxMin(_, es) => es.iter().for_each(|e| e.collect_names(names)),
        }
    }

    pub fn mentions(&self, name: &Name) -> bool {
        self.free_names().contains(name)
    }

    /// Operands of a (possibly nested) disjunction; a non-disjunction is its own single disjunct.
    pub fn disjuncts(&self) -> Vec<&ScalExp> {
        match self {
            ScalExp::Or(a, b) => {
                let mut result = a.disjuncts();
                result.extend(b.disjuncts());
                result
            }
            e => vec![e],
        }
    }
}

// Constructors folding constant operands.
impl ScalExp {
    pub fn plus(a: ScalExp, b: ScalExp) -> ScalExp {
        match fold_arith(&a, &b, |x, y| x + y, |x, y| x + y) {
            Some(v) => ScalExp::Val(v),
            None => ScalExp::Plus(Box::new(a), Box::new(b)),
        }
    }

    pub fn minus(a: ScalExp, b: ScalExp) -> ScalExp {
        match fold_arith(&a, &b, |x, y| x - y, |x, y| x - y) {
            Some(v) => ScalExp::Val(v),
            None => ScalExp::Minus(Box::new(a), Box::new(b)),
        }
    }

    pub fn times(a: ScalExp, b: ScalExp) -> ScalExp {
        match fold_arith(&a, &b, |x, y| x * y, |x, y| x * y) {
            Some(v) => ScalExp::Val(v),
            None => ScalExp::Times(Box::new(a), Box::new(b)),
        }
    }

    pub fn neg(e: ScalExp) -> ScalExp {
        match e {
            ScalExp::Val(PrimValue::Int(n)) => ScalExp::Val(PrimValue::Int(-n)),
            ScalExp::Val(PrimValue::Float(x)) => ScalExp::Val(PrimValue::Float(-x)),
            ScalExp::Neg(inner) => *inner,
            e => ScalExp::Neg(Box::new(e)),
        }
    }

    /// Logical negation, folding constants and double negations.
    pub fn not(e: ScalExp) -> ScalExp {
        match e {
            ScalExp::Val(PrimValue::Bool(b)) => ScalExp::bool(!b),
            ScalExp::Not(inner) => *inner,
            e => ScalExp::Not(Box::new(e)),
        }
    }

    pub fn and(a: ScalExp, b: ScalExp) -> ScalExp {
        match (a.as_bool(), b.as_bool()) {
            (Some(false), _) | (_, Some(false)) => ScalExp::bool(false),
            (Some(true), _) => b,
            (_, Some(true)) => a,
            _ => ScalExp::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(a: ScalExp, b: ScalExp) -> ScalExp {
        match (a.as_bool(), b.as_bool()) {
            (Some(true), _) | (_, Some(true)) => ScalExp::bool(true),
            (Some(false), _) => b,
            (_, Some(false)) => a,
            _ => ScalExp::Or(Box::new(a), Box::new(b)),
        }
    }

    pub fn rel(op: RelOp0, e: ScalExp) -> ScalExp {
        match e.as_int() {
            Some(n) => ScalExp::bool(match op {
                RelOp0::Lth0 => *n < BigInt::ZERO,
                RelOp0::Leq0 => *n <= BigInt::ZERO,
            }),
            None => ScalExp::Rel(op, Box::new(e)),
        }
    }

    /// `min(a, b)`, flattening nested `min` nodes but never evaluating symbolic operands.
    pub fn min_of(a: ScalExp, b: ScalExp) -> ScalExp {
        Self::max_min(MinMax::Min, a, b)
    }

    /// `max(a, b)`, flattening nested `max` nodes but never evaluating symbolic operands.
    pub fn max_of(a: ScalExp, b: ScalExp) -> ScalExp {
        Self::max_min(MinMax::Max, a, b)
    }

    fn max_min(kind: MinMax, a: ScalExp, b: ScalExp) -> ScalExp {
        let mut operands = Vec::new();
        for e in [a, b] {
            match e {
                ScalExp::MaxMin(k, es) if k == kind => operands.extend(es),
                e => operands.push(e),
            }
        }
        ScalExp::MaxMin(kind, operands)
    }
}

fn fold_arith(
    a: &ScalExp,
    b: &ScalExp,
    int_op: impl Fn(&BigInt, &BigInt) -> BigInt,
    float_op: impl Fn(f64, f64) -> f64,
) -> Option<PrimValue> {
    match (a.as_value()?, b.as_value()?) {
        (PrimValue::Int(x), PrimValue::Int(y)) => Some(PrimValue::Int(int_op(x, y))),
        (PrimValue::Float(x), PrimValue::Float(y)) => Some(PrimValue::Float(float_op(*x, *y))),
        _ => None,
    }
}

impl fmt::Display for ScalExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalExp::Val(v) => write!(f, "{}", v),
            ScalExp::Id(name, _) => write!(f, "{}", name),
            ScalExp::Neg(e) => write!(f, "-{}", e),
            ScalExp::Not(e) => write!(f, "!{}", e),
            ScalExp::Plus(a, b) => write!(f, "({} + {})", a, b),
            ScalExp::Minus(a, b) => write!(f, "({} - {})", a, b),
            ScalExp::Times(a, b) => write!(f, "({} * {})", a, b),
            ScalExp::Div(a, b) => write!(f, "({} / {})", a, b),
            ScalExp::Rel(RelOp0::Lth0, e) => write!(f, "({} < 0)", e),
            ScalExp::Rel(RelOp0::Leq0, e) => write!(f, "({} <= 0)", e),
            ScalExp::And(a, b) => write!(f, "({} && {})", a, b),
            ScalExp::Or(a, b) => write!(f, "({} || {})", a, b),
            ScalExp::MaxMin(kind, es) => {
                let name = match kind {
                    MinMax::Min => "min",
                    MinMax::Max => "max",
                };
                write!(f, "{}(", name)?;
                for (i, e) in es.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Symbolic value range of a variable.
///
/// An absent bound means "unknown in that direction"; it never claims
/// that the variable is unbounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    pub lower: Option<ScalExp>,
    pub upper: Option<ScalExp>,
}

impl Range {
    pub fn new(lower: Option<ScalExp>, upper: Option<ScalExp>) -> Self {
        Range { lower, upper }
    }

    /// The range `(unknown, unknown)`.
    pub fn unknown() -> Self {
        Range::default()
    }

    /// The degenerate range `[e, e]`.
    pub fn exact(e: ScalExp) -> Self {
        Range::new(Some(e.clone()), Some(e))
    }

    pub fn is_unknown(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        match &self.lower {
            Some(e) => write!(f, "{}", e)?,
            None => write!(f, "?")?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Some(e) => write!(f, "{}", e)?,
            None => write!(f, "?")?,
        }
        write!(f, "]")
    }
}

/// Consistent renaming of free names.
///
/// Names not present in the substitution are left as they are.
pub trait Substitute {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self;
}

impl<T: Substitute> Substitute for Vec<T> {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        self.iter().map(|x| x.substitute(subst)).collect()
    }
}

impl<T: Substitute> Substitute for Option<T> {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        self.as_ref().map(|x| x.substitute(subst))
    }
}

impl<T: Substitute> Substitute for Box<T> {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        Box::new(self.as_ref().substitute(subst))
    }
}

impl Substitute for ScalExp {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        match self {
            ScalExp::Val(v) => ScalExp::Val(v.clone()),
            ScalExp::Id(name, t) => ScalExp::Id(subst.get(name).unwrap_or(name).clone(), *t),
            ScalExp::Neg(e) => ScalExp::Neg(e.substitute(subst)),
            ScalExp::Not(e) => ScalExp::Not(e.substitute(subst)),
            ScalExp::Plus(a, b) => ScalExp::Plus(a.substitute(subst), b.substitute(subst)),
            ScalExp::Minus(a, b) => ScalExp::Minus(a.substitute(subst), b.substitute(subst)),
            ScalExp::Times(a, b) => ScalExp::Times(a.substitute(subst), b.substitute(subst)),
            ScalExp::Div(a, b) => ScalExp::Div(a.substitute(subst), b.substitute(subst)),
            ScalExp::Rel(op, e) => ScalExp::Rel(*op, e.substitute(subst)),
            ScalExp::And(a, b) => ScalExp::And(a.substitute(subst), b.substitute(subst)),
            ScalExp::Or(a, b) => ScalExp::Or(a.substitute(subst), b.substitute(subst)),
            ScalExp::MaxMin(kind, es) => ScalExp::MaxMin(*kind, es.substitute(subst)),
        }
    }
}

impl Substitute for Range {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        Range::new(self.lower.substitute(subst), self.upper.substitute(subst))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn var(base: &str, tag: u32) -> ScalExp {
        ScalExp::id(Name::new(base, tag), PrimType::Int)
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(ScalExp::minus(ScalExp::int(5), ScalExp::int(1)), ScalExp::int(4));
        assert_eq!(ScalExp::times(ScalExp::int(3), ScalExp::int(-2)), ScalExp::int(-6));
        assert_eq!(ScalExp::neg(ScalExp::int(7)), ScalExp::int(-7));
        assert_eq!(ScalExp::rel(RelOp0::Lth0, ScalExp::int(0)), ScalExp::bool(false));
        assert_eq!(ScalExp::rel(RelOp0::Leq0, ScalExp::int(0)), ScalExp::bool(true));
    }

    #[test]
    fn test_symbolic_operands_are_kept() {
        let n = var("n", 1);
        let e = ScalExp::minus(n.clone(), ScalExp::int(1));
        assert_eq!(e, ScalExp::Minus(Box::new(n.clone()), Box::new(ScalExp::int(1))));
        assert_eq!(e.to_string(), "(n_1 - 1)");
    }

    #[test]
    fn test_min_of_flattens() {
        let a = var("a", 1);
        let b = var("b", 2);
        let m = ScalExp::min_of(ScalExp::min_of(a.clone(), b.clone()), ScalExp::int(3));
        assert_eq!(m, ScalExp::MaxMin(MinMax::Min, vec![a.clone(), b.clone(), ScalExp::int(3)]));
        assert_eq!(m.to_string(), "min(a_1, b_2, 3)");

        // A max inside a min is a different node and is not flattened.
        let mixed = ScalExp::min_of(ScalExp::max_of(a.clone(), b.clone()), a.clone());
        assert_eq!(mixed, ScalExp::MaxMin(MinMax::Min, vec![ScalExp::max_of(a.clone(), b), a]));
    }

    #[test]
    fn test_boolean_folding() {
        let p = ScalExp::rel(RelOp0::Lth0, var("x", 1));
        assert_eq!(ScalExp::and(ScalExp::bool(true), p.clone()), p);
        assert_eq!(ScalExp::or(ScalExp::bool(true), p.clone()), ScalExp::bool(true));
        assert_eq!(ScalExp::not(ScalExp::not(p.clone())), p);
    }

    #[test]
    fn test_free_names_order() {
        let e = ScalExp::plus(
            ScalExp::times(var("b", 2), var("a", 1)),
            ScalExp::min_of(var("a", 1), var("c", 3)),
        );
        let names: Vec<String> = e.free_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["b_2", "a_1", "c_3"]);
        assert!(e.mentions(&Name::new("c", 3)));
        assert!(!e.mentions(&Name::new("d", 4)));
    }

    #[test]
    fn test_substitute_renames_free_names() {
        let a = Name::new("a", 1);
        let b = Name::new("b", 2);
        let mut subst = FxHashMap::default();
        subst.insert(a.clone(), b.clone());

        let range = Range::new(Some(ScalExp::int(0)), Some(ScalExp::minus(var("a", 1), ScalExp::int(1))));
        let renamed = range.substitute(&subst);
        assert_eq!(renamed.upper, Some(ScalExp::minus(var("b", 2), ScalExp::int(1))));
        assert_eq!(renamed.lower, Some(ScalExp::int(0)));
    }

    #[test]
    fn test_scalar_type() {
        assert_eq!(var("x", 1).scalar_type(), PrimType::Int);
        assert_eq!(ScalExp::rel(RelOp0::Lth0, var("x", 1)).scalar_type(), PrimType::Bool);
        assert_eq!(ScalExp::Val(PrimValue::Float(1.0)).scalar_type(), PrimType::Float);
    }
}

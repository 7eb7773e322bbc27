//! Minimal intermediate representation consumed by the symbol table.
//!
//! The table only inspects the *shape* of expressions (to pick a range rule)
//! and their scalar parts (to derive symbolic forms), so only those shapes are modelled here.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::scalar::Substitute;
use crate::types::{Name, PrimType, PrimValue};

/// Type of a variable: a primitive scalar or an array with symbolic dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Prim(PrimType),
    Array(PrimType, Vec<SubExp>),
}

impl Type {
    pub fn int() -> Self {
        Type::Prim(PrimType::Int)
    }

    pub fn bool() -> Self {
        Type::Prim(PrimType::Bool)
    }

    pub fn array(elem: PrimType, dims: impl IntoIterator<Item = SubExp>) -> Self {
        Type::Array(elem, dims.into_iter().collect())
    }

    /// Returns the primitive type, if this is not an array.
    pub fn prim(&self) -> Option<PrimType> {
        match self {
            Type::Prim(t) => Some(*t),
            Type::Array(..) => None,
        }
    }

    /// Returns the array dimensions (empty for scalars).
    pub fn dims(&self) -> &[SubExp] {
        match self {
            Type::Prim(_) => &[],
            Type::Array(_, dims) => dims,
        }
    }
}

/// A typed variable occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: Name,
    pub ty: Type,
}

impl Ident {
    pub fn new(name: Name, ty: Type) -> Self {
        Ident { name, ty }
    }
}

/// Function and lambda parameters are plain typed identifiers.
pub type Param = Ident;

/// An atomic operand: a variable reference or a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum SubExp {
    Var(Ident),
    Const(PrimValue),
}

impl SubExp {
    pub fn var(name: Name, ty: Type) -> Self {
        SubExp::Var(Ident::new(name, ty))
    }

    pub fn int(value: i64) -> Self {
        SubExp::Const(PrimValue::int(value))
    }

    pub fn as_var(&self) -> Option<&Name> {
        match self {
            SubExp::Var(ident) => Some(&ident.name),
            SubExp::Const(_) => None,
        }
    }

    pub fn as_const(&self) -> Option<&PrimValue> {
        match self {
            SubExp::Const(v) => Some(v),
            SubExp::Var(_) => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    LogAnd,
    LogOr,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnOp {
    Not,
    Neg,
}

/// An IR expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    /// Pass-through of an atomic operand.
    SubExp(SubExp),
    BinOp(BinOp, SubExp, SubExp),
    CmpOp(CmpOp, SubExp, SubExp),
    UnOp(UnOp, SubExp),
    /// `iota(n)`: the array `[0, 1, ..., n-1]`.
    Iota(SubExp),
    /// `replicate(n, v)`: `n` copies of `v`.
    Replicate(SubExp, SubExp),
    /// Permutation of the dimensions of an array.
    Rearrange(Vec<usize>, Name),
    /// Split of an array along its outer dimension.
    Split(Vec<SubExp>, Name),
    Copy(SubExp),
    /// `a[i, j, ...]`.
    Index(Name, Vec<SubExp>),
    /// Filter of several arrays by a predicate; yields the new size and one array per input.
    Filter { pred: Name, arrays: Vec<SubExp> },
    /// Call of an uninterpreted function.
    Apply(Name, Vec<SubExp>, PrimType),
}

/// A statement binding one or more identifiers to the results of an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub pattern: Vec<Ident>,
    pub exp: Exp,
}

impl Binding {
    pub fn new(pattern: impl IntoIterator<Item = Ident>, exp: Exp) -> Self {
        Binding {
            pattern: pattern.into_iter().collect(),
            exp,
        }
    }

    pub fn single(ident: Ident, exp: Exp) -> Self {
        Binding::new([ident], exp)
    }
}

impl fmt::Display for SubExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubExp::Var(ident) => write!(f, "{}", ident.name),
            SubExp::Const(v) => write!(f, "{}", v),
        }
    }
}

fn rename(name: &Name, subst: &FxHashMap<Name, Name>) -> Name {
    subst.get(name).cloned().unwrap_or_else(|| name.clone())
}

impl Substitute for Type {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        match self {
            Type::Prim(t) => Type::Prim(*t),
            Type::Array(t, dims) => Type::Array(*t, dims.substitute(subst)),
        }
    }
}

impl Substitute for Ident {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        Ident::new(rename(&self.name, subst), self.ty.substitute(subst))
    }
}

impl Substitute for SubExp {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        match self {
            SubExp::Var(ident) => SubExp::Var(ident.substitute(subst)),
            SubExp::Const(v) => SubExp::Const(v.clone()),
        }
    }
}

impl Substitute for Exp {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        match self {
            Exp::SubExp(se) => Exp::SubExp(se.substitute(subst)),
            Exp::BinOp(op, a, b) => Exp::BinOp(*op, a.substitute(subst), b.substitute(subst)),
            Exp::CmpOp(op, a, b) => Exp::CmpOp(*op, a.substitute(subst), b.substitute(subst)),
            Exp::UnOp(op, a) => Exp::UnOp(*op, a.substitute(subst)),
            Exp::Iota(n) => Exp::Iota(n.substitute(subst)),
            Exp::Replicate(n, v) => Exp::Replicate(n.substitute(subst), v.substitute(subst)),
            Exp::Rearrange(perm, a) => Exp::Rearrange(perm.clone(), rename(a, subst)),
            Exp::Split(sizes, a) => Exp::Split(sizes.substitute(subst), rename(a, subst)),
            Exp::Copy(se) => Exp::Copy(se.substitute(subst)),
            Exp::Index(a, idxs) => Exp::Index(rename(a, subst), idxs.substitute(subst)),
            Exp::Filter { pred, arrays } => Exp::Filter {
                pred: rename(pred, subst),
                arrays: arrays.substitute(subst),
            },
            Exp::Apply(f, args, t) => Exp::Apply(f.clone(), args.substitute(subst), *t),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_type_dims() {
        let n = Name::new("n", 1);
        let ty = Type::array(PrimType::Int, [SubExp::var(n.clone(), Type::int()), SubExp::int(3)]);
        assert_eq!(ty.prim(), None);
        assert_eq!(ty.dims().len(), 2);
        assert_eq!(ty.dims()[0].as_var(), Some(&n));
        assert_eq!(Type::int().dims().len(), 0);
    }

    #[test]
    fn test_substitute_exp() {
        let a = Name::new("a", 1);
        let b = Name::new("b", 2);
        let xs = Name::new("xs", 3);
        let ys = Name::new("ys", 4);

        let mut subst = FxHashMap::default();
        subst.insert(a.clone(), b.clone());
        subst.insert(xs.clone(), ys.clone());

        let exp = Exp::Index(xs, vec![SubExp::var(a, Type::int()), SubExp::int(0)]);
        let renamed = exp.substitute(&subst);
        assert_eq!(renamed, Exp::Index(ys, vec![SubExp::var(b, Type::int()), SubExp::int(0)]));
    }
}

//! Translation of IR expressions into symbolic scalar form.
//!
//! The translation is opportunistic: it succeeds only for shapes that have a
//! scalar meaning (arithmetic, comparisons, logical operators, min/max over
//! primitive operands) and returns `None` for everything else.
//!
//! Variable references are resolved through a lookup callback, which lets the
//! caller substitute a variable by its known scalar form. Unresolved variables
//! of primitive type become [`ScalExp::Id`] leaves.

use crate::ir::{BinOp, CmpOp, Exp, SubExp, UnOp};
use crate::scalar::{RelOp0, ScalExp};
use crate::types::{Name, PrimType};

pub fn subexp_to_scalar<F>(se: &SubExp, lookup: &F) -> Option<ScalExp>
where
    F: Fn(&Name) -> Option<ScalExp>,
{
    match se {
        SubExp::Const(v) => Some(ScalExp::Val(v.clone())),
        SubExp::Var(ident) => {
            let ty = ident.ty.prim()?;
            Some(lookup(&ident.name).unwrap_or_else(|| ScalExp::id(ident.name.clone(), ty)))
        }
    }
}

pub fn to_scalar<F>(exp: &Exp, lookup: &F) -> Option<ScalExp>
where
    F: Fn(&Name) -> Option<ScalExp>,
{
    match exp {
        Exp::SubExp(se) => subexp_to_scalar(se, lookup),
        Exp::BinOp(op, a, b) => {
            let a = subexp_to_scalar(a, lookup)?;
            let b = subexp_to_scalar(b, lookup)?;
            binop_to_scalar(*op, a, b)
        }
        Exp::CmpOp(op, a, b) => {
            let a = subexp_to_scalar(a, lookup)?;
            let b = subexp_to_scalar(b, lookup)?;
            cmpop_to_scalar(*op, a, b)
        }
        Exp::UnOp(op, a) => {
            let a = subexp_to_scalar(a, lookup)?;
            match (op, a.scalar_type()) {
                (UnOp::Not, PrimType::Bool) => Some(ScalExp::not(a)),
                (UnOp::Neg, PrimType::Int | PrimType::Float) => Some(ScalExp::neg(a)),
                _ => None,
            }
        }
        Exp::Iota(_)
        | Exp::Replicate(..)
        | Exp::Rearrange(..)
        | Exp::Split(..)
        | Exp::Copy(_)
        | Exp::Index(..)
        | Exp::Filter { .. }
        | Exp::Apply(..) => None,
    }
}

fn binop_to_scalar(op: BinOp, a: ScalExp, b: ScalExp) -> Option<ScalExp> {
    let ty = a.scalar_type();
    if ty != b.scalar_type() {
        return None;
    }
    let numeric = matches!(ty, PrimType::Int | PrimType::Float);
    match op {
        BinOp::Add if numeric => Some(ScalExp::plus(a, b)),
        BinOp::Sub if numeric => Some(ScalExp::minus(a, b)),
        BinOp::Mul if numeric => Some(ScalExp::times(a, b)),
        BinOp::Div if ty == PrimType::Int => Some(ScalExp::Div(Box::new(a), Box::new(b))),
        BinOp::Min if numeric => Some(ScalExp::min_of(a, b)),
        BinOp::Max if numeric => Some(ScalExp::max_of(a, b)),
        BinOp::LogAnd if ty == PrimType::Bool => Some(ScalExp::and(a, b)),
        BinOp::LogOr if ty == PrimType::Bool => Some(ScalExp::or(a, b)),
        _ => None,
    }
}

fn cmpop_to_scalar(op: CmpOp, a: ScalExp, b: ScalExp) -> Option<ScalExp> {
    let ty = a.scalar_type();
    if ty != b.scalar_type() || ty == PrimType::Bool {
        return None;
    }
    let equal = |a: ScalExp, b: ScalExp| {
        ScalExp::and(
            ScalExp::rel(RelOp0::Leq0, ScalExp::minus(a.clone(), b.clone())),
            ScalExp::rel(RelOp0::Leq0, ScalExp::minus(b, a)),
        )
    };
    Some(match op {
        CmpOp::Lt => ScalExp::rel(RelOp0::Lth0, ScalExp::minus(a, b)),
        CmpOp::Le => ScalExp::rel(RelOp0::Leq0, ScalExp::minus(a, b)),
        CmpOp::Gt => ScalExp::rel(RelOp0::Lth0, ScalExp::minus(b, a)),
        CmpOp::Ge => ScalExp::rel(RelOp0::Leq0, ScalExp::minus(b, a)),
        CmpOp::Eq => equal(a, b),
        CmpOp::Ne => ScalExp::not(equal(a, b)),
    })
}

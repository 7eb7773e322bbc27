use std::fmt;

use rustc_hash::FxHashMap;

use crate::ir::{Exp, SubExp};
use crate::scalar::{Range, ScalExp, Substitute};
use crate::types::{Name, PrimValue};

/// Everything the symbol table knows about one variable.
///
/// The `annotation` is computed once, at insertion time, by the annotation
/// function of the table from the other fields (see [`SymbolTable`][super::SymbolTable]).
/// Later bound refinements update `range` in place but leave the annotation alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<A> {
    /// Defining expression, if the variable is bound by a single-result statement.
    pub exp: Option<Exp>,
    /// Symbolic form of the defining expression.
    pub scalar: Option<ScalExp>,
    pub range: Range,
    /// Whether the variable is a loop induction variable.
    pub loop_var: bool,
    /// Loop nesting depth at which the variable was bound.
    pub depth: usize,
    pub annotation: A,
}

impl Entry<()> {
    /// Entry with nothing known.
    pub fn unknown() -> Self {
        Entry::with_range(Range::unknown())
    }

    pub fn with_range(range: Range) -> Self {
        Entry {
            exp: None,
            scalar: None,
            range,
            loop_var: false,
            depth: 0,
            annotation: (),
        }
    }
}

impl<A> Entry<A> {
    pub fn as_exp(&self) -> Option<&Exp> {
        self.exp.as_ref()
    }

    /// The operand this variable is a plain copy of, if any.
    pub fn as_subexp(&self) -> Option<&SubExp> {
        match self.exp.as_ref()? {
            Exp::SubExp(se) => Some(se),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalExp> {
        self.scalar.as_ref()
    }

    pub fn as_value(&self) -> Option<&PrimValue> {
        self.as_subexp()?.as_const()
    }

    /// The variable this one is an alias of, if any.
    pub fn as_alias(&self) -> Option<&Name> {
        self.as_subexp()?.as_var()
    }

    /// Replaces the annotation, computing the new one from the rest of the entry.
    pub fn annotate<B>(self, f: impl FnOnce(&Entry<()>) -> B) -> Entry<B> {
        let bare = Entry {
            exp: self.exp,
            scalar: self.scalar,
            range: self.range,
            loop_var: self.loop_var,
            depth: self.depth,
            annotation: (),
        };
        let annotation = f(&bare);
        Entry {
            exp: bare.exp,
            scalar: bare.scalar,
            range: bare.range,
            loop_var: bare.loop_var,
            depth: bare.depth,
            annotation,
        }
    }
}

impl<A: Clone> Substitute for Entry<A> {
    fn substitute(&self, subst: &FxHashMap<Name, Name>) -> Self {
        Entry {
            exp: self.exp.substitute(subst),
            scalar: self.scalar.substitute(subst),
            range: self.range.substitute(subst),
            loop_var: self.loop_var,
            depth: self.depth,
            annotation: self.annotation.clone(),
        }
    }
}

impl<A> fmt::Display for Entry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @{}", self.range, self.depth)?;
        if self.loop_var {
            write!(f, " loop")?;
        }
        if let Some(scalar) = &self.scalar {
            write!(f, " = {}", scalar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::ir::Type;
    use crate::types::PrimType;

    #[test]
    fn test_projections() {
        let n = Name::new("n", 1);
        let mut alias = Entry::unknown();
        alias.exp = Some(Exp::SubExp(SubExp::var(n.clone(), Type::int())));
        assert_eq!(alias.as_alias(), Some(&n));
        assert_eq!(alias.as_value(), None);

        let mut constant = Entry::unknown();
        constant.exp = Some(Exp::SubExp(SubExp::int(5)));
        assert_eq!(constant.as_value(), Some(&PrimValue::int(5)));
        assert_eq!(constant.as_alias(), None);

        let mut iota = Entry::unknown();
        iota.exp = Some(Exp::Iota(SubExp::int(5)));
        assert_eq!(iota.as_subexp(), None);
        assert!(iota.as_exp().is_some());
    }

    #[test]
    fn test_annotate_sees_fields() {
        let mut entry = Entry::with_range(Range::exact(ScalExp::int(3)));
        entry.depth = 2;
        let annotated = entry.annotate(|e| (e.depth, e.range.lower.clone()));
        assert_eq!(annotated.annotation, (2, Some(ScalExp::int(3))));
        assert_eq!(annotated.depth, 2);
    }

    #[test]
    fn test_substitute_keeps_annotation() {
        let a = Name::new("a", 1);
        let b = Name::new("b", 2);
        let mut subst = FxHashMap::default();
        subst.insert(a.clone(), b.clone());

        let mut entry = Entry::with_range(Range::new(Some(ScalExp::int(0)), Some(ScalExp::id(a.clone(), PrimType::Int))))
            .annotate(|_| "tag");
        entry.scalar = Some(ScalExp::id(a, PrimType::Int));

        let renamed = entry.substitute(&subst);
        assert_eq!(renamed.scalar, Some(ScalExp::id(b.clone(), PrimType::Int)));
        assert_eq!(renamed.range.upper, Some(ScalExp::id(b, PrimType::Int)));
        assert_eq!(renamed.annotation, "tag");
    }
}

//! Primitive building blocks shared by the IR, the scalar expressions and the symbol table.
//!
//! This module provides the identifier type [`Name`], the primitive types and values
//! that scalar expressions range over, and a lightweight source location [`SrcLoc`]
//! used for error reporting.

use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

/// A globally unique variable name.
///
/// A name is a human-readable base together with a numeric tag.
/// Two names are equal only if both parts are equal, so the tag is what
/// makes otherwise identical source names distinct after renaming.
///
/// # Invariants
///
/// - Names are immutable once created
/// - Cloning is cheap (the base string is shared)
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name {
    base: Rc<str>,
    tag: u32,
}

impl Name {
    /// Creates a new name with the given base and tag.
    pub fn new(base: &str, tag: u32) -> Self {
        Name { base: Rc::from(base), tag }
    }

    /// Returns the base (source) part of the name.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the numeric tag of the name.
    pub fn tag(&self) -> u32 {
        self.tag
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.tag)
    }
}

/// Scalar type of a primitive value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimType {
    Int,
    Bool,
    Float,
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimType::Int => write!(f, "int"),
            PrimType::Bool => write!(f, "bool"),
            PrimType::Float => write!(f, "float"),
        }
    }
}

/// A primitive constant.
///
/// Integers are arbitrary precision, so constant folding never overflows.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimValue {
    Int(BigInt),
    Bool(bool),
    Float(f64),
}

impl PrimValue {
    pub fn int(value: impl Into<BigInt>) -> Self {
        PrimValue::Int(value.into())
    }

    pub fn prim_type(&self) -> PrimType {
        match self {
            PrimValue::Int(_) => PrimType::Int,
            PrimValue::Bool(_) => PrimType::Bool,
            PrimValue::Float(_) => PrimType::Float,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            PrimValue::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PrimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimValue::Int(n) => write!(f, "{}", n),
            PrimValue::Bool(b) => write!(f, "{}", b),
            PrimValue::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Source location of an expression, used only for error messages.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SrcLoc {
    pub line: u32,
    pub column: u32,
}

impl SrcLoc {
    pub fn new(line: u32, column: u32) -> Self {
        SrcLoc { line, column }
    }

    /// Returns `true` if the location is unknown.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SrcLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_name_identity() {
        let a = Name::new("x", 1);
        let b = Name::new("x", 2);
        assert_ne!(a, b);
        assert_eq!(a, Name::new("x", 1));
        assert_eq!(a.to_string(), "x_1");
        assert!(a < b);
    }

    #[test]
    fn test_prim_value_type() {
        assert_eq!(PrimValue::int(3).prim_type(), PrimType::Int);
        assert_eq!(PrimValue::Bool(true).prim_type(), PrimType::Bool);
        assert_eq!(PrimValue::Float(1.5).prim_type(), PrimType::Float);
    }

    #[test]
    fn test_srcloc_display() {
        assert_eq!(SrcLoc::default().to_string(), "<unknown>");
        assert_eq!(SrcLoc::new(3, 7).to_string(), "3:7");
    }
}

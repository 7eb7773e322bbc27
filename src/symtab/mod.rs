//! Scoped symbol table with symbolic ranges.
//!
//! A [`SymbolTable`] is built during a single forward traversal of a function
//! body: every statement inserts its bound variables, loop bodies are entered
//! with [`SymbolTable::deepen`], and branches refine the ranges of the
//! variables constrained by the branch condition (see [`SymbolTable::update_bounds`]).
//!
//! The table behaves as an immutable value. Every operation consumes the
//! table and returns the updated one; cloning is cheap, since the binding map
//! and the entries are shared and only copied on write. A branch-local table
//! is therefore obtained by refining a clone, leaving the parent untouched.
//!
//! Each entry carries a user-defined annotation of type `A`, computed at
//! insertion time by the annotation function the table was created with.

use std::fmt;
use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::algebra::{Limits, RangeContext};
use crate::ir::{Binding, Exp, Ident, Param, SubExp};
use crate::scalar::{Range, ScalExp};
use crate::translate::{subexp_to_scalar, to_scalar};
use crate::types::{Name, PrimValue};

mod entry;
mod refine;

pub use entry::Entry;

pub struct SymbolTable<A, F> {
    depth: usize,
    bindings: Rc<FxHashMap<Name, Rc<Entry<A>>>>,
    annotate: Rc<F>,
    limits: Limits,
}

/// Symbol table without annotations.
pub type PlainSymbolTable = SymbolTable<(), fn(&Entry<()>)>;

fn no_annotation(_: &Entry<()>) {}

impl PlainSymbolTable {
    pub fn plain() -> Self {
        SymbolTable::new(no_annotation as fn(&Entry<()>))
    }
}

impl<A, F> Clone for SymbolTable<A, F> {
    fn clone(&self) -> Self {
        SymbolTable {
            depth: self.depth,
            bindings: Rc::clone(&self.bindings),
            annotate: Rc::clone(&self.annotate),
            limits: self.limits,
        }
    }
}

impl<A, F> SymbolTable<A, F>
where
    A: Clone,
    F: Fn(&Entry<()>) -> A,
{
    /// Creates an empty table at depth 0.
    pub fn new(annotate: F) -> Self {
        SymbolTable::with_limits(annotate, Limits::default())
    }

    pub fn with_limits(annotate: F, limits: Limits) -> Self {
        SymbolTable {
            depth: 0,
            bindings: Rc::new(FxHashMap::default()),
            annotate: Rc::new(annotate),
            limits,
        }
    }

    /// Enters a loop body.
    pub fn deepen(mut self) -> Self {
        self.depth += 1;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.bindings.contains_key(name)
    }

    /// Names of all bound variables, sorted.
    pub fn names(&self) -> Vec<&Name> {
        let mut names: Vec<&Name> = self.bindings.keys().collect();
        names.sort();
        names
    }
}

// Lookup.
impl<A, F> SymbolTable<A, F>
where
    A: Clone,
    F: Fn(&Entry<()>) -> A,
{
    pub fn lookup(&self, name: &Name) -> Option<&Entry<A>> {
        self.bindings.get(name).map(Rc::as_ref)
    }

    pub fn lookup_exp(&self, name: &Name) -> Option<&Exp> {
        self.lookup(name)?.as_exp()
    }

    pub fn lookup_subexp(&self, name: &Name) -> Option<&SubExp> {
        self.lookup(name)?.as_subexp()
    }

    pub fn lookup_scalar(&self, name: &Name) -> Option<&ScalExp> {
        self.lookup(name)?.as_scalar()
    }

    pub fn lookup_value(&self, name: &Name) -> Option<&PrimValue> {
        self.lookup(name)?.as_value()
    }

    pub fn lookup_var(&self, name: &Name) -> Option<&Name> {
        self.lookup(name)?.as_alias()
    }

    /// Range of `name`; unknown if the variable is not in the table.
    pub fn lookup_range(&self, name: &Name) -> Range {
        self.lookup(name).map(|e| e.range.clone()).unwrap_or_default()
    }

    /// Scalar form of `name` as used when translating expressions.
    ///
    /// A variable whose lower and upper bounds coincide is known to equal that bound.
    pub fn resolve_scalar(&self, name: &Name) -> Option<ScalExp> {
        let entry = self.lookup(name)?;
        match (&entry.range.lower, &entry.range.upper) {
            (Some(lower), Some(upper)) if lower == upper => Some(lower.clone()),
            _ => entry.scalar.clone(),
        }
    }

    /// Ranges and binding depths of every variable, as facts for the simplifier.
    pub fn ranges(&self) -> RangeContext {
        let mut ctx = RangeContext::new(self.limits);
        for (name, entry) in self.bindings.iter() {
            ctx.insert(name.clone(), entry.depth, entry.range.clone());
        }
        ctx
    }

    /// Loop variables among `free`, innermost first.
    pub fn enclosing_loop_vars(&self, free: impl IntoIterator<Item = Name>) -> Vec<Name> {
        let mut vars: Vec<(usize, Name)> = free
            .into_iter()
            .filter_map(|name| {
                let entry = self.lookup(&name)?;
                entry.loop_var.then_some((entry.depth, name))
            })
            .collect();
        vars.sort_by(|a, b| b.0.cmp(&a.0));
        vars.into_iter().map(|(_, name)| name).collect()
    }
}

// Insertion.
impl<A, F> SymbolTable<A, F>
where
    A: Clone,
    F: Fn(&Entry<()>) -> A,
{
    pub fn insert_binding(self, binding: &Binding) -> Self {
        let annotate = Rc::clone(&self.annotate);
        self.insert_binding_with(|e: &Entry<()>| annotate(e), binding)
    }

    /// Like [`insert_binding`][Self::insert_binding], but annotates the new entries with `annotate`.
    pub fn insert_binding_with<G>(self, annotate: G, binding: &Binding) -> Self
    where
        G: Fn(&Entry<()>) -> A,
    {
        let entries = self.binding_entries(binding);
        self.insert_entries_with(&annotate, entries)
    }

    /// Inserts a function or lambda parameter.
    ///
    /// Every variable used as an array dimension in the type of the
    /// parameter is a size, hence non-negative.
    pub fn insert_parameter(self, param: &Param) -> Self {
        self.insert_parameter_with_range(param, Range::unknown())
    }

    /// Inserts a lambda parameter that ranges over the elements of `source`.
    ///
    /// The parameter gets the range of `source`, and since `source` is being
    /// consumed, its outer dimension is at least one.
    pub fn insert_array_parameter(self, param: &Param, source: &Ident) -> Self {
        let range = self.lookup_range(&source.name);
        let table = self.insert_parameter_with_range(param, range);
        match source.ty.dims().first() {
            Some(SubExp::Var(size)) => table.set_lower_bound(&size.name, ScalExp::int(1)),
            _ => table,
        }
    }

    fn insert_parameter_with_range(self, param: &Param, range: Range) -> Self {
        let table = self.insert_entries([(param.name.clone(), Entry::with_range(range))]);
        param.ty.dims().iter().fold(table, |table, dim| match dim {
            SubExp::Var(size) => table.set_lower_bound(&size.name, ScalExp::int(0)),
            SubExp::Const(_) => table,
        })
    }

    /// Inserts the induction variable of a loop running from 0 to `bound` (exclusive).
    pub fn insert_loop_variable(self, name: &Name, bound: &SubExp) -> Self {
        let upper = subexp_to_scalar(bound, &|n: &Name| self.resolve_scalar(n))
            .map(|b| ScalExp::minus(b, ScalExp::int(1)));
        let mut entry = Entry::with_range(Range::new(Some(ScalExp::int(0)), upper));
        entry.loop_var = true;
        self.insert_entries([(name.clone(), entry)])
    }

    /// Inserts ready-made entries, stamping them with the current depth.
    pub fn insert_entries(self, entries: impl IntoIterator<Item = (Name, Entry<()>)>) -> Self {
        let annotate = Rc::clone(&self.annotate);
        self.insert_entries_with(annotate.as_ref(), entries)
    }

    fn insert_entries_with<G>(mut self, annotate: &G, entries: impl IntoIterator<Item = (Name, Entry<()>)>) -> Self
    where
        G: Fn(&Entry<()>) -> A,
    {
        let depth = self.depth;
        let bindings = Rc::make_mut(&mut self.bindings);
        for (name, mut entry) in entries {
            entry.depth = depth;
            debug!("insert {} : {}", name, entry);
            bindings.insert(name, Rc::new(entry.annotate(annotate)));
        }
        self
    }

    fn binding_entries(&self, binding: &Binding) -> Vec<(Name, Entry<()>)> {
        match (binding.pattern.as_slice(), &binding.exp) {
            ([ident], exp) => vec![(ident.name.clone(), self.single_entry(exp))],
            ([size, results @ ..], Exp::Filter { arrays, .. }) => {
                let mut entries = vec![(size.name.clone(), Entry::unknown())];
                for (i, ident) in results.iter().enumerate() {
                    let range = arrays
                        .get(i)
                        .and_then(SubExp::as_var)
                        .map(|array| self.lookup_range(array))
                        .unwrap_or_default();
                    entries.push((ident.name.clone(), Entry::with_range(range)));
                }
                entries
            }
            (pattern, _) => pattern
                .iter()
                .map(|ident| (ident.name.clone(), Entry::unknown()))
                .collect(),
        }
    }

    fn single_entry(&self, exp: &Exp) -> Entry<()> {
        let lookup = |n: &Name| self.resolve_scalar(n);
        let range = match exp {
            Exp::SubExp(se) | Exp::Copy(se) | Exp::Replicate(_, se) => self.subexp_range(se),
            Exp::Iota(n) => Range::new(
                Some(ScalExp::int(0)),
                subexp_to_scalar(n, &lookup).map(|n| ScalExp::minus(n, ScalExp::int(1))),
            ),
            Exp::Rearrange(_, array) | Exp::Split(_, array) | Exp::Index(array, _) => self.lookup_range(array),
            _ => Range::unknown(),
        };
        let mut entry = Entry::with_range(range);
        entry.scalar = to_scalar(exp, &lookup);
        entry.exp = Some(exp.clone());
        entry
    }

    fn subexp_range(&self, se: &SubExp) -> Range {
        match se {
            SubExp::Const(v) => Range::exact(ScalExp::Val(v.clone())),
            SubExp::Var(ident) => self.lookup_range(&ident.name),
        }
    }
}

// Bounds.
impl<A, F> SymbolTable<A, F>
where
    A: Clone,
    F: Fn(&Entry<()>) -> A,
{
    /// Tightens the upper bound of `name` to `min(old, bound)`.
    ///
    /// Unknown variables are left alone.
    pub fn set_upper_bound(self, name: &Name, bound: ScalExp) -> Self {
        self.update_range(name, |range| {
            range.upper = Some(match range.upper.take() {
                Some(old) => ScalExp::min_of(old, bound),
                None => bound,
            });
        })
    }

    /// Tightens the lower bound of `name` to `max(old, bound)`.
    ///
    /// Unknown variables are left alone.
    pub fn set_lower_bound(self, name: &Name, bound: ScalExp) -> Self {
        self.update_range(name, |range| {
            range.lower = Some(match range.lower.take() {
                Some(old) => ScalExp::max_of(old, bound),
                None => bound,
            });
        })
    }

    fn update_range(mut self, name: &Name, update: impl FnOnce(&mut Range)) -> Self {
        if !self.bindings.contains_key(name) {
            return self;
        }
        let bindings = Rc::make_mut(&mut self.bindings);
        if let Some(entry) = bindings.get_mut(name) {
            let entry = Rc::make_mut(entry);
            update(&mut entry.range);
            debug!("range of {} is now {}", name, entry.range);
        }
        self
    }
}

impl<A: PartialEq, F> PartialEq for SymbolTable<A, F> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.bindings == other.bindings
    }
}

impl<A: fmt::Debug, F> fmt::Debug for SymbolTable<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("depth", &self.depth)
            .field("size", &self.bindings.len())
            .field("limits", &self.limits)
            .finish()
    }
}

impl<A, F> fmt::Display for SymbolTable<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        writeln!(f, "depth {}", self.depth)?;
        for (name, entry) in entries {
            writeln!(f, "  {}: {}", name, entry)?;
        }
        Ok(())
    }
}

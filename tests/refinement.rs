use num_bigint::BigInt;
use test_log::test;

use symtab_rs::algebra::simplify;
use symtab_rs::ir::{Binding, CmpOp, Exp, Ident, SubExp, Type};
use symtab_rs::scalar::{Range, ScalExp};
use symtab_rs::symtab::PlainSymbolTable;
use symtab_rs::types::{Name, PrimType, SrcLoc};

fn int_ident(name: &Name) -> Ident {
    Ident::new(name.clone(), Type::int())
}

fn int_var(name: &Name) -> SubExp {
    SubExp::var(name.clone(), Type::int())
}

fn cmp(op: CmpOp, name: &Name, value: i64) -> Exp {
    Exp::CmpOp(op, int_var(name), SubExp::int(value))
}

/// Constant value of a bound, if it simplifies to one.
fn constant(table: &PlainSymbolTable, bound: &Option<ScalExp>) -> Option<BigInt> {
    let bound = bound.as_ref()?;
    simplify(bound, SrcLoc::default(), &table.ranges()).ok()?.as_int().cloned()
}

fn constant_range(table: &PlainSymbolTable, name: &Name) -> (Option<BigInt>, Option<BigInt>) {
    let range = table.lookup_range(name);
    (constant(table, &range.lower), constant(table, &range.upper))
}

#[test]
fn test_upper_bound_from_true_branch() {
    let n = Name::new("n", 1);
    let table = PlainSymbolTable::plain().insert_parameter(&int_ident(&n));
    assert!(table.lookup_range(&n).is_unknown());

    let table = table.update_bounds(true, &cmp(CmpOp::Le, &n, 10));
    assert_eq!(constant_range(&table, &n), (None, Some(BigInt::from(10))));
}

#[test]
fn test_lower_bound_from_false_branch() {
    let n = Name::new("n", 1);
    let table = PlainSymbolTable::plain()
        .insert_parameter(&int_ident(&n))
        .update_bounds(false, &cmp(CmpOp::Lt, &n, 0));
    assert_eq!(constant_range(&table, &n), (Some(BigInt::from(0)), None));
}

#[test]
fn test_untranslatable_condition() {
    let n = Name::new("n", 1);
    let table = PlainSymbolTable::plain().insert_parameter(&int_ident(&n));
    let call = Exp::Apply(Name::new("pred", 2), vec![int_var(&n)], PrimType::Bool);
    assert_eq!(table.clone().update_bounds(true, &call), table);
    assert_eq!(table.clone().update_bounds(false, &call), table);
}

#[test]
fn test_refinement_never_widens() {
    let i = Name::new("i", 1);
    let mut table = PlainSymbolTable::plain().insert_loop_variable(&i, &SubExp::int(100));
    let conditions = [
        (true, cmp(CmpOp::Le, &i, 50)),
        (true, cmp(CmpOp::Lt, &i, 20)),
        (false, cmp(CmpOp::Le, &i, 3)),
        (true, cmp(CmpOp::Ge, &i, 1)),
        (true, cmp(CmpOp::Le, &i, 30)),
        (false, cmp(CmpOp::Gt, &i, 60)),
    ];
    for (branch, cond) in conditions {
        let (lo, hi) = constant_range(&table, &i);
        let refined = table.clone().update_bounds(branch, &cond);
        let (new_lo, new_hi) = constant_range(&refined, &i);
        assert!(new_lo >= lo, "lower bound widened from {:?} to {:?}", lo, new_lo);
        assert!(new_hi.is_some() && new_hi <= hi, "upper bound widened from {:?} to {:?}", hi, new_hi);
        table = refined;
    }
    assert_eq!(constant_range(&table, &i), (Some(BigInt::from(4)), Some(BigInt::from(19))));
}

#[test]
fn test_branches_do_not_leak() {
    let n = Name::new("n", 1);
    let table = PlainSymbolTable::plain().insert_parameter(&int_ident(&n));
    let cond = cmp(CmpOp::Lt, &n, 8);

    let then_branch = table.clone().update_bounds(true, &cond);
    let else_branch = table.clone().update_bounds(false, &cond);

    assert_eq!(constant_range(&then_branch, &n), (None, Some(BigInt::from(7))));
    assert_eq!(constant_range(&else_branch, &n), (Some(BigInt::from(8)), None));
    assert!(table.lookup_range(&n).is_unknown());
}

#[test]
fn test_repeated_bounds_take_min_and_max() {
    let x = Name::new("x", 1);
    let mut table = PlainSymbolTable::plain().insert_parameter(&int_ident(&x));
    for bound in [7, 3, 9] {
        table = table.set_upper_bound(&x, ScalExp::int(bound));
    }
    for bound in [1, 5, 2] {
        table = table.set_lower_bound(&x, ScalExp::int(bound));
    }
    assert_eq!(constant_range(&table, &x), (Some(BigInt::from(5)), Some(BigInt::from(3))));
}

#[test]
fn test_iota_of_constant_size() {
    let n = Name::new("n", 1);
    let y = Name::new("y", 2);
    let table = PlainSymbolTable::plain()
        .insert_binding(&Binding::single(int_ident(&n), Exp::SubExp(SubExp::int(5))))
        .insert_binding(&Binding::single(
            Ident::new(y.clone(), Type::array(PrimType::Int, [int_var(&n)])),
            Exp::Iota(int_var(&n)),
        ));
    assert_eq!(table.lookup_range(&y), Range::new(Some(ScalExp::int(0)), Some(ScalExp::int(4))));
}

#[test]
fn test_loop_variable_over_symbolic_bound() {
    let n = Name::new("n", 1);
    let i = Name::new("i", 2);
    let table = PlainSymbolTable::plain()
        .insert_parameter(&int_ident(&n))
        .deepen()
        .insert_loop_variable(&i, &int_var(&n));
    let entry = table.lookup(&i).unwrap();
    assert!(entry.loop_var);
    assert_eq!(entry.depth, 1);
    assert_eq!(entry.range.lower, Some(ScalExp::int(0)));
    assert_eq!(entry.range.upper.as_ref().map(ToString::to_string), Some("(n_1 - 1)".to_string()));
}

#[test]
fn test_copy_keeps_range() {
    let w = Name::new("w", 1);
    let z = Name::new("z", 2);
    let table = PlainSymbolTable::plain()
        .insert_parameter(&int_ident(&w))
        .set_lower_bound(&w, ScalExp::int(2))
        .set_upper_bound(&w, ScalExp::int(8))
        .insert_binding(&Binding::single(int_ident(&z), Exp::Copy(int_var(&w))));
    assert_eq!(table.lookup_range(&z), Range::new(Some(ScalExp::int(2)), Some(ScalExp::int(8))));
}

#[test]
fn test_array_parameter_asserts_nonempty_source() {
    let m = Name::new("m", 1);
    let xs = Name::new("xs", 2);
    let x = Name::new("x", 3);
    let source = Ident::new(xs.clone(), Type::array(PrimType::Int, [int_var(&m)]));
    let table = PlainSymbolTable::plain()
        .insert_parameter(&int_ident(&m))
        .insert_parameter(&source)
        .set_lower_bound(&xs, ScalExp::int(1))
        .set_upper_bound(&xs, ScalExp::int(9))
        .insert_array_parameter(&int_ident(&x), &source);
    assert_eq!(constant_range(&table, &m).0, Some(BigInt::from(1)));
    assert_eq!(constant_range(&table, &x), (Some(BigInt::from(1)), Some(BigInt::from(9))));
}

#[test]
fn test_enclosing_loop_vars_innermost_first() {
    let names: Vec<Name> = ["a", "b", "c", "d"].iter().enumerate().map(|(i, s)| Name::new(s, i as u32)).collect();
    let mut table = PlainSymbolTable::plain();
    for name in &names {
        table = table.insert_loop_variable(name, &SubExp::int(4)).deepen();
    }
    let order = table.enclosing_loop_vars([names[1].clone(), names[3].clone(), names[0].clone()]);
    assert_eq!(order, vec![names[3].clone(), names[1].clone(), names[0].clone()]);

    let depths: Vec<usize> = order.iter().map(|n| table.lookup(n).unwrap().depth).collect();
    assert!(depths.windows(2).all(|w| w[0] >= w[1]));
}

use clap::Parser;

use symtab_rs::algebra::simplify;
use symtab_rs::ir::{BinOp, Binding, CmpOp, Exp, Ident, SubExp, Type};
use symtab_rs::scalar::ScalExp;
use symtab_rs::symtab::PlainSymbolTable;
use symtab_rs::types::{Name, PrimType, SrcLoc};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Bound compared against the loop variable.
    #[arg(value_name = "INT", default_value = "10")]
    bound: i64,

    /// Use a strict comparison (`i < bound` instead of `i <= bound`).
    #[clap(long)]
    strict: bool,

    /// Refine for the false branch of the condition.
    #[clap(long)]
    else_branch: bool,

    /// Verbosity (`-v` for debug, `-vv` for trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    // Encode:
    //   fn f(n: i64, xs: [n]i64) {
    //     for i in 0..n {
    //       let j = i + 1;
    //       if i < bound { ... } else { ... }
    //     }
    //   }
    let n = Name::new("n", 1);
    let xs = Name::new("xs", 2);
    let i = Name::new("i", 3);
    let j = Name::new("j", 4);
    let n_var = SubExp::var(n.clone(), Type::int());
    let i_var = SubExp::var(i.clone(), Type::int());

    let table = PlainSymbolTable::plain()
        .insert_parameter(&Ident::new(n.clone(), Type::int()))
        .insert_parameter(&Ident::new(xs, Type::array(PrimType::Int, [n_var.clone()])))
        .deepen()
        .insert_loop_variable(&i, &n_var)
        .insert_binding(&Binding::single(
            Ident::new(j, Type::int()),
            Exp::BinOp(BinOp::Add, i_var.clone(), SubExp::int(1)),
        ));
    println!("before:\n{}", table);

    let op = if args.strict { CmpOp::Lt } else { CmpOp::Le };
    let cond = Exp::CmpOp(op, i_var, SubExp::int(args.bound));
    let refined = table.update_bounds(!args.else_branch, &cond);
    println!("after:\n{}", refined);

    let ctx = refined.ranges();
    for name in refined.names() {
        let range = refined.lookup_range(name);
        let show = |bound: Option<ScalExp>| -> color_eyre::Result<String> {
            Ok(match bound {
                Some(b) => simplify(&b, SrcLoc::default(), &ctx)?.to_string(),
                None => "?".to_string(),
            })
        };
        println!("{}: [{}, {}]", name, show(range.lower)?, show(range.upper)?);
    }

    Ok(())
}

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lalrgen::{
    conflicts::Expectation,
    grammar::{examples, Grammar},
    Config,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// The built-in grammar to process.
    #[arg(long, value_enum, default_value_t = Builtin::Arithmetic)]
    grammar: Builtin,

    /// The number of shift/reduce conflicts the grammar is expected to have.
    #[arg(long)]
    expect: Option<usize>,

    /// Dump the LR(0) automaton and the look-ahead sets.
    #[arg(long)]
    automaton: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Builtin {
    Arithmetic,
    Ambiguous,
    Operators,
    OperatorsReversed,
    LeftAssoc,
    RightAssoc,
    Nonassoc,
    DanglingElse,
    WithNullable,
    ReadThroughNullable,
    ErrorRecovery,
    EmptyLanguage,
    LalrReduceReduce,
    MinCaml,
}

impl Builtin {
    fn example(self) -> examples::Example {
        match self {
            Self::Arithmetic => examples::arithmetic,
            Self::Ambiguous => examples::ambiguous,
            Self::Operators => examples::operators,
            Self::OperatorsReversed => examples::operators_reversed,
            Self::LeftAssoc => examples::left_assoc,
            Self::RightAssoc => examples::right_assoc,
            Self::Nonassoc => examples::nonassoc,
            Self::DanglingElse => examples::dangling_else,
            Self::WithNullable => examples::with_nullable,
            Self::ReadThroughNullable => examples::read_through_nullable,
            Self::ErrorRecovery => examples::error_recovery,
            Self::EmptyLanguage => examples::empty_language,
            Self::LalrReduceReduce => examples::lalr_reduce_reduce,
            Self::MinCaml => examples::min_caml,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    let grammar = Grammar::define(args.grammar.example())
        .with_context(|| anyhow::anyhow!("invalid grammar definition: {:?}", args.grammar))?;
    println!("{}", grammar);

    let mut config = Config::new();
    if let Some(n) = args.expect {
        config.expect_conflicts(n);
    }

    let s = Instant::now();
    let tables = config.generate(&grammar)?;
    tracing::info!("generate: {:?} elapsed", s.elapsed());

    if args.automaton {
        println!("## automaton:\n{}", tables.automaton.display(&grammar));
        println!("## lookaheads:\n{}", tables.lookaheads.display(&grammar));
        for resolution in &tables.conflicts.resolutions {
            println!("{}", resolution.display(&grammar));
        }
        println!();
    }
    println!("## parse table:\n{}", tables.table.display(&grammar));

    if !tables.summary.is_empty() {
        println!("{}", tables.summary);
    }
    match tables.expectation {
        Expectation::NotDeclared | Expectation::Met => Ok(()),
        Expectation::Unmet {
            expected,
            found,
            reduce_reduce,
        } => Err(anyhow::anyhow!(
            "expected {} shift/reduce conflicts, but found {} shift/reduce and {} reduce/reduce",
            expected,
            found,
            reduce_reduce
        )),
    }
}

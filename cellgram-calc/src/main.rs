//! Command-line interface (CLI) for cellgram-calc
//!
//! Evaluates formulas given as arguments, or one per line from standard
//! input, and prints each result. The grammar and parse traces can be
//! printed to standard error.

use anyhow::{Context, Result};
use cellgram::{Channel, Trace};
use cellgram_calc::{CellOutcome, Formula};
use clap::Parser as ClapParser;
use std::io::BufRead;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Formulas to evaluate; reads standard input when none are given
    formulas: Vec<String>,

    /// Print automaton construction to stderr
    #[arg(long)]
    trace_grammar: bool,

    /// Print the shift/reduce trace of every formula to stderr
    #[arg(long)]
    trace_parse: bool,

    /// Exit with an error on the first invalid formula
    #[arg(short, long)]
    strict: bool,
}

fn build(args: &Args) -> Result<Formula> {
    let trace = Trace::new();
    if args.trace_grammar {
        trace.subscribe(Channel::Grammar, |m| eprintln!("{}", m));
    }
    let formula = Formula::with_trace(trace).context("can't build formula grammar")?;
    if args.trace_parse {
        formula.observe(Channel::Parse, |m| eprintln!("{}", m));
    }
    Ok(formula)
}

fn run(formula: &Formula, source: &str, strict: bool) -> Result<()> {
    if strict {
        if !source.trim().is_empty() {
            let value = formula
                .eval(source)
                .with_context(|| format!("invalid formula {:?}", source))?;
            println!("{}", value);
        }
        return Ok(());
    }
    match formula.evaluate_cell(source) {
        CellOutcome::Empty => {}
        CellOutcome::Value(value) => println!("{}", value),
        CellOutcome::Error { display, message } => println!("{}\t# {}", display, message),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let formula = build(&args)?;

    if args.formulas.is_empty() {
        for line in std::io::stdin().lock().lines() {
            let line = line.context("can't read standard input")?;
            run(&formula, &line, args.strict)?;
        }
    } else {
        for source in &args.formulas {
            run(&formula, source, args.strict)?;
        }
    }
    Ok(())
}

//! Command-line driver for the Tao interpreter
//!
//! Reads a program from a file, or from stdin when no path (or `-`) is
//! given; with `-m`/`--main`, calls the top-level `main` function after
//! loading. Any load or runtime error goes to stderr with a non-zero
//! exit.

use std::process::ExitCode;

use anyhow::{bail, Context};
use tao::Program;

struct Options {
    path: Option<String>,
    call_main: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Options> {
    let mut options = Options {
        path: None,
        call_main: false,
    };
    for arg in args {
        match arg.as_str() {
            "-m" | "--main" => options.call_main = true,
            "-" => options.path = None,
            flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
            path => {
                if options.path.is_some() {
                    bail!("only one input file is accepted");
                }
                options.path = Some(path.to_string());
            }
        }
    }
    Ok(options)
}

fn run() -> anyhow::Result<()> {
    let options = parse_args(std::env::args().skip(1))?;

    let mut program = Program::new();
    match &options.path {
        Some(path) => {
            let source = std::fs::read(path).with_context(|| format!("cannot open {path}"))?;
            program.load_input(&source[..])?;
        }
        None => program.load_input(std::io::stdin())?,
    }

    if options.call_main {
        program.call("main", &[])?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

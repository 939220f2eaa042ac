//! IPPcode20 interpreter CLI.
//!
//! Exit codes:
//! - 0-49: program finished, or the status given to EXIT
//! - 10: bad or missing command-line options
//! - 11: source or input file cannot be read
//! - 12: output or stats file cannot be written
//! - 31: missing header or XML that is not well-formed
//! - 32: malformed program structure
//! - 52-58: runtime error

mod commands;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, ArgGroup, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

/// Interpreter for IPPcode20 programs.
///
/// At least one of --source and --input must be given; the other is read
/// from standard input.
#[derive(Parser, Debug)]
#[command(name = "ippcode", disable_help_flag = true, disable_version_flag = true)]
#[command(group(
    ArgGroup::new("files")
        .required(true)
        .multiple(true)
        .args(["source", "input"])
))]
pub(crate) struct Options {
    /// Program source, as IPPcode20 text or its XML form.
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Lines consumed by READ.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write execution statistics to FILE.
    #[arg(long, value_name = "FILE")]
    pub stats: Option<PathBuf>,

    /// Report the number of executed instructions.
    #[arg(long, action = ArgAction::Count, requires = "stats")]
    pub insts: u8,

    /// Report the number of variable writes.
    #[arg(long, action = ArgAction::Count, requires = "stats")]
    pub vars: u8,
}

/// One line of the stats file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stat {
    Insts,
    Vars,
}

/// Stats flags in the order they were given.
fn stat_order(args: &[String]) -> Vec<Stat> {
    args.iter()
        .filter_map(|arg| match arg.as_str() {
            "--insts" => Some(Stat::Insts),
            "--vars" => Some(Stat::Vars),
            _ => None,
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    if args.iter().skip(1).any(|arg| arg == "--help") {
        if args.len() == 2 {
            print_usage();
            process::exit(0);
        }
        eprintln!("error: --help cannot be combined with other options");
        process::exit(10);
    }

    let options = match Options::try_parse_from(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            process::exit(10);
        }
    };

    let stats = stat_order(&args[1..]);
    match commands::run(&options, &stats) {
        Ok(status) | Err(status) => process::exit(status),
    }
}

fn print_usage() {
    let mut command = Options::command();
    println!("{}", command.render_help());
}

//! CLI command implementations.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use ippcode_vm::{Console, LineSource, ReaderInput, ScriptedInput, Stats, VM};
use tracing::debug;

use crate::{Options, Stat};

/// Load and execute a program. `Ok` carries the program's exit status,
/// `Err` the status for a load, I/O or runtime failure.
pub fn run(options: &Options, stats: &[Stat]) -> Result<i32, i32> {
    let text = match &options.source {
        Some(path) => read_file(path)?,
        None => read_stdin()?,
    };

    let program = ippcode_loader::load_source(&text).map_err(|e| {
        eprintln!("error: {e}");
        e.exit_code()
    })?;
    debug!(instructions = program.len(), "source loaded");

    let mut input: Box<dyn LineSource> = match &options.input {
        Some(path) => Box::new(ScriptedInput::from_text(&read_file(path)?)),
        None => Box::new(ReaderInput::new(io::stdin().lock())),
    };

    let stdout = io::stdout();
    let mut output = stdout.lock();
    let stderr = io::stderr();
    let mut diagnostics = stderr.lock();

    let (outcome, counters) = {
        let mut vm = VM::new(
            &program,
            Console {
                input: input.as_mut(),
                output: &mut output,
                diagnostics: &mut diagnostics,
            },
        );
        let outcome = vm.execute();
        (outcome, vm.stats())
    };

    let flushed = output.flush();
    drop(diagnostics);

    let halt = outcome.map_err(|e| {
        eprintln!("error: {e}");
        e.exit_code()
    })?;
    flushed.map_err(|e| {
        eprintln!("error: cannot write output: {e}");
        12
    })?;

    if let Some(path) = &options.stats {
        write_stats(path, stats, counters)?;
    }

    debug!(status = halt.status(), "finished");
    Ok(halt.status())
}

fn read_file(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        11
    })
}

fn read_stdin() -> Result<String, i32> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|e| {
        eprintln!("error: cannot read standard input: {e}");
        11
    })?;
    Ok(text)
}

/// One number per requested stat, in request order.
fn render_stats(stats: &[Stat], counters: Stats) -> String {
    stats
        .iter()
        .map(|stat| match stat {
            Stat::Insts => format!("{}\n", counters.instructions),
            Stat::Vars => format!("{}\n", counters.variable_writes),
        })
        .collect()
}

fn write_stats(path: &Path, stats: &[Stat], counters: Stats) -> Result<(), i32> {
    fs::write(path, render_stats(stats, counters)).map_err(|e| {
        eprintln!("error: cannot write '{}': {e}", path.display());
        12
    })
}

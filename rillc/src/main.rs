mod cli;
mod natives;
mod repl;

use std::{path::PathBuf, process::ExitCode, rc::Rc, time::Instant};

use clap::Parser;
use rill_core::{
    eval::prelude::Interpreter,
    resolver::{check_from_stream, check_source, prelude::Resolved},
    utils::prelude::{Error, Warning, WarningEmitterIO},
};

#[derive(Parser)]
enum Command {
    /// Parses, resolves and runs a source file
    Run {
        /// Path of source file
        path: PathBuf,
    },
    /// Performs syntactic and binding analysis without running the program
    Check {
        /// Path of source file
        path: PathBuf,
        /// Print the parsed program back
        #[arg(short, long, default_value_t = false)]
        print_program: bool,
    },
    /// Starts an interactive session
    Repl,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsoleWarningEmitter;

impl WarningEmitterIO for ConsoleWarningEmitter {
    fn emit_warning(&self, warning: Warning) {
        let buffer_writer = cli::stderr_buffer_writer();
        let mut buffer = buffer_writer.buffer();
        warning.pretty(&mut buffer);
        buffer_writer.print(&buffer).expect("print warning");
    }
}

fn main() -> ExitCode {
    match Command::parse() {
        Command::Run { path } => run(path),
        Command::Check { path, print_program } => check(path, print_program),
        Command::Repl => repl::start(),
    }
}

fn run(path: PathBuf) -> ExitCode {
    let warnings: Rc<dyn WarningEmitterIO> = Rc::new(ConsoleWarningEmitter);

    cli::print_running(&path.to_string_lossy());

    let src = match std::fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => {
            cli::print_error(&Error::StdIo { err: err.kind() });
            return ExitCode::FAILURE;
        }
    };

    let Resolved { program, bindings } = match check_source(&src, path.clone(), warnings) {
        Ok(resolved) => resolved,
        Err(error) => {
            cli::print_error(&error);
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = Interpreter::new(bindings);
    natives::register(&mut interpreter);

    match interpreter.interpret(&program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            cli::print_error(&Error::Runtime { path, src, error });
            ExitCode::FAILURE
        }
    }
}

fn check(path: PathBuf, print_program: bool) -> ExitCode {
    let warnings: Rc<dyn WarningEmitterIO> = Rc::new(ConsoleWarningEmitter);

    cli::print_checking(&path.to_string_lossy());
    let started = Instant::now();

    match check_from_stream(path, warnings) {
        Ok(resolved) => {
            cli::print_checked(started.elapsed());

            if print_program {
                println!("{}", resolved.program);
            }

            ExitCode::SUCCESS
        },
        Err(error) => {
            cli::print_error(&error);
            ExitCode::FAILURE
        }
    }
}

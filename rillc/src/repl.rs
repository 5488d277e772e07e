use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use rill_core::{
    eval::prelude::Interpreter,
    lexer::prelude::Lexer,
    parser::prelude::Parser,
    resolver::prelude::{Outcome, Resolver},
    utils::prelude::{Error, ResolveWarningEmitter, WarningEmitter, WarningEmitterIO},
};

use crate::{cli, natives, ConsoleWarningEmitter};

const PROMPT: &str = ">> ";

/// Interactive loop. The interpreter and its global environment persist
/// across inputs, so definitions from earlier lines stay usable; each line
/// is parsed and resolved on its own, with expression ids threaded through
/// so earlier closures keep their bindings.
pub fn start() -> ExitCode {
    ctrlc::set_handler(|| std::process::exit(0)).expect("set Ctrl-C handler");

    let warnings: Rc<dyn WarningEmitterIO> = Rc::new(ConsoleWarningEmitter);

    let mut interpreter = Interpreter::new(Default::default());
    natives::register(&mut interpreter);

    let mut next_id = 0;
    let stdin = std::io::stdin();

    loop {
        let mut input = String::new();

        print!("{PROMPT}");
        if std::io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        match stdin.read_line(&mut input) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {},
            Err(_) => return ExitCode::FAILURE,
        }

        let input = input.trim_end_matches(['\n', '\r']);

        match input {
            "" => {},
            ".exit" => return ExitCode::SUCCESS,
            src => {
                next_id = eval_line(src, next_id, &mut interpreter, &warnings);
            }
        }
    }
}

fn eval_line(
    src: &str,
    next_id: u32,
    interpreter: &mut Interpreter,
    warnings: &Rc<dyn WarningEmitterIO>,
) -> u32 {
    let lexer = Lexer::new(src.char_indices().map(|(i, c)| (i as u32, c)));
    let mut parser = Parser::with_first_id(lexer, next_id);

    let parsed = match parser.parse() {
        Ok(parsed) => parsed,
        Err(errors) => {
            cli::print_error(&Error::Parse {
                path: PathBuf::from("<repl>"),
                src: src.to_string(),
                errors,
            });

            return parser.next_id();
        }
    };
    let next_id = parser.next_id();

    let emitter = ResolveWarningEmitter::new(
        PathBuf::from("<repl>"),
        src.to_string(),
        WarningEmitter::new(Rc::clone(warnings)),
    );

    let resolved = match Resolver::resolve(parsed.program, &emitter) {
        Outcome::Ok(resolved) => resolved,
        Outcome::PartialFailure(_, errors) => {
            cli::print_error(&Error::Resolve {
                path: PathBuf::from("<repl>"),
                src: src.to_string(),
                errors,
            });

            return next_id;
        }
    };

    interpreter.extend_bindings(resolved.bindings);

    if let Err(error) = interpreter.interpret(&resolved.program) {
        cli::print_error(&Error::Runtime {
            path: PathBuf::from("<repl>"),
            src: src.to_string(),
            error,
        });
    }

    next_id
}

pub mod error;
pub mod resolver;

pub mod prelude {
    pub use super::{
        error::*,
        resolver::*
    };
}

#[cfg(test)]
mod tests;

use std::{path::PathBuf, rc::Rc};

use utf8_chars::BufReadCharsExt;

use crate::{
    parser::prelude::{parse_module, parse_module_from_stream},
    resolver::prelude::{Outcome, Resolved, Resolver},
    utils::prelude::{Error, ResolveWarningEmitter, WarningEmitter, WarningEmitterIO},
};

/// Parses and resolves a source file. Returns the resolved program only if
/// both passes finished without a single error; resolver warnings go to the
/// given emitter either way.
pub fn check(
    path: PathBuf,
    warnings: Rc<dyn WarningEmitterIO>,
) -> Result<Resolved, Error> {
    let src = match std::fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => return Err(Error::StdIo { err: err.kind() }),
    };

    check_source(&src, path, warnings)
}

pub fn check_source(
    src: &str,
    path: PathBuf,
    warnings: Rc<dyn WarningEmitterIO>,
) -> Result<Resolved, Error> {
    let parsed = match parse_module(src) {
        Ok(parsed) => parsed,
        Err(errors) => return Err(Error::Parse {
            path,
            src: src.to_string(),
            errors,
        }),
    };

    let emitter = ResolveWarningEmitter::new(
        path.clone(),
        src.to_string(),
        WarningEmitter::new(warnings),
    );

    match Resolver::resolve(parsed.program, &emitter) {
        Outcome::Ok(resolved) => Ok(resolved),
        Outcome::PartialFailure(_, errors) => Err(Error::Resolve {
            path,
            src: src.to_string(),
            errors,
        }),
    }
}

/// Streaming variant of [`check`]: the file is fed to the lexer character by
/// character while the source accumulates for diagnostics.
pub fn check_from_stream(
    path: PathBuf,
    warnings: Rc<dyn WarningEmitterIO>,
) -> Result<Resolved, Error> {
    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(err) => return Err(Error::StdIo { err: err.kind() }),
    };

    let file_size = file.metadata()
        .map_err(|err| Error::StdIo { err: err.kind() })?
        .len() as usize;

    let mut src = String::with_capacity(file_size);
    let mut reader = std::io::BufReader::new(file);

    let parsed = {
        let stream = reader.chars()
            .map_while(|c| c.ok())
            .map(|c| {
                src.push(c);
                c
            });

        parse_module_from_stream(stream)
    };

    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(errors) => return Err(Error::Parse {
            path,
            src,
            errors,
        }),
    };

    let emitter = ResolveWarningEmitter::new(
        path.clone(),
        src.clone(),
        WarningEmitter::new(warnings),
    );

    match Resolver::resolve(parsed.program, &emitter) {
        Outcome::Ok(resolved) => Ok(resolved),
        Outcome::PartialFailure(_, errors) => Err(Error::Resolve {
            path,
            src,
            errors,
        }),
    }
}

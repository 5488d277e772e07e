use std::path::PathBuf;

use termcolor::Buffer;
use thiserror::Error;

use crate::{
    eval::prelude::RuntimeError,
    parser::prelude::{ParseError, ParseErrorType},
    resolver::prelude::ResolveError,
    utils::prelude::SrcSpan,
};
use super::diagnostic::{Diagnostic, Label, Level, Location};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("failed to parse source code")]
    Parse {
        path: PathBuf,
        src: String,
        errors: Vec<ParseError>,
    },
    #[error("name resolution failed")]
    Resolve {
        path: PathBuf,
        src: String,
        errors: Vec<ResolveError>,
    },
    #[error("runtime error")]
    Runtime {
        path: PathBuf,
        src: String,
        error: RuntimeError,
    },
    #[error("IO operation failed")]
    StdIo {
        err: std::io::ErrorKind,
    },
}

impl Error {
    pub fn pretty_string(&self) -> String {
        let mut nocolor = Buffer::no_color();
        self.pretty(&mut nocolor);
        String::from_utf8(nocolor.into_inner()).expect("Error printing produced invalid utf8")
    }

    pub fn pretty(&self, buf: &mut Buffer) {
        use std::io::Write;

        for diagnostic in self.to_diagnostics() {
            diagnostic.write(buf);
            writeln!(buf).expect("write new line diagnostic");
        }
    }

    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse { path, src, errors } => {
                errors.iter()
                    .map(|error| parse_diagnostic(path, src, error))
                    .collect()
            },
            Error::Resolve { path, src, errors } => {
                errors.iter()
                    .map(|error| resolve_diagnostic(path, src, error))
                    .collect()
            },
            Error::Runtime { path, src, error } => {
                let (label, extra) = error.details();
                let text = extra.join("\n");

                vec![Diagnostic {
                    title: "Runtime error".into(),
                    text,
                    hint: None,
                    level: Level::Error,
                    location: Some(Location {
                        src,
                        path: path.clone(),
                        label: Label {
                            text: Some(label),
                            span: error.location(),
                        },
                        extra_labels: vec![],
                    }),
                }]
            },
            Error::StdIo { err } => {
                vec![Diagnostic {
                    title: "Standard IO error".into(),
                    text: format!("{err}"),
                    hint: None,
                    level: Level::Error,
                    location: None,
                }]
            }
        }
    }
}

fn parse_diagnostic<'a>(path: &PathBuf, src: &'a str, error: &ParseError) -> Diagnostic<'a> {
    let (label, extra) = error.details();
    let text = extra.join("\n");

    // End-of-file errors carry a useless zero span; point them at the end
    // of the source instead.
    let adjusted_location = if matches!(error.error, ParseErrorType::UnexpectedEof) {
        SrcSpan {
            start: src.len() as u32,
            end: src.len() as u32,
        }
    } else {
        error.span
    };

    Diagnostic {
        title: "Syntax error".into(),
        text,
        hint: None,
        level: Level::Error,
        location: Some(Location {
            src,
            path: path.clone(),
            label: Label {
                text: Some(label),
                span: adjusted_location,
            },
            extra_labels: vec![],
        }),
    }
}

fn resolve_diagnostic<'a>(path: &PathBuf, src: &'a str, error: &ResolveError) -> Diagnostic<'a> {
    match error {
        ResolveError::SelfReferencingInitializer { location, name } => Diagnostic {
            title: "Self-referencing initializer".into(),
            text: format!("Can't read local variable `{name}` in its own initializer."),
            hint: None,
            level: Level::Error,
            location: Some(Location {
                src,
                path: path.clone(),
                label: Label {
                    text: None,
                    span: *location,
                },
                extra_labels: vec![],
            }),
        },
        ResolveError::DuplicateDeclaration { location_a, location_b, name } => Diagnostic {
            title: "Duplicate declaration".into(),
            text: format!("`{name}` is already declared in this scope."),
            hint: None,
            level: Level::Error,
            location: Some(Location {
                src,
                path: path.clone(),
                label: Label {
                    text: Some("Declared again here".into()),
                    span: *location_b,
                },
                extra_labels: vec![Label {
                    text: Some("First declared here".into()),
                    span: *location_a,
                }],
            }),
        },
        ResolveError::ReturnOutsideFunction { location } => Diagnostic {
            title: "Invalid return".into(),
            text: "Can't return from outside of a function.".into(),
            hint: None,
            level: Level::Error,
            location: Some(Location {
                src,
                path: path.clone(),
                label: Label {
                    text: None,
                    span: *location,
                },
                extra_labels: vec![],
            }),
        },
        ResolveError::BreakOutsideLoop { location } => Diagnostic {
            title: "Invalid break".into(),
            text: "Can't break outside of a loop.".into(),
            hint: None,
            level: Level::Error,
            location: Some(Location {
                src,
                path: path.clone(),
                label: Label {
                    text: None,
                    span: *location,
                },
                extra_labels: vec![],
            }),
        },
        ResolveError::ContinueOutsideLoop { location } => Diagnostic {
            title: "Invalid continue".into(),
            text: "Can't continue outside of a loop.".into(),
            hint: None,
            level: Level::Error,
            location: Some(Location {
                src,
                path: path.clone(),
                label: Label {
                    text: None,
                    span: *location,
                },
                extra_labels: vec![],
            }),
        },
    }
}

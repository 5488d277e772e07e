use crate::{lexer::prelude::Token, utils::prelude::SrcSpan};

/// Errors raised during interpretation. Each aborts the current `interpret`
/// call only; environment mutations made before the failure stay in place.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UndefinedVariable {
        location: SrcSpan,
        name: String,
    },
    UndefinedDictionary {
        location: SrcSpan,
        name: String,
    },
    NotCallable {
        location: SrcSpan,
    },
    ArityMismatch {
        location: SrcSpan,
        expected: usize,
        got: usize,
    },
    ExpectedNumberOperand {
        location: SrcSpan,
        operator: Token,
    },
    ExpectedNumberOperands {
        location: SrcSpan,
        operator: Token,
    },
    InvalidAdditionOperands {
        location: SrcSpan,
    },
    InvalidUnaryOperator {
        location: SrcSpan,
        operator: Token,
    },
    /// A native function rejected its arguments.
    Native {
        location: SrcSpan,
        message: String,
    },
}

impl RuntimeError {
    pub fn location(&self) -> SrcSpan {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::UndefinedDictionary { location, .. }
            | RuntimeError::NotCallable { location }
            | RuntimeError::ArityMismatch { location, .. }
            | RuntimeError::ExpectedNumberOperand { location, .. }
            | RuntimeError::ExpectedNumberOperands { location, .. }
            | RuntimeError::InvalidAdditionOperands { location }
            | RuntimeError::InvalidUnaryOperator { location, .. }
            | RuntimeError::Native { location, .. } => *location
        }
    }

    pub fn details(&self) -> (String, Vec<String>) {
        match self {
            RuntimeError::UndefinedVariable { name, .. } => {
                (format!("Undefined variable `{name}`"), vec![])
            },
            RuntimeError::UndefinedDictionary { name, .. } => {
                (format!("Undefined dictionary `{name}`"), vec![])
            },
            RuntimeError::NotCallable { .. } => {
                ("Can only call functions".into(), vec![])
            },
            RuntimeError::ArityMismatch { expected, got, .. } => {
                (format!("Expected {expected} arguments but got {got}"), vec![])
            },
            RuntimeError::ExpectedNumberOperand { operator, .. } => {
                (format!("Operand of `{}` must be a number", operator.as_literal()), vec![])
            },
            RuntimeError::ExpectedNumberOperands { operator, .. } => {
                (format!("Operands of `{}` must both be numbers", operator.as_literal()), vec![])
            },
            RuntimeError::InvalidAdditionOperands { .. } => {
                ("Operands of `+` must be numbers or strings".into(), vec![])
            },
            RuntimeError::InvalidUnaryOperator { operator, .. } => {
                (format!("Invalid unary operator `{}`", operator.as_literal()), vec![])
            },
            RuntimeError::Native { message, .. } => {
                (message.clone(), vec![])
            },
        }
    }
}

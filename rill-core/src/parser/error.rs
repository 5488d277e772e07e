use crate::{lexer::prelude::{LexicalError, Token}, utils::prelude::SrcSpan};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
    ExpectedIdent,
    ExpectedExpression,
    UnexpectedEof,
    UnexpectedToken {
        token: Token,
        expected: Vec<String>,
    },
    MissingLeftOperand {
        operator: Token,
    },
    MissingRightOperand {
        operator: Token,
    },
    InvalidAssignmentTarget,
    UnsupportedUnaryPlus,
    TooManyParameters,
    TooManyArguments,
    LexError { error: LexicalError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub error: ParseErrorType,
    pub span: SrcSpan,
}

impl ParseError {
    pub fn details(&self) -> (String, Vec<String>) {
        match &self.error {
            ParseErrorType::ExpectedIdent => ("Expected an identifier".into(), vec![]),
            ParseErrorType::ExpectedExpression => ("Expected an expression".into(), vec![]),
            ParseErrorType::UnexpectedEof => ("Unexpected end of file".into(), vec![]),
            ParseErrorType::UnexpectedToken { token, expected } => {
                let found = match token {
                    Token::Number(_) => "a number".to_string(),
                    Token::String(_) => "a string".to_string(),
                    Token::Ident(_) => "an identifier".to_string(),
                    _ if token.is_reserved_word() => format!("the keyword `{}`", token.as_literal()),
                    _ => format!("`{}`", token.as_literal())
                };

                let messages = std::iter::once(format!("Found {found}, expected one of: "))
                    .chain(expected.iter().map(|expected| format!("- `{expected}`")))
                    .collect();

                ("Unexpected token".into(), messages)
            },
            ParseErrorType::MissingLeftOperand { operator } => {
                (format!("Missing left operand for `{}`", operator.as_literal()), vec![])
            },
            ParseErrorType::MissingRightOperand { operator } => {
                (format!("Missing valid right operand for `{}`", operator.as_literal()), vec![])
            },
            ParseErrorType::InvalidAssignmentTarget => (
                "Invalid assignment target".into(),
                vec!["Only a variable or a dictionary index can be assigned to.".into()]
            ),
            ParseErrorType::UnsupportedUnaryPlus => {
                ("Unary `+` expressions are not supported".into(), vec![])
            },
            ParseErrorType::TooManyParameters => {
                ("Can't have more than 255 parameters".into(), vec![])
            },
            ParseErrorType::TooManyArguments => {
                ("Can't have more than 255 arguments".into(), vec![])
            },
            ParseErrorType::LexError { error } => {
                let (message, extra) = error.details();
                (message.into(), extra)
            }
        }
    }
}

pub fn parse_error<T>(error: ParseErrorType, span: SrcSpan) -> Result<T, ParseError> {
    Err(ParseError { error, span })
}

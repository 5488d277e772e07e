use crate::{lexer::prelude::{LexResult, Lexer, LexicalError, Spanned, Token}, utils::prelude::SrcSpan};
use super::error::{parse_error, ParseError, ParseErrorType};
use super::ast::*;

use std::rc::Rc;

/// Recursive-descent parser over the lexer's spanned token stream.
///
/// Syntax errors do not abort the parse: the offending statement is skipped
/// via panic-mode recovery (`synchronize`) and parsing resumes at the next
/// statement boundary, so a single pass reports every independent error.
pub struct Parser<T: Iterator<Item = LexResult>> {
    pub current_token: Option<Spanned>,
    pub next_token: Option<Spanned>,
    pub comments: Vec<SrcSpan>,
    pub lex_errors: Vec<LexicalError>,

    errors: Vec<ParseError>,
    previous: Option<Spanned>,
    next_id: u32,
    tokens: T,
}

impl<T: Iterator<Item = LexResult>> Parser<T> {
    pub fn new(input: T) -> Self {
        Self::with_first_id(input, 0)
    }

    /// Starts expression ids at `first_id` instead of zero. Sequential
    /// parses feeding one interpreter (the REPL) thread the counter through
    /// so ids stay unique across inputs.
    pub fn with_first_id(input: T, first_id: u32) -> Self {
        let mut parser = Self {
            current_token: None,
            next_token: None,
            comments: vec![],
            lex_errors: vec![],

            errors: vec![],
            previous: None,
            next_id: first_id,
            tokens: input,
        };

        parser.step();
        parser.step();

        parser
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn parse(&mut self) -> Result<Parsed, Vec<ParseError>> {
        let mut statements = vec![];

        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        if !self.lex_errors.is_empty() {
            return Err(self.lex_errors.iter()
                .map(|error| ParseError {
                    error: ParseErrorType::LexError { error: *error },
                    span: error.location,
                })
                .collect());
        }

        if !self.errors.is_empty() {
            let mut errors = std::mem::take(&mut self.errors);
            errors.sort_by_key(|error| error.span.start);

            return Err(errors);
        }

        Ok(Parsed {
            program: Program { statements },
            comments: std::mem::take(&mut self.comments),
        })
    }

    // declaration -> <function> | <var> | <dictionary> | <statement>
    fn declaration(&mut self) -> Option<Statement> {
        let result = match &self.current_token {
            Some((_, Token::Fun, _)) => self.function_declaration(),
            Some((_, Token::Var, _)) => self.var_declaration(),
            Some((_, Token::Dictionary, _)) => self.dictionary_declaration(),
            _ => self.statement(),
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();

                None
            }
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current_token {
            Some((_, Token::Break, _)) => self.break_statement(),
            Some((_, Token::Continue, _)) => self.continue_statement(),
            Some((_, Token::If, _)) => self.if_statement(),
            Some((_, Token::For, _)) => self.for_statement(),
            Some((_, Token::While, _)) => self.while_statement(),
            Some((_, Token::Print, _)) => self.print_statement(),
            Some((_, Token::Return, _)) => self.return_statement(),
            Some((_, Token::LBrace, _)) => self.block_statement(),
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expression = self.expression()?;
        let location = expression.location();
        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Expression(ExpressionStatement {
            location: SrcSpan {
                start: location.start,
                end,
            },
            expression,
        }))
    }

    fn function_declaration(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Fun)?;

        let name = Identifier::from(self.expect_ident()?);

        self.expect_one(Token::LParen)?;
        let params = self.parse_parameters()?;
        self.expect_one(Token::RParen)?;

        self.expect_one(Token::LBrace)?;
        let (body, end) = self.block_contents()?;

        Ok(Statement::Function(FunctionDeclaration {
            name,
            params,
            body: Rc::new(body),
            location: SrcSpan { start, end },
        }))
    }

    fn var_declaration(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Var)?;

        let name = Identifier::from(self.expect_ident()?);

        let initializer = if self.match_token(&Token::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Var(VarDeclaration {
            name,
            initializer,
            location: SrcSpan { start, end },
        }))
    }

    fn dictionary_declaration(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Dictionary)?;

        let name = Identifier::from(self.expect_ident()?);

        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Dictionary(DictionaryDeclaration {
            name,
            location: SrcSpan { start, end },
        }))
    }

    fn break_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Break)?;
        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Break(Break { location: SrcSpan { start, end } }))
    }

    fn continue_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Continue)?;
        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Continue(Continue { location: SrcSpan { start, end } }))
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::If)?;

        self.expect_one(Token::LParen)?;
        let condition = self.expression()?;
        self.expect_one(Token::RParen)?;

        let resolution = Box::new(self.statement()?);
        let mut end = resolution.location().end;

        let alternative = if self.match_token(&Token::Else) {
            let alternative = self.statement()?;
            end = alternative.location().end;

            Some(Box::new(alternative))
        } else {
            None
        };

        Ok(Statement::If(If {
            condition,
            resolution,
            alternative,
            location: SrcSpan { start, end },
        }))
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::While)?;

        self.expect_one(Token::LParen)?;
        let condition = self.expression()?;
        self.expect_one(Token::RParen)?;

        let body = self.statement()?;
        let end = body.location().end;

        Ok(Statement::While(While {
            condition,
            body: Box::new(body),
            location: SrcSpan { start, end },
        }))
    }

    // for -> for ( <initializer> ; <condition> ; <increment> ) <statement>
    //
    // There is no `for` node: the loop is desugared here into the
    // equivalent `while` wrapped in blocks for the initializer and the
    // increment.
    fn for_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::For)?;

        self.expect_one(Token::LParen)?;

        let initializer = if self.match_token(&Token::Semicolon) {
            None
        } else if matches!(self.current_token, Some((_, Token::Var, _))) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&Token::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_one(Token::Semicolon)?;

        let increment = if !self.check(&Token::RParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_one(Token::RParen)?;

        let mut body = self.statement()?;
        let end = body.location().end;

        if let Some(increment) = increment {
            let location = increment.location();

            body = Statement::Block(Block {
                statements: vec![
                    body,
                    Statement::Expression(ExpressionStatement { expression: increment, location }),
                ],
                location: SrcSpan { start, end },
            });
        }

        let condition = condition.unwrap_or(Expr::Literal(Literal {
            value: LiteralValue::Boolean(true),
            location: SrcSpan { start, end: start },
        }));

        body = Statement::While(While {
            condition,
            body: Box::new(body),
            location: SrcSpan { start, end },
        });

        if let Some(initializer) = initializer {
            body = Statement::Block(Block {
                statements: vec![initializer, body],
                location: SrcSpan { start, end },
            });
        }

        Ok(body)
    }

    fn print_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Print)?;

        let expression = self.expression()?;
        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Print(PrintStatement {
            expression,
            location: SrcSpan { start, end },
        }))
    }

    fn return_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::Return)?;

        let value = if !self.check(&Token::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        let (_, end) = self.expect_one(Token::Semicolon)?;

        Ok(Statement::Return(Return {
            value,
            location: SrcSpan { start, end },
        }))
    }

    fn block_statement(&mut self) -> Result<Statement, ParseError> {
        let (start, _) = self.expect_one(Token::LBrace)?;

        let (statements, end) = self.block_contents()?;

        Ok(Statement::Block(Block {
            statements,
            location: SrcSpan { start, end },
        }))
    }

    // Statements up to the closing brace. The brace itself is consumed.
    fn block_contents(&mut self) -> Result<(Vec<Statement>, u32), ParseError> {
        let mut statements = vec![];

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        let (_, end) = self.expect_one(Token::RBrace)?;

        Ok((statements, end))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Identifier>, ParseError> {
        let mut params = vec![];

        if !self.check(&Token::RParen) {
            loop {
                if params.len() >= 255 {
                    self.errors.push(ParseError {
                        error: ParseErrorType::TooManyParameters,
                        span: self.current_span(),
                    });
                }

                params.push(Identifier::from(self.expect_ident()?));

                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    // expression -> <assignment>
    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    // assignment -> ( <variable> | <dictionary_index> ) = <assignment> | <ternary>
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.ternary()?;

        if self.match_token(&Token::Equal) {
            let equals_span = self.previous_span();
            let value = self.assignment()?;

            return Ok(match expr {
                Expr::Variable(variable) => {
                    let location = SrcSpan {
                        start: variable.name.location.start,
                        end: value.location().end,
                    };

                    Expr::Assign(Assign {
                        name: variable.name,
                        value: Box::new(value),
                        id: self.next_expr_id(),
                        location,
                    })
                },
                Expr::DictionaryIndex(index) => {
                    let location = SrcSpan {
                        start: index.location.start,
                        end: value.location().end,
                    };

                    Expr::DictionaryAssign(DictionaryAssign {
                        name: index.name,
                        index: index.index,
                        value: Box::new(value),
                        id: self.next_expr_id(),
                        location,
                    })
                },
                other => {
                    // Reported without aborting: the left-hand expression
                    // stands as the statement and parsing continues.
                    self.errors.push(ParseError {
                        error: ParseErrorType::InvalidAssignmentTarget,
                        span: equals_span,
                    });

                    other
                }
            });
        }

        Ok(expr)
    }

    // ternary -> <or> [ ? <or> : <ternary> ]
    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.or()?;

        while self.match_token(&Token::Question) {
            let resolution = self.or()?;
            self.expect_one(Token::Colon)?;
            let alternative = self.ternary()?;

            let location = SrcSpan {
                start: expr.location().start,
                end: alternative.location().end,
            };

            expr = Expr::Ternary(Ternary {
                condition: Box::new(expr),
                resolution: Box::new(resolution),
                alternative: Box::new(alternative),
                location,
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and()?;

        while let Some(operator) = self.match_any(&[Token::Or]) {
            let right = self.and()?;
            expr = logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;

        while let Some(operator) = self.match_any(&[Token::And]) {
            let right = self.equality()?;
            expr = logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        self.report_missing_left_operand(&[Token::BangEqual, Token::EqualEqual]);

        let mut expr = self.comparison()?;

        while let Some(operator) = self.match_any(&[Token::BangEqual, Token::EqualEqual]) {
            let right = self.comparison()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        self.report_missing_left_operand(&[
            Token::Greater, Token::GreaterEqual, Token::Less, Token::LessEqual,
        ]);

        let mut expr = self.term()?;

        while let Some(operator) = self.match_any(&[
            Token::Greater, Token::GreaterEqual, Token::Less, Token::LessEqual,
        ]) {
            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.match_any(&[Token::Minus, Token::Plus]) {
            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        self.report_missing_left_operand(&[Token::Slash, Token::Star, Token::Percent]);

        let mut expr = self.unary()?;

        while let Some(operator) = self.match_any(&[Token::Slash, Token::Star, Token::Percent]) {
            let right = self.unary()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    // unary -> ( ! | - ) <unary> | <call>
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(operator) = self.match_any(&[Token::Bang, Token::Minus, Token::Plus]) {
            let operator_span = self.previous_span();

            if operator == Token::Plus {
                self.errors.push(ParseError {
                    error: ParseErrorType::UnsupportedUnaryPlus,
                    span: operator_span,
                });
            }

            let right = self.unary()?;
            let location = SrcSpan {
                start: operator_span.start,
                end: right.location().end,
            };

            return Ok(Expr::Unary(Unary {
                operator,
                right: Box::new(right),
                location,
            }));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        while self.match_token(&Token::LParen) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = vec![];

        if !self.check(&Token::RParen) {
            loop {
                if arguments.len() >= 255 {
                    self.errors.push(ParseError {
                        error: ParseErrorType::TooManyArguments,
                        span: self.current_span(),
                    });
                }

                arguments.push(self.expression()?);

                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        let (paren_start, paren_end) = self.expect_one(Token::RParen)?;

        let location = SrcSpan {
            start: callee.location().start,
            end: paren_end,
        };

        Ok(Expr::Call(Call {
            callee: Box::new(callee),
            arguments,
            paren: SrcSpan { start: paren_start, end: paren_end },
            location,
        }))
    }

    fn lambda(&mut self, start: u32) -> Result<Expr, ParseError> {
        self.expect_one(Token::LParen)?;
        let params = self.parse_parameters()?;
        self.expect_one(Token::RParen)?;

        self.expect_one(Token::LBrace)?;
        let (body, end) = self.block_contents()?;

        Ok(Expr::Lambda(Lambda {
            params,
            body: Rc::new(body),
            location: SrcSpan { start, end },
        }))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token.take() {
            Some((start, Token::False, end)) => {
                self.step();
                Ok(literal(LiteralValue::Boolean(false), start, end))
            },
            Some((start, Token::True, end)) => {
                self.step();
                Ok(literal(LiteralValue::Boolean(true), start, end))
            },
            Some((start, Token::Nil, end)) => {
                self.step();
                Ok(literal(LiteralValue::Nil, start, end))
            },
            Some((start, Token::Number(value), end)) => {
                self.step();
                Ok(literal(LiteralValue::Number(value), start, end))
            },
            Some((start, Token::String(value), end)) => {
                self.step();
                Ok(literal(LiteralValue::String(value), start, end))
            },
            Some((start, Token::Ident(value), end)) => {
                self.step();

                let name = Identifier {
                    value,
                    location: SrcSpan { start, end },
                };

                // name[index] is always a dictionary reference, never a
                // scalar read followed by an index.
                if self.match_token(&Token::LBracket) {
                    let index = self.ternary()?;
                    let (_, bracket_end) = self.expect_one(Token::RBracket)?;

                    return Ok(Expr::DictionaryIndex(DictionaryIndex {
                        name,
                        index: Box::new(index),
                        id: self.next_expr_id(),
                        location: SrcSpan { start, end: bracket_end },
                    }));
                }

                Ok(Expr::Variable(Variable {
                    name,
                    id: self.next_expr_id(),
                }))
            },
            Some((start, Token::Lambda, _)) => {
                self.step();
                self.lambda(start)
            },
            Some((start, Token::LParen, _)) => {
                self.step();

                let expression = self.expression()?;
                let (_, end) = self.expect_one(Token::RParen)?;

                Ok(Expr::Grouping(Grouping {
                    expression: Box::new(expression),
                    location: SrcSpan { start, end },
                }))
            },
            Some(token) => {
                self.current_token = Some(token);

                if let Some((_, operator, _)) = &self.previous {
                    if operator.is_binary_operator() {
                        return parse_error(
                            ParseErrorType::MissingRightOperand { operator: operator.clone() },
                            self.previous_span(),
                        );
                    }
                }

                parse_error(ParseErrorType::ExpectedExpression, self.current_span())
            },
            None => parse_error(ParseErrorType::UnexpectedEof, self.previous_span()),
        }
    }

    /// A binary operator with no left operand gets a dedicated diagnostic
    /// instead of the generic "expected expression"; the operator is
    /// consumed so the right operand still parses.
    fn report_missing_left_operand(&mut self, operators: &[Token]) {
        if let Some(operator) = self.match_any(operators) {
            self.errors.push(ParseError {
                error: ParseErrorType::MissingLeftOperand { operator },
                span: self.previous_span(),
            });
        }
    }

    /// Panic-mode recovery: discard tokens until just past a semicolon or
    /// just before a token that can start a statement.
    fn synchronize(&mut self) {
        self.step();

        while let Some((_, token, _)) = &self.current_token {
            if matches!(self.previous, Some((_, Token::Semicolon, _))) {
                return;
            }

            if token.starts_statement() {
                return;
            }

            self.step();
        }
    }

    fn step(&mut self) {
        let _ = self.next_token();
    }

    pub fn next_token(&mut self) -> Option<Spanned> {
        let consumed = self.current_token.take();
        let mut next = None;

        loop {
            match self.tokens.next() {
                Some(Ok((start, Token::Comment, end))) => {
                    self.comments.push(SrcSpan { start, end })
                },
                Some(Err(error)) => {
                    self.lex_errors.push(error);

                    break;
                },
                Some(Ok(token)) => {
                    next = Some(token);

                    break;
                },
                None => {
                    break;
                }
            }
        }

        self.current_token = self.next_token.take();
        self.next_token = next;

        if consumed.is_some() {
            self.previous = consumed.clone();
        }

        consumed
    }

    fn is_at_end(&self) -> bool {
        self.current_token.is_none()
    }

    fn check(&self, token: &Token) -> bool {
        matches!(&self.current_token, Some((_, current, _)) if current == token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.step();
            return true;
        }

        false
    }

    fn match_any(&mut self, tokens: &[Token]) -> Option<Token> {
        if let Some((_, current, _)) = &self.current_token {
            if tokens.contains(current) {
                let token = current.clone();
                self.step();

                return Some(token);
            }
        }

        None
    }

    pub fn expect_one(&mut self, token: Token) -> Result<(u32, u32), ParseError> {
        match self.current_token.take() {
            Some((start, current, end)) if current == token => {
                self.current_token = Some((start, current, end));
                self.step();

                Ok((start, end))
            },
            Some(current) => {
                let (start, found, end) = current.clone();
                self.current_token = Some(current);

                parse_error(
                    ParseErrorType::UnexpectedToken {
                        token: found,
                        expected: vec![token.as_literal()],
                    },
                    SrcSpan { start, end },
                )
            },
            None => parse_error(ParseErrorType::UnexpectedEof, self.previous_span()),
        }
    }

    pub fn expect_ident(&mut self) -> Result<(u32, String, u32), ParseError> {
        match self.current_token.take() {
            Some((start, Token::Ident(value), end)) => {
                self.current_token = Some((start, Token::Ident(value.clone()), end));
                self.step();

                Ok((start, value, end))
            },
            Some(current) => {
                let (start, _, end) = current.clone();
                self.current_token = Some(current);

                parse_error(ParseErrorType::ExpectedIdent, SrcSpan { start, end })
            },
            None => parse_error(ParseErrorType::UnexpectedEof, self.previous_span()),
        }
    }

    fn previous_span(&self) -> SrcSpan {
        match &self.previous {
            Some((start, _, end)) => SrcSpan { start: *start, end: *end },
            None => SrcSpan { start: 0, end: 0 },
        }
    }

    fn current_span(&self) -> SrcSpan {
        match &self.current_token {
            Some((start, _, end)) => SrcSpan { start: *start, end: *end },
            None => self.previous_span(),
        }
    }

    fn next_expr_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;

        id
    }
}

fn literal(value: LiteralValue, start: u32, end: u32) -> Expr {
    Expr::Literal(Literal {
        value,
        location: SrcSpan { start, end },
    })
}

fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
    let location = SrcSpan {
        start: left.location().start,
        end: right.location().end,
    };

    Expr::Binary(Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        location,
    })
}

fn logical(left: Expr, operator: Token, right: Expr) -> Expr {
    let location = SrcSpan {
        start: left.location().start,
        end: right.location().end,
    };

    Expr::Logical(Logical {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        location,
    })
}

impl From<(u32, String, u32)> for Identifier {
    fn from(value: (u32, String, u32)) -> Self {
        Identifier {
            value: value.1,
            location: SrcSpan { start: value.0, end: value.2 },
        }
    }
}

pub fn parse_module(src: &str) -> Result<Parsed, Vec<ParseError>> {
    let lexer = Lexer::new(src.char_indices().map(|(i, c)| (i as u32, c)));
    let mut parser = Parser::new(lexer);

    parser.parse()
}

pub fn parse_module_from_stream(stream: impl Iterator<Item = char>) -> Result<Parsed, Vec<ParseError>> {
    let lexer = Lexer::new(stream
        .scan(0, |pos, c| {
            *pos += c.len_utf8() as u32;
            Some((*pos - c.len_utf8() as u32, c))
        })
    );
    let mut parser = Parser::new(lexer);

    parser.parse()
}

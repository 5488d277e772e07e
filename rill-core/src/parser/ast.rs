use std::fmt::Display;
use std::rc::Rc;

use crate::lexer::prelude::Token;
use crate::utils::prelude::SrcSpan;

/// Identity of a reference expression (variable read, dictionary index,
/// assignment). Two structurally identical expressions at different places in
/// the program carry different ids, which is what lets the resolver attach a
/// binding distance to one occurrence without affecting the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

#[derive(Debug)]
pub struct Parsed {
    pub program: Program,
    pub comments: Vec<SrcSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let statements = self.statements.iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}", statements.join("\n"))
    }
}

// identifier -> <letter> { <letter> | <digit> | "_" }
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub value: String,
    pub location: SrcSpan,
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

// statement -> <expression_statement> | <print> | <var> | <dictionary>
//            | <block> | <if> | <while> | <function> | <return>
//            | <break> | <continue>
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(ExpressionStatement),
    Print(PrintStatement),
    Var(VarDeclaration),
    Dictionary(DictionaryDeclaration),
    Block(Block),
    If(If),
    While(While),
    Function(FunctionDeclaration),
    Return(Return),
    Break(Break),
    Continue(Continue),
}

impl Statement {
    pub fn location(&self) -> SrcSpan {
        match self {
            Self::Expression(statement) => statement.location,
            Self::Print(statement) => statement.location,
            Self::Var(declaration) => declaration.location,
            Self::Dictionary(declaration) => declaration.location,
            Self::Block(block) => block.location,
            Self::If(conditional) => conditional.location,
            Self::While(loop_) => loop_.location,
            Self::Function(declaration) => declaration.location,
            Self::Return(statement) => statement.location,
            Self::Break(statement) => statement.location,
            Self::Continue(statement) => statement.location,
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expression(statement) => write!(f, "{statement}"),
            Self::Print(statement) => write!(f, "{statement}"),
            Self::Var(declaration) => write!(f, "{declaration}"),
            Self::Dictionary(declaration) => write!(f, "{declaration}"),
            Self::Block(block) => write!(f, "{block}"),
            Self::If(conditional) => write!(f, "{conditional}"),
            Self::While(loop_) => write!(f, "{loop_}"),
            Self::Function(declaration) => write!(f, "{declaration}"),
            Self::Return(statement) => write!(f, "{statement}"),
            Self::Break(statement) => write!(f, "{statement}"),
            Self::Continue(statement) => write!(f, "{statement}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expr,
    pub location: SrcSpan,
}

impl Display for ExpressionStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};", self.expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStatement {
    pub expression: Expr,
    pub location: SrcSpan,
}

impl Display for PrintStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "print {};", self.expression)
    }
}

// var -> var <identifier> [ = <expression> ] ;
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub name: Identifier,
    pub initializer: Option<Expr>,
    pub location: SrcSpan,
}

impl Display for VarDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.initializer {
            Some(initializer) => write!(f, "var {} = {};", self.name, initializer),
            None => write!(f, "var {};", self.name),
        }
    }
}

// dictionary -> dictionary <identifier> ;
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryDeclaration {
    pub name: Identifier,
    pub location: SrcSpan,
}

impl Display for DictionaryDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dictionary {};", self.name)
    }
}

// block -> { <statement>* }
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: SrcSpan,
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let statements = self.statements.iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<String>>();

        write!(f, "{{ {} }}", statements.join(" "))
    }
}

// if -> if ( <expression> ) <statement> [ else <statement> ]
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub resolution: Box<Statement>,
    pub alternative: Option<Box<Statement>>,
    pub location: SrcSpan,
}

impl Display for If {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if ({}) {}", self.condition, self.resolution)?;

        if let Some(alternative) = &self.alternative {
            write!(f, " else {alternative}")?;
        }

        Ok(())
    }
}

// while -> while ( <expression> ) <statement>
#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Box<Statement>,
    pub location: SrcSpan,
}

impl Display for While {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "while ({}) {}", self.condition, self.body)
    }
}

// function -> fun <identifier> ( [ <parameters> ] ) <block>
//
// The body is reference-counted so that function values can share it with
// the tree instead of cloning the statements on every closure creation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Rc<Vec<Statement>>,
    pub location: SrcSpan,
}

impl Display for FunctionDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.params.iter()
            .map(|param| param.to_string())
            .collect::<Vec<String>>();
        let body = self.body.iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<String>>();

        write!(f, "fun {}({}) {{ {} }}", self.name, params.join(", "), body.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expr>,
    pub location: SrcSpan,
}

impl Display for Return {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "return {value};"),
            None => write!(f, "return;"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Break {
    pub location: SrcSpan,
}

impl Display for Break {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "break;")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Continue {
    pub location: SrcSpan,
}

impl Display for Continue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "continue;")
    }
}

// expression -> <literal> | <grouping> | <unary> | <binary> | <logical>
//             | <ternary> | <variable> | <dictionary_index> | <assign>
//             | <dictionary_assign> | <call> | <lambda>
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Grouping(Grouping),
    Unary(Unary),
    Binary(Binary),
    Logical(Logical),
    Ternary(Ternary),
    Variable(Variable),
    DictionaryIndex(DictionaryIndex),
    Assign(Assign),
    DictionaryAssign(DictionaryAssign),
    Call(Call),
    Lambda(Lambda),
}

impl Expr {
    pub fn location(&self) -> SrcSpan {
        match self {
            Self::Literal(literal) => literal.location,
            Self::Grouping(grouping) => grouping.location,
            Self::Unary(unary) => unary.location,
            Self::Binary(binary) => binary.location,
            Self::Logical(logical) => logical.location,
            Self::Ternary(ternary) => ternary.location,
            Self::Variable(variable) => variable.name.location,
            Self::DictionaryIndex(index) => index.location,
            Self::Assign(assign) => assign.location,
            Self::DictionaryAssign(assign) => assign.location,
            Self::Call(call) => call.location,
            Self::Lambda(lambda) => lambda.location,
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{literal}"),
            Self::Grouping(grouping) => write!(f, "{grouping}"),
            Self::Unary(unary) => write!(f, "{unary}"),
            Self::Binary(binary) => write!(f, "{binary}"),
            Self::Logical(logical) => write!(f, "{logical}"),
            Self::Ternary(ternary) => write!(f, "{ternary}"),
            Self::Variable(variable) => write!(f, "{}", variable.name),
            Self::DictionaryIndex(index) => write!(f, "{index}"),
            Self::Assign(assign) => write!(f, "{assign}"),
            Self::DictionaryAssign(assign) => write!(f, "{assign}"),
            Self::Call(call) => write!(f, "{call}"),
            Self::Lambda(lambda) => write!(f, "{lambda}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub location: SrcSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Nil,
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            LiteralValue::Number(value) => write!(f, "{value}"),
            LiteralValue::String(value) => write!(f, "\"{value}\""),
            LiteralValue::Boolean(value) => write!(f, "{value}"),
            LiteralValue::Nil => write!(f, "nil"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub expression: Box<Expr>,
    pub location: SrcSpan,
}

impl Display for Grouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.expression)
    }
}

// unary -> ( "!" | "-" ) <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub operator: Token,
    pub right: Box<Expr>,
    pub location: SrcSpan,
}

impl Display for Unary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.operator.as_literal(), self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
    pub location: SrcSpan,
}

impl Display for Binary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator.as_literal(), self.right)
    }
}

// logical -> <expression> ( "and" | "or" ) <expression>, short-circuiting
#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
    pub location: SrcSpan,
}

impl Display for Logical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator.as_literal(), self.right)
    }
}

// ternary -> <expression> ? <expression> : <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct Ternary {
    pub condition: Box<Expr>,
    pub resolution: Box<Expr>,
    pub alternative: Box<Expr>,
    pub location: SrcSpan,
}

impl Display for Ternary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ? {} : {}", self.condition, self.resolution, self.alternative)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Identifier,
    pub id: ExprId,
}

// dictionary_index -> <identifier> [ <expression> ]
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryIndex {
    pub name: Identifier,
    pub index: Box<Expr>,
    pub id: ExprId,
    pub location: SrcSpan,
}

impl Display for DictionaryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.name, self.index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub name: Identifier,
    pub value: Box<Expr>,
    pub id: ExprId,
    pub location: SrcSpan,
}

impl Display for Assign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryAssign {
    pub name: Identifier,
    pub index: Box<Expr>,
    pub value: Box<Expr>,
    pub id: ExprId,
    pub location: SrcSpan,
}

impl Display for DictionaryAssign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}] = {}", self.name, self.index, self.value)
    }
}

// call -> <expression> ( [ <arguments> ] )
//
// `paren` keeps the closing parenthesis span so runtime call errors can
// point at the call site rather than the whole expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub paren: SrcSpan,
    pub location: SrcSpan,
}

impl Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arguments = self.arguments.iter()
            .map(|argument| argument.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}({})", self.callee, arguments.join(", "))
    }
}

// lambda -> lambda ( [ <parameters> ] ) <block>
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Identifier>,
    pub body: Rc<Vec<Statement>>,
    pub location: SrcSpan,
}

impl Display for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.params.iter()
            .map(|param| param.to_string())
            .collect::<Vec<String>>();
        let body = self.body.iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<String>>();

        write!(f, "lambda({}) {{ {} }}", params.join(", "), body.join(" "))
    }
}

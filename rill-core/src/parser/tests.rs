use super::prelude::*;
use crate::lexer::prelude::Token;

fn parse(src: &str) -> Parsed {
    parse_module(src).expect("parse failed")
}

fn parse_errors(src: &str) -> Vec<ParseError> {
    parse_module(src).expect_err("expected parse errors")
}

fn single_expression(parsed: &Parsed) -> &Expr {
    match parsed.program.statements.as_slice() {
        [Statement::Expression(statement)] => &statement.expression,
        other => panic!("expected a single expression statement, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let parsed = parse("1 + 2 * 3;");

    let Expr::Binary(sum) = single_expression(&parsed) else {
        panic!("expected a binary expression");
    };

    assert_eq!(sum.operator, Token::Plus);
    assert!(matches!(
        sum.right.as_ref(),
        Expr::Binary(product) if product.operator == Token::Star
    ));
}

#[test]
fn unary_binds_tighter_than_multiplication() {
    let parsed = parse("-1 * 2;");

    let Expr::Binary(product) = single_expression(&parsed) else {
        panic!("expected a binary expression");
    };

    assert_eq!(product.operator, Token::Star);
    assert!(matches!(product.left.as_ref(), Expr::Unary(_)));
}

#[test]
fn ternary_nests_in_the_false_branch() {
    let parsed = parse("a ? 1 : b ? 2 : 3;");

    let Expr::Ternary(ternary) = single_expression(&parsed) else {
        panic!("expected a ternary expression");
    };

    assert!(matches!(ternary.resolution.as_ref(), Expr::Literal(_)));
    assert!(matches!(ternary.alternative.as_ref(), Expr::Ternary(_)));
}

#[test]
fn assignment_chains_to_the_right() {
    let parsed = parse("a = b = 1;");

    let Expr::Assign(assign) = single_expression(&parsed) else {
        panic!("expected an assignment");
    };

    assert_eq!(assign.name.value, "a");
    assert!(matches!(assign.value.as_ref(), Expr::Assign(inner) if inner.name.value == "b"));
}

#[test]
fn bracketed_name_is_always_a_dictionary_reference() {
    let parsed = parse("d[0];");

    assert!(matches!(
        single_expression(&parsed),
        Expr::DictionaryIndex(index) if index.name.value == "d"
    ));
}

#[test]
fn assigning_to_an_index_is_a_dictionary_assignment() {
    let parsed = parse("d[0] = 1;");

    assert!(matches!(
        single_expression(&parsed),
        Expr::DictionaryAssign(assign) if assign.name.value == "d"
    ));
}

#[test]
fn calls_chain_left_to_right() {
    let parsed = parse("f(1)(2);");

    let Expr::Call(outer) = single_expression(&parsed) else {
        panic!("expected a call");
    };

    assert_eq!(outer.arguments.len(), 1);
    assert!(matches!(outer.callee.as_ref(), Expr::Call(_)));
}

#[test]
fn lambda_expressions_parse() {
    let parsed = parse("var f = lambda(a, b) { return a + b; };");

    let [Statement::Var(declaration)] = parsed.program.statements.as_slice() else {
        panic!("expected a var declaration");
    };

    let Some(Expr::Lambda(lambda)) = &declaration.initializer else {
        panic!("expected a lambda initializer");
    };

    assert_eq!(lambda.params.len(), 2);
    assert_eq!(lambda.body.len(), 1);
}

#[test]
fn for_desugars_into_while() {
    let parsed = parse("for (var i = 0; i < 3; i = i + 1) print i;");

    let [Statement::Block(block)] = parsed.program.statements.as_slice() else {
        panic!("expected the initializer block");
    };

    let [Statement::Var(_), Statement::While(loop_)] = block.statements.as_slice() else {
        panic!("expected initializer and while, got {:?}", block.statements);
    };

    let Statement::Block(body) = loop_.body.as_ref() else {
        panic!("expected the increment block");
    };

    assert!(matches!(
        body.statements.as_slice(),
        [Statement::Print(_), Statement::Expression(_)]
    ));
}

#[test]
fn for_without_clauses_loops_on_true() {
    let parsed = parse("for (;;) print 1;");

    let [Statement::While(loop_)] = parsed.program.statements.as_slice() else {
        panic!("expected a bare while, got {:?}", parsed.program.statements);
    };

    assert!(matches!(
        &loop_.condition,
        Expr::Literal(literal) if literal.value == LiteralValue::Boolean(true)
    ));
}

#[test]
fn invalid_assignment_target_is_reported_once() {
    let errors = parse_errors("1 = 2;\nprint 3;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, ParseErrorType::InvalidAssignmentTarget);
}

#[test]
fn leading_equality_operator_reports_missing_left_operand() {
    let errors = parse_errors("== 2;");

    assert!(matches!(
        &errors[0].error,
        ParseErrorType::MissingLeftOperand { operator: Token::EqualEqual }
    ));
}

#[test]
fn dangling_operator_reports_missing_right_operand() {
    let errors = parse_errors("1 + ;");

    assert!(matches!(
        &errors[0].error,
        ParseErrorType::MissingRightOperand { operator: Token::Plus }
    ));
}

#[test]
fn unary_plus_is_rejected() {
    let errors = parse_errors("+1;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, ParseErrorType::UnsupportedUnaryPlus);
}

#[test]
fn recovery_surfaces_every_independent_error() {
    let errors = parse_errors("var 1 = 2;\nprint \"ok\";\nfun ();");

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].error, ParseErrorType::ExpectedIdent);
    assert_eq!(errors[1].error, ParseErrorType::ExpectedIdent);
}

#[test]
fn argument_count_is_capped() {
    let arguments = vec!["0"; 256].join(", ");
    let errors = parse_errors(&format!("f({arguments});"));

    assert!(errors.iter().any(|error| error.error == ParseErrorType::TooManyArguments));
}

#[test]
fn comments_are_collected_not_parsed() {
    let parsed = parse("// leading note\nprint 1; // trailing note\n");

    assert_eq!(parsed.comments.len(), 2);
    assert_eq!(parsed.program.statements.len(), 1);
}

#[test]
fn lexical_errors_surface_as_parse_errors() {
    let errors = parse_errors("var s = \"oops;");

    assert!(matches!(&errors[0].error, ParseErrorType::LexError { .. }));
}

#[test]
fn if_with_else_attaches_the_alternative() {
    let parsed = parse("if (a) { print 1; } else print 2;");

    let [Statement::If(conditional)] = parsed.program.statements.as_slice() else {
        panic!("expected an if statement");
    };

    assert!(matches!(conditional.resolution.as_ref(), Statement::Block(_)));
    assert!(conditional.alternative.is_some());
}

use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    environment::prelude::Value,
    parser::prelude::{parse_module, Program},
    resolver::prelude::{Outcome, Resolver},
    utils::prelude::ResolveWarningEmitter,
};

use super::{error::RuntimeError, Interpreter};

/// `print` sink that the test keeps a handle on after handing it to the
/// interpreter.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is valid utf8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn interpreter_for(src: &str) -> (Interpreter, Program, SharedBuffer) {
    let parsed = parse_module(src).expect("parse failed");

    let resolved = match Resolver::resolve(parsed.program, &ResolveWarningEmitter::null()) {
        Outcome::Ok(resolved) => resolved,
        Outcome::PartialFailure(_, errors) => panic!("resolve errors: {errors:?}"),
    };

    let output = SharedBuffer::default();
    let interpreter = Interpreter::with_output(resolved.bindings, Box::new(output.clone()));

    (interpreter, resolved.program, output)
}

fn run(src: &str) -> String {
    let (mut interpreter, program, output) = interpreter_for(src);

    interpreter.interpret(&program).expect("runtime error");

    output.contents()
}

fn run_expecting_error(src: &str) -> RuntimeError {
    let (mut interpreter, program, _output) = interpreter_for(src);

    interpreter.interpret(&program).expect_err("expected a runtime error")
}

#[test]
fn arithmetic_follows_precedence() {
    assert_eq!(run("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn block_scopes_shadow_and_restore() {
    let output = run(r#"
        var x = 10;
        {
            var x = 20;
            print x;
        }
        print x;
    "#);

    assert_eq!(output, "20\n10\n");
}

#[test]
fn closures_mutate_their_defining_environment() {
    let output = run(r#"
        fun make(n) {
            fun inc() {
                n = n + 1;
                return n;
            }
            return inc;
        }
        var c = make(0);
        print c();
        print c();
    "#);

    assert_eq!(output, "1\n2\n");
}

#[test]
fn dictionaries_store_and_retrieve_by_key() {
    let output = run(r#"
        dictionary d;
        d["a"] = 1;
        print d["a"];
    "#);

    assert_eq!(output, "1\n");
}

#[test]
fn break_and_continue_steer_a_while_loop() {
    let output = run(r#"
        var i = 0;
        while (i < 5) {
            i = i + 1;
            if (i == 3) continue;
            if (i == 5) break;
            print i;
        }
    "#);

    assert_eq!(output, "1\n2\n4\n");
}

#[test]
fn string_number_addition_concatenates() {
    assert_eq!(run("print \"n=\" + 5;"), "n=5\n");
    assert_eq!(run("print 5 + \"n\";"), "5n\n");
}

#[test]
fn whole_numbers_print_without_a_fraction() {
    assert_eq!(run("print 8 / 4;"), "2\n");
    assert_eq!(run("print 10 / 4;"), "2.5\n");
}

#[test]
fn a_single_bare_expression_is_echoed() {
    assert_eq!(run("1 + 2;"), "3\n");
}

#[test]
fn a_bare_nil_expression_prints_nothing() {
    assert_eq!(run("nil;"), "");
}

#[test]
fn echoing_only_applies_to_singleton_programs() {
    assert_eq!(run("3 + 4;\nprint 1;"), "1\n");
}

#[test]
fn only_nil_and_false_are_falsey() {
    assert_eq!(run("print 0 ? \"t\" : \"f\";"), "t\n");
    assert_eq!(run("print \"\" ? \"t\" : \"f\";"), "t\n");
    assert_eq!(run("print nil ? \"t\" : \"f\";"), "f\n");
    assert_eq!(run("print false ? \"t\" : \"f\";"), "f\n");
}

#[test]
fn ternary_chains_through_the_false_branch() {
    assert_eq!(run("print false ? 1 : true ? 2 : 3;"), "2\n");
}

#[test]
fn logical_operators_short_circuit() {
    let output = run(r#"
        var a = 1;
        false and (a = 2);
        true or (a = 3);
        print a;
    "#);

    assert_eq!(output, "1\n");
}

#[test]
fn logical_operators_return_operand_values() {
    assert_eq!(run("print nil or \"fallback\";"), "fallback\n");
    assert_eq!(run("print 0 and 1;"), "1\n");
}

#[test]
fn named_functions_can_recurse() {
    let output = run(r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#);

    assert_eq!(output, "55\n");
}

#[test]
fn closures_capture_by_reference_not_by_snapshot() {
    let output = run(r#"
        fun outer() {
            var x = 1;
            fun get() {
                return x;
            }
            x = 2;
            return get();
        }
        print outer();
    "#);

    assert_eq!(output, "2\n");
}

#[test]
fn continue_only_affects_the_innermost_loop() {
    let output = run(r#"
        var outer_count = 0;
        var i = 0;
        while (i < 3) {
            i = i + 1;
            var j = 0;
            while (j < 3) {
                j = j + 1;
                if (j == 2) continue;
            }
            outer_count = outer_count + 1;
        }
        print outer_count;
    "#);

    assert_eq!(output, "3\n");
}

#[test]
fn break_only_exits_the_innermost_loop() {
    let output = run(r#"
        var finished = 0;
        var i = 0;
        while (i < 3) {
            i = i + 1;
            var j = 0;
            while (j < 10) {
                j = j + 1;
                if (j == 2) break;
            }
            finished = finished + 1;
        }
        print finished;
    "#);

    assert_eq!(output, "3\n");
}

#[test]
fn desugared_for_loops_run() {
    assert_eq!(
        run("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn modulus_operates_on_numbers() {
    assert_eq!(run("print 7 % 3;"), "1\n");
}

#[test]
fn nan_results_compare_equal_to_each_other() {
    assert_eq!(run("print 0 / 0 == 0 / 0;"), "true\n");
}

#[test]
fn lambdas_are_first_class_values() {
    let output = run(r#"
        fun apply(f, x) {
            return f(x);
        }
        print apply(lambda(n) { return n * 2; }, 21);
    "#);

    assert_eq!(output, "42\n");
}

#[test]
fn functions_print_by_name() {
    assert_eq!(run("fun f() { return; }\nprint f;"), "<fn f>\n");
    assert_eq!(run("var f = lambda() { return; };\nprint f;"), "<lambda>\n");
}

#[test]
fn uninitialized_variables_read_as_nil() {
    assert_eq!(run("var x;\nprint x;"), "nil\n");
}

#[test]
fn top_level_redeclaration_is_allowed() {
    assert_eq!(run("var x = 1;\nvar x = 2;\nprint x;"), "2\n");
}

#[test]
fn falling_off_a_function_returns_nil() {
    assert_eq!(run("fun f() { 1 + 1; }\nprint f();"), "nil\n");
    assert_eq!(run("fun f() { return; }\nprint f();"), "nil\n");
}

#[test]
fn assignment_evaluates_to_the_assigned_value() {
    assert_eq!(run("var a = 0;\nprint a = 5;"), "5\n");
}

#[test]
fn calling_a_non_callable_value_is_an_error() {
    assert!(matches!(
        run_expecting_error("\"hello\"();"),
        RuntimeError::NotCallable { .. }
    ));
}

#[test]
fn arity_is_checked_exactly() {
    let error = run_expecting_error("fun f(a) { return a; }\nf();");

    assert!(matches!(
        error,
        RuntimeError::ArityMismatch { expected: 1, got: 0, .. }
    ));
}

#[test]
fn reading_an_undefined_variable_is_an_error() {
    assert!(matches!(
        run_expecting_error("print missing;"),
        RuntimeError::UndefinedVariable { name, .. } if name == "missing"
    ));
}

#[test]
fn reading_an_undefined_dictionary_is_an_error() {
    assert!(matches!(
        run_expecting_error("print missing[\"k\"];"),
        RuntimeError::UndefinedDictionary { name, .. } if name == "missing"
    ));
}

#[test]
fn adding_a_boolean_to_a_number_is_an_error() {
    assert!(matches!(
        run_expecting_error("true + 1;"),
        RuntimeError::InvalidAdditionOperands { .. }
    ));
}

#[test]
fn comparison_requires_numbers() {
    assert!(matches!(
        run_expecting_error("1 < \"two\";"),
        RuntimeError::ExpectedNumberOperands { .. }
    ));
}

#[test]
fn negating_a_string_is_an_error() {
    assert!(matches!(
        run_expecting_error("-\"s\";"),
        RuntimeError::ExpectedNumberOperand { .. }
    ));
}

#[test]
fn scalar_and_dictionary_namespaces_are_independent() {
    let output = run(r#"
        dictionary d;
        d["a"] = 1;
        var d = 2;
        print d;
        print d["a"];
    "#);

    assert_eq!(output, "2\n1\n");
}

#[test]
fn missing_dictionary_keys_read_as_nil() {
    assert_eq!(run("dictionary d;\nprint d[\"missing\"];"), "nil\n");
}

#[test]
fn assigning_an_index_at_top_level_creates_the_dictionary() {
    // No declaration needed in the global record: the first index write
    // brings the dictionary into existence.
    assert_eq!(run("d[\"k\"] = 1;\nprint d[\"k\"];"), "1\n");
}

#[test]
fn dictionary_arguments_bind_in_both_namespaces() {
    let src = r#"
        fun fill(m) {
            m["k"] = 99;
            return m["k"];
        }
        print fill(make_dict());
    "#;

    let (mut interpreter, program, output) = interpreter_for(src);
    interpreter.define_native("make_dict", 0, |_arguments| {
        Ok(Value::Dictionary(Default::default()))
    });

    interpreter.interpret(&program).expect("runtime error");

    assert_eq!(output.contents(), "99\n");
}

#[test]
fn native_errors_become_runtime_errors() {
    let (mut interpreter, program, _output) = interpreter_for("explode();");
    interpreter.define_native("explode", 0, |_arguments| Err("boom".to_string()));

    let error = interpreter.interpret(&program).expect_err("expected a runtime error");

    assert!(matches!(error, RuntimeError::Native { message, .. } if message == "boom"));
}

#[test]
fn native_arity_is_checked_like_interpreted_arity() {
    let (mut interpreter, program, _output) = interpreter_for("pair(1);");
    interpreter.define_native("pair", 2, |_arguments| Ok(Value::Nil));

    let error = interpreter.interpret(&program).expect_err("expected a runtime error");

    assert!(matches!(error, RuntimeError::ArityMismatch { expected: 2, got: 1, .. }));
}

#[test]
fn runtime_errors_keep_already_produced_output() {
    let (mut interpreter, program, output) = interpreter_for("print 1;\nprint missing;");

    assert!(interpreter.interpret(&program).is_err());
    assert_eq!(output.contents(), "1\n");
}

#[test]
fn interpreting_twice_from_the_same_globals_is_deterministic() {
    let src = r#"
        var total = 0;
        var i = 0;
        while (i < 10) {
            i = i + 1;
            total = total + i * i;
        }
        print total;
    "#;

    assert_eq!(run(src), run(src));
}

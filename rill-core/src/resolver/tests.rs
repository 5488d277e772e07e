use std::{path::PathBuf, rc::Rc};

use crate::{
    parser::prelude::parse_module,
    utils::prelude::{
        ResolveWarningEmitter, VectorWarningEmitterIO, Warning, WarningEmitter,
    },
};

use super::prelude::{Outcome, ResolveError, ResolveWarning, Resolved, Resolver};

fn resolve_ok(src: &str) -> Resolved {
    let parsed = parse_module(src).expect("parse failed");

    match Resolver::resolve(parsed.program, &ResolveWarningEmitter::null()) {
        Outcome::Ok(resolved) => resolved,
        Outcome::PartialFailure(_, errors) => panic!("resolve errors: {errors:?}"),
    }
}

fn resolve_errors(src: &str) -> Vec<ResolveError> {
    let parsed = parse_module(src).expect("parse failed");

    match Resolver::resolve(parsed.program, &ResolveWarningEmitter::null()) {
        Outcome::Ok(_) => panic!("expected resolve errors"),
        Outcome::PartialFailure(_, errors) => errors,
    }
}

fn resolve_warnings(src: &str) -> Vec<ResolveWarning> {
    let parsed = parse_module(src).expect("parse failed");

    let vector = Rc::new(VectorWarningEmitterIO::new());
    let emitter = ResolveWarningEmitter::new(
        PathBuf::new(),
        src.to_string(),
        WarningEmitter::new(vector.clone()),
    );

    let _ = Resolver::resolve(parsed.program, &emitter);

    vector.take()
        .into_iter()
        .map(|warning| match warning {
            Warning::Resolve { warning, .. } => warning,
        })
        .collect()
}

#[test]
fn distance_counts_scopes_between_use_and_declaration() {
    let resolved = resolve_ok(r#"
        {
            var a = 1;
            {
                {
                    print a;
                }
            }
        }
    "#);

    assert_eq!(resolved.bindings.len(), 1);
    assert_eq!(resolved.bindings.values().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn globals_are_left_unresolved() {
    let resolved = resolve_ok("var a = 1;\nprint a;");

    assert!(resolved.bindings.is_empty());
}

#[test]
fn reading_an_undeclared_global_is_not_a_resolve_error() {
    let resolved = resolve_ok("print defined_later;");

    assert!(resolved.bindings.is_empty());
}

#[test]
fn parameters_resolve_at_distance_zero() {
    let resolved = resolve_ok("fun f(n) { return n; }");

    assert_eq!(resolved.bindings.len(), 1);
    assert_eq!(resolved.bindings.values().copied().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn closure_reference_crosses_one_function_scope() {
    let resolved = resolve_ok(r#"
        fun outer() {
            var n = 1;
            fun inner() {
                return n;
            }
            return inner;
        }
    "#);

    assert!(resolved.bindings.values().any(|distance| *distance == 1));
}

#[test]
fn reading_a_local_in_its_own_initializer_is_an_error() {
    let errors = resolve_errors("{ var a = a; }");

    assert!(matches!(
        &errors[0],
        ResolveError::SelfReferencingInitializer { name, .. } if name == "a"
    ));
}

#[test]
fn redeclaring_in_the_same_scope_is_an_error() {
    let errors = resolve_errors("{ var a = 1; var a = 2; print a; }");

    assert!(matches!(
        &errors[0],
        ResolveError::DuplicateDeclaration { name, .. } if name == "a"
    ));
}

#[test]
fn shadowing_an_outer_scope_is_allowed() {
    let resolved = resolve_ok(r#"
        {
            var a = 1;
            {
                var a = 2;
                print a;
            }
            print a;
        }
    "#);

    assert_eq!(resolved.bindings.len(), 2);
    assert!(resolved.bindings.values().all(|distance| *distance == 0));
}

#[test]
fn return_at_the_top_level_is_an_error() {
    let errors = resolve_errors("return 1;");

    assert!(matches!(&errors[0], ResolveError::ReturnOutsideFunction { .. }));
}

#[test]
fn break_and_continue_require_an_enclosing_loop() {
    assert!(matches!(
        resolve_errors("break;").as_slice(),
        [ResolveError::BreakOutsideLoop { .. }]
    ));
    assert!(matches!(
        resolve_errors("continue;").as_slice(),
        [ResolveError::ContinueOutsideLoop { .. }]
    ));

    resolve_ok("while (true) { break; }");
    resolve_ok("while (true) { continue; }");
}

#[test]
fn a_function_body_does_not_inherit_the_enclosing_loop() {
    let errors = resolve_errors("while (true) { fun f() { break; } }");

    assert!(matches!(&errors[0], ResolveError::BreakOutsideLoop { .. }));
}

#[test]
fn unused_locals_are_warned_about() {
    let warnings = resolve_warnings("{ var unused = 1; }");

    assert!(matches!(
        warnings.as_slice(),
        [ResolveWarning::UnusedLocal { name, .. }] if name == "unused"
    ));
}

#[test]
fn used_locals_are_not_warned_about() {
    let warnings = resolve_warnings("{ var used = 1; print used; }");

    assert!(warnings.is_empty());
}

#[test]
fn dictionary_references_share_the_scope_distance_mechanism() {
    let resolved = resolve_ok(r#"
        {
            dictionary d;
            d["k"] = 1;
            print d["k"];
        }
    "#);

    assert_eq!(resolved.bindings.len(), 2);
    assert!(resolved.bindings.values().all(|distance| *distance == 0));
}

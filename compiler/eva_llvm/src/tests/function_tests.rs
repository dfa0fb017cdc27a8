#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::helper::{compile_err, ir, run};
use crate::CompileError;

#[test]
fn calls_a_function() {
    let src = r#"
        (def square (x) (* x x))
        (printf "%d" (square 7))
    "#;
    assert_eq!(run(src), "49");
}

#[test]
fn typed_signature() {
    let src = r#"
        (def sum ((a number) (b number)) -> number (+ a b))
        (printf "%d" (sum 2 3))
    "#;
    assert_eq!(run(src), "5");
    assert!(ir(src).contains("define i32 @sum(i32 %a, i32 %b) {"));
}

#[test]
fn string_parameters_and_return() {
    let src = r#"
        (def pick ((flag number) (yes string) (no string)) -> string
          (if flag yes no))
        (printf "%s %s" (pick 1 "a" "b") (pick 0 "a" "b"))
    "#;
    assert_eq!(run(src), "a b");
}

#[test]
fn body_is_an_implicit_begin() {
    let src = r#"
        (def twice (x)
          (var y (* x 2))
          (printf "y=%d " y)
          y)
        (printf "%d" (twice 4))
    "#;
    assert_eq!(run(src), "y=8 8");
}

#[test]
fn recursion() {
    let src = r#"
        (def factorial (n)
          (if (== n 0) 1 (* n (factorial (- n 1)))))
        (printf "%d" (factorial 5))
    "#;
    assert_eq!(run(src), "120");
}

#[test]
fn parameters_are_copies() {
    let src = r#"
        (def bump (x) (begin (set x (+ x 1)) x))
        (var y 1)
        (printf "%d %d" (bump y) y)
    "#;
    assert_eq!(run(src), "2 1");
}

#[test]
fn functions_see_globals() {
    let src = r#"
        (def version () VERSION)
        (printf "%d" (version))
    "#;
    assert_eq!(run(src), "42");
}

#[test]
fn functions_do_not_see_caller_locals() {
    let src = r#"
        (var secret 1)
        (def peek () secret)
    "#;
    assert_eq!(
        compile_err(src),
        CompileError::UnboundName {
            name: "secret".to_string()
        }
    );
}

#[test]
fn nested_functions_can_call_each_other() {
    let src = r#"
        (def outer (x)
          (begin
            (def inner (y) (+ y 1))
            (inner (inner x))))
        (printf "%d" (outer 1))
    "#;
    assert_eq!(run(src), "3");
}

#[test]
fn nested_function_does_not_capture_parameters() {
    let src = r#"
        (def outer (x)
          (begin
            (def inner () x)
            (inner)))
    "#;
    assert_eq!(
        compile_err(src),
        CompileError::UnboundName {
            name: "x".to_string()
        }
    );
}

#[test]
fn functions_are_values() {
    let src = r#"
        (def add1 (x) (+ x 1))
        (var f add1)
        (printf "%d" (f 41))
    "#;
    assert_eq!(run(src), "42");
}

#[test]
fn computed_callee() {
    let src = r#"
        (def add1 (x) (+ x 1))
        (def sub1 (x) (- x 1))
        (printf "%d" ((if (> 2 1) add1 sub1) 10))
    "#;
    assert_eq!(run(src), "11");
}

#[test]
fn function_named_main_does_not_clash() {
    let src = r#"
        (def main () 7)
        (printf "%d" (main))
    "#;
    assert_eq!(run(src), "7");
    assert!(ir(src).contains("define i32 @main.1() {"));
}

#[test]
fn arity_is_checked() {
    let err = compile_err("(def f (a b) (+ a b)) (f 1)");
    assert!(
        matches!(err, CompileError::MalformedForm { ref message, .. } if message.contains("expects 2")),
        "{err}"
    );
}

#[test]
fn return_type_is_checked() {
    let err = compile_err(r#"(def f () "text")"#);
    assert!(matches!(err, CompileError::TypeMismatch { .. }), "{err}");
}

#[test]
fn calling_a_number_is_a_type_error() {
    let err = compile_err("(var x 1) (x 2)");
    assert!(matches!(err, CompileError::TypeMismatch { .. }), "{err}");
}

#[test]
fn malformed_definitions() {
    for src in ["(def f)", "(def f (x))", "(def (f) () 1)", "(def f x 1)", "(def f () -> number)"] {
        assert!(
            matches!(compile_err(src), CompileError::MalformedForm { ref form, .. } if form == "def"),
            "{src}"
        );
    }
}

#[test]
fn unknown_parameter_type() {
    assert_eq!(
        compile_err("(def f ((p Shape)) 1)"),
        CompileError::UnknownType {
            name: "Shape".to_string()
        }
    );
}

#[test]
fn self_outside_a_class_is_malformed() {
    assert!(matches!(
        compile_err("(def f (self) 1)"),
        CompileError::MalformedForm { ref form, .. } if form == "self"
    ));
}

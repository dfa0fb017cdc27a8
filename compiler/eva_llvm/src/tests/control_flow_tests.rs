#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::helper::{compile_err, ir, run};
use crate::CompileError;

#[test]
fn if_selects_the_else_branch() {
    assert_eq!(run(r#"(printf "%d" (if (> 5 10) 1 2))"#), "2");
}

#[test]
fn if_selects_the_then_branch() {
    assert_eq!(run(r#"(printf "%d" (if (< 5 10) 1 2))"#), "1");
}

#[test]
fn if_merges_with_a_phi() {
    let text = ir("(if (> 5 10) 1 2)");
    assert!(text.contains("br i1 %tmpcmp, label %then, label %else"), "{text}");
    assert!(text.contains("%tmpif = phi i32 [ 1, %then ], [ 2, %else ]"), "{text}");
}

#[test]
fn if_without_else_yields_zero() {
    assert_eq!(run(r#"(printf "%d" (if (> 5 10) 7))"#), "0");
    assert_eq!(run(r#"(printf "%d" (if (< 5 10) 7))"#), "7");
}

#[test]
fn if_accepts_integer_conditions() {
    assert_eq!(run(r#"(printf "%d" (if 0 1 2))"#), "2");
    assert_eq!(run(r#"(printf "%d" (if 3 1 2))"#), "1");
}

#[test]
fn nested_ifs_keep_blocks_in_order() {
    let src = r#"
        (var x 15)
        (printf "%d" (if (> x 10) (if (> x 20) 3 2) 1))
    "#;
    assert_eq!(run(src), "2");
    let text = ir(src);
    let then = text.find("then:").unwrap();
    let inner_then = text.find("then1:").unwrap();
    let outer_else = text.find("\nelse:").unwrap();
    assert!(then < inner_then && inner_then < outer_else, "{text}");
}

#[test]
fn if_with_mixed_branch_types_is_a_statement() {
    let src = r#"
        (var s "none")
        (if (> 2 1) (set s "big") 0)
        (printf "%s" s)
    "#;
    assert_eq!(run(src), "big");
}

#[test]
fn while_counts_to_ten() {
    let src = r#"
        (var i 0)
        (while (< i 10)
          (begin
            (printf "%d " i)
            (set i (+ i 1))))
        (printf "done %d" i)
    "#;
    assert_eq!(run(src), "0 1 2 3 4 5 6 7 8 9 done 10");
}

#[test]
fn while_lays_out_cond_body_loopend() {
    let text = ir("(var i 0) (while (< i 3) (set i (+ i 1)))");
    let cond = text.find("cond:").unwrap();
    let body = text.find("body:").unwrap();
    let end = text.find("loopend:").unwrap();
    assert!(cond < body && body < end, "{text}");
    assert!(text.contains("br i1 %tmpcmp, label %body, label %loopend"), "{text}");
}

#[test]
fn while_that_never_runs() {
    assert_eq!(run(r#"(while (> 1 2) (printf "x")) (printf "end")"#), "end");
}

#[test]
fn begin_yields_its_last_value() {
    assert_eq!(run(r#"(printf "%d" (begin (var x 1) (set x (+ x 1)) x))"#), "2");
}

#[test]
fn begin_scopes_shadow_and_restore() {
    let src = r#"
        (var x 10)
        (begin
          (var x 20)
          (printf "%d " x))
        (printf "%d" x)
    "#;
    assert_eq!(run(src), "20 10");
}

#[test]
fn set_writes_through_to_the_outer_variable() {
    let src = r#"
        (var x 10)
        (begin (set x 100))
        (printf "%d" x)
    "#;
    assert_eq!(run(src), "100");
}

#[test]
fn set_yields_the_stored_value() {
    assert_eq!(run(r#"(var x 1) (printf "%d" (set x 5))"#), "5");
}

#[test]
fn typed_variables() {
    let src = r#"
        (var (n number) 7)
        (var (s string) "seven")
        (printf "%d %s" n s)
    "#;
    assert_eq!(run(src), "7 seven");
}

#[test]
fn var_slots_live_in_the_entry_block() {
    let text = ir("(while (> 1 2) (var y 1))");
    let alloca = text.find("%y = alloca i32").unwrap();
    assert!(alloca < text.find("cond:").unwrap(), "{text}");
}

#[test]
fn empty_begin_is_malformed() {
    assert!(matches!(
        compile_err("(begin)"),
        CompileError::MalformedForm { ref form, .. } if form == "begin"
    ));
}

#[test]
fn if_needs_a_condition_and_a_branch() {
    assert!(matches!(
        compile_err("(if (> 1 2))"),
        CompileError::MalformedForm { ref form, .. } if form == "if"
    ));
}

#[test]
fn while_arity_is_checked() {
    assert!(matches!(
        compile_err("(while (> 1 2))"),
        CompileError::MalformedForm { ref form, .. } if form == "while"
    ));
}

#[test]
fn set_of_unknown_variable_is_unbound() {
    assert_eq!(
        compile_err("(set nope 1)"),
        CompileError::UnboundName {
            name: "nope".to_string()
        }
    );
}

#[test]
fn set_type_is_checked() {
    assert!(matches!(
        compile_err(r#"(var x 1) (set x "one")"#),
        CompileError::TypeMismatch { .. }
    ));
}

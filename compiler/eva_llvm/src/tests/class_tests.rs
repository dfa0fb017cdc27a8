#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::helper::{compile, compile_err, ir, run};
use crate::CompileError;

const POINTS: &str = r#"
    (class Point null
      (begin
        (var x 0)
        (var y 0)
        (def constructor (self x y)
          (begin
            (set (prop self x) x)
            (set (prop self y) y)
            0))
        (def calc (self)
          (+ (prop self x) (prop self y)))))

    (class Point3D Point
      (begin
        (var z 0)
        (def constructor (self x y z)
          (begin
            ((method (super Point) constructor) self x y)
            (set (prop self z) z)
            0))
        (def calc (self)
          (+ ((method (super Point) calc) self) (prop self z)))))
"#;

fn with_points(body: &str) -> String {
    format!("{POINTS}\n{body}")
}

#[test]
fn fields_are_stored_and_loaded() {
    let src = with_points(
        r#"
        (var p (new Point 10 20))
        (printf "%d %d" (prop p x) (prop p y))
    "#,
    );
    assert_eq!(run(&src), "10 20");
}

#[test]
fn fields_can_be_assigned() {
    let src = with_points(
        r#"
        (var p (new Point 1 2))
        (set (prop p x) 7)
        (printf "%d" (prop p x))
    "#,
    );
    assert_eq!(run(&src), "7");
}

#[test]
fn inherited_fields_are_initialized_by_the_super_constructor() {
    let src = with_points(
        r#"
        (var p (new Point3D 100 200 300))
        (printf "%d %d %d" (prop p x) (prop p y) (prop p z))
    "#,
    );
    assert_eq!(run(&src), "100 200 300");
}

#[test]
fn virtual_dispatch_uses_the_override() {
    let src = with_points(
        r#"
        (var p1 (new Point 10 20))
        (var p2 (new Point3D 100 200 300))
        (printf "P1: %d\n" ((method p1 calc) p1))
        (printf "P3: %d\n" ((method p2 calc) p2))
    "#,
    );
    assert_eq!(run(&src), "P1: 30\nP3: 600\n");
}

#[test]
fn super_calls_the_parent_implementation() {
    let src = with_points(
        r#"
        (var p (new Point3D 1 2 3))
        (printf "%d %d" ((method (super Point) calc) p) ((method p calc) p))
    "#,
    );
    assert_eq!(run(&src), "3 6");
}

#[test]
fn dispatch_through_a_parent_typed_reference() {
    let src = with_points(
        r#"
        (def total ((p Point)) ((method p calc) p))
        (printf "%d %d" (total (new Point 1 2)) (total (new Point3D 1 2 3)))
    "#,
    );
    assert_eq!(run(&src), "3 6");
}

#[test]
fn inherited_methods_are_dispatched() {
    let src = r#"
        (class Base null
          (begin
            (var n 0)
            (def constructor (self n) (begin (set (prop self n) n) 0))
            (def get (self) (prop self n))))
        (class Derived Base
          (begin
            (var extra 0)))
        (var d (new Derived 9))
        (printf "%d" ((method d get) d))
    "#;
    assert_eq!(run(src), "9");
    let text = ir(src);
    assert!(
        text.contains("@Derived_vTable = constant %Derived_vTable { i32 (%Base*, i32)* @Base_constructor, i32 (%Base*)* @Base_get }"),
        "{text}"
    );
}

#[test]
fn layout_reserves_the_vtable_slot() {
    let text = ir(POINTS);
    assert!(text.contains("%Point = type { %Point_vTable*, i32, i32 }"), "{text}");
    assert!(
        text.contains("%Point3D = type { %Point3D_vTable*, i32, i32, i32 }"),
        "{text}"
    );
    assert!(
        text.contains("%Point_vTable = type { i32 (%Point*, i32, i32)*, i32 (%Point*)* }"),
        "{text}"
    );
    assert!(text.contains("define i32 @Point3D_calc(%Point3D* %self) {"), "{text}");
}

#[test]
fn new_allocates_and_installs_the_vtable() {
    let text = ir(&with_points("(new Point 1 2)"));
    assert!(text.contains("call i8* @malloc(i64 16)"), "{text}");
    assert!(text.contains("store %Point_vTable* @Point_vTable, %Point_vTable** %vt_slot"), "{text}");
    assert!(text.contains("call i32 @Point_constructor(%Point* %instance, i32 1, i32 2)"), "{text}");
}

#[test]
fn class_without_constructor() {
    let src = r#"
        (class Counter null (var count 0))
        (var c (new Counter))
        (set (prop c count) (+ (prop c count) 5))
        (printf "%d" (prop c count))
    "#;
    assert_eq!(run(src), "5");
}

#[test]
fn field_initializers_run_before_the_constructor() {
    let src = r#"
        (class Account null
          (begin
            (var balance 100)
            (var bonus (+ 2 3))
            (def constructor (self extra)
              (begin (set (prop self balance) (+ (prop self balance) extra)) 0))))
        (var a (new Account 7))
        (printf "%d %d" (prop a balance) (prop a bonus))
    "#;
    assert_eq!(run(src), "107 5");
}

#[test]
fn field_initializers_are_stored_by_new() {
    let text = ir("(class C null (var count 0)) (new C)");
    let init = text.find("store i32 0, i32* %count_ptr").unwrap();
    let vtable = text.find("store %C_vTable* @C_vTable").unwrap();
    assert!(vtable < init, "{text}");
}

#[test]
fn subclass_may_redeclare_an_inherited_field() {
    let src = r#"
        (class A null (begin (var x 1) (var y 2)))
        (class B A (begin (var x 10) (var z 3)))
        (var a (new A))
        (var b (new B))
        (printf "%d %d %d %d %d" (prop a x) (prop b x) (prop b y) (prop b z) (prop a y))
    "#;
    assert_eq!(run(src), "1 10 2 3 2");
    let text = ir(src);
    assert!(text.contains("%B = type { %B_vTable*, i32, i32, i32 }"), "{text}");
}

#[test]
fn object_fields_start_null() {
    let text = ir("(class Node null (begin (var v 0) (var (next Node) 0))) (new Node)");
    assert!(text.contains("store %Node* null, %Node** %next_ptr"), "{text}");
}

#[test]
fn set_prop_evaluates_the_instance_first() {
    let src = r#"
        (class Box null (var v 0))
        (var b (new Box))
        (set (prop (begin (printf "a") b) v) (begin (printf "b") 5))
        (printf " %d" (prop b v))
    "#;
    assert_eq!(run(src), "ab 5");
}

#[test]
fn typed_fields() {
    let src = r#"
        (class Named null
          (begin
            (var (name string) "")
            (def constructor (self (name string)) (begin (set (prop self name) name) 0))
            (def greet (self) (printf "hello %s" (prop self name)))))
        (var n (new Named "eva"))
        ((method n greet) n)
    "#;
    assert_eq!(run(src), "hello eva");
}

#[test]
fn fields_may_reference_their_own_class() {
    let src = r#"
        (class Node null
          (begin
            (var value 0)
            (var (next Node) 0)
            (def constructor (self value) (begin (set (prop self value) value) 0))))
        (var a (new Node 1))
        (var b (new Node 2))
        (set (prop a next) b)
        (printf "%d" (prop (prop a next) value))
    "#;
    assert_eq!(run(src), "2");
}

#[test]
fn methods_may_call_other_methods_on_self() {
    let src = r#"
        (class Calc null
          (begin
            (def double (self v) (* v 2))
            (def quad (self v) ((method self double) self ((method self double) self v)))))
        (var c (new Calc))
        (printf "%d" ((method c quad) c 3))
    "#;
    assert_eq!(run(src), "12");
}

#[test]
fn functors_call_their_call_method() {
    let src = r#"
        (class Transformer null
          (begin
            (var factor 0)
            (def constructor (self factor) (begin (set (prop self factor) factor) 0))
            (def __call__ (self v) (* v (prop self factor)))))
        (var scale (new Transformer 5))
        (printf "%d" (scale 10))
    "#;
    assert_eq!(run(src), "50");
}

#[test]
fn redeclaring_a_class_fails() {
    let err = compile_err("(class A null (begin)) (class A null (begin))");
    assert_eq!(
        err,
        CompileError::ClassError {
            class: "A".to_string(),
            message: "class is already defined".to_string(),
        }
    );
}

#[test]
fn unknown_parent_fails() {
    let err = compile_err("(class B Missing (begin))");
    assert!(matches!(err, CompileError::ClassError { ref class, .. } if class == "B"), "{err}");
}

#[test]
fn unknown_class_in_new() {
    assert_eq!(
        compile_err("(new Ghost)"),
        CompileError::UnknownType {
            name: "Ghost".to_string()
        }
    );
}

#[test]
fn unknown_members_are_class_errors() {
    let err = compile_err(&with_points("(prop (new Point 1 2) w)"));
    assert!(matches!(err, CompileError::ClassError { .. }), "{err}");
    let err = compile_err(&with_points("(var p (new Point 1 2)) (method p area)"));
    assert!(matches!(err, CompileError::ClassError { .. }), "{err}");
}

#[test]
fn arguments_without_constructor_are_malformed() {
    let err = compile_err("(class A null (var x 0)) (new A 1)");
    assert!(matches!(err, CompileError::MalformedForm { ref form, .. } if form == "new"), "{err}");
}

#[test]
fn prop_of_a_number_is_a_type_error() {
    let err = compile_err("(prop 5 x)");
    assert!(matches!(err, CompileError::TypeMismatch { .. }), "{err}");
}

#[test]
fn class_bodies_only_hold_members() {
    let err = compile_err(r#"(class A null (begin (printf "no")))"#);
    assert!(matches!(err, CompileError::ClassError { .. }), "{err}");
}

#[test]
fn duplicate_methods_fail() {
    let err = compile_err("(class A null (begin (def f (self) 1) (def f (self) 2)))");
    assert!(matches!(err, CompileError::ClassError { .. }), "{err}");
}

#[test]
fn classes_yield_no_runtime_value() {
    assert!(compile("(printf \"%d\" (class A null (begin)))").is_ok());
}

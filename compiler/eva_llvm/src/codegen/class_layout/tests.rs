#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;

fn method(builder: &mut IrBuilder, name: &str, this: TypeId) -> FunctionId {
    let this_ptr = builder.ptr_type(this);
    let ty = builder.fn_type(TypeId::I32, &[this_ptr], false);
    builder.declare_function(name, ty, &["self"])
}

/// `Point { x, y; calc }` and `Point3D : Point { z; calc }`.
fn points(builder: &mut IrBuilder, registry: &mut ClassRegistry) -> (FunctionId, FunctionId) {
    let point_ty = registry.declare(builder, "Point", None).unwrap().ty;
    registry.add_field("Point", "x", TypeId::I32, None).unwrap();
    registry.add_field("Point", "y", TypeId::I32, None).unwrap();
    let point_calc = method(builder, "Point_calc", point_ty);
    registry.add_method("Point", "calc", point_calc).unwrap();
    registry.finalize(builder, "Point").unwrap();

    let point3d_ty = registry.declare(builder, "Point3D", Some("Point")).unwrap().ty;
    registry.add_field("Point3D", "z", TypeId::I32, None).unwrap();
    let point3d_calc = method(builder, "Point3D_calc", point3d_ty);
    registry.add_method("Point3D", "calc", point3d_calc).unwrap();
    registry.finalize(builder, "Point3D").unwrap();
    (point_calc, point3d_calc)
}

#[test]
fn fields_follow_the_reserved_slot() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    assert_eq!(registry.field_index("Point", "x").unwrap(), 1);
    assert_eq!(registry.field_index("Point", "y").unwrap(), 2);
    assert_eq!(registry.field_index("Point3D", "z").unwrap(), 3);
}

#[test]
fn inherited_fields_keep_their_index() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    for field in ["x", "y"] {
        assert_eq!(
            registry.field_index("Point3D", field).unwrap(),
            registry.field_index("Point", field).unwrap()
        );
    }
}

#[test]
fn override_reuses_the_parent_slot() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    let (point_calc, point3d_calc) = points(&mut builder, &mut registry);

    let point = registry.get("Point").unwrap();
    let point3d = registry.get("Point3D").unwrap();
    assert_eq!(point.methods().len(), 1);
    assert_eq!(point3d.methods().len(), 1);
    assert_eq!(registry.method_index("Point3D", "calc").unwrap(), 0);
    assert_eq!(point.resolve_method("calc"), Some(point_calc));
    assert_eq!(point3d.resolve_method("calc"), Some(point3d_calc));
    assert_eq!(point3d.methods()[0].owner, "Point3D");
}

#[test]
fn finalize_emits_struct_bodies_and_vtable() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    let ir = builder.module().to_ir();
    assert!(ir.contains("%Point = type { %Point_vTable*, i32, i32 }"), "{ir}");
    assert!(ir.contains("%Point_vTable = type { i32 (%Point*)* }"), "{ir}");
    assert!(ir.contains("%Point3D = type { %Point3D_vTable*, i32, i32, i32 }"), "{ir}");
    assert!(
        ir.contains("@Point3D_vTable = constant %Point3D_vTable { i32 (%Point3D*)* @Point3D_calc }"),
        "{ir}"
    );
    assert!(registry.get("Point").unwrap().is_finalized());
}

#[test]
fn class_of_maps_instance_pointers_back() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    let point_ty = registry.get("Point").unwrap().ty;
    let ptr = builder.ptr_type(point_ty);
    let found = registry.class_of(builder.types(), ptr).unwrap();
    assert_eq!(found.name, "Point");
    assert!(registry.class_of(builder.types(), point_ty).is_none());
    assert!(registry.class_of(builder.types(), TypeId::I32).is_none());
}

#[test]
fn redeclaring_a_class_fails() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    let err = registry.declare(&mut builder, "Point", None).unwrap_err();
    assert!(matches!(err, CompileError::ClassError { ref class, .. } if class == "Point"));
}

#[test]
fn unknown_parent_fails() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    let err = registry
        .declare(&mut builder, "Orphan", Some("Missing"))
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::ClassError {
            class: "Orphan".to_string(),
            message: "unknown parent class `Missing`".to_string(),
        }
    );
    assert!(registry.is_empty());
}

#[test]
fn duplicate_members_fail() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    let ty = registry.declare(&mut builder, "A", None).unwrap().ty;
    registry.add_field("A", "x", TypeId::I32, None).unwrap();
    assert!(registry.add_field("A", "x", TypeId::I32, None).is_err());

    let f = method(&mut builder, "A_f", ty);
    registry.add_method("A", "f", f).unwrap();
    assert!(registry.add_method("A", "f", f).is_err());
}

#[test]
fn missing_members_are_class_errors() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    points(&mut builder, &mut registry);

    assert!(matches!(
        registry.field_index("Point", "z"),
        Err(CompileError::ClassError { .. })
    ));
    assert!(matches!(
        registry.method_index("Point", "draw"),
        Err(CompileError::ClassError { .. })
    ));
    assert!(matches!(
        registry.field_index("Nope", "x"),
        Err(CompileError::UnknownType { .. })
    ));
}

#[test]
fn redeclared_inherited_field_keeps_its_slot() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    registry.declare(&mut builder, "A", None).unwrap();
    registry.add_field("A", "x", TypeId::I32, None).unwrap();
    registry.finalize(&mut builder, "A").unwrap();

    registry.declare(&mut builder, "B", Some("A")).unwrap();
    registry
        .add_field("B", "x", TypeId::I32, Some(Exp::Number(7)))
        .unwrap();
    registry.add_field("B", "y", TypeId::I32, None).unwrap();
    registry.finalize(&mut builder, "B").unwrap();

    assert_eq!(
        registry.field_index("B", "x").unwrap(),
        registry.field_index("A", "x").unwrap()
    );
    assert_eq!(registry.field_index("B", "y").unwrap(), 2);
    let b = registry.get("B").unwrap();
    assert_eq!(b.fields().len(), 2);
    assert_eq!(b.field("x").unwrap().init, Some(Exp::Number(7)));
    assert_eq!(b.field("x").unwrap().owner, "B");
    assert!(registry.get("A").unwrap().field("x").unwrap().init.is_none());

    // a second declaration in the same subclass is still a duplicate
    assert!(registry.add_field("B", "x", TypeId::I32, None).is_err());
}

#[test]
fn redeclared_inherited_field_must_keep_its_type() {
    let mut builder = IrBuilder::new("layout");
    let mut registry = ClassRegistry::new();
    registry.declare(&mut builder, "A", None).unwrap();
    registry.add_field("A", "x", TypeId::I32, None).unwrap();
    registry.finalize(&mut builder, "A").unwrap();
    registry.declare(&mut builder, "B", Some("A")).unwrap();

    let err = registry.add_field("B", "x", TypeId::I8, None).unwrap_err();
    assert_eq!(
        err,
        CompileError::class("B", "field `x` is redeclared with a different type")
    );
}

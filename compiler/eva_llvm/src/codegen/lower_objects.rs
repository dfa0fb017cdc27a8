//! Classes, instances, fields and method lookup.
//!
//! `(class Name Parent Body)` is compiled in three steps: declare the class
//! in the [`ClassRegistry`](super::class_layout::ClassRegistry), collect its
//! fields and method prototypes, finalize the layout, then compile the
//! method bodies. Method bodies therefore see the complete layout, including
//! their own class.
//!
//! Instances live on the heap. `new` allocates the struct with `malloc`,
//! stores the vtable pointer in the reserved slot, stores every field's
//! declared initial value, then calls the `constructor` method (own or
//! inherited) when there is one.

use eva_ir::{DataLayout, TypeId, ValueId};
use eva_syntax::Exp;
use tracing::debug;

use super::class_layout::{FieldInfo, VTABLE_INDEX};
use super::expr_lowerer::{ExprLowerer, LowerResult};
use super::function_compiler::FunctionDef;
use super::scope::ScopeKind;
use crate::error::CompileError;

/// Method run by `new` after allocation.
pub(crate) const CONSTRUCTOR: &str = "constructor";

/// Operands of a tagged list, e.g. `[a, b]` for `(var a b)`.
fn operands(exp: &Exp) -> &[Exp] {
    exp.as_list()
        .and_then(|items| items.get(1..))
        .unwrap_or_default()
}

impl ExprLowerer<'_> {
    // -----------------------------------------------------------------------
    // Class definitions
    // -----------------------------------------------------------------------

    /// `(class Name Parent Body)`; `Parent` is `null` for a root class.
    pub(crate) fn lower_class(&mut self, args: &[Exp]) -> LowerResult {
        Self::expect_args("class", args, 3)?;
        let name = Self::expect_symbol("class", &args[0], "class name")?;
        let parent = match Self::expect_symbol("class", &args[1], "parent class")? {
            "null" => None,
            parent => Some(parent),
        };
        let body = &args[2];
        let members = if body.is_tagged("begin") {
            operands(body)
        } else {
            std::slice::from_ref(body)
        };

        self.classes.declare(self.builder, name, parent)?;
        let previous = self.current_class.replace(name.to_string());
        let result = self.compile_class_members(name, members);
        self.current_class = previous;
        result?;
        Ok(self.unit())
    }

    fn compile_class_members(&mut self, class: &str, members: &[Exp]) -> LowerResult<()> {
        let mut methods = Vec::new();
        for member in members {
            match member.tag() {
                Some("var") => {
                    let args = operands(member);
                    Self::expect_args("var", args, 2)?;
                    let (field, ty) = self.typed_name("var", &args[0])?;
                    self.classes.add_field(
                        class,
                        field,
                        ty.unwrap_or(TypeId::I32),
                        Some(args[1].clone()),
                    )?;
                }
                Some("def") => {
                    let def = FunctionDef::parse(member)?;
                    let function = self.declare_method(class, &def)?;
                    self.classes.add_method(class, def.name, function)?;
                    methods.push((def, function));
                }
                _ => {
                    return Err(CompileError::class(
                        class,
                        format!("class body may only contain `var` and `def`, found `{member}`"),
                    ))
                }
            }
        }
        self.classes.finalize(self.builder, class)?;
        for (def, function) in &methods {
            self.compile_function_body(*function, def)?;
        }
        debug!(class, methods = methods.len(), "compiled class");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// `(new Class args...)`.
    pub(crate) fn lower_new(&mut self, args: &[Exp]) -> LowerResult {
        let Some((class_exp, ctor_args)) = args.split_first() else {
            return Err(CompileError::malformed("new", "missing class name"));
        };
        let class = Self::expect_symbol("new", class_exp, "class")?;
        let Some(info) = self.classes.get(class) else {
            return Err(CompileError::UnknownType {
                name: class.to_string(),
            });
        };
        let (struct_ty, vtable, constructor) =
            (info.ty, info.vtable, info.resolve_method(CONSTRUCTOR));
        let initializers: Vec<(u32, FieldInfo)> = info
            .fields()
            .iter()
            .filter_map(|field| Some((info.field_index(&field.name)?, field.clone())))
            .collect();
        let Some(vtable) = vtable else {
            return Err(CompileError::class(class, "instantiated before its definition is complete"));
        };

        let size = DataLayout::default().alloc_size(self.builder.types(), struct_ty);
        let size = self.builder.const_i64(size as i64);
        let malloc = self.runtime.malloc;
        let Some(raw) = self.builder.call_function(malloc, &[size], "") else {
            return Err(CompileError::malformed("new", "allocator returned no value"));
        };
        let instance_ty = self.builder.ptr_type(struct_ty);
        let instance = self.builder.bitcast(raw, instance_ty, "instance");

        let vtable_slot = self
            .builder
            .struct_gep(struct_ty, instance, VTABLE_INDEX, "vt_slot");
        let vtable_ptr = self.builder.global_value(vtable);
        self.builder.store(vtable_ptr, vtable_slot);
        self.initialize_fields(struct_ty, instance, &initializers)?;

        match constructor {
            Some(ctor) => {
                let mut values = vec![instance];
                for arg in ctor_args {
                    values.push(self.lower(arg)?);
                }
                let callee = self.builder.function_value(ctor);
                self.call_value(callee, values, &format!("{class}.{CONSTRUCTOR}"))?;
            }
            None if !ctor_args.is_empty() => {
                return Err(CompileError::malformed(
                    "new",
                    format!(
                        "class `{class}` has no constructor but {} argument(s) were given",
                        ctor_args.len()
                    ),
                ));
            }
            None => {}
        }
        Ok(instance)
    }

    /// Store each field's declared initial value into a fresh `instance`.
    fn initialize_fields(
        &mut self,
        struct_ty: TypeId,
        instance: ValueId,
        fields: &[(u32, FieldInfo)],
    ) -> LowerResult<()> {
        for (index, field) in fields {
            let Some(init) = &field.init else { continue };
            // `0` initializes an object field to null
            let null_ptr =
                matches!(init, Exp::Number(0)) && self.builder.types().is_pointer(field.ty);
            let value = if null_ptr {
                self.builder.const_null(field.ty)
            } else {
                self.with_scope(ScopeKind::Block, |this| this.lower(init))?
            };
            let value = self.coerce(
                value,
                field.ty,
                &format!("initializer of field `{}`", field.name),
            )?;
            let ptr = self
                .builder
                .struct_gep(struct_ty, instance, *index, &format!("{}_ptr", field.name));
            self.builder.store(value, ptr);
        }
        Ok(())
    }

    /// Class name and struct type of an instance pointer.
    fn instance_class(&self, instance: ValueId, form: &str) -> LowerResult<(String, TypeId)> {
        let ty = self.builder.type_of(instance);
        match self.classes.class_of(self.builder.types(), ty) {
            Some(info) => Ok((info.name.clone(), info.ty)),
            None => Err(self.mismatch(&format!("operand of `{form}`"), "class instance", ty)),
        }
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    /// `(prop instance field)`: load the field.
    pub(crate) fn lower_prop(&mut self, args: &[Exp]) -> LowerResult {
        let (ptr, ty) = self.field_address(args)?;
        let field = Self::expect_symbol("prop", &args[1], "field")?;
        Ok(self.builder.load(ty, ptr, field))
    }

    /// Address and type of `field` in `instance`, from `[instance, field]`.
    pub(crate) fn field_address(&mut self, args: &[Exp]) -> LowerResult<(ValueId, TypeId)> {
        Self::expect_args("prop", args, 2)?;
        let field = Self::expect_symbol("prop", &args[1], "field")?;
        let instance = self.lower(&args[0])?;
        let (class, struct_ty) = self.instance_class(instance, "prop")?;
        let index = self.classes.field_index(&class, field)?;
        let Some(field_ty) = self
            .classes
            .get(&class)
            .and_then(|info| info.field(field))
            .map(|info| info.ty)
        else {
            return Err(CompileError::class(&class, format!("no field named `{field}`")));
        };
        let ptr = self
            .builder
            .struct_gep(struct_ty, instance, index, &format!("{field}_ptr"));
        Ok((ptr, field_ty))
    }

    // -----------------------------------------------------------------------
    // Methods
    // -----------------------------------------------------------------------

    /// `(method instance name)` dispatches through the instance's vtable;
    /// `(method (super Class) name)` names `Class`'s implementation directly.
    pub(crate) fn lower_method(&mut self, args: &[Exp]) -> LowerResult {
        Self::expect_args("method", args, 2)?;
        let method = Self::expect_symbol("method", &args[1], "method name")?;

        if args[0].is_tagged("super") {
            let super_args = operands(&args[0]);
            Self::expect_args("super", super_args, 1)?;
            let class = Self::expect_symbol("super", &super_args[0], "class")?;
            let Some(info) = self.classes.get(class) else {
                return Err(CompileError::UnknownType {
                    name: class.to_string(),
                });
            };
            let Some(function) = info.resolve_method(method) else {
                return Err(CompileError::class(class, format!("no method named `{method}`")));
            };
            return Ok(self.builder.function_value(function));
        }

        let instance = self.lower(&args[0])?;
        let (class, _) = self.instance_class(instance, "method")?;
        self.load_method(&class, instance, method)
    }

    /// Load `method`'s function pointer from `instance`'s vtable.
    pub(crate) fn load_method(
        &mut self,
        class: &str,
        instance: ValueId,
        method: &str,
    ) -> LowerResult {
        let index = self.classes.method_index(class, method)?;
        let Some((struct_ty, vtable_ty)) = self
            .classes
            .get(class)
            .map(|info| (info.ty, info.vtable_ty))
        else {
            return Err(CompileError::UnknownType {
                name: class.to_string(),
            });
        };
        let Some(fn_ptr_ty) = self
            .builder
            .types()
            .struct_fields(vtable_ty)
            .and_then(|slots| slots.get(index as usize))
            .copied()
        else {
            return Err(CompileError::class(class, "vtable is not laid out yet"));
        };

        let vtable_slot = self
            .builder
            .struct_gep(struct_ty, instance, VTABLE_INDEX, "vt_slot");
        let vtable_ptr_ty = self.builder.ptr_type(vtable_ty);
        let vtable = self.builder.load(vtable_ptr_ty, vtable_slot, "vt");
        let method_slot = self
            .builder
            .struct_gep(vtable_ty, vtable, index, &format!("{method}_slot"));
        Ok(self.builder.load(fn_ptr_ty, method_slot, method))
    }
}

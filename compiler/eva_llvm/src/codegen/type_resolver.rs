//! Source type annotations.
//!
//! | Annotation | IR type |
//! |------------|---------|
//! | `number` | `i32` |
//! | `string` | `i8*` |
//! | class name | pointer to the class struct |

use eva_ir::TypeId;
use eva_syntax::Exp;

use super::expr_lowerer::{ExprLowerer, LowerResult};
use crate::error::CompileError;

impl ExprLowerer<'_> {
    /// Map a type name to its IR type.
    pub(crate) fn resolve_type(&mut self, name: &str) -> LowerResult<TypeId> {
        match name {
            "number" => Ok(TypeId::I32),
            "string" => Ok(self.builder.ptr_type(TypeId::I8)),
            class => match self.classes.get(class) {
                Some(info) => {
                    let ty = info.ty;
                    Ok(self.builder.ptr_type(ty))
                }
                None => Err(CompileError::UnknownType {
                    name: class.to_string(),
                }),
            },
        }
    }

    /// Pointer to the class being compiled.
    pub(crate) fn self_type(&mut self) -> LowerResult<TypeId> {
        match self.current_class.clone() {
            Some(class) => self.resolve_type(&class),
            None => Err(CompileError::malformed(
                "self",
                "`self` parameter outside a class body",
            )),
        }
    }

    /// Split `name` or `(name type)`, resolving the annotation if present.
    pub(crate) fn typed_name<'e>(
        &mut self,
        form: &str,
        exp: &'e Exp,
    ) -> LowerResult<(&'e str, Option<TypeId>)> {
        match exp {
            Exp::Symbol(name) => Ok((name.as_str(), None)),
            Exp::List(items) => match items.as_slice() {
                [Exp::Symbol(name), Exp::Symbol(ty)] => {
                    let ty = self.resolve_type(ty)?;
                    Ok((name.as_str(), Some(ty)))
                }
                _ => Err(CompileError::malformed(
                    form,
                    format!("expected `name` or `(name type)`, found `{exp}`"),
                )),
            },
            other => Err(CompileError::malformed(
                form,
                format!("expected a name, found {} `{other}`", other.kind_name()),
            )),
        }
    }

    /// Name and type of a function parameter. Untyped parameters are
    /// numbers; a parameter named `self` is always the current class.
    pub(crate) fn param_type<'e>(&mut self, exp: &'e Exp) -> LowerResult<(&'e str, TypeId)> {
        let name = match exp {
            Exp::List(items) => items.first().and_then(Exp::as_symbol),
            _ => exp.as_symbol(),
        };
        if name == Some("self") {
            return Ok(("self", self.self_type()?));
        }
        let (name, ty) = self.typed_name("def", exp)?;
        Ok((name, ty.unwrap_or(TypeId::I32)))
    }
}

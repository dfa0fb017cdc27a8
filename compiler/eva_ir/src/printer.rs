//! LLVM assembly writer.
//!
//! Produces typed-pointer textual IR (`i8*`, `%Point*`) that `llc` and
//! `clang` accept for the constructs this crate models.

use std::fmt::Write;

use crate::inst::{Instruction, Op};
use crate::module::{Constant, Function, Global, Linkage, Module, ValueKind};
use crate::types::Type;
use crate::value_id::{TypeId, ValueId};

pub(crate) fn print_module(module: &Module) -> String {
    let mut p = Printer {
        module,
        out: String::new(),
    };
    p.module_header();
    p.struct_types();
    p.globals();
    for (_, function) in module.functions() {
        p.function(function);
    }
    p.out
}

/// `name` as an LLVM identifier body, quoted when it has characters
/// outside `[-a-zA-Z$._0-9]` or starts with a digit.
fn ident(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_'));
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", escape_bytes(name.as_bytes()))
    }
}

/// Escape bytes for a `c"..."` literal or quoted identifier.
fn escape_bytes(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == b'"' || b == b'\\' || !(0x20..0x7f).contains(&b) {
            let _ = write!(s, "\\{b:02X}");
        } else {
            s.push(char::from(b));
        }
    }
    s
}

struct Printer<'m> {
    module: &'m Module,
    out: String,
}

impl Printer<'_> {
    fn ty(&self, ty: TypeId) -> String {
        self.module.types.display(ty).to_string()
    }

    fn module_header(&mut self) {
        let m = self.module;
        let _ = writeln!(self.out, "; ModuleID = '{}'", m.name);
        let _ = writeln!(
            self.out,
            "source_filename = \"{}\"",
            escape_bytes(m.source_filename.as_bytes())
        );
        if let Some(triple) = &m.target_triple {
            let _ = writeln!(self.out, "target triple = \"{triple}\"");
        }
    }

    fn struct_types(&mut self) {
        let mut any = false;
        for named in self.module.types.structs() {
            if !any {
                self.out.push('\n');
                any = true;
            }
            let body = match &named.fields {
                None => "opaque".to_string(),
                Some(fields) if fields.is_empty() => "{}".to_string(),
                Some(fields) => {
                    let parts: Vec<String> = fields.iter().map(|&f| self.ty(f)).collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            };
            let _ = writeln!(self.out, "%{} = type {body}", ident(&named.name));
        }
    }

    fn globals(&mut self) {
        let mut any = false;
        for (_, global) in self.module.globals() {
            if !any {
                self.out.push('\n');
                any = true;
            }
            let line = self.global(global);
            self.out.push_str(&line);
            self.out.push('\n');
        }
    }

    fn global(&self, global: &Global) -> String {
        let mut line = format!("@{} = ", ident(&global.name));
        if global.linkage == Linkage::Private {
            line.push_str("private ");
        }
        if global.unnamed_addr {
            line.push_str("unnamed_addr ");
        }
        match &global.init {
            None => {
                line.push_str("external ");
                line.push_str(if global.constant { "constant " } else { "global " });
                line.push_str(&self.ty(global.value_ty));
            }
            Some(init) => {
                line.push_str(if global.constant { "constant " } else { "global " });
                line.push_str(&self.ty(global.value_ty));
                line.push(' ');
                line.push_str(&self.constant(global.value_ty, init));
            }
        }
        line
    }

    fn constant(&self, ty: TypeId, constant: &Constant) -> String {
        match constant {
            Constant::Int(v) => self.int_literal(ty, *v),
            Constant::Bytes(bytes) => format!("c\"{}\"", escape_bytes(bytes)),
            Constant::Null => "null".to_string(),
            Constant::Function(f) => format!("@{}", ident(&self.module.function(*f).name)),
            Constant::Struct(fields) => {
                if fields.is_empty() {
                    return "zeroinitializer".to_string();
                }
                let field_tys = self.module.types.struct_fields(ty).unwrap_or_default();
                let parts: Vec<String> = fields
                    .iter()
                    .enumerate()
                    .map(|(i, c)| {
                        let fty = field_tys.get(i).copied().unwrap_or(TypeId::I32);
                        format!("{} {}", self.ty(fty), self.constant(fty, c))
                    })
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
        }
    }

    fn int_literal(&self, ty: TypeId, v: i64) -> String {
        if ty == TypeId::I1 {
            let text = if v & 1 == 1 { "true" } else { "false" };
            text.to_string()
        } else {
            v.to_string()
        }
    }

    /// Operand text without its type.
    fn value(&self, id: ValueId) -> String {
        let data = self.module.value(id);
        match &data.kind {
            ValueKind::ConstInt(v) => self.int_literal(data.ty, *v),
            ValueKind::Null => "null".to_string(),
            ValueKind::Undef => "undef".to_string(),
            ValueKind::Function(f) => format!("@{}", ident(&self.module.function(*f).name)),
            ValueKind::Global(g) => format!("@{}", ident(&self.module.global(*g).name)),
            ValueKind::StringPtr(g) => {
                let global = self.module.global(*g);
                let arr = self.ty(global.value_ty);
                format!(
                    "getelementptr inbounds ({arr}, {arr}* @{}, i32 0, i32 0)",
                    ident(&global.name)
                )
            }
            ValueKind::Param { .. } | ValueKind::Inst { .. } => format!("%{}", ident(&data.name)),
        }
    }

    /// Operand text with its type, e.g. `i32 %x`.
    fn typed(&self, id: ValueId) -> String {
        format!("{} {}", self.ty(self.module.type_of(id)), self.value(id))
    }

    fn function(&mut self, f: &Function) {
        let Some(sig) = self.module.types.fn_sig(f.ty) else {
            return;
        };
        let ret = self.ty(sig.ret);
        self.out.push('\n');

        if f.is_declaration() {
            let mut params: Vec<String> = sig.params.iter().map(|&p| self.ty(p)).collect();
            if sig.variadic {
                params.push("...".to_string());
            }
            let _ = writeln!(
                self.out,
                "declare {ret} @{}({})",
                ident(&f.name),
                params.join(", ")
            );
            return;
        }

        let mut params: Vec<String> = f.params.iter().map(|&p| self.typed(p)).collect();
        if sig.variadic {
            params.push("...".to_string());
        }
        let _ = writeln!(
            self.out,
            "define {ret} @{}({}) {{",
            ident(&f.name),
            params.join(", ")
        );
        for (i, (_, block)) in f.blocks().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            let _ = writeln!(self.out, "{}:", ident(&block.name));
            for &inst in &block.insts {
                let line = self.instruction(f, f.inst(inst));
                let _ = writeln!(self.out, "  {line}");
            }
        }
        self.out.push_str("}\n");
    }

    fn label(f: &Function, block: crate::BlockId) -> String {
        format!("label %{}", ident(&f.block(block).name))
    }

    fn instruction(&self, f: &Function, inst: &Instruction) -> String {
        let lhs = inst
            .result
            .map(|r| format!("{} = ", self.value(r)))
            .unwrap_or_default();
        let body = match &inst.op {
            Op::Alloca { ty } => format!("alloca {}", self.ty(*ty)),
            Op::Load { ty, ptr } => format!("load {}, {}", self.ty(*ty), self.typed(*ptr)),
            Op::Store { value, ptr } => format!("store {}, {}", self.typed(*value), self.typed(*ptr)),
            Op::Binary { op, lhs, rhs } => format!(
                "{} {}, {}",
                op.mnemonic(),
                self.typed(*lhs),
                self.value(*rhs)
            ),
            Op::ICmp { pred, lhs, rhs } => format!(
                "icmp {} {}, {}",
                pred.mnemonic(),
                self.typed(*lhs),
                self.value(*rhs)
            ),
            Op::StructGep {
                struct_ty,
                ptr,
                index,
            } => format!(
                "getelementptr inbounds {}, {}, i32 0, i32 {index}",
                self.ty(*struct_ty),
                self.typed(*ptr)
            ),
            Op::Cast { op, value, to } => {
                format!("{} {} to {}", op.mnemonic(), self.typed(*value), self.ty(*to))
            }
            Op::Call {
                callee,
                fn_ty,
                args,
            } => self.call(*callee, *fn_ty, args),
            Op::Phi { ty, incoming } => {
                let arms: Vec<String> = incoming
                    .iter()
                    .map(|(v, b)| format!("[ {}, %{} ]", self.value(*v), ident(&f.block(*b).name)))
                    .collect();
                format!("phi {} {}", self.ty(*ty), arms.join(", "))
            }
            Op::Br { dest } => format!("br {}", Self::label(f, *dest)),
            Op::CondBr {
                cond,
                then_bb,
                else_bb,
            } => format!(
                "br {}, {}, {}",
                self.typed(*cond),
                Self::label(f, *then_bb),
                Self::label(f, *else_bb)
            ),
            Op::Ret { value: Some(v) } => format!("ret {}", self.typed(*v)),
            Op::Ret { value: None } => "ret void".to_string(),
        };
        format!("{lhs}{body}")
    }

    fn call(&self, callee: ValueId, fn_ty: TypeId, args: &[ValueId]) -> String {
        let (ret, variadic) = match self.module.types.get(fn_ty) {
            Type::Function(sig) => (sig.ret, sig.variadic),
            _ => (TypeId::VOID, false),
        };
        // Variadic callees are spelled with their full function type.
        let callee_ty = if variadic {
            self.ty(fn_ty)
        } else {
            self.ty(ret)
        };
        let args: Vec<String> = args.iter().map(|&a| self.typed(a)).collect();
        format!("call {callee_ty} {}({})", self.value(callee), args.join(", "))
    }
}

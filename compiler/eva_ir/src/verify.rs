//! Module verifier.
//!
//! Checks the structural rules a backend relies on: every attached block
//! ends in exactly one terminator, phis lead their block and name real
//! predecessors, values never cross function boundaries, and operand types
//! agree with each instruction's signature. Dominance is not checked.

use tracing::debug;

use crate::error::VerifyError;
use crate::inst::{CastOp, Instruction, Op};
use crate::module::{Constant, Function, Global, Module, ValueKind};
use crate::types::Type;
use crate::value_id::{BlockId, FunctionId, TypeId, ValueId};

pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    for (_, global) in module.globals() {
        if let Some(init) = &global.init {
            verify_constant(module, global, global.value_ty, init)?;
        }
    }
    for (id, function) in module.functions() {
        if function.is_declaration() {
            continue;
        }
        FunctionVerifier {
            module,
            id,
            function,
        }
        .run()?;
    }
    debug!(module = %module.name, "module verified");
    Ok(())
}

fn verify_constant(
    module: &Module,
    global: &Global,
    ty: TypeId,
    constant: &Constant,
) -> Result<(), VerifyError> {
    let types = &module.types;
    let fail = |what: &str| {
        Err(VerifyError::new(
            format!("global `@{}`", global.name),
            format!("{what} initializer for `{}`", types.display(ty)),
        ))
    };
    match (constant, types.get(ty)) {
        (Constant::Int(_), Type::Int(_)) | (Constant::Null, Type::Pointer(_)) => Ok(()),
        (Constant::Bytes(bytes), Type::Array { elem, len })
            if *elem == TypeId::I8 && bytes.len() as u64 == *len =>
        {
            Ok(())
        }
        (Constant::Function(f), Type::Pointer(pointee))
            if module.function(*f).ty == *pointee =>
        {
            Ok(())
        }
        (Constant::Struct(fields), Type::Struct(_)) => {
            let Some(field_tys) = types.struct_fields(ty) else {
                return fail("opaque struct");
            };
            if field_tys.len() != fields.len() {
                return fail("wrong arity struct");
            }
            for (c, &fty) in fields.iter().zip(field_tys) {
                verify_constant(module, global, fty, c)?;
            }
            Ok(())
        }
        (Constant::Int(_), _) => fail("integer"),
        (Constant::Bytes(_), _) => fail("byte array"),
        (Constant::Null, _) => fail("null"),
        (Constant::Function(_), _) => fail("function"),
        (Constant::Struct(_), _) => fail("struct"),
    }
}

struct FunctionVerifier<'m> {
    module: &'m Module,
    id: FunctionId,
    function: &'m Function,
}

impl FunctionVerifier<'_> {
    fn error(&self, message: String) -> VerifyError {
        VerifyError::new(format!("function `{}`", self.function.name), message)
    }

    fn ty(&self, ty: TypeId) -> String {
        self.module.types.display(ty).to_string()
    }

    fn type_of(&self, v: ValueId) -> TypeId {
        self.module.type_of(v)
    }

    fn run(&self) -> Result<(), VerifyError> {
        for (bid, block) in self.function.blocks() {
            if block.insts.is_empty() {
                return Err(self.error(format!("block `{}` is empty", block.name)));
            }
            let last = block.insts.len() - 1;
            let mut seen_non_phi = false;
            for (i, &inst_id) in block.insts.iter().enumerate() {
                let inst = self.function.inst(inst_id);
                match (inst.op.is_terminator(), i == last) {
                    (true, false) => {
                        return Err(self.error(format!(
                            "terminator in the middle of block `{}`",
                            block.name
                        )))
                    }
                    (false, true) => {
                        return Err(self.error(format!(
                            "block `{}` does not end with a terminator",
                            block.name
                        )))
                    }
                    _ => {}
                }
                if matches!(inst.op, Op::Phi { .. }) {
                    if seen_non_phi {
                        return Err(self.error(format!(
                            "phi after non-phi instruction in block `{}`",
                            block.name
                        )));
                    }
                    self.phi_predecessors(bid, inst)?;
                } else {
                    seen_non_phi = true;
                }
                for operand in inst.op.operands() {
                    self.operand(operand)?;
                }
                for target in inst.op.blocks() {
                    self.block_ref(target)?;
                }
                self.types(inst)?;
            }
        }
        Ok(())
    }

    fn operand(&self, v: ValueId) -> Result<(), VerifyError> {
        let data = self.module.value(v);
        if let Some(owner) = data.owner() {
            if owner != self.id {
                return Err(self.error(format!(
                    "uses `%{}` which belongs to function `{}`",
                    data.name,
                    self.module.function(owner).name
                )));
            }
        }
        if let ValueKind::Inst { inst, .. } = data.kind {
            let def_block = self.function.inst(inst).block;
            if !self.function.block(def_block).is_attached() {
                return Err(self.error(format!(
                    "uses `%{}` defined in a block that is not in the function",
                    data.name
                )));
            }
        }
        Ok(())
    }

    fn block_ref(&self, block: BlockId) -> Result<(), VerifyError> {
        let attached = self
            .function
            .blocks
            .get(block.index())
            .is_some_and(crate::module::Block::is_attached);
        if attached {
            Ok(())
        } else {
            Err(self.error(format!("reference to block #{} outside the layout", block.raw())))
        }
    }

    fn phi_predecessors(&self, block: BlockId, inst: &Instruction) -> Result<(), VerifyError> {
        let Op::Phi { incoming, .. } = &inst.op else {
            return Ok(());
        };
        if incoming.is_empty() {
            return Err(self.error("phi with no incoming values".to_string()));
        }
        for &(_, pred) in incoming {
            self.block_ref(pred)?;
            let branches_here = self
                .function
                .terminator(pred)
                .is_some_and(|t| t.op.blocks().contains(&block));
            if !branches_here {
                return Err(self.error(format!(
                    "phi names `{}` which does not branch to `{}`",
                    self.function.block(pred).name,
                    self.function.block(block).name
                )));
            }
        }
        Ok(())
    }

    fn types(&self, inst: &Instruction) -> Result<(), VerifyError> {
        let types = &self.module.types;
        match &inst.op {
            Op::Alloca { .. } | Op::Br { .. } => Ok(()),
            Op::Load { ty, ptr } => {
                if types.pointee(self.type_of(*ptr)) == Some(*ty) {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "load of `{}` through `{}`",
                        self.ty(*ty),
                        self.ty(self.type_of(*ptr))
                    )))
                }
            }
            Op::Store { value, ptr } => {
                let vty = self.type_of(*value);
                if types.pointee(self.type_of(*ptr)) == Some(vty) {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "store of `{}` through `{}`",
                        self.ty(vty),
                        self.ty(self.type_of(*ptr))
                    )))
                }
            }
            Op::Binary { op, lhs, rhs } => {
                let (l, r) = (self.type_of(*lhs), self.type_of(*rhs));
                if l == r && types.is_int(l) {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "`{}` on `{}` and `{}`",
                        op.mnemonic(),
                        self.ty(l),
                        self.ty(r)
                    )))
                }
            }
            Op::ICmp { lhs, rhs, .. } => {
                let (l, r) = (self.type_of(*lhs), self.type_of(*rhs));
                if l == r && (types.is_int(l) || types.is_pointer(l)) {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "icmp on `{}` and `{}`",
                        self.ty(l),
                        self.ty(r)
                    )))
                }
            }
            Op::StructGep {
                struct_ty,
                ptr,
                index,
            } => {
                let ok = types.pointee(self.type_of(*ptr)) == Some(*struct_ty)
                    && types
                        .struct_fields(*struct_ty)
                        .is_some_and(|f| (*index as usize) < f.len());
                if ok {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "field {index} of `{}` through `{}`",
                        self.ty(*struct_ty),
                        self.ty(self.type_of(*ptr))
                    )))
                }
            }
            Op::Cast { op, value, to } => {
                let from = self.type_of(*value);
                let ok = match op {
                    CastOp::Bitcast => types.is_pointer(from) && types.is_pointer(*to),
                    CastOp::ZExt => matches!(
                        (types.int_bits(from), types.int_bits(*to)),
                        (Some(a), Some(b)) if a < b
                    ),
                    CastOp::Trunc => matches!(
                        (types.int_bits(from), types.int_bits(*to)),
                        (Some(a), Some(b)) if a > b
                    ),
                };
                if ok {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "{} from `{}` to `{}`",
                        op.mnemonic(),
                        self.ty(from),
                        self.ty(*to)
                    )))
                }
            }
            Op::Call {
                callee,
                fn_ty,
                args,
            } => self.call(*callee, *fn_ty, args),
            Op::Phi { ty, incoming } => {
                match incoming.iter().find(|(v, _)| self.type_of(*v) != *ty) {
                    Some((v, _)) => Err(self.error(format!(
                        "phi of `{}` has incoming `{}`",
                        self.ty(*ty),
                        self.ty(self.type_of(*v))
                    ))),
                    None => Ok(()),
                }
            }
            Op::CondBr { cond, .. } => {
                if self.type_of(*cond) == TypeId::I1 {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "branch condition of type `{}`",
                        self.ty(self.type_of(*cond))
                    )))
                }
            }
            Op::Ret { value } => {
                let expected = types.fn_sig(self.function.ty).map_or(TypeId::VOID, |s| s.ret);
                let found = value.map_or(TypeId::VOID, |v| self.type_of(v));
                if expected == found {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "returns `{}` but is declared to return `{}`",
                        self.ty(found),
                        self.ty(expected)
                    )))
                }
            }
        }
    }

    fn call(&self, callee: ValueId, fn_ty: TypeId, args: &[ValueId]) -> Result<(), VerifyError> {
        let types = &self.module.types;
        if types.pointee(self.type_of(callee)) != Some(fn_ty) {
            return Err(self.error(format!(
                "callee of type `{}` called as `{}`",
                self.ty(self.type_of(callee)),
                self.ty(fn_ty)
            )));
        }
        let Some(sig) = types.fn_sig(fn_ty) else {
            return Err(self.error(format!("call through `{}`", self.ty(fn_ty))));
        };
        let arity_ok = if sig.variadic {
            args.len() >= sig.params.len()
        } else {
            args.len() == sig.params.len()
        };
        if !arity_ok {
            return Err(self.error(format!(
                "call to `{}` with {} arguments, expected {}",
                self.ty(fn_ty),
                args.len(),
                sig.params.len()
            )));
        }
        for (i, (&arg, &param)) in args.iter().zip(&sig.params).enumerate() {
            if self.type_of(arg) != param {
                return Err(self.error(format!(
                    "argument {i} of call to `{}` is `{}`, expected `{}`",
                    self.ty(fn_ty),
                    self.ty(self.type_of(arg)),
                    self.ty(param)
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

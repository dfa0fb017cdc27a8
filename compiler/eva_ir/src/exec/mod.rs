//! Reference interpreter.
//!
//! Executes a verified [`Module`] directly, so generated code can be tested
//! without an LLVM toolchain. `printf` output is captured into a buffer
//! rather than written to the process's stdout; `malloc` (and `GC_malloc`)
//! allocate fresh slot vectors that are never freed.

mod memory;
mod printf;


use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub use memory::{Pointer, RtValue};

use crate::error::ExecError;
use crate::inst::{BinOp, CastOp, IntPredicate, Op};
use crate::module::{Constant, Module, ValueKind};
use crate::types::Type;
use crate::value_id::{BlockId, FunctionId, TypeId, ValueId};
use memory::{mask, slot_count, Memory};

/// Execution bounds.
#[derive(Clone, Copy, Debug)]
pub struct ExecLimits {
    pub max_steps: u64,
    pub max_depth: usize,
}

impl Default for ExecLimits {
    fn default() -> Self {
        ExecLimits {
            max_steps: 50_000_000,
            max_depth: 10_000,
        }
    }
}

/// Result of running `main`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecOutcome {
    pub exit_code: i64,
    pub stdout: String,
}

/// Run `main` with default limits.
pub fn run_main(module: &Module) -> Result<ExecOutcome, ExecError> {
    let mut interp = Interpreter::new(module);
    let result = interp.call("main", &[])?;
    Ok(ExecOutcome {
        exit_code: result.as_i64().unwrap_or(0),
        stdout: interp.take_output(),
    })
}

pub struct Interpreter<'m> {
    module: &'m Module,
    memory: Memory,
    globals: Vec<Pointer>,
    output: String,
    limits: ExecLimits,
    steps: u64,
    depth: usize,
}

type Frame = FxHashMap<ValueId, RtValue>;

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_limits(module, ExecLimits::default())
    }

    pub fn with_limits(module: &'m Module, limits: ExecLimits) -> Self {
        let mut interp = Interpreter {
            module,
            memory: Memory::default(),
            globals: Vec::new(),
            output: String::new(),
            limits,
            steps: 0,
            depth: 0,
        };
        interp.init_globals();
        interp
    }

    fn init_globals(&mut self) {
        let module = self.module;
        for (_, global) in module.globals() {
            let ptr = self
                .memory
                .allocate(slot_count(&module.types, global.value_ty));
            let mut flat = Vec::new();
            if let Some(init) = &global.init {
                self.flatten(global.value_ty, init, &mut flat);
            }
            for (i, value) in flat.into_iter().enumerate() {
                let slot = Pointer {
                    alloc: ptr.alloc,
                    offset: i as u64,
                };
                // Freshly allocated with the right size, so writes are in bounds.
                let _ = self.memory.write(slot, value);
            }
            self.globals.push(ptr);
        }
    }

    fn flatten(&self, ty: TypeId, constant: &Constant, out: &mut Vec<RtValue>) {
        let types = &self.module.types;
        match constant {
            Constant::Int(v) => out.push(RtValue::int(types.int_bits(ty).unwrap_or(64), *v)),
            Constant::Bytes(bytes) => out.extend(
                bytes
                    .iter()
                    .map(|&b| RtValue::int(8, i64::from(b))),
            ),
            Constant::Null => out.push(RtValue::Null),
            Constant::Function(f) => out.push(RtValue::Func(*f)),
            Constant::Struct(fields) => {
                let field_tys = types.struct_fields(ty).unwrap_or_default();
                for (c, &fty) in fields.iter().zip(field_tys) {
                    self.flatten(fty, c, out);
                }
            }
        }
    }

    /// Captured `printf` output so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Call the function named `name`.
    pub fn call(&mut self, name: &str, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let function = self
            .module
            .function_named(name)
            .ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;
        debug!(function = name, "interpreting");
        self.call_function(function, args.to_vec())
    }

    fn call_function(&mut self, id: FunctionId, args: Vec<RtValue>) -> Result<RtValue, ExecError> {
        let module = self.module;
        let function = module.function(id);
        if function.is_declaration() {
            return self.call_extern(&function.name, &args);
        }
        if self.depth >= self.limits.max_depth {
            return Err(ExecError::StackOverflow(self.limits.max_depth));
        }
        self.depth += 1;
        let result = eva_stack::maybe_grow(|| self.run_body(id, args));
        self.depth -= 1;
        result
    }

    fn call_extern(&mut self, name: &str, args: &[RtValue]) -> Result<RtValue, ExecError> {
        trace!(name, "extern call");
        match name {
            "printf" => {
                let Some(RtValue::Ptr(fmt_ptr)) = args.first().copied() else {
                    return Err(ExecError::BadFormat("format is not a string".to_string()));
                };
                let fmt = self.memory.c_string(fmt_ptr)?;
                let text = printf::format(&mut self.memory, &fmt, &args[1..])?;
                let written = i64::try_from(text.len()).unwrap_or(i64::MAX);
                self.output.push_str(&text);
                Ok(RtValue::int(32, written))
            }
            "malloc" | "GC_malloc" => {
                let size = args.first().and_then(|a| a.as_u64()).unwrap_or(0);
                Ok(RtValue::Ptr(self.memory.allocate(size)))
            }
            other => Err(ExecError::UnsupportedExtern(other.to_string())),
        }
    }

    fn step(&mut self) -> Result<(), ExecError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            Err(ExecError::StepLimit(self.limits.max_steps))
        } else {
            Ok(())
        }
    }

    fn run_body(&mut self, id: FunctionId, args: Vec<RtValue>) -> Result<RtValue, ExecError> {
        let module = self.module;
        let function = module.function(id);
        let mut frame: Frame = function.params.iter().copied().zip(args).collect();
        let Some(mut block) = function.entry_block() else {
            return Err(ExecError::Unsupported(format!("`{}` has no body", function.name)));
        };
        let mut prev: Option<BlockId> = None;

        loop {
            let insts = &function.block(block).insts;

            // Phis read their inputs as of block entry.
            let mut phi_values = Vec::new();
            for &inst_id in insts {
                let inst = function.inst(inst_id);
                let Op::Phi { incoming, .. } = &inst.op else {
                    break;
                };
                let from = incoming
                    .iter()
                    .find(|(_, b)| Some(*b) == prev)
                    .ok_or_else(|| ExecError::Unsupported("phi without matching predecessor".to_string()))?;
                let value = self.operand(&frame, from.0)?;
                if let Some(result) = inst.result {
                    phi_values.push((result, value));
                }
            }
            frame.extend(phi_values);

            let mut next = None;
            for &inst_id in insts {
                self.step()?;
                let inst = function.inst(inst_id);
                match &inst.op {
                    Op::Phi { .. } => {}
                    Op::Br { dest } => {
                        next = Some(*dest);
                        break;
                    }
                    Op::CondBr {
                        cond,
                        then_bb,
                        else_bb,
                    } => {
                        let taken = self.operand(&frame, *cond)?.as_u64().unwrap_or(0) != 0;
                        next = Some(if taken { *then_bb } else { *else_bb });
                        break;
                    }
                    Op::Ret { value } => {
                        return match value {
                            Some(v) => self.operand(&frame, *v),
                            None => Ok(RtValue::Undef),
                        };
                    }
                    op => {
                        let value = self.execute(&frame, op)?;
                        if let Some(result) = inst.result {
                            frame.insert(result, value);
                        }
                    }
                }
            }

            let Some(dest) = next else {
                return Err(ExecError::Unsupported(format!(
                    "block `{}` has no terminator",
                    function.block(block).name
                )));
            };
            prev = Some(block);
            block = dest;
        }
    }

    fn operand(&self, frame: &Frame, id: ValueId) -> Result<RtValue, ExecError> {
        let module = self.module;
        let data = module.value(id);
        let types = &module.types;
        Ok(match data.kind {
            ValueKind::ConstInt(v) => RtValue::int(types.int_bits(data.ty).unwrap_or(64), v),
            ValueKind::Null => RtValue::Null,
            ValueKind::Undef => RtValue::Undef,
            ValueKind::Function(f) => RtValue::Func(f),
            ValueKind::Global(g) | ValueKind::StringPtr(g) => RtValue::Ptr(self.globals[g.index()]),
            ValueKind::Param { .. } | ValueKind::Inst { .. } => *frame
                .get(&id)
                .ok_or_else(|| ExecError::UndefinedValue(data.name.clone()))?,
        })
    }

    fn pointer(&self, frame: &Frame, id: ValueId) -> Result<Pointer, ExecError> {
        match self.operand(frame, id)? {
            RtValue::Ptr(p) => Ok(p),
            RtValue::Null => Err(ExecError::NullDereference),
            other => Err(ExecError::Unsupported(format!("expected a pointer, found {other:?}"))),
        }
    }

    fn int(&self, frame: &Frame, id: ValueId) -> Result<(u32, u64), ExecError> {
        match self.operand(frame, id)? {
            RtValue::Int { bits, value } => Ok((bits, value)),
            RtValue::Undef => Err(ExecError::UndefinedValue(self.module.value(id).name.clone())),
            other => Err(ExecError::Unsupported(format!("expected an integer, found {other:?}"))),
        }
    }

    fn scalar_type(&self, ty: TypeId) -> Result<(), ExecError> {
        match self.module.types.get(ty) {
            Type::Int(_) | Type::Pointer(_) => Ok(()),
            _ => Err(ExecError::Unsupported(format!(
                "aggregate load/store of `{}`",
                self.module.types.display(ty)
            ))),
        }
    }

    fn execute(&mut self, frame: &Frame, op: &Op) -> Result<RtValue, ExecError> {
        let module = self.module;
        let types = &module.types;
        match op {
            Op::Alloca { ty } => Ok(RtValue::Ptr(self.memory.allocate(slot_count(types, *ty)))),
            Op::Load { ty, ptr } => {
                self.scalar_type(*ty)?;
                let p = self.pointer(frame, *ptr)?;
                self.memory.read(p)
            }
            Op::Store { value, ptr } => {
                self.scalar_type(module.type_of(*value))?;
                let v = self.operand(frame, *value)?;
                let p = self.pointer(frame, *ptr)?;
                self.memory.write(p, v)?;
                Ok(RtValue::Undef)
            }
            Op::Binary { op, lhs, rhs } => {
                let (bits, a) = self.int(frame, *lhs)?;
                let (_, b) = self.int(frame, *rhs)?;
                let value = match op {
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::SDiv => {
                        let sa = RtValue::Int { bits, value: a }.as_i64().unwrap_or(0);
                        let sb = RtValue::Int { bits, value: b }.as_i64().unwrap_or(0);
                        if sb == 0 {
                            return Err(ExecError::DivisionByZero);
                        }
                        sa.wrapping_div(sb) as u64
                    }
                };
                Ok(RtValue::Int {
                    bits,
                    value: mask(bits, value),
                })
            }
            Op::ICmp { pred, lhs, rhs } => {
                let l = self.operand(frame, *lhs)?;
                let r = self.operand(frame, *rhs)?;
                let result = match (l, r) {
                    (RtValue::Int { value: a, .. }, RtValue::Int { value: b, .. }) => match pred {
                        IntPredicate::Eq => a == b,
                        IntPredicate::Ne => a != b,
                        IntPredicate::Ugt => a > b,
                        IntPredicate::Uge => a >= b,
                        IntPredicate::Ult => a < b,
                        IntPredicate::Ule => a <= b,
                    },
                    (a, b) => match pred {
                        IntPredicate::Eq => a == b,
                        IntPredicate::Ne => a != b,
                        _ => {
                            return Err(ExecError::Unsupported(
                                "ordered comparison of pointers".to_string(),
                            ))
                        }
                    },
                };
                Ok(RtValue::int(1, i64::from(result)))
            }
            Op::StructGep {
                struct_ty,
                ptr,
                index,
            } => {
                let mut p = self.pointer(frame, *ptr)?;
                let fields = types.struct_fields(*struct_ty).unwrap_or_default();
                p.offset += fields
                    .iter()
                    .take(*index as usize)
                    .map(|&f| slot_count(types, f))
                    .sum::<u64>();
                Ok(RtValue::Ptr(p))
            }
            Op::Cast { op, value, to } => {
                let v = self.operand(frame, *value)?;
                match (op, v) {
                    (CastOp::Bitcast, v) => Ok(v),
                    (CastOp::ZExt | CastOp::Trunc, RtValue::Int { value, .. }) => {
                        let bits = types.int_bits(*to).unwrap_or(64);
                        Ok(RtValue::Int {
                            bits,
                            value: mask(bits, value),
                        })
                    }
                    (_, other) => Err(ExecError::Unsupported(format!(
                        "{} of {other:?}",
                        op.mnemonic()
                    ))),
                }
            }
            Op::Call { callee, args, .. } => {
                let target = match self.operand(frame, *callee)? {
                    RtValue::Func(f) => f,
                    RtValue::Null => return Err(ExecError::NullDereference),
                    other => {
                        return Err(ExecError::Unsupported(format!("call of {other:?}")));
                    }
                };
                let values = args
                    .iter()
                    .map(|&a| self.operand(frame, a))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_function(target, values)
            }
            Op::Phi { .. } | Op::Br { .. } | Op::CondBr { .. } | Op::Ret { .. } => Ok(RtValue::Undef),
        }
    }
}

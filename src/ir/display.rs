//! Textual IR, in the syntax of LLVM assembly with typed pointers.

use std::fmt::{self, Display, Formatter, Write};

use super::{
    Block, Function, GlobalString, InstKind, Instruction, IntPredicate, Module, StructType,
    Terminator, Value, ValueKind,
};

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        if !self.structs.is_empty() {
            writeln!(f)?;
            for ty in &self.structs {
                write_struct(f, ty)?;
            }
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                write_global(f, global)?;
            }
        }
        for function in &self.functions {
            writeln!(f)?;
            Printer {
                module: self,
                function,
            }
            .write_function(f)?;
        }
        Ok(())
    }
}

fn write_struct(f: &mut Formatter<'_>, ty: &StructType) -> fmt::Result {
    write!(f, "%{} = type {{", ty.name)?;
    for (i, field) in ty.fields.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(f, "{sep}{field}")?;
    }
    if !ty.fields.is_empty() {
        f.write_char(' ')?;
    }
    writeln!(f, "}}")
}

fn write_global(f: &mut Formatter<'_>, global: &GlobalString) -> fmt::Result {
    write!(
        f,
        "@{} = private unnamed_addr constant {} c\"",
        global.name,
        global.ty()
    )?;
    for &byte in &*global.bytes {
        if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
            f.write_char(char::from(byte))?;
        } else {
            write!(f, "\\{byte:02X}")?;
        }
    }
    writeln!(f, "\"")
}

struct Printer<'a> {
    module: &'a Module,
    function: &'a Function,
}

impl Printer<'_> {
    fn write_function(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let function = self.function;
        write!(f, "define {} @{}(", function.ret_ty, function.name)?;
        for (i, param) in function.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} %{}", param.ty, param.name)?;
        }
        writeln!(f, ") {{")?;
        for (i, (_, block)) in function.blocks().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            self.write_block(f, block)?;
        }
        writeln!(f, "}}")
    }

    fn write_block(&self, f: &mut Formatter<'_>, block: &Block) -> fmt::Result {
        writeln!(f, "{}:", block.label)?;
        for &id in &block.insts {
            f.write_str("  ")?;
            self.write_inst(f, self.function.inst(id))?;
            writeln!(f)?;
        }
        if let Some(terminator) = &block.terminator {
            f.write_str("  ")?;
            self.write_terminator(f, terminator)?;
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_inst(&self, f: &mut Formatter<'_>, inst: &Instruction) -> fmt::Result {
        if let Some(name) = &inst.name {
            write!(f, "%{name} = ")?;
        }
        match &inst.kind {
            InstKind::Alloca { allocated } => write!(f, "alloca {allocated}"),
            InstKind::Load { ptr } => write!(f, "load {}, {}", inst.ty, self.typed(ptr)),
            InstKind::Store { value, ptr } => {
                write!(f, "store {}, {}", self.typed(value), self.typed(ptr))
            }
            InstKind::Add { lhs, rhs } => write!(
                f,
                "add {} {}, {}",
                inst.ty,
                self.operand(lhs),
                self.operand(rhs)
            ),
            InstKind::ICmp { pred, lhs, rhs } => {
                let pred = match pred {
                    IntPredicate::Eq => "eq",
                    IntPredicate::Ne => "ne",
                };
                write!(
                    f,
                    "icmp {pred} {}, {}",
                    self.typed(lhs),
                    self.operand(rhs)
                )
            }
            InstKind::Call { callee, args } => {
                write!(f, "call {} @{callee}(", inst.ty)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.typed(arg))?;
                }
                f.write_char(')')
            }
            InstKind::BitCast { value } => {
                write!(f, "bitcast {} to {}", self.typed(value), inst.ty)
            }
        }
    }

    fn write_terminator(&self, f: &mut Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        let label = |id| &*self.function.block(id).label;
        match terminator {
            Terminator::Br(target) => write!(f, "br label %{}", label(*target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br {}, label %{}, label %{}",
                self.typed(cond),
                label(*then_block),
                label(*else_block)
            ),
            Terminator::Ret(None) => f.write_str("ret void"),
            Terminator::Ret(Some(value)) => write!(f, "ret {}", self.typed(value)),
            Terminator::Unreachable => f.write_str("unreachable"),
        }
    }

    fn operand<'v>(&'v self, value: &'v Value) -> Operand<'v> {
        Operand {
            printer: self,
            value,
            typed: false,
        }
    }

    fn typed<'v>(&'v self, value: &'v Value) -> Operand<'v> {
        Operand {
            printer: self,
            value,
            typed: true,
        }
    }
}

struct Operand<'v> {
    printer: &'v Printer<'v>,
    value: &'v Value,
    typed: bool,
}

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Printer { module, function } = self.printer;
        if self.typed {
            write!(f, "{} ", self.value.ty)?;
        }
        match &self.value.kind {
            ValueKind::ConstInt(n) => write!(f, "{n}"),
            ValueKind::Param(index) => write!(f, "%{}", function.params[*index].name),
            ValueKind::Inst(id) => match &function.inst(*id).name {
                Some(name) => write!(f, "%{name}"),
                None => f.write_str("undef"),
            },
            ValueKind::GlobalString(id) => {
                let global = module.global(*id);
                let ty = global.ty();
                write!(
                    f,
                    "getelementptr inbounds ({ty}, {ty}* @{}, i64 0, i64 0)",
                    global.name
                )
            }
        }
    }
}

//! A small, typed, block-structured IR modelled after LLVM's.
//!
//! A [`Module`] owns named struct types, global string constants and
//! functions. Each [`Function`] owns an arena of instructions and an arena
//! of basic blocks; blocks refer to instructions by [`InstId`], and branches
//! refer to blocks by [`BlockId`]. Function bodies are built through
//! [`builder::FunctionBuilder`].

pub mod builder;
mod display;

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    /// An integer of the given bit width.
    Int(u32),
    Ptr(Box<Type>),
    /// A named struct type, defined in the module.
    Struct(Box<str>),
    Array(u64, Box<Type>),
}

impl Type {
    pub const I1: Type = Type::Int(1);
    pub const I8: Type = Type::Int(8);
    pub const I32: Type = Type::Int(32);

    pub fn pointer_to(self) -> Type {
        Type::Ptr(Box::new(self))
    }

    pub fn is_void(&self) -> bool {
        *self == Type::Void
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Int(bits) => write!(f, "i{bits}"),
            Type::Ptr(inner) => write!(f, "{inner}*"),
            Type::Struct(name) => write!(f, "%{name}"),
            Type::Array(len, elem) => write!(f, "[{len} x {elem}]"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalId(u32);

impl InstId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl GlobalId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Converts an arena length into the next handle.
fn next_handle(len: usize) -> u32 {
    u32::try_from(len).expect("IR arena exceeds u32::MAX entries")
}

/// A typed operand.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub kind: ValueKind,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    ConstInt(i64),
    /// The n-th parameter of the enclosing function.
    Param(usize),
    /// The result of an instruction of the enclosing function.
    Inst(InstId),
    /// A pointer to the first byte of a global string constant.
    GlobalString(GlobalId),
}

impl Value {
    pub fn const_int(ty: Type, value: i64) -> Value {
        debug_assert!(ty.is_integer());
        Value {
            kind: ValueKind::ConstInt(value),
            ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub kind: InstKind,
    /// Result type. [`Type::Void`] for instructions without a result.
    pub ty: Type,
    /// Unique (within the function) result name.
    pub name: Option<Box<str>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InstKind {
    Alloca { allocated: Type },
    Load { ptr: Value },
    Store { value: Value, ptr: Value },
    Add { lhs: Value, rhs: Value },
    ICmp { pred: IntPredicate, lhs: Value, rhs: Value },
    Call { callee: Box<str>, args: Vec<Value> },
    BitCast { value: Value },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<Value>),
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret(_) | Terminator::Unreachable => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: Box<str>,
    pub insts: Vec<InstId>,
    pub terminator: Option<Terminator>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Box<str>,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: Box<str>,
    pub params: Vec<Param>,
    pub ret_ty: Type,
    insts: Vec<Instruction>,
    blocks: Vec<Block>,
    /// Order in which the attached blocks appear in the function body. The
    /// first one is the entry block.
    layout: Vec<BlockId>,
}

impl Function {
    pub fn signature(&self) -> Signature {
        Signature {
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            ret: self.ret_ty.clone(),
        }
    }

    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns the attached blocks, in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.layout.iter().map(|&id| (id, self.block(id)))
    }

    pub fn block_count(&self) -> usize {
        self.layout.len()
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    /// Returns the instructions of the given block, in order.
    pub fn block_insts(&self, id: BlockId) -> impl Iterator<Item = &Instruction> {
        self.block(id).insts.iter().map(|&inst| self.inst(inst))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructType {
    pub name: Box<str>,
    pub fields: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalString {
    pub name: Box<str>,
    /// NUL-terminated contents.
    pub bytes: Box<[u8]>,
}

impl GlobalString {
    pub fn ty(&self) -> Type {
        Type::Array(self.bytes.len() as u64, Box::new(Type::I8))
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Module {
    pub name: Box<str>,
    structs: Vec<StructType>,
    globals: Vec<GlobalString>,
    functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<Box<str>>) -> Module {
        Module {
            name: name.into(),
            ..Module::default()
        }
    }

    pub fn structs(&self) -> &[StructType] {
        &self.structs
    }

    pub fn globals(&self) -> &[GlobalString] {
        &self.globals
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructType> {
        self.structs.iter().find(|s| &*s.name == name)
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| &*f.name == name)
    }

    pub fn global(&self, id: GlobalId) -> &GlobalString {
        &self.globals[id.index()]
    }

    /// Defines a named struct type. The caller must ensure the name is not
    /// taken yet.
    pub fn add_struct(&mut self, ty: StructType) {
        debug_assert!(self.get_struct(&ty.name).is_none());
        self.structs.push(ty);
    }

    /// Adds a function. The caller must ensure the name is not taken yet.
    pub fn add_function(&mut self, function: Function) {
        debug_assert!(self.get_function(&function.name).is_none());
        self.functions.push(function);
    }

    /// Adds a private, NUL-terminated string constant and returns a pointer
    /// to its first byte, typed `i8*`.
    pub fn add_global_string(&mut self, contents: &str) -> Value {
        let id = GlobalId(next_handle(self.globals.len()));
        let name = match id.0 {
            0 => Box::from(".str"),
            n => format!(".str.{n}").into_boxed_str(),
        };
        let mut bytes = Vec::with_capacity(contents.len() + 1);
        bytes.extend_from_slice(contents.as_bytes());
        bytes.push(0);
        self.globals.push(GlobalString {
            name,
            bytes: bytes.into_boxed_slice(),
        });
        Value {
            kind: ValueKind::GlobalString(id),
            ty: Type::I8.pointer_to(),
        }
    }

    /// Truncates the globals list to the given length, discarding anything
    /// added afterwards.
    pub(crate) fn truncate_globals(&mut self, len: usize) {
        self.globals.truncate(len);
    }
}

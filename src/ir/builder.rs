use std::collections::{HashMap, HashSet};

use super::{
    next_handle, Block, BlockId, Function, InstId, InstKind, Instruction, IntPredicate, Param,
    Signature, Terminator, Type, Value, ValueKind,
};

/// Builds the body of a single function.
///
/// Instructions are always appended to the end of the current insertion
/// block. Blocks may be created detached and attached to the function layout
/// later, so that nested control flow can allocate its join blocks up front
/// while keeping a readable block order.
pub struct FunctionBuilder {
    function: Function,
    insert: BlockId,
    /// Values and labels share one namespace, like in LLVM.
    taken: HashSet<Box<str>>,
    /// Next suffix to try for each base name.
    suffixes: HashMap<Box<str>, u32>,
}

impl FunctionBuilder {
    /// The block every function starts in.
    pub const ENTRY: BlockId = BlockId(0);

    /// Starts a function with the given parameters and an attached `entry`
    /// block, which becomes the insertion point.
    pub fn new(name: impl Into<Box<str>>, params: Vec<(Box<str>, Type)>, ret_ty: Type) -> Self {
        let mut builder = FunctionBuilder {
            function: Function {
                name: name.into(),
                params: Vec::with_capacity(params.len()),
                ret_ty,
                insts: Vec::new(),
                blocks: Vec::new(),
                layout: Vec::new(),
            },
            insert: Self::ENTRY,
            taken: HashSet::new(),
            suffixes: HashMap::new(),
        };
        for (name, ty) in params {
            let name = builder.unique_name(&name);
            builder.function.params.push(Param { name, ty });
        }
        let entry = builder.create_block("entry");
        debug_assert_eq!(entry, Self::ENTRY);
        builder.attach_block(entry);
        builder
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn signature(&self) -> Signature {
        self.function.signature()
    }

    pub fn ret_ty(&self) -> &Type {
        &self.function.ret_ty
    }

    pub fn param(&self, index: usize) -> Value {
        Value {
            kind: ValueKind::Param(index),
            ty: self.function.params[index].ty.clone(),
        }
    }

    /// Creates a new, detached block with a unique label derived from the
    /// given one.
    pub fn create_block(&mut self, label: &str) -> BlockId {
        let id = BlockId(next_handle(self.function.blocks.len()));
        let label = self.unique_name(label);
        self.function.blocks.push(Block {
            label,
            insts: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Appends a detached block to the function layout.
    pub fn attach_block(&mut self, block: BlockId) {
        debug_assert!(!self.function.layout.contains(&block));
        self.function.layout.push(block);
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.insert = block;
    }

    pub fn insert_block(&self) -> BlockId {
        self.insert
    }

    /// Whether the insertion block already ends with a terminator.
    pub fn is_terminated(&self) -> bool {
        self.function.block(self.insert).terminator.is_some()
    }

    /// Whether any attached block branches to the given block.
    pub fn has_predecessors(&self, block: BlockId) -> bool {
        self.function
            .blocks()
            .filter_map(|(_, b)| b.terminator.as_ref())
            .any(|t| t.successors().contains(&block))
    }

    pub fn alloca(&mut self, allocated: Type, name: &str) -> Value {
        let ty = allocated.clone().pointer_to();
        self.push(InstKind::Alloca { allocated }, ty, Some(name))
    }

    pub fn load(&mut self, ty: Type, ptr: Value, name: &str) -> Value {
        debug_assert_eq!(ptr.ty.pointee(), Some(&ty));
        self.push(InstKind::Load { ptr }, ty, Some(name))
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        debug_assert_eq!(ptr.ty.pointee(), Some(&value.ty));
        self.push(InstKind::Store { value, ptr }, Type::Void, None);
    }

    pub fn add(&mut self, lhs: Value, rhs: Value, name: &str) -> Value {
        debug_assert_eq!(lhs.ty, rhs.ty);
        let ty = lhs.ty.clone();
        self.push(InstKind::Add { lhs, rhs }, ty, Some(name))
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value, name: &str) -> Value {
        debug_assert_eq!(lhs.ty, rhs.ty);
        self.push(InstKind::ICmp { pred, lhs, rhs }, Type::I1, Some(name))
    }

    /// Emits a call. Calls returning `void` produce no named value; the
    /// returned [`Value`] is then typed `void` and must not be used as an
    /// operand.
    pub fn call(&mut self, callee: &str, ret_ty: Type, args: Vec<Value>, name: &str) -> Value {
        let name = (!ret_ty.is_void()).then_some(name);
        let kind = InstKind::Call {
            callee: callee.into(),
            args,
        };
        self.push(kind, ret_ty, name)
    }

    pub fn bitcast(&mut self, value: Value, to: Type, name: &str) -> Value {
        self.push(InstKind::BitCast { value }, to, Some(name))
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        debug_assert_eq!(cond.ty, Type::I1);
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Ret(value));
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    pub fn finish(self) -> Function {
        debug_assert!(
            self.function.blocks().all(|(_, b)| b.terminator.is_some()),
            "every attached block of {} must be terminated",
            self.function.name
        );
        self.function
    }

    fn push(&mut self, kind: InstKind, ty: Type, name: Option<&str>) -> Value {
        debug_assert!(!self.is_terminated(), "appending past a terminator");
        let id = InstId(next_handle(self.function.insts.len()));
        let name = name.map(|name| self.unique_name(name));
        self.function.insts.push(Instruction {
            kind,
            ty: ty.clone(),
            name,
        });
        self.function.blocks[self.insert.index()].insts.push(id);
        Value {
            kind: ValueKind::Inst(id),
            ty,
        }
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.function.blocks[self.insert.index()];
        debug_assert!(block.terminator.is_none(), "block {} terminated twice", block.label);
        block.terminator = Some(terminator);
    }

    fn unique_name(&mut self, base: &str) -> Box<str> {
        let mut suffix = self.suffixes.get(base).copied().unwrap_or(0);
        loop {
            let candidate = match suffix {
                0 => Box::from(base),
                n => format!("{base}{n}").into_boxed_str(),
            };
            suffix += 1;
            if self.taken.insert(candidate.clone()) {
                self.suffixes.insert(base.into(), suffix);
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(function: &Function) -> Vec<&str> {
        function.blocks().map(|(_, b)| &*b.label).collect()
    }

    #[test]
    fn test_unique_labels() {
        let mut builder = FunctionBuilder::new("f", Vec::new(), Type::Void);
        let a = builder.create_block("then");
        let b = builder.create_block("then");
        let c = builder.create_block("entry");
        for block in [a, b, c] {
            builder.attach_block(block);
            builder.position_at_end(block);
            builder.ret(None);
        }
        builder.position_at_end(BlockId(0));
        builder.br(a);
        assert!(builder.has_predecessors(a));
        assert!(!builder.has_predecessors(b));
        let function = builder.finish();
        assert_eq!(labels(&function), ["entry", "then", "then1", "entry1"]);
    }

    #[test]
    fn test_detached_blocks_follow_attach_order() {
        let mut builder = FunctionBuilder::new("f", Vec::new(), Type::Void);
        let merge = builder.create_block("ifcont");
        let then = builder.create_block("then");
        builder.attach_block(then);
        builder.attach_block(merge);
        builder.br(then);
        for block in [then, merge] {
            builder.position_at_end(block);
            builder.ret(None);
        }
        assert_eq!(labels(&builder.finish()), ["entry", "then", "ifcont"]);
    }

    #[test]
    fn test_value_names_share_namespace_with_params() {
        let params = vec![(Box::from("a"), Type::I32)];
        let mut builder = FunctionBuilder::new("f", params, Type::I32);
        let a = builder.param(0);
        let slot = builder.alloca(Type::I32, "a");
        builder.store(a.clone(), slot.clone());
        let loaded = builder.load(Type::I32, slot, "a");
        let sum = builder.add(loaded, a, "addtmp");
        builder.ret(Some(sum));
        assert!(builder.is_terminated());

        let function = builder.finish();
        let names: Vec<_> = function
            .block_insts(BlockId(0))
            .map(|inst| inst.name.as_deref())
            .collect();
        assert_eq!(names, [Some("a1"), None, Some("a2"), Some("addtmp")]);
        assert_eq!(&*function.params[0].name, "a");
    }

    #[test]
    fn test_generated_names_skip_taken_ones() {
        let params = vec![(Box::from("x1"), Type::I32)];
        let mut builder = FunctionBuilder::new("f", params, Type::Void);
        let first = builder.alloca(Type::I32, "x");
        let second = builder.alloca(Type::I32, "x");
        builder.ret(None);
        let function = builder.finish();
        let name = |value: &Value| match value.kind {
            ValueKind::Inst(id) => function.inst(id).name.clone(),
            _ => None,
        };
        assert_eq!(name(&first).as_deref(), Some("x"));
        assert_eq!(name(&second).as_deref(), Some("x2"));
    }

    #[test]
    fn test_void_call_is_unnamed() {
        let mut builder = FunctionBuilder::new("f", Vec::new(), Type::Void);
        let value = builder.call("g", Type::Void, Vec::new(), "g_call");
        assert_eq!(value.ty, Type::Void);
        builder.ret(None);
        let function = builder.finish();
        let call = function.block_insts(BlockId(0)).next().unwrap();
        assert_eq!(call.name, None);
    }
}

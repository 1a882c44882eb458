use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::{
    ast::{
        BinaryOperator, Block, Decl, DeclKind, Expr, ExprKind, FunctionDecl, Ident,
        InterfaceDecl, Literal, Program, Stmt, StmtKind, StructDecl, TypeRef, VariableDecl,
    },
    diag::{Diagnostic, DiagnosticSink},
    ir::{builder::FunctionBuilder, IntPredicate, Module, Signature, StructType, Type, Value},
    token::Located,
};


pub const DEFAULT_MODULE_NAME: &str = "jlang";

type Result<T, E = Located<Error>> = std::result::Result<T, E>;

/// Lowers a whole program into a module named [`DEFAULT_MODULE_NAME`].
pub fn generate(
    program: &Program,
    sink: &mut dyn DiagnosticSink,
) -> Result<Module, Vec<Located<Error>>> {
    Generator::new(DEFAULT_MODULE_NAME).generate(program, sink)
}

/// Lowering of a [`Program`] into an IR [`Module`].
///
/// Every top-level declaration is lowered independently: the first error
/// found in a declaration aborts that declaration only, and nothing it
/// produced is kept in the module. Generation as a whole fails if any
/// declaration failed.
///
/// A function is declared once its signature maps, before its body is
/// lowered. Calls to a function whose body failed still resolve.
pub struct Generator {
    module: Module,
    declared: HashMap<Box<str>, Signature>,
    errors: Vec<Located<Error>>,
}

/// How a name is bound in the function being generated.
#[derive(Clone, Debug)]
enum Binding {
    /// Parameters are plain SSA values.
    Param(Value),
    /// Local variables live in a stack slot.
    Slot { ptr: Value, ty: Type },
}

/// Per-function generation state.
struct FunctionCtx {
    builder: FunctionBuilder,
    bindings: HashMap<Box<str>, Binding>,
}

impl Generator {
    pub fn new(module_name: &str) -> Generator {
        Generator {
            module: Module::new(module_name),
            declared: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn generate(
        mut self,
        program: &Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Module, Vec<Located<Error>>> {
        for decl in &program.decls {
            if let Err(error) = self.gen_decl(decl, sink) {
                debug!(line = error.line, "discarding declaration: {}", error.inner);
                self.errors.push(error);
            }
        }
        if self.errors.is_empty() {
            Ok(self.module)
        } else {
            Err(self.errors)
        }
    }

    fn gen_decl(&mut self, decl: &Decl, sink: &mut dyn DiagnosticSink) -> Result<()> {
        match &decl.kind {
            DeclKind::Interface(interface) => {
                Self::gen_interface(interface, decl.line, sink);
                Ok(())
            }
            DeclKind::Struct(strukt) => self.gen_struct(strukt, decl.line, sink),
            DeclKind::Function(function) => {
                let globals_before = self.module.globals().len();
                let result = self.gen_function(function, decl.line);
                if result.is_err() {
                    self.module.truncate_globals(globals_before);
                }
                result
            }
        }
    }

    /// Interfaces have no runtime representation.
    fn gen_interface(interface: &InterfaceDecl, line: u32, sink: &mut dyn DiagnosticSink) {
        trace!(name = %interface.name, methods = interface.methods.len(), "skipping interface");
        let message = format!("interface {} has no runtime representation", interface.name);
        sink.report(Diagnostic::trace(line, message));
    }

    fn gen_struct(
        &mut self,
        strukt: &StructDecl,
        line: u32,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        let name = &strukt.name;
        if self.module.get_struct(&name.name).is_some() {
            return Err(Located::new(name.line, Error::DuplicateStruct(name.name.clone())));
        }
        let fields = strukt
            .fields
            .iter()
            .map(|field| self.map_value_type(&field.ty, Position::Field, field.line))
            .collect::<Result<Vec<_>>>()?;
        trace!(name = %name, fields = fields.len(), "defined struct type");
        self.module.add_struct(StructType {
            name: name.name.clone(),
            fields,
        });
        sink.report(Diagnostic::trace(line, format!("defined struct type {name}")));
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(name = %function.name))]
    fn gen_function(&mut self, function: &FunctionDecl, line: u32) -> Result<()> {
        let name = &function.name;
        if self.declared.contains_key(&name.name) {
            return Err(Located::new(name.line, Error::DuplicateFunction(name.name.clone())));
        }
        let params = function
            .params
            .iter()
            .map(|param| {
                let ty = self.map_value_type(&param.ty, Position::Parameter, param.line)?;
                Ok((param.name.name.clone(), ty))
            })
            .collect::<Result<Vec<_>>>()?;
        let ret_ty = self
            .map_type(&function.return_ty)
            .map_err(|error| Located::new(line, error))?;

        let builder = FunctionBuilder::new(name.name.clone(), params, ret_ty);
        self.declared.insert(name.name.clone(), builder.signature());
        let bindings = function
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| (param.name.name.clone(), Binding::Param(builder.param(i))))
            .collect();
        let mut f = FunctionCtx { builder, bindings };

        self.gen_block(&mut f, &function.body)?;

        if !f.builder.is_terminated() {
            let current = f.builder.insert_block();
            if f.builder.ret_ty().is_void() {
                f.builder.ret(None);
            } else if current != FunctionBuilder::ENTRY && !f.builder.has_predecessors(current) {
                // Every path returned before reaching the join block.
                f.builder.unreachable();
            } else {
                return Err(Located::new(line, Error::MissingReturn(name.name.clone())));
            }
        }

        debug!("generated function");
        self.module.add_function(f.builder.finish());
        Ok(())
    }

    fn gen_block(&mut self, f: &mut FunctionCtx, block: &Block) -> Result<()> {
        for stmt in &block.statements {
            self.gen_stmt(f, stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, f: &mut FunctionCtx, stmt: &Stmt) -> Result<()> {
        if f.builder.is_terminated() {
            return Err(Located::new(stmt.line, Error::UnreachableStatement));
        }
        match &stmt.kind {
            StmtKind::Block(block) => self.gen_block(f, block),
            StmtKind::Expr(expr) => self.gen_expr(f, expr).map(drop),
            StmtKind::Var(var) => self.gen_variable(f, var, stmt.line),
            StmtKind::Return(value) => self.gen_return(f, value.as_ref(), stmt.line),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.gen_if(f, condition, then_branch, else_branch.as_deref()),
        }
    }

    fn gen_if(
        &mut self,
        f: &mut FunctionCtx,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<()> {
        let cond = self.gen_expr(f, condition)?;
        let cond = if cond.ty == Type::I1 {
            cond
        } else if cond.ty == Type::I32 {
            let zero = Value::const_int(Type::I32, 0);
            f.builder.icmp(IntPredicate::Ne, cond, zero, "ifcond")
        } else {
            return Err(Located::new(condition.line, Error::InvalidCondition(cond.ty)));
        };

        let then_block = f.builder.create_block("then");
        let else_block = f.builder.create_block("else");
        let merge_block = f.builder.create_block("ifcont");
        f.builder.cond_br(cond, then_block, else_block);

        f.builder.attach_block(then_block);
        f.builder.position_at_end(then_block);
        self.gen_stmt(f, then_branch)?;
        if !f.builder.is_terminated() {
            f.builder.br(merge_block);
        }

        f.builder.attach_block(else_block);
        f.builder.position_at_end(else_block);
        if let Some(else_branch) = else_branch {
            self.gen_stmt(f, else_branch)?;
        }
        if !f.builder.is_terminated() {
            f.builder.br(merge_block);
        }

        f.builder.attach_block(merge_block);
        f.builder.position_at_end(merge_block);
        Ok(())
    }

    fn gen_variable(&mut self, f: &mut FunctionCtx, var: &VariableDecl, line: u32) -> Result<()> {
        let ty = self.map_value_type(&var.ty, Position::Variable, line)?;
        let ptr = f.builder.alloca(ty.clone(), &var.name.name);
        if let Some(initializer) = &var.initializer {
            let value = self.gen_expr(f, initializer)?;
            expect_type(&ty, &value, initializer.line)?;
            f.builder.store(value, ptr.clone());
        }
        f.bindings.insert(var.name.name.clone(), Binding::Slot { ptr, ty });
        Ok(())
    }

    fn gen_return(&mut self, f: &mut FunctionCtx, value: Option<&Expr>, line: u32) -> Result<()> {
        let ret_ty = f.builder.ret_ty().clone();
        match value {
            None if ret_ty.is_void() => f.builder.ret(None),
            None => return Err(Located::new(line, Error::MissingReturnValue(ret_ty))),
            Some(_) if ret_ty.is_void() => {
                return Err(Located::new(line, Error::UnexpectedReturnValue));
            }
            Some(expr) => {
                let value = self.gen_expr(f, expr)?;
                expect_type(&ret_ty, &value, expr.line)?;
                f.builder.ret(Some(value));
            }
        }
        Ok(())
    }

    fn gen_expr(&mut self, f: &mut FunctionCtx, expr: &Expr) -> Result<Value> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Literal(Literal::Int(value)) => {
                Ok(Value::const_int(Type::I32, i64::from(*value)))
            }
            ExprKind::Literal(Literal::Str(contents)) => {
                Ok(self.module.add_global_string(contents))
            }
            ExprKind::Var(name) => match f.bindings.get(&name.name) {
                Some(Binding::Param(value)) => Ok(value.clone()),
                Some(Binding::Slot { ptr, ty }) => {
                    Ok(f.builder.load(ty.clone(), ptr.clone(), &name.name))
                }
                None => Err(Located::new(
                    name.line,
                    Error::UndefinedVariable(name.name.clone()),
                )),
            },
            ExprKind::Call { callee, args } => self.gen_call(f, callee, args, line),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.gen_expr(f, lhs)?;
                let rhs = self.gen_expr(f, rhs)?;
                self.gen_binary(f, *op, lhs, rhs, line)
            }
            ExprKind::Cast { target, expr } => {
                let value = self.gen_expr(f, expr)?;
                let to = self.map_value_type(target, Position::CastTarget, line)?;
                if value.ty.is_pointer() && to.is_pointer() {
                    Ok(f.builder.bitcast(value, to, "ptrcast"))
                } else {
                    let from = value.ty;
                    Err(Located::new(line, Error::UnsupportedCast { from, to }))
                }
            }
        }
    }

    fn gen_call(
        &mut self,
        f: &mut FunctionCtx,
        callee: &Ident,
        args: &[Expr],
        line: u32,
    ) -> Result<Value> {
        let signature = self.declared.get(&callee.name).cloned().ok_or_else(|| {
            Located::new(callee.line, Error::UnknownFunction(callee.name.clone()))
        })?;
        if signature.params.len() != args.len() {
            let error = Error::ArgumentCount {
                callee: callee.name.clone(),
                expected: signature.params.len(),
                actual: args.len(),
            };
            return Err(Located::new(line, error));
        }
        let mut values = Vec::with_capacity(args.len());
        for (arg, param_ty) in args.iter().zip(&signature.params) {
            let value = self.gen_expr(f, arg)?;
            expect_type(param_ty, &value, arg.line)?;
            values.push(value);
        }
        let name = format!("{}_call", callee.name);
        Ok(f.builder.call(&callee.name, signature.ret, values, &name))
    }

    fn gen_binary(
        &mut self,
        f: &mut FunctionCtx,
        op: BinaryOperator,
        lhs: Value,
        rhs: Value,
        line: u32,
    ) -> Result<Value> {
        let Some((_, lowering)) = BINARY_LOWERINGS.iter().find(|(o, _)| *o == op) else {
            return Err(Located::new(line, Error::UnsupportedOperator(op)));
        };
        if !lhs.ty.is_integer() || lhs.ty != rhs.ty {
            let error = Error::InvalidOperands {
                op,
                lhs: lhs.ty,
                rhs: rhs.ty,
            };
            return Err(Located::new(line, error));
        }
        Ok(match lowering {
            BinaryLowering::Add => f.builder.add(lhs, rhs, "addtmp"),
            BinaryLowering::ICmp(pred, name) => f.builder.icmp(*pred, lhs, rhs, name),
        })
    }

    /// Maps a type that must hold values, rejecting `void`.
    fn map_value_type(&self, ty: &TypeRef, position: Position, line: u32) -> Result<Type> {
        if ty.is_void() && !ty.is_pointer {
            return Err(Located::new(line, Error::VoidNotAllowed(position)));
        }
        self.map_type(ty).map_err(|error| Located::new(line, error))
    }

    /// Maps a source type reference onto an IR type. Struct names resolve
    /// only if the struct was defined earlier in the program.
    pub fn map_type(&self, ty: &TypeRef) -> Result<Type, Error> {
        let base = match &*ty.name {
            TypeRef::VOID if ty.is_pointer => {
                return Err(Error::VoidNotAllowed(Position::Pointee));
            }
            TypeRef::VOID => Type::Void,
            "int32" => Type::I32,
            "char" => Type::I8,
            name if self.module.get_struct(name).is_some() => Type::Struct(name.into()),
            name => return Err(Error::UnknownType(name.into())),
        };
        Ok(if ty.is_pointer {
            base.pointer_to()
        } else {
            base
        })
    }
}

enum BinaryLowering {
    Add,
    ICmp(IntPredicate, &'static str),
}

/// Operators without an entry here are parsed but cannot be lowered.
const BINARY_LOWERINGS: &[(BinaryOperator, BinaryLowering)] = &[
    (BinaryOperator::Add, BinaryLowering::Add),
    (BinaryOperator::Eq, BinaryLowering::ICmp(IntPredicate::Eq, "eqtmp")),
    (BinaryOperator::Ne, BinaryLowering::ICmp(IntPredicate::Ne, "netmp")),
];

fn expect_type(expected: &Type, value: &Value, line: u32) -> Result<()> {
    if *expected == value.ty {
        Ok(())
    } else {
        let error = Error::TypeMismatch {
            expected: expected.clone(),
            actual: value.ty.clone(),
        };
        Err(Located::new(line, error))
    }
}

/// Where a type reference appears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
    Variable,
    Field,
    Parameter,
    CastTarget,
    Pointee,
}

#[derive(Debug, PartialEq)]
pub enum Error {
    UnknownType(Box<str>),
    VoidNotAllowed(Position),
    UndefinedVariable(Box<str>),
    UnknownFunction(Box<str>),
    DuplicateFunction(Box<str>),
    DuplicateStruct(Box<str>),
    ArgumentCount {
        callee: Box<str>,
        expected: usize,
        actual: usize,
    },
    TypeMismatch {
        expected: Type,
        actual: Type,
    },
    InvalidOperands {
        op: BinaryOperator,
        lhs: Type,
        rhs: Type,
    },
    UnsupportedOperator(BinaryOperator),
    UnsupportedCast {
        from: Type,
        to: Type,
    },
    InvalidCondition(Type),
    MissingReturn(Box<str>),
    MissingReturnValue(Type),
    UnexpectedReturnValue,
    UnreachableStatement,
}

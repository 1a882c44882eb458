use crate::ast::*;
use std::io::Write;

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).expect("writing to a Vec is infallible");
    String::from_utf8(buf).expect("tree output is UTF-8")
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(256);
    print_expr(&mut buf, 0, expr).expect("writing to a Vec is infallible");
    String::from_utf8(buf).expect("tree output is UTF-8")
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for decl in &program.decls {
        print_decl(w, 0, decl)?;
    }
    Ok(())
}

fn print_decl(w: &mut impl Write, i: usize, decl: &Decl) -> std::io::Result<()> {
    let line = decl.line;
    sp(w, i)?;
    match &decl.kind {
        DeclKind::Interface(interface) => {
            writeln!(w, "interface {} @{line}", interface.name)?;
            for method in &interface.methods {
                sp(w, i + 1)?;
                writeln!(w, "method {method}")?;
            }
        }
        DeclKind::Struct(strukt) => {
            write!(w, "struct {}", strukt.name)?;
            if let Some(ref interface) = strukt.interface {
                write!(w, " -> {interface}")?;
            }
            writeln!(w, " @{line}")?;
            for field in &strukt.fields {
                sp(w, i + 1)?;
                writeln!(w, "field {}: {} @{}", field.name, field.ty, field.line)?;
            }
        }
        DeclKind::Function(function) => {
            write!(w, "function {}(", function.name)?;
            for (idx, param) in function.params.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{}: {}", param.name, param.ty)?;
            }
            writeln!(w, ") : {} @{line}", function.return_ty)?;
            for stmt in &function.body.statements {
                print_stmt(w, i + 1, stmt)?;
            }
        }
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    let line = stmt.line;
    sp(w, i)?;
    match &stmt.kind {
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            writeln!(w, "if @{line}")?;
            print_expr(w, i + 1, condition)?;
            sp(w, i + 1)?;
            writeln!(w, "then")?;
            print_stmt(w, i + 2, then_branch)?;
            if let Some(else_branch) = else_branch {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_stmt(w, i + 2, else_branch)?;
            }
        }
        StmtKind::Block(block) => {
            writeln!(w, "block @{line}")?;
            for stmt in &block.statements {
                print_stmt(w, i + 1, stmt)?;
            }
        }
        StmtKind::Expr(expr) => {
            writeln!(w, "expr @{line}")?;
            print_expr(w, i + 1, expr)?;
        }
        StmtKind::Var(var) => {
            write!(w, "var {}: {} @{line}", var.name, var.ty)?;
            if let Some(ref initializer) = var.initializer {
                writeln!(w, " (initialized)")?;
                print_expr(w, i + 1, initializer)?;
            } else {
                writeln!(w)?;
            }
        }
        StmtKind::Return(value) => {
            writeln!(w, "return @{line}")?;
            if let Some(value) = value {
                print_expr(w, i + 1, value)?;
            }
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let line = expr.line;
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            writeln!(w, "call {callee} @{line}")?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} @{line}")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Var(name) => writeln!(w, "ident {name} @{line}")?,
        ExprKind::Literal(Literal::Int(value)) => writeln!(w, "int {value} @{line}")?,
        ExprKind::Literal(Literal::Str(value)) => writeln!(w, "string \"{value}\" @{line}")?,
        ExprKind::Cast { target, expr } => {
            writeln!(w, "cast {target} @{line}")?;
            print_expr(w, i + 1, expr)?;
        }
    }
    Ok(())
}

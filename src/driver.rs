use tracing::{debug, info_span};

use crate::{
    codegen::{Generator, DEFAULT_MODULE_NAME},
    diag::{Diagnostic, DiagnosticSink},
    ir::Module,
    lexer::{self, SUGGESTED_TOKENS_CAPACITY},
    parser,
};

#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Name given to the generated module.
    pub module_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            module_name: DEFAULT_MODULE_NAME.to_owned(),
        }
    }
}

/// Why a compilation failed. Each variant carries the number of errors that
/// were reported to the sink.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    Syntax(usize),
    Semantic(usize),
}

/// Compiles a source string with the default options.
pub fn compile(src: &str, sink: &mut dyn DiagnosticSink) -> Result<Module, CompileError> {
    compile_with(src, &CompileOptions::default(), sink)
}

/// Runs the whole pipeline over a source string.
///
/// Every error found is reported to the sink as a [`Diagnostic`]. Syntax
/// errors stop the pipeline before code generation.
pub fn compile_with(
    src: &str,
    options: &CompileOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Module, CompileError> {
    let _span = info_span!("compile", module = %options.module_name).entered();

    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    if let Some(line) = lexer::lex_into(src, &mut tokens) {
        sink.report(Diagnostic::warning(line, "unterminated string literal"));
    }
    debug!(tokens = tokens.len(), "lexed");

    let program = match parser::parse(&tokens) {
        Ok(program) => program,
        Err((_, errors)) => {
            for error in &errors {
                sink.report(Diagnostic::error(error.line, error.inner.to_string()));
            }
            return Err(CompileError::Syntax(errors.len()));
        }
    };
    debug!(decls = program.decls.len(), "parsed");

    Generator::new(&options.module_name)
        .generate(&program, sink)
        .map_err(|errors| {
            for error in &errors {
                sink.report(Diagnostic::error(error.line, error.inner.to_string()));
            }
            CompileError::Semantic(errors.len())
        })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        diag::{Diagnostic, Severity},
        util::test_utils::configure_test_tracing,
    };

    #[test]
    fn test_compile_ok() {
        configure_test_tracing();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let module = compile("int32 main() { return 0; }", &mut sink).unwrap();
        assert_eq!(
            module.to_string(),
            indoc! {"
                ; ModuleID = 'jlang'

                define i32 @main() {
                entry:
                  ret i32 0
                }
            "}
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sample_compiles() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let module = compile(include_str!("../samples/sample.j"), &mut sink).unwrap();
        let names: Vec<_> = module.functions().iter().map(|f| &*f.name).collect();
        assert_eq!(names, ["log", "add", "sign", "countdown", "main"]);
        assert_eq!(module.structs().len(), 2);
        assert_eq!(module.globals().len(), 4);
        assert!(sink.iter().all(|d| d.severity == Severity::Trace));
    }

    #[test]
    fn test_module_name_option() {
        let options = CompileOptions {
            module_name: "demo".to_owned(),
        };
        let module = compile_with("", &options, &mut Vec::<Diagnostic>::new()).unwrap();
        assert_eq!(module.to_string(), "; ModuleID = 'demo'\n");
    }

    #[test]
    fn test_syntax_errors_stop_before_codegen() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = compile("void f() { g(; }\nvoid h() { undefined(); }", &mut sink);
        assert_eq!(result, Err(CompileError::Syntax(1)));
        assert_eq!(
            sink,
            [Diagnostic::error(
                1,
                "expected an expression, but got Semicolon"
            )]
        );
    }

    #[test]
    fn test_unterminated_string_is_a_warning() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = compile("void f() { }\n\"dangling", &mut sink);
        assert!(result.is_ok());
        assert_eq!(
            sink,
            [Diagnostic::warning(2, "unterminated string literal")]
        );
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let src = indoc! {"
            interface I { void f(); }
            void a() { missing(); }
            void b() { var x void; }
        "};
        let result = compile(src, &mut sink);
        assert_eq!(result, Err(CompileError::Semantic(2)));
        let reported: Vec<_> = sink
            .iter()
            .map(|d| (d.severity, d.line, d.message.as_str()))
            .collect();
        assert_eq!(
            reported,
            [
                (Severity::Trace, Some(1), "interface I has no runtime representation"),
                (Severity::Error, Some(2), "unknown function missing"),
                (
                    Severity::Error,
                    Some(3),
                    "void is not allowed as a variable type"
                ),
            ]
        );
    }
}

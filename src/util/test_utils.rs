use std::{fmt::Display, sync::Once};

use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    codegen::Generator,
    diag::Diagnostic,
    parser,
    token::Located,
    util::fmt::tree,
};

/// Installs a global subscriber that honors `RUST_LOG` and writes through
/// the test harness, so logs only show up for failing tests.
pub fn configure_test_tracing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        fmt::Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

pub fn format_errors<E>(errors: &[Located<E>]) -> Vec<String>
where
    Located<E>: Display,
{
    errors.iter().map(|e| format!("{e:#}")).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    /// The "tree" of a code generation test is the printed module.
    CodegenProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    configure_test_tracing();

    match test {
        Test::ParserProgram(input) => {
            let (prog, errors) = match parser::parse_program(input) {
                Ok(prog) => (prog, vec![]),
                Err((prog, errors)) => (prog, errors),
            };
            let tree = tree::print_program_string(&prog);
            (tree, format_errors(&errors))
        }
        Test::ParserExpr(input) => match parser::parse_expr(input) {
            Ok(expr) => (tree::print_expr_string(&expr), vec![]),
            Err(errors) => (String::new(), format_errors(&errors)),
        },
        Test::CodegenProgram(input) => {
            let (prog, errors) = match parser::parse_program(input) {
                Ok(prog) => (prog, vec![]),
                Err((prog, errors)) => (prog, errors),
            };
            let mut fmt_errors = format_errors(&errors);

            let mut diagnostics: Vec<Diagnostic> = Vec::new();
            let ir = match Generator::new("test").generate(&prog, &mut diagnostics) {
                Ok(module) => module.to_string(),
                Err(errors) => {
                    fmt_errors.extend(format_errors(&errors));
                    String::new()
                }
            };
            (ir, fmt_errors)
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(codegen, program), $source:expr) => {
        crate::util::test_utils::Test::CodegenProgram($source)
    };
}
pub(crate) use tree_tests;

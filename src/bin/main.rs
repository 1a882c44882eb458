use std::{env, fs, process::ExitCode};

use jlang::{
    diag::{Diagnostic, DiagnosticSink, Severity, TracingSink},
    driver::{self, CompileOptions},
};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: jlang <file> [module-name]";

fn main() -> ExitCode {
    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(path), module_name, None) = (args.next(), args.next(), args.next()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let src = match fs::read_to_string(&path) {
        Ok(src) => src,
        Err(error) => {
            eprintln!("failed to read {path}: {error}");
            return ExitCode::from(2);
        }
    };

    let options = match module_name {
        Some(module_name) => CompileOptions { module_name },
        None => CompileOptions::default(),
    };
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = driver::compile_with(&src, &options, &mut diagnostics);
    for diagnostic in diagnostics {
        if diagnostic.severity == Severity::Trace {
            TracingSink.report(diagnostic);
        } else {
            eprintln!("{path}: {diagnostic}");
        }
    }

    match result {
        Ok(module) => {
            print!("{module}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{path}: compilation failed with {error}");
            ExitCode::from(1)
        }
    }
}

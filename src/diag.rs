use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Trace => "trace",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Source line, when the diagnostic is tied to one.
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn new(severity: Severity, line: Option<u32>, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            line,
        }
    }

    pub fn trace(line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Trace, Some(line), message)
    }

    pub fn warning(line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Warning, Some(line), message)
    }

    pub fn error(line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(Severity::Error, Some(line), message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: line {line}: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Receives the diagnostics produced during a compilation.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing`, at the level matching its
/// severity.
#[derive(Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            message,
            line,
        } = diagnostic;
        match severity {
            Severity::Trace => tracing::debug!(line, "{message}"),
            Severity::Warning => tracing::warn!(line, "{message}"),
            Severity::Error => tracing::error!(line, "{message}"),
        }
    }
}

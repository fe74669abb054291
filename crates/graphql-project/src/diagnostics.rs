use graphql_extract::Range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// Which stage of the pipeline produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSource {
    Syntax,
    Validation,
    Deprecation,
}

impl DiagnosticSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "GraphQL: Syntax",
            Self::Validation => "GraphQL: Validation",
            Self::Deprecation => "GraphQL: Deprecation",
        }
    }
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic message (error, warning, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,

    /// Range where the diagnostic applies
    pub range: Range,

    /// Diagnostic message
    pub message: String,

    /// Optional diagnostic code, usually the name of the rule that fired
    pub code: Option<String>,

    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn syntax(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            range,
            message: message.into(),
            code: None,
            source: DiagnosticSource::Syntax,
        }
    }

    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            range,
            message: message.into(),
            code: None,
            source: DiagnosticSource::Validation,
        }
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            range,
            message: message.into(),
            code: None,
            source: DiagnosticSource::Validation,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub const fn with_source(mut self, source: DiagnosticSource) -> Self {
        self.source = source;
        self
    }

    /// Move the diagnostic down by `lines`, for snippets embedded in a host file
    #[must_use]
    pub const fn offset_lines(mut self, lines: usize) -> Self {
        self.range = self.range.offset_lines(lines);
        self
    }
}

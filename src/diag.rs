use thiserror::Error;

use crate::name::Name;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Information => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One entry of the message log. Appended, never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Information,
            span,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}: {}\n{}", self.severity, self.message, span),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Everything a command elaborator can fail with. Errors short-circuit the
/// command they arise in and are folded into the message log at the
/// dispatcher boundary; no variant aborts the whole module.
#[derive(Debug, Clone, Error)]
pub enum ElabError {
    #[error("unexpected syntax: {kind}")]
    UnexpectedSyntax {
        kind: &'static str,
        span: Option<Span>,
    },
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: Name, span: Option<Span> },
    #[error("ambiguous identifier '{name}', candidates: {}", fmt_candidates(.candidates))]
    AmbiguousIdentifier {
        name: Name,
        candidates: Vec<Name>,
        span: Option<Span>,
    },
    #[error("notation '{token}' conflicts with an existing one")]
    AmbiguousNotation { token: String, span: Option<Span> },
    // internal invariant violation: the root scope is never popped
    #[error("no open scope")]
    NoOpenScope,
    #[error("invalid 'end', expected '{expected}' but found '{found}'")]
    EndNameMismatch {
        expected: Name,
        found: Name,
        span: Option<Span>,
    },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput { span: Option<Span> },
}

fn fmt_candidates(candidates: &[Name]) -> String {
    candidates
        .iter()
        .map(Name::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ElabError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            ElabError::UnexpectedSyntax { span, .. }
            | ElabError::UnknownIdentifier { span, .. }
            | ElabError::AmbiguousIdentifier { span, .. }
            | ElabError::AmbiguousNotation { span, .. }
            | ElabError::EndNameMismatch { span, .. }
            | ElabError::UnexpectedEndOfInput { span } => span.as_ref(),
            ElabError::NoOpenScope => None,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let message = self.to_string();
        Diagnostic::error(message, self.span().cloned())
    }
}

#[easy_ext::ext(ResultSpanExt)]
pub impl<T> Result<T, ElabError> {
    /// Attaches `span` to an error that was raised without one.
    fn with_span(self, span: Option<&Span>) -> Result<T, ElabError> {
        self.map_err(|err| {
            if err.span().is_some() {
                return err;
            }
            let span = span.cloned();
            match err {
                ElabError::UnexpectedSyntax { kind, .. } => {
                    ElabError::UnexpectedSyntax { kind, span }
                }
                ElabError::UnknownIdentifier { name, .. } => {
                    ElabError::UnknownIdentifier { name, span }
                }
                ElabError::AmbiguousIdentifier {
                    name, candidates, ..
                } => ElabError::AmbiguousIdentifier {
                    name,
                    candidates,
                    span,
                },
                ElabError::AmbiguousNotation { token, .. } => {
                    ElabError::AmbiguousNotation { token, span }
                }
                ElabError::EndNameMismatch {
                    expected, found, ..
                } => ElabError::EndNameMismatch {
                    expected,
                    found,
                    span,
                },
                ElabError::UnexpectedEndOfInput { .. } => ElabError::UnexpectedEndOfInput { span },
                ElabError::NoOpenScope => ElabError::NoOpenScope,
            }
        })
    }
}

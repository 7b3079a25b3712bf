//! Non-fatal findings collected during generation.
//!
//! Fatal problems abort the run through [`GenerateError`](super::GenerateError);
//! everything else (name collisions today) is recorded here, logged as it is
//! pushed, and handed back to the caller next to the generated files.

use std::fmt::{Display, Formatter};
use tracing::{info, warn};

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// May produce surprising identifiers but generation continues
    Warning,
    /// Informational note
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the issue occurred (e.g. "types in module crate::admin")
    pub location: String,
    pub severity: Severity,
    /// Machine-readable kind (e.g. "name_collision")
    pub kind: String,
    pub message: String,
    /// Optional suggestion for how to fix it
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        location: impl Into<String>,
        severity: Severity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            location: location.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {})", suggestion)?;
        }
        Ok(())
    }
}

/// Ordered list of diagnostics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!(
                kind = %diagnostic.kind,
                location = %diagnostic.location,
                "{}",
                diagnostic.message
            ),
            Severity::Info => info!(
                kind = %diagnostic.kind,
                location = %diagnostic.location,
                "{}",
                diagnostic.message
            ),
        }
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Print diagnostics for humans, grouped by severity.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    let warnings = diagnostics.warnings().count();
    eprintln!(
        "\n{} diagnostic(s), {} warning(s):",
        diagnostics.len(),
        warnings
    );
    for diagnostic in diagnostics.iter() {
        eprintln!("  {}", diagnostic);
    }
}

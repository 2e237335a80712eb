//! Validation diagnostics collected while checking a network.
//!
//! Stages validate their input before running; errors abort the stage,
//! warnings are logged and the stage proceeds.

/// Severity of a diagnostic issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single issue found during validation.
#[derive(Debug, Clone)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Short category tag, e.g. "topology" or "series"
    pub category: String,
    pub message: String,
}

/// Accumulator for validation issues.
#[derive(Debug, Default)]
pub struct Diagnostics {
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues.push(DiagnosticIssue {
            severity: Severity::Error,
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues.push(DiagnosticIssue {
            severity: Severity::Warning,
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    pub fn issues(&self) -> &[DiagnosticIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Render all issues as one message, for error reporting.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| {
                let tag = match i.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                format!("[{tag}/{}] {}", i.category, i.message)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_and_warning_split() {
        let mut diag = Diagnostics::new();
        diag.add_warning("types", "unregistered line type");
        diag.add_error("topology", "self-loop");

        assert!(diag.has_errors());
        assert_eq!(diag.errors().count(), 1);
        assert_eq!(diag.warnings().count(), 1);
        assert!(diag.summary().contains("self-loop"));
    }
}

//! Non-fatal findings collected while extracting annotations from a file.
//!
//! Nothing in the extraction engine aborts a scan. Malformed doc-comments,
//! misplaced annotations and entities that fail validation are reported here
//! instead, and mirrored to the `log` facade so they show up on the console.

use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something was lost, e.g. a doc-comment that failed to parse
    Warning,
    /// Something looked off but extraction continued as expected
    Notice,
}

/// A single finding with the location label it was raised under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.message, self.location)
    }
}

/// Diagnostic sink owned by a single file scan.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn warning(&mut self, message: impl Into<String>, location: &str) {
        self.push(Severity::Warning, message.into(), location);
    }

    /// Records a notice and logs it.
    pub fn notice(&mut self, message: impl Into<String>, location: &str) {
        self.push(Severity::Notice, message.into(), location);
    }

    fn push(&mut self, severity: Severity, message: String, location: &str) {
        let diagnostic = Diagnostic {
            severity,
            message,
            location: location.to_string(),
        };
        match severity {
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Notice => info!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order_with_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("broken comment", "a.php on line 3");
        diagnostics.notice("stray api", "a.php on line 9");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.entries()[0].severity, Severity::Warning);
        assert_eq!(diagnostics.entries()[1].severity, Severity::Notice);
        assert_eq!(diagnostics.entries()[1].location, "a.php on line 9");
        assert!(diagnostics.contains("stray"));
    }

    #[test]
    fn test_display_includes_location() {
        let diagnostic = Diagnostic {
            severity: Severity::Notice,
            message: "oops".to_string(),
            location: "Foo in foo.php on line 1".to_string(),
        };
        assert_eq!(diagnostic.to_string(), "oops in Foo in foo.php on line 1");
    }
}

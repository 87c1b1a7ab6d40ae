//! Batch error taxonomy
//!
//! Every failure inside batch processing is surfaced as a categorized
//! `BatchError` carrying an optional entry index and a recovery suggestion
//! chosen by keyword-matching the raw message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a batch processing error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Parsing,
    Validation,
    Database,
    Rollback,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Parsing => "parsing",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Database => "database",
            ErrorCategory::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// Severity of a batch processing error. A critical error triggers a
/// rollback attempt for already-applied siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Error,
    Critical,
}

/// A structured per-entry error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    /// 0-based index of the failed entry within its batch
    pub entry_index: Option<usize>,
    /// Short description of the entry, e.g. "cement 50kg: 10 bag"
    pub entry_details: Option<String>,
    pub suggestion: Option<String>,
}

impl BatchError {
    /// Create an error, categorizing it from the message when no explicit
    /// category is given.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let (category, suggestion) = Self::categorize(&message);
        Self {
            category,
            severity: ErrorSeverity::Error,
            message,
            entry_index: None,
            entry_details: None,
            suggestion: Some(suggestion.to_string()),
        }
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_entry(mut self, index: usize, details: impl Into<String>) -> Self {
        self.entry_index = Some(index);
        self.entry_details = Some(details.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == ErrorSeverity::Critical
    }

    /// Categorize a raw error message and pick a generic suggestion
    pub fn categorize(message: &str) -> (ErrorCategory, &'static str) {
        let lowered = message.to_lowercase();

        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

        if contains_any(&["database", "airtable", "connection", "timeout", "rate limit"]) {
            (ErrorCategory::Database, "Please try again later or with fewer items.")
        } else if contains_any(&["rollback", "revert", "undo"]) {
            (
                ErrorCategory::Rollback,
                "Some operations could not be undone. Please check inventory.",
            )
        } else if contains_any(&["parse", "format", "syntax", "invalid input"]) {
            (ErrorCategory::Parsing, "Check the format of your command.")
        } else {
            (ErrorCategory::Validation, "Please verify your input and try again.")
        }
    }

    /// Format for user display: "Entry #3: message (details) Suggestion: ..."
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if let Some(index) = self.entry_index {
            parts.push(format!("Entry #{}:", index + 1));
        }
        parts.push(self.message.clone());
        if let Some(details) = &self.entry_details {
            parts.push(format!("({})", details));
        }
        if let Some(suggestion) = &self.suggestion {
            parts.push(format!("Suggestion: {}", suggestion));
        }
        parts.join(" ")
    }
}

/// Group errors by category into a short summary line
pub fn summarize(errors: &[BatchError]) -> String {
    if errors.is_empty() {
        return "No errors.".to_string();
    }

    let mut counts: Vec<(ErrorCategory, usize)> = Vec::new();
    for error in errors {
        match counts.iter_mut().find(|(category, _)| *category == error.category) {
            Some((_, count)) => *count += 1,
            None => counts.push((error.category, 1)),
        }
    }

    counts
        .iter()
        .map(|(category, count)| format!("{} errors: {}", capitalize(&category.to_string()), count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Overall recovery advice based on the predominant error category
pub fn recovery_suggestion(errors: &[BatchError]) -> &'static str {
    if errors.is_empty() {
        return "";
    }
    if errors.iter().any(|e| e.category == ErrorCategory::Database) {
        "There were database connection issues. Try again later or with fewer items."
    } else if errors.iter().any(|e| e.category == ErrorCategory::Rollback) {
        "Some operations could not be undone. Please verify your inventory for consistency."
    } else if errors.iter().any(|e| e.category == ErrorCategory::Parsing) {
        "There were issues with the format of your command. Check syntax and try again."
    } else {
        "Please check your input data and ensure all required fields are provided correctly."
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_message_keywords() {
        assert_eq!(BatchError::categorize("connection timeout").0, ErrorCategory::Database);
        assert_eq!(BatchError::categorize("rate limit exceeded").0, ErrorCategory::Database);
        assert_eq!(BatchError::categorize("could not revert entry").0, ErrorCategory::Rollback);
        assert_eq!(BatchError::categorize("bad format near line 2").0, ErrorCategory::Parsing);
        assert_eq!(BatchError::categorize("quantity is required").0, ErrorCategory::Validation);
    }

    #[test]
    fn format_includes_one_based_entry_index() {
        let error = BatchError::new("Insufficient stock")
            .with_entry(2, "Steel 12mm: 20 piece")
            .with_suggestion("Reduce the quantity");
        let formatted = error.format();
        assert!(formatted.starts_with("Entry #3:"), "{}", formatted);
        assert!(formatted.contains("(Steel 12mm: 20 piece)"));
        assert!(formatted.contains("Suggestion: Reduce the quantity"));
    }

    #[test]
    fn summarize_groups_by_category() {
        let errors = vec![
            BatchError::new("database down"),
            BatchError::new("database still down"),
            BatchError::new("missing quantity"),
        ];
        let summary = summarize(&errors);
        assert!(summary.contains("Database errors: 2"), "{}", summary);
        assert!(summary.contains("Validation errors: 1"), "{}", summary);
    }

    #[test]
    fn recovery_prefers_database_issues() {
        let errors = vec![BatchError::new("missing field"), BatchError::new("airtable timeout")];
        assert!(recovery_suggestion(&errors).contains("database connection issues"));
        assert_eq!(recovery_suggestion(&[]), "");
    }
}

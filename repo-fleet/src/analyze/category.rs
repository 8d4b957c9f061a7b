//! Workflow categories tracked for failures.

use std::collections::HashSet;

/// Workflow names tallied when the configuration does not name any.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "CodeQL Security Analysis",
    "Code Quality",
    "Security Audit",
    "Dependency Review",
    "Tests",
    "Documentation",
];

/// A named class of CI workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowCategory(String);

impl WorkflowCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether the name contains `filter`, ignoring case.
    pub fn matches(&self, filter: &str) -> bool {
        self.0.to_lowercase().contains(&filter.to_lowercase())
    }

    /// Report header for this category, e.g. `CODEQL FAILURES`.
    pub fn header(&self) -> String {
        format!("{} FAILURES", self.0.to_uppercase())
    }
}

/// Keeps the categories matching `filter`, in configured order.
///
/// Names differing only in case are kept once, so a single failed run can
/// never be counted under two categories.
pub fn select_categories(names: &[String], filter: Option<&str>) -> Vec<WorkflowCategory> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(WorkflowCategory::new)
        .filter(|category| filter.map_or(true, |f| category.matches(f)))
        .filter(|category| seen.insert(category.name().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    }

    fn names(categories: &[WorkflowCategory]) -> Vec<&str> {
        categories.iter().map(WorkflowCategory::name).collect()
    }

    #[test]
    fn no_filter_keeps_everything() {
        assert_eq!(select_categories(&defaults(), None).len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn filter_is_case_insensitive() {
        let selected = select_categories(&defaults(), Some("codeql"));
        assert_eq!(names(&selected), ["CodeQL Security Analysis"]);
    }

    #[test]
    fn filter_matches_substrings() {
        let selected = select_categories(&defaults(), Some("SECURITY"));
        assert_eq!(names(&selected), ["CodeQL Security Analysis", "Security Audit"]);
    }

    #[test]
    fn unmatched_filter_selects_nothing() {
        assert!(select_categories(&defaults(), Some("deploy")).is_empty());
    }

    #[test]
    fn duplicate_names_are_dropped() {
        let names_in = vec!["Tests".to_string(), "tests".to_string(), "Lint".to_string()];
        let selected = select_categories(&names_in, None);
        assert_eq!(names(&selected), ["Tests", "Lint"]);
    }

    #[test]
    fn header_is_uppercased() {
        assert_eq!(WorkflowCategory::new("CodeQL").header(), "CODEQL FAILURES");
    }
}

//! Report renderer.

use super::ReportError;
use crate::analyze::FailureAnalysis;
use crate::pages::PagesAudit;
use crate::summary::{FleetEntry, FleetSummary};
use crate::sync::{SyncOutcome, SyncStatus};
use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};

const SYNC: &str = "sync";
const CHECK: &str = "check";
const ANALYSIS: &str = "analysis";
const PAGES: &str = "pages";

const SYNC_TEMPLATE: &str = "{{#each entries}}{{name}}: {{marker}}\n{{/each}}\
Synced: {{synced}}, Failed: {{failed}}\
{{#if skipped}}, Skipped: {{skipped}}{{/if}}\
{{#if cancelled}}, Cancelled: {{cancelled}}{{/if}}\n";

const CHECK_TEMPLATE: &str = "{{#each drifted}}{{name}}:\n\
{{#each lines}}  {{this}}\n{{/each}}\
{{#if hidden}}  ... and {{hidden}} more\n{{/if}}{{/each}}\
{{#if changes}}Repositories with changes: {{changes}}/{{total}}\
{{else}}All repositories are clean!{{/if}}\n\
{{#if indeterminate}}Repositories that could not be queried: {{indeterminate}}\n{{/if}}\
{{#if cancelled}}Cancelled: {{cancelled}}\n{{/if}}";

const ANALYSIS_TEMPLATE: &str = "{{#each categories}}{{#unless @first}}\n{{/unless}}\
{{header}}\n{{#each failures}}{{repository}}: {{count}}\n{{/each}}{{/each}}\
{{#if indeterminate}}Unanswered queries, counted as zero: {{indeterminate}}\n{{/if}}\
{{#if cancelled}}Cancelled: {{cancelled}}\n{{/if}}";

const PAGES_TEMPLATE: &str = "{{#each flagged}}{{this}}: pages workflow present, Pages disabled\n\
{{/each}}{{#if indeterminate}}Unanswered probes: {{indeterminate}}\n{{/if}}\
{{#if cancelled}}Cancelled: {{cancelled}}\n{{/if}}";

/// Creates a Handlebars registry for plain-text reports.
///
/// The registry is configured with:
/// - No HTML escaping (output is plain text)
/// - Strict mode (catches missing variables)
/// - The four built-in report templates
///
/// # Errors
///
/// Returns [`ReportError`] if a built-in template fails to parse.
pub fn create_report_registry() -> Result<Handlebars<'static>, ReportError> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);

    hbs.register_template_string(SYNC, SYNC_TEMPLATE)?;
    hbs.register_template_string(CHECK, CHECK_TEMPLATE)?;
    hbs.register_template_string(ANALYSIS, ANALYSIS_TEMPLATE)?;
    hbs.register_template_string(PAGES, PAGES_TEMPLATE)?;

    Ok(hbs)
}

/// Renders command results into report text.
pub struct ReportRenderer {
    handlebars: Handlebars<'static>,
}

impl ReportRenderer {
    /// Creates a renderer with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if a built-in template fails to parse.
    pub fn new() -> Result<Self, ReportError> {
        Ok(Self {
            handlebars: create_report_registry()?,
        })
    }

    /// One line per repository, then the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_sync(&self, summary: &FleetSummary) -> Result<String, ReportError> {
        let entries: Vec<Value> = summary
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                FleetEntry::Sync(outcome) => Some(json!({
                    "name": outcome.repository.name,
                    "marker": sync_marker(outcome),
                })),
                FleetEntry::Drift(_) => None,
            })
            .collect();

        let data = json!({
            "entries": entries,
            "synced": summary.synced,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "cancelled": summary.abandoned,
        });
        self.render(SYNC, &data)
    }

    /// One block per drifted repository, then the count line.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_check(&self, summary: &FleetSummary) -> Result<String, ReportError> {
        let drifted: Vec<Value> = summary
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                FleetEntry::Drift(report) => Some(json!({
                    "name": report.repository.name,
                    "lines": report.lines,
                    "hidden": report.hidden(),
                })),
                FleetEntry::Sync(_) => None,
            })
            .collect();

        let data = json!({
            "drifted": drifted,
            "changes": summary.drifted,
            "total": summary.checked(),
            "indeterminate": summary.indeterminate,
            "cancelled": summary.abandoned,
        });
        self.render(CHECK, &data)
    }

    /// One section per selected category.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_analysis(&self, analysis: &FailureAnalysis) -> Result<String, ReportError> {
        let categories: Vec<Value> = analysis
            .categories
            .iter()
            .map(|tally| {
                json!({
                    "header": tally.category.header(),
                    "failures": tally.failures,
                })
            })
            .collect();

        let data = json!({
            "categories": categories,
            "indeterminate": analysis.indeterminate(),
            "cancelled": analysis.abandoned,
        });
        self.render(ANALYSIS, &data)
    }

    /// One line per flagged repository.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_pages(&self, audit: &PagesAudit) -> Result<String, ReportError> {
        let flagged: Vec<&str> = audit.flagged().map(|e| e.repository.as_str()).collect();

        let data = json!({
            "flagged": flagged,
            "indeterminate": audit.indeterminate(),
            "cancelled": audit.abandoned,
        });
        self.render(PAGES, &data)
    }

    fn render(&self, name: &str, data: &Value) -> Result<String, ReportError> {
        Ok(self.handlebars.render(name, data)?)
    }
}

fn sync_marker(outcome: &SyncOutcome) -> String {
    match outcome.status {
        SyncStatus::Synced => "✓".to_string(),
        SyncStatus::Conflicted => format!("⚠ ({})", outcome.reason()),
        SyncStatus::Skipped => "- (dry run)".to_string(),
    }
}

//! Report rendering error types.

/// Report rendering error.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Handlebars rendering error.
    #[error("Report rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    /// A built-in template failed to parse.
    #[error("Report template error: {0}")]
    RegistrationError(#[from] handlebars::TemplateError),
}

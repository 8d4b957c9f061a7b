//! Text reports for every command, rendered with Handlebars.
//!
//! Reports go to stdout; logs go to stderr.

mod error;
mod renderer;

pub use error::ReportError;
pub use renderer::ReportRenderer;

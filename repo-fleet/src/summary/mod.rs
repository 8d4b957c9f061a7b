//! Fleet run summary types and helpers.

mod entry;
mod fleet_summary;

pub use entry::FleetEntry;
pub use fleet_summary::FleetSummary;

//! Data model for query resolution
//!
//! Every entity here is created fresh per request and dropped once the
//! response has been returned; nothing outlives a single orchestration call.

pub mod location;
pub mod query;
pub mod result;
pub mod weather;

pub use location::ResolvedLocation;
pub use query::{ActivityCategory, ChatMessage, Intent, ParsedQuery, ProcessingMethod, QueryRequest};
pub use result::{HealthReport, QueryResult, QueryStatus};
pub use weather::WeatherOutcome;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

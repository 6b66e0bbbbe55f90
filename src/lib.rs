pub mod auth;
pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod logging;
pub mod mock;
pub mod models;
pub mod page;
pub mod readers;
pub mod recorder;
pub mod routes;
pub mod session;

pub use config::{RuntimeMode, StatsConfig};
pub use error::{StatsError, StatsResult};
pub use mock::{generate_mock_time_series, Fallback, FallbackPolicy, MockDataProvider};
pub use readers::{Fetched, StatsReader};
pub use recorder::{EventRecorder, RecordOutcome};
pub use session::SessionId;

#[cfg(test)]
mod tests;

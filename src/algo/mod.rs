pub mod q_table;
pub mod snapshot;

pub use q_table::{EpisodeSummary, Outcome, QTableAgent, QTableAgentConfig};
pub use snapshot::QTableSnapshot;

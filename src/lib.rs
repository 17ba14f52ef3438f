/// Tabular learning agents
pub mod algo;

/// Environment traits
pub mod env;

/// Error type shared by environments and agents
pub mod error;

/// Exploration policies
pub mod exploration;

/// Grid environments
pub mod gym;

/// Background training driver
pub mod train;

/// Terminal training dashboard
#[cfg(feature = "viz")]
pub mod viz;

mod util;

pub use error::{Error, Result};

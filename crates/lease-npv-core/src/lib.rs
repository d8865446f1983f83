pub mod error;
pub mod lease;
pub mod time_value;
pub mod types;

#[cfg(feature = "goal_seek")]
pub mod goal_seek;

pub use error::LeaseNpvError;
pub use types::*;

/// Standard result type for all lease-npv operations
pub type LeaseNpvResult<T> = Result<T, LeaseNpvError>;

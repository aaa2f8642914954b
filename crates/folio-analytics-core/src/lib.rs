pub mod config;
pub mod error;
pub mod nav;
pub mod time_range;
pub mod time_value;
pub mod types;

#[cfg(feature = "performance")]
pub mod performance;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use types::*;

/// Standard result type for all analytics computations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

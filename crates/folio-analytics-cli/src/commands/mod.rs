pub mod comparison;
pub mod dashboard;
pub mod performance;
pub mod risk;
pub mod xirr;

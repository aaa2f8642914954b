pub mod cash_flow;
pub mod chart;
pub mod gold;
pub mod holdings;
pub mod summary;

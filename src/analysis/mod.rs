//! Analytics aggregation.
//!
//! Column resolution, the report aggregator, previous-period comparison
//! and dashboard assembly.

pub mod aggregator;
pub mod columns;
pub mod comparison;
pub mod dashboard;

pub use aggregator::{Aggregator, DEFAULT_REVENUE_PER_CONVERSION, DEFAULT_TOP_LIMIT};
pub use columns::ColumnTable;
pub use comparison::{Comparison, ComparisonMode, SyntheticFactors};
pub use dashboard::{build_dashboard, DashboardOptions};

//! Geographic drill-down over sales data.
//!
//! A Region → District → Territory filter keeps three selectors consistent
//! with each other and with the dataset; the aggregator summarizes the
//! filtered rows and classifies average lot value against a goal.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filters;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, gap_label, gap_pct, group_by, status, Aggregator};
pub use config::{AppConfig, GoalConfig, DEFAULT_GOAL, NEAR_RATIO};
pub use error::{ConfigError, LoadError, OutputError, ReportError};
pub use filters::{
    apply, drill_level, filter, options_for, reset, scope_label, FilterUpdate,
    HierarchicalFilterState, LevelOptions,
};
pub use types::{
    AggregateResult, DrillLevel, GroupSummary, HierarchyId, Level, LevelValue, Row, Selection,
    StatusClass,
};

//! Timeline progress for projects.
//!
//! This module owns the stage table, the progress engine that turns a
//! project's start date and automation mode into a current stage and
//! percentage, and the auto-refresh timer used by live views.

mod engine;
mod refresh;
pub mod stages;

pub use engine::{
    days_between, format_stage_dates, parse_start_date, stage_date_range, AutomationMode, Clock,
    ProgressResult, RoadmapEntry, StageState, TimelineEngine, TimelineSource,
};
pub use refresh::{AutoRefresh, RefreshCallback};
pub use stages::{Stage, StageDefinition, STAGE_COUNT, TIMELINE_DAYS};

/// Errors raised by stage lookups.
///
/// These indicate a programming error (a stage number or day that was never
/// clamped), not bad user data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// Stage number outside `1..=10`.
    #[error("Invalid stage {0}: stages are numbered 1 to 10")]
    InvalidStage(i64),

    /// Day outside the 28-day table.
    #[error("Day {0} is outside the 28-day timeline")]
    DayOutOfRange(u32),
}

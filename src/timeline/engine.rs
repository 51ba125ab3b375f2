//! Date-driven stage and progress computation.
//!
//! The engine is pure: it reads its inputs and the static stage table and
//! returns a fresh result on every call. Bad or missing start dates are
//! treated as "not started" rather than reported as errors, so a dashboard
//! never fails because of one malformed record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stages::{self, Stage, TIMELINE_DAYS};
use super::TimelineError;

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Whether a project's stage advances with time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum AutomationMode {
    /// Stage follows elapsed days.
    #[default]
    Running,
    /// Stage is pinned to the manually chosen value.
    Paused,
}

impl AutomationMode {
    /// Display name, as stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Paused => "Paused",
        }
    }
}

impl fmt::Display for AutomationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" | "run" | "on" => Ok(Self::Running),
            "paused" | "pause" | "off" => Ok(Self::Paused),
            other => Err(format!("Invalid automation status '{other}' (expected running or paused)")),
        }
    }
}

/// The fields of a project the engine reads.
pub trait TimelineSource {
    /// Raw start date as stored (`YYYY-MM-DD` or RFC 3339).
    fn start_date(&self) -> Option<&str>;

    /// Current automation mode.
    fn automation_mode(&self) -> AutomationMode;

    /// Manually chosen stage, used while paused.
    fn manual_stage(&self) -> Option<u8>;
}

/// Engine output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResult {
    /// Authoritative current stage
    pub current_stage: Stage,
    /// Overall progress in `[0, 100]`
    pub progress_percent: f64,
}

impl ProgressResult {
    /// Result for a project that has not started.
    pub const NOT_STARTED: Self = Self { current_stage: Stage::FIRST, progress_percent: 0.0 };

    /// Progress rounded to a whole percent for display.
    pub fn rounded_percent(&self) -> u32 {
        self.progress_percent.round() as u32
    }
}

/// Where a stage sits relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    /// Before the current stage
    Completed,
    /// The current stage
    Active,
    /// After the current stage
    Upcoming,
}

/// One line of a project roadmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapEntry {
    /// Stage number
    pub stage: Stage,
    /// Stage title
    pub title: &'static str,
    /// Position relative to the current stage
    pub state: StageState,
    /// Calendar dates the stage occupies, when the start date is known
    pub dates: Option<(NaiveDate, NaiveDate)>,
    /// Progress within this stage
    pub percent: f64,
}

/// Source of "now" for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall-clock time
    #[default]
    System,
    /// A pinned instant
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Current instant according to this clock.
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }
}

/// Computes stage and progress for projects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineEngine {
    clock: Clock,
}

impl TimelineEngine {
    /// Create an engine reading the system clock.
    pub fn new() -> Self {
        Self { clock: Clock::System }
    }

    /// Create an engine pinned to `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { clock: Clock::Fixed(now) }
    }

    /// The engine's notion of now.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Whole days since `start_date`, rounded up.
    ///
    /// Returns `None` when the date is missing or unparseable. The difference
    /// is absolute, so a start date in the future also counts as elapsed.
    pub fn days_elapsed(&self, start_date: Option<&str>) -> Option<u32> {
        let start = parse_start_date(start_date?)?;
        Some(days_between(start, self.now()))
    }

    /// Compute the current stage and overall progress.
    pub fn compute_state(
        &self,
        start_date: Option<&str>,
        mode: AutomationMode,
        manual_stage: Option<u8>,
    ) -> ProgressResult {
        let Some(days) = self.days_elapsed(start_date) else {
            return ProgressResult::NOT_STARTED;
        };
        // A running project started today has no progress yet. Paused
        // projects still report their manual stage.
        if days == 0 && mode == AutomationMode::Running {
            return ProgressResult::NOT_STARTED;
        }

        let current_stage = match mode {
            AutomationMode::Paused => Stage::clamped(manual_stage.unwrap_or(1)),
            AutomationMode::Running => stage_for_day(days),
        };

        let timeline_progress = (f64::from(days) / f64::from(TIMELINE_DAYS) * 100.0).min(100.0);
        let stage_progress = f64::from(current_stage.get()) * 10.0;

        ProgressResult { current_stage, progress_percent: timeline_progress.max(stage_progress) }
    }

    /// Compute state for anything exposing timeline fields.
    pub fn compute_for<T: TimelineSource + ?Sized>(&self, source: &T) -> ProgressResult {
        self.compute_state(source.start_date(), source.automation_mode(), source.manual_stage())
    }

    /// Progress inside a single stage.
    ///
    /// Earlier stages are complete, later stages untouched; the current stage
    /// interpolates elapsed days across its window.
    pub fn within_stage_progress<T: TimelineSource + ?Sized>(
        &self,
        stage: u8,
        source: &T,
    ) -> Result<f64, TimelineError> {
        let def = stages::definition(stage)?;
        let current = self.compute_for(source).current_stage.get();

        let percent = if stage < current {
            100.0
        } else if stage > current {
            0.0
        } else {
            let days = self.days_elapsed(source.start_date()).unwrap_or(0);
            if days < def.first_day {
                0.0
            } else if days > def.last_day {
                100.0
            } else {
                let into_stage = days - def.first_day + 1;
                (f64::from(into_stage) / f64::from(def.duration()) * 100.0).min(100.0)
            }
        };

        Ok(percent)
    }

    /// Every stage with its state, dates and within-stage progress.
    pub fn roadmap<T: TimelineSource + ?Sized>(&self, source: &T) -> Vec<RoadmapEntry> {
        let current = self.compute_for(source).current_stage;
        let start = source.start_date().and_then(parse_start_date).map(|dt| dt.date_naive());

        Stage::all()
            .map(|stage| {
                let def = stage.definition();
                let state = match stage.cmp(&current) {
                    std::cmp::Ordering::Less => StageState::Completed,
                    std::cmp::Ordering::Equal => StageState::Active,
                    std::cmp::Ordering::Greater => StageState::Upcoming,
                };
                RoadmapEntry {
                    stage,
                    title: def.title,
                    state,
                    dates: start.and_then(|s| stage_date_range(s, stage.get()).ok()),
                    percent: self.within_stage_progress(stage.get(), source).unwrap_or(0.0),
                }
            })
            .collect()
    }
}

/// Stage reached after `days` of automatic progress.
fn stage_for_day(days: u32) -> Stage {
    if days < 1 {
        return Stage::FIRST;
    }
    if days > TIMELINE_DAYS {
        return Stage::LAST;
    }
    match stages::stage_of(days) {
        Ok(def) => def.stage(),
        Err(err) => {
            // Unreachable with the shipped table; approximate rather than fail.
            tracing::warn!(days, error = %err, "Day not covered by stage table");
            Stage::clamped((f64::from(days) / 2.8).ceil() as u8)
        }
    }
}

/// Whole days between two instants, rounded up, ignoring direction.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = (end - start).num_milliseconds().unsigned_abs();
    u32::try_from(millis.div_ceil(MILLIS_PER_DAY)).unwrap_or(u32::MAX)
}

/// Parse a stored start date.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` (read as UTC), and plain
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar dates occupied by `stage` for a project starting on `start`.
pub fn stage_date_range(
    start: NaiveDate,
    stage: u8,
) -> Result<(NaiveDate, NaiveDate), TimelineError> {
    let def = stages::definition(stage)?;
    let offset = |day: u32| {
        start.checked_add_days(Days::new(u64::from(day - 1))).unwrap_or(NaiveDate::MAX)
    };
    Ok((offset(def.first_day), offset(def.last_day)))
}

/// Format a stage window as `"Jan 13 - Jan 15"`, or a single date.
pub fn format_stage_dates((first, last): (NaiveDate, NaiveDate)) -> String {
    if first == last {
        first.format("%b %-d").to_string()
    } else {
        format!("{} - {}", first.format("%b %-d"), last.format("%b %-d"))
    }
}

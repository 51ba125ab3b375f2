//! Search and summary statistics over a project list.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{Project, ProjectStatus};
use crate::timeline::{parse_start_date, TimelineEngine};

/// Number of entries in [`ProjectStats::recent_activity`].
const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Field to sort search results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    StartDate,
    Created,
    Updated,
    Stage,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "name" => Ok(Self::Name),
            "startdate" | "start" => Ok(Self::StartDate),
            "created" | "createdat" => Ok(Self::Created),
            "updated" | "updatedat" => Ok(Self::Updated),
            "stage" => Ok(Self::Stage),
            _ => Err(format!(
                "Invalid sort field '{}' (expected name, start-date, created, updated or stage)",
                s.trim()
            )),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("Invalid sort order '{other}' (expected asc or desc)")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Narrowing and ordering for [`search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Keep only this status
    pub status: Option<ProjectStatus>,
    /// Keep projects starting on or after this date
    pub start_from: Option<NaiveDate>,
    /// Keep projects starting on or before this date
    pub start_until: Option<NaiveDate>,
    /// Sort key; stored order when `None`
    pub sort_by: Option<SortField>,
    pub order: SortOrder,
}

/// Filter `projects` by a case-insensitive substring and `filters`.
///
/// The query is matched against name, description and slug. An empty query
/// matches everything. With a date window set, projects whose start date
/// cannot be parsed are dropped.
pub fn search(projects: &[Project], query: &str, filters: &SearchFilters) -> Vec<Project> {
    let needle = query.trim().to_lowercase();

    let mut results: Vec<Project> = projects
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.slug.to_lowercase().contains(&needle)
        })
        .filter(|p| filters.status.is_none_or(|status| p.status == status))
        .filter(|p| within_window(p, filters.start_from, filters.start_until))
        .cloned()
        .collect();

    if let Some(field) = filters.sort_by {
        results.sort_by(|a, b| {
            let ordering = compare(a, b, field);
            match filters.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    results
}

fn within_window(project: &Project, from: Option<NaiveDate>, until: Option<NaiveDate>) -> bool {
    if from.is_none() && until.is_none() {
        return true;
    }
    let Some(start) = parse_start_date(&project.start_date).map(|dt| dt.date_naive()) else {
        return false;
    };
    from.is_none_or(|from| start >= from) && until.is_none_or(|until| start <= until)
}

fn compare(a: &Project, b: &Project, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::StartDate => {
            parse_start_date(&a.start_date).cmp(&parse_start_date(&b.start_date))
        }
        SortField::Created => a.created_at.cmp(&b.created_at),
        SortField::Updated => a.updated_at.cmp(&b.updated_at),
        SortField::Stage => a.stage.cmp(&b.stage),
    }
}

/// One entry of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    pub name: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Summary across all projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    /// Projects "In Progress"
    pub active: usize,
    pub completed: usize,
    pub delayed: usize,
    pub on_hold: usize,
    pub cancelled: usize,
    /// Mean overall progress, rounded to a whole percent
    pub average_progress: u32,
    /// Most recently updated projects, newest first
    pub recent_activity: Vec<RecentActivity>,
}

/// Count projects per status and average their current progress.
pub fn stats(projects: &[Project], engine: &TimelineEngine) -> ProjectStats {
    let mut stats = ProjectStats { total: projects.len(), ..ProjectStats::default() };
    let mut progress_sum = 0.0;

    for project in projects {
        match project.status {
            ProjectStatus::InProgress => stats.active += 1,
            ProjectStatus::Completed => stats.completed += 1,
            ProjectStatus::Delayed => stats.delayed += 1,
            ProjectStatus::OnHold => stats.on_hold += 1,
            ProjectStatus::Cancelled => stats.cancelled += 1,
        }
        progress_sum += engine.compute_for(project).progress_percent;
    }

    if !projects.is_empty() {
        stats.average_progress = (progress_sum / projects.len() as f64).round() as u32;
    }

    let mut recent: Vec<&Project> = projects.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    stats.recent_activity = recent
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|p| RecentActivity {
            id: p.id.clone(),
            name: p.name.clone(),
            action: "updated".to_string(),
            timestamp: p.updated_at,
        })
        .collect();

    stats
}

//! Page models and the surface that displays them.
//!
//! Route handlers build plain view models ([`DashboardRow`], [`ProjectView`])
//! from store records and the timeline engine, then hand them to a
//! [`PageSurface`]. The terminal implementation lives in [`terminal`].

mod terminal;

use chrono::NaiveDate;
use serde::Serialize;

use crate::router::RouteSurface;
use crate::store::{Project, ProjectStatus};
use crate::timeline::{
    parse_start_date, stage_date_range, AutomationMode, ProgressResult, RoadmapEntry, Stage,
    TimelineEngine,
};

pub use terminal::{
    render_dashboard, render_edit_form, render_not_found, render_project, TerminalSurface,
};

/// Where pages are displayed.
pub trait PageSurface: RouteSurface {
    /// The project list.
    fn show_dashboard(&self, rows: &[DashboardRow]);

    /// A single project.
    fn show_project(&self, view: &ProjectView);

    /// The editable fields of a project.
    fn show_edit_form(&self, project: &Project);

    /// The not-found page for `path`.
    fn show_not_found(&self, path: &str);
}

/// One line of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub name: String,
    pub slug: String,
    pub stage: Stage,
    pub percent: u32,
    pub status: ProjectStatus,
    pub automation: AutomationMode,
}

impl DashboardRow {
    /// Summarize `project` as of the engine's now.
    pub fn build(project: &Project, engine: &TimelineEngine) -> Self {
        let progress = engine.compute_for(project);
        Self {
            name: project.name.clone(),
            slug: project.slug.clone(),
            stage: progress.current_stage,
            percent: progress.rounded_percent(),
            status: project.status,
            automation: project.automation_status,
        }
    }
}

/// Everything the project page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub project: Project,
    pub progress: ProgressResult,
    /// `None` when the start date cannot be read
    pub days_elapsed: Option<u32>,
    pub start: Option<NaiveDate>,
    /// Calendar window of the current stage
    pub stage_dates: Option<(NaiveDate, NaiveDate)>,
    pub roadmap: Vec<RoadmapEntry>,
    /// Shareable link, `<host>/projects/<slug>`
    pub public_url: String,
}

impl ProjectView {
    /// Compute the page for `project`.
    pub fn build(project: &Project, engine: &TimelineEngine, public_host: &str) -> Self {
        let progress = engine.compute_for(project);
        let start = parse_start_date(&project.start_date).map(|dt| dt.date_naive());
        let stage_dates = start.and_then(|s| stage_date_range(s, progress.current_stage.get()).ok());

        Self {
            project: project.clone(),
            progress,
            days_elapsed: engine.days_elapsed(Some(&project.start_date)),
            start,
            stage_dates,
            roadmap: engine.roadmap(project),
            public_url: format!("{}/projects/{}", public_host.trim_end_matches('/'), project.slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::NewProject;
    use crate::timeline::StageState;

    fn engine() -> TimelineEngine {
        TimelineEngine::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn project(start: &str) -> Project {
        NewProject::new("Vitamin D3", start).into_project("vitamin-d3".into(), Utc::now())
    }

    #[test]
    fn test_dashboard_row() {
        let row = DashboardRow::build(&project("2024-02-20"), &engine());
        assert_eq!(row.stage.get(), 4);
        assert_eq!(row.percent, 40);
        assert_eq!(row.slug, "vitamin-d3");
    }

    #[test]
    fn test_project_view() {
        let view = ProjectView::build(&project("2024-02-20"), &engine(), "https://tracker.example/");

        assert_eq!(view.days_elapsed, Some(11));
        assert_eq!(view.progress.current_stage.get(), 4);
        assert_eq!(
            view.stage_dates,
            Some((
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
            ))
        );
        assert_eq!(view.public_url, "https://tracker.example/projects/vitamin-d3");
        assert_eq!(view.roadmap.len(), 10);
        assert_eq!(view.roadmap[2].state, StageState::Completed);
        assert_eq!(view.roadmap[3].state, StageState::Active);
        assert_eq!(view.roadmap[4].state, StageState::Upcoming);
    }

    #[test]
    fn test_project_view_without_start_date() {
        let view = ProjectView::build(&project("someday"), &engine(), "tracker.example");
        assert_eq!(view.days_elapsed, None);
        assert_eq!(view.start, None);
        assert_eq!(view.stage_dates, None);
        assert_eq!(view.progress, ProgressResult::NOT_STARTED);
        assert!(view.roadmap.iter().all(|e| e.dates.is_none()));
    }
}

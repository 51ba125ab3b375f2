//! Plain-text page rendering.

use std::fmt::Write as _;
use std::io::{self, Write};

use parking_lot::Mutex;

use super::{DashboardRow, PageSurface, ProjectView};
use crate::core::DisplayConfig;
use crate::router::RouteSurface;
use crate::store::Project;
use crate::timeline::{format_stage_dates, StageState, STAGE_COUNT};

/// Render the project list.
pub fn render_dashboard(rows: &[DashboardRow]) -> String {
    if rows.is_empty() {
        return "No projects yet. Add one with `stagetrack add <name> --start <date>`.\n"
            .to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:>4}  {:<11} {:<8} {}",
        "STAGE", "DONE", "STATUS", "AUTO", "PROJECT"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<6} {:>4}  {:<11} {:<8} {} ({})",
            format!("{}/{}", row.stage, STAGE_COUNT),
            format!("{}%", row.percent),
            row.status.as_str(),
            row.automation.as_str(),
            row.name,
            row.slug
        );
    }
    out
}

/// Render the project page.
pub fn render_project(view: &ProjectView, display: &DisplayConfig) -> String {
    let project = &view.project;
    let stage = view.progress.current_stage;
    let mut out = String::new();

    let _ = writeln!(out, "{}  [{}]", project.name, project.status);
    let _ = writeln!(out, "{}", view.public_url);
    out.push('\n');

    let start = view.start.map_or_else(
        || project.start_date.clone(),
        |date| date.format(&display.date_format).to_string(),
    );
    let _ = writeln!(out, "Start date:     {start}");
    let _ = writeln!(out, "Days elapsed:   {}", view.days_elapsed.unwrap_or(0));
    let _ = writeln!(
        out,
        "Current stage:  {}/{} {}",
        stage,
        STAGE_COUNT,
        stage.definition().title
    );
    if let Some(dates) = view.stage_dates {
        let _ = writeln!(out, "Stage dates:    {}", format_stage_dates(dates));
    }
    let _ = writeln!(out, "Progress:       {}%", view.progress.rounded_percent());
    let _ = writeln!(out, "Automation:     {}", project.automation_status);

    if !project.description.trim().is_empty() {
        let _ = writeln!(out, "\n{}", project.description.trim());
    }

    if !project.delay_notes.trim().is_empty() {
        out.push_str("\nDelay notes:\n");
        for line in project.delay_notes.trim().lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    out.push_str("\nRoadmap:\n");
    for entry in &view.roadmap {
        let marker = match entry.state {
            StageState::Completed => "[x]",
            StageState::Active => "[>]",
            StageState::Upcoming => "[ ]",
        };
        let dates = entry.dates.map(format_stage_dates).unwrap_or_default();
        let _ = writeln!(
            out,
            "  {marker} {:>2}. {:<36} {:<16} {:>3}%",
            entry.stage.get(),
            entry.title,
            dates,
            entry.percent.round() as u32
        );
    }
    out
}

/// Render the edit page.
pub fn render_edit_form(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Editing {} ({})", project.name, project.id);
    out.push('\n');
    let _ = writeln!(out, "  name:         {}", project.name);
    let _ = writeln!(out, "  description:  {}", project.description);
    let _ = writeln!(out, "  start date:   {}", project.start_date);
    let _ = writeln!(out, "  stage:        {}", project.stage);
    let _ = writeln!(out, "  status:       {}", project.status);
    let _ = writeln!(out, "  automation:   {}", project.automation_status);
    let _ = writeln!(out, "  delay notes:  {}", project.delay_notes);
    out.push('\n');
    let _ = writeln!(
        out,
        "Change fields with: stagetrack edit {} [--name ..] [--start ..] [--stage ..] \
         [--status ..] [--automation ..] [--notes ..]",
        project.slug
    );
    out
}

/// Render the not-found page.
pub fn render_not_found(path: &str) -> String {
    format!("The page \"{path}\" could not be found.\n")
}

/// A [`PageSurface`] that writes text to a stream.
pub struct TerminalSurface<W: Write + Send> {
    out: Mutex<W>,
    display: DisplayConfig,
}

impl<W: Write + Send> std::fmt::Debug for TerminalSurface<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSurface").field("display", &self.display).finish()
    }
}

impl TerminalSurface<io::Stdout> {
    /// Write to standard output.
    pub fn stdout(display: DisplayConfig) -> Self {
        Self::new(io::stdout(), display)
    }
}

impl TerminalSurface<Vec<u8>> {
    /// Collect output in memory.
    pub fn buffer(display: DisplayConfig) -> Self {
        Self::new(Vec::new(), display)
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    /// Write to `out`.
    pub fn new(out: W, display: DisplayConfig) -> Self {
        Self { out: Mutex::new(out), display }
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %err, "Failed to write page output");
        }
    }
}

impl<W: Write + Send> RouteSurface for TerminalSurface<W> {
    fn set_title(&self, title: &str) {
        self.write(&format!("== {title} ==\n"));
    }

    fn show_error(&self, message: &str) {
        self.write(&format!("Error: {message}\n"));
    }
}

impl<W: Write + Send> PageSurface for TerminalSurface<W> {
    fn show_dashboard(&self, rows: &[DashboardRow]) {
        self.write(&render_dashboard(rows));
    }

    fn show_project(&self, view: &ProjectView) {
        self.write(&render_project(view, &self.display));
    }

    fn show_edit_form(&self, project: &Project) {
        self.write(&render_edit_form(project));
    }

    fn show_not_found(&self, path: &str) {
        self.write(&render_not_found(path));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::NewProject;
    use crate::timeline::TimelineEngine;

    fn engine() -> TimelineEngine {
        TimelineEngine::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn project() -> Project {
        let mut input = NewProject::new("Vitamin D3", "2024-02-20");
        input.delay_notes = "Waiting on supplier\nRetest batch".into();
        input.into_project("vitamin-d3".into(), Utc::now())
    }

    #[test]
    fn test_dashboard_lines() {
        let rows = vec![DashboardRow::build(&project(), &engine())];
        let text = render_dashboard(&rows);
        let line = text.lines().nth(1).unwrap();
        assert!(line.starts_with("4/10"));
        assert!(line.contains("40%"));
        assert!(line.contains("In Progress"));
        assert!(line.contains("Running"));
        assert!(line.ends_with("Vitamin D3 (vitamin-d3)"));
    }

    #[test]
    fn test_empty_dashboard() {
        assert!(render_dashboard(&[]).starts_with("No projects yet."));
    }

    #[test]
    fn test_project_page() {
        let view = ProjectView::build(&project(), &engine(), "tracker.example");
        let text = render_project(&view, &DisplayConfig::default());

        assert!(text.starts_with("Vitamin D3  [In Progress]\ntracker.example/projects/vitamin-d3\n"));
        assert!(text.contains("Start date:     Feb 20, 2024"));
        assert!(text.contains("Days elapsed:   11"));
        assert!(text.contains("Current stage:  4/10 Bioavailability Enhancement"));
        assert!(text.contains("Stage dates:    Feb 29 - Mar 2"));
        assert!(text.contains("Progress:       40%"));
        assert!(text.contains("  Waiting on supplier\n  Retest batch\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("  [x]")).count(), 3);
        assert_eq!(text.lines().filter(|l| l.starts_with("  [>]")).count(), 1);
        assert_eq!(text.lines().filter(|l| l.starts_with("  [ ]")).count(), 6);
    }

    #[test]
    fn test_surface_writes_through() {
        let surface = TerminalSurface::buffer(DisplayConfig::default());
        surface.set_title("Page Not Found - Stagetrack");
        surface.show_not_found("/nope");
        surface.show_error("Project not found");

        assert_eq!(
            surface.contents(),
            "== Page Not Found - Stagetrack ==\n\
             The page \"/nope\" could not be found.\n\
             Error: Project not found\n"
        );
    }

    #[test]
    fn test_edit_form_mentions_command() {
        let text = render_edit_form(&project());
        assert!(text.starts_with("Editing Vitamin D3 (proj_"));
        assert!(text.contains("stagetrack edit vitamin-d3"));
    }
}

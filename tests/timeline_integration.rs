//! Timeline Integration Tests
//!
//! Walks projects through the full 28-day pipeline and checks the auto
//! refresh timer against a paused tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::FutureExt;

use stagetrack::store::{JsonStore, NewProject, ProjectRepository};
use stagetrack::timeline::{
    stages, AutoRefresh, AutomationMode, StageState, TimelineEngine, STAGE_COUNT,
};

fn engine_on_day(day: u32) -> TimelineEngine {
    // Start date 2024-01-01 00:00, so noon on day N rounds up to N days.
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        + chrono::Duration::days(i64::from(day) - 1);
    TimelineEngine::at(now)
}

#[test]
fn test_running_project_walks_every_stage() {
    let mut previous = 0;
    for day in 1..=28 {
        let state =
            engine_on_day(day).compute_state(Some("2024-01-01"), AutomationMode::Running, None);
        let stage = state.current_stage.get();

        assert!(stage >= previous, "stage went backwards on day {day}");
        assert!(stages::range_of(stage).unwrap().contains(&day));
        assert!(state.progress_percent >= f64::from(stage) * 10.0);
        previous = stage;
    }
    assert_eq!(previous, STAGE_COUNT);
}

#[test]
fn test_progress_is_capped_after_the_timeline() {
    let state = engine_on_day(90).compute_state(Some("2024-01-01"), AutomationMode::Running, None);
    assert_eq!(state.current_stage.get(), 10);
    assert!((state.progress_percent - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_paused_project_keeps_manual_stage() {
    let early = engine_on_day(2).compute_state(Some("2024-01-01"), AutomationMode::Paused, Some(6));
    let late = engine_on_day(20).compute_state(Some("2024-01-01"), AutomationMode::Paused, Some(6));

    assert_eq!(early.current_stage.get(), 6);
    assert_eq!(late.current_stage.get(), 6);
    assert_eq!(early.rounded_percent(), 60);
    assert_eq!(late.rounded_percent(), 71);
}

#[test]
fn test_unreadable_start_date_is_not_started() {
    let engine = engine_on_day(5);
    for raw in [None, Some(""), Some("soon")] {
        let state = engine.compute_state(raw, AutomationMode::Running, None);
        assert_eq!(state.current_stage.get(), 1);
        assert_eq!(state.rounded_percent(), 0);
    }
}

#[tokio::test]
async fn test_roadmap_for_stored_project() {
    let store = JsonStore::in_memory();
    let project = store.create(NewProject::new("Magnesium", "2024-01-01")).await.unwrap();

    // Day 14 sits in stage 5 (days 13-15).
    let roadmap = engine_on_day(14).roadmap(&project);

    assert_eq!(roadmap.len(), usize::from(STAGE_COUNT));
    let states: Vec<StageState> = roadmap.iter().map(|e| e.state).collect();
    assert_eq!(&states[..4], &[StageState::Completed; 4]);
    assert_eq!(states[4], StageState::Active);
    assert_eq!(&states[5..], &[StageState::Upcoming; 5]);

    let active = &roadmap[4];
    assert_eq!(active.title, "Regulatory Compliance Validation");
    assert!((active.percent - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(
        active.dates.map(stagetrack::timeline::format_stage_dates).as_deref(),
        Some("Jan 13 - Jan 15")
    );
}

#[tokio::test(start_paused = true)]
async fn test_refresh_follows_mode_and_visibility() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let mut refresh = AutoRefresh::new(
        Duration::from_secs(30),
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                AutomationMode::Running
            }
            .boxed()
        }),
    );

    refresh.arm(AutomationMode::Paused);
    assert!(!refresh.is_armed());

    refresh.arm(AutomationMode::Running);
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 2);

    refresh.set_visible(false);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 2);

    refresh.set_visible(true);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

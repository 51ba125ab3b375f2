//! Performance benchmarks for Stagetrack.
//!
//! This module contains benchmarks for:
//! - Route pattern parsing and matching
//! - Timeline stage and progress computation
//! - Project search and statistics over large stores
//!
//! Run with: `cargo bench`

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stagetrack::router::RoutePattern;
use stagetrack::store::{
    slug::generate_slug, JsonStore, NewProject, Project, ProjectRepository, ProjectStatus,
    SearchFilters, SortField, SortOrder,
};
use stagetrack::timeline::{AutomationMode, TimelineEngine};

// ============================================================================
// Mock Data Fixtures
// ============================================================================

mod fixtures {
    use super::*;

    /// Paths exercising every built-in route shape.
    pub fn paths() -> Vec<&'static str> {
        vec![
            "/",
            "/projects/vitamin-d3",
            "/projects/vitamin-d3/edit",
            "/projects/omega-3-fish-oil-1/edit",
            "/reports/2024/q1",
            "/projects/",
        ]
    }

    /// A fixed engine so results do not drift between runs.
    pub fn engine() -> TimelineEngine {
        TimelineEngine::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    /// A store holding `count` projects with varied names, dates and statuses.
    pub fn projects(count: usize) -> Vec<Project> {
        let names = [
            "Vitamin D3", "Omega 3", "Zinc Citrate", "Magnesium Glycinate", "Iron Bisglycinate",
            "Probiotic Blend", "Collagen Peptides", "Ashwagandha", "Turmeric", "Melatonin",
        ];
        let statuses = ProjectStatus::ALL;

        let rt = tokio::runtime::Runtime::new().unwrap();
        let store = JsonStore::in_memory();
        rt.block_on(async {
            for i in 0..count {
                let mut input = NewProject::new(
                    format!("{} batch {}", names[i % names.len()], i),
                    format!("2024-02-{:02}", 1 + i % 28),
                );
                input.description = format!("Formulation run {i} for the spring catalogue");
                input.status = Some(statuses[i % statuses.len()]);
                if i % 4 == 0 {
                    input.automation_status = Some(AutomationMode::Paused);
                    input.stage = Some((i % 10) as u8 + 1);
                }
                store.create(input).await.unwrap();
            }
        });
        store.projects()
    }
}

// ============================================================================
// Router Benchmarks
// ============================================================================

fn bench_pattern_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_parse");

    for pattern in ["/", "/projects/:slug", "/projects/:slug/edit", "/a/:b/c/:d/e/:f", "*"] {
        group.bench_with_input(BenchmarkId::from_parameter(pattern), pattern, |b, pattern| {
            b.iter(|| RoutePattern::parse(black_box(pattern)).unwrap());
        });
    }

    group.finish();
}

fn bench_pattern_matching(c: &mut Criterion) {
    let patterns: Vec<RoutePattern> = ["/", "/projects/:slug", "/projects/:slug/edit", "*"]
        .into_iter()
        .map(|p| RoutePattern::parse(p).unwrap())
        .collect();
    let paths = fixtures::paths();

    let mut group = c.benchmark_group("pattern_match");
    group.throughput(Throughput::Elements(paths.len() as u64));

    group.bench_function("first_match", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(patterns.iter().find_map(|p| p.matches(black_box(path))));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Timeline Benchmarks
// ============================================================================

fn bench_compute_state(c: &mut Criterion) {
    let engine = fixtures::engine();
    let mut group = c.benchmark_group("compute_state");

    group.bench_function("running", |b| {
        b.iter(|| {
            engine.compute_state(black_box(Some("2024-02-20")), AutomationMode::Running, None)
        });
    });

    group.bench_function("paused", |b| {
        b.iter(|| {
            engine.compute_state(black_box(Some("2024-02-20")), AutomationMode::Paused, Some(7))
        });
    });

    group.bench_function("rfc3339_start", |b| {
        b.iter(|| {
            engine.compute_state(
                black_box(Some("2024-02-20T08:30:00Z")),
                AutomationMode::Running,
                None,
            )
        });
    });

    group.finish();
}

fn bench_roadmap(c: &mut Criterion) {
    let engine = fixtures::engine();
    let project = fixtures::projects(1).remove(0);

    c.bench_function("roadmap", |b| b.iter(|| engine.roadmap(black_box(&project))));
}

// ============================================================================
// Store Benchmarks
// ============================================================================

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [100, 1_000, 5_000] {
        let projects = fixtures::projects(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("substring", size), &projects, |b, projects| {
            b.iter(|| {
                stagetrack::store::search(
                    black_box(projects),
                    black_box("zinc"),
                    &SearchFilters::default(),
                )
            });
        });

        let filters = SearchFilters {
            status: Some(ProjectStatus::InProgress),
            sort_by: Some(SortField::StartDate),
            order: SortOrder::Desc,
            ..SearchFilters::default()
        };
        group.bench_with_input(BenchmarkId::new("filtered_sorted", size), &projects, |b, projects| {
            b.iter(|| stagetrack::store::search(black_box(projects), "", &filters));
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let engine = fixtures::engine();
    let projects = fixtures::projects(1_000);

    c.bench_function("stats_1000", |b| {
        b.iter(|| stagetrack::store::stats(black_box(&projects), &engine));
    });
}

fn bench_slug_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("slug");

    for name in ["Vitamin D3", "  Omega-3 & Fish Oil (Batch #12)  ", "Ünïcödé Prøject Nàme"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| generate_slug(black_box(name)));
        });
    }

    group.finish();
}

criterion_group!(router_benches, bench_pattern_parsing, bench_pattern_matching,);

criterion_group!(timeline_benches, bench_compute_state, bench_roadmap,);

criterion_group!(store_benches, bench_search, bench_stats, bench_slug_generation,);

criterion_main!(router_benches, timeline_benches, store_benches,);

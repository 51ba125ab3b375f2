//! Stagetrack - track projects through a ten-stage, 28-day pipeline.
//!
//! Every page (dashboard, project, edit form) is addressed by path and goes
//! through the same router a browser front end would use.

#![allow(clippy::single_match_else)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagetrack::core::Config;
use stagetrack::router::RouteParams;
use stagetrack::store::{
    JsonStore, NewProject, Project, ProjectRepository, ProjectStatus, ProjectUpdate,
    SearchFilters, SortField, SortOrder,
};
use stagetrack::timeline::{self, stages, AutomationMode, TimelineEngine};
use stagetrack::view::{DashboardRow, ProjectView, TerminalSurface};
use stagetrack::App;

/// Track projects through a ten-stage, 28-day pipeline
#[derive(Parser)]
#[command(name = "stagetrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project data file (defaults to the configured one)
    #[arg(long, global = true, env = "STAGETRACK_DATA")]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the project dashboard (default)
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Open a page by path, e.g. /projects/vitamin-d3
    Open {
        /// Page path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show a single project
    Show {
        /// Project slug
        slug: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a project
    Add {
        /// Project name
        name: String,

        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Manual stage (1-10), used while automation is paused
        #[arg(long)]
        stage: Option<u8>,

        /// Status (in-progress, delayed, on-hold, cancelled, completed)
        #[arg(long)]
        status: Option<String>,

        /// Automation (running, paused)
        #[arg(long)]
        automation: Option<String>,

        /// Delay notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a project; without field flags, shows the edit page
    Edit {
        /// Project slug or id
        target: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// Manual stage (1-10)
        #[arg(long)]
        stage: Option<u8>,

        /// Status (in-progress, delayed, on-hold, cancelled, completed)
        #[arg(long)]
        status: Option<String>,

        /// Automation (running, paused)
        #[arg(long)]
        automation: Option<String>,

        /// Delay notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a project
    Remove {
        /// Project slug or id
        target: String,

        /// Don't confirm before removing
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show the stage table
    Stages {
        /// Show calendar dates for a project starting on this date
        #[arg(long)]
        start_date: Option<String>,
    },

    /// Show project statistics
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Search projects by name, description or slug
    Search {
        /// Text to look for (empty matches everything)
        #[arg(default_value = "")]
        query: String,

        /// Only projects with this status
        #[arg(long)]
        status: Option<String>,

        /// Only projects starting on or after this date
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only projects starting on or before this date
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Sort by (name, start-date, created, updated, stage)
        #[arg(long)]
        sort: Option<String>,

        /// Sort order (asc, desc)
        #[arg(long, default_value = "asc")]
        order: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Export every project as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import projects from an export file
    Import {
        /// Export file to read
        file: PathBuf,
    },

    /// Print the path of a named route
    Url {
        /// Route name (dashboard, project, project-edit)
        route: String,

        /// Route parameters (key=value)
        params: Vec<String>,
    },

    /// Show a project and keep it up to date while it runs
    Watch {
        /// Project slug
        slug: String,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let data = cli.data.as_deref();

    // Handle commands
    match cli.command {
        None => {
            cmd_list(data, "text")?;
        }
        Some(Commands::List { format }) => {
            cmd_list(data, &format)?;
        }
        Some(Commands::Open { path }) => {
            cmd_open(data, &path)?;
        }
        Some(Commands::Show { slug, format }) => {
            cmd_show(data, &slug, &format)?;
        }
        Some(Commands::Add { name, start, description, stage, status, automation, notes }) => {
            let mut input = NewProject::new(name, start);
            input.description = description;
            input.stage = stage;
            input.status = status.as_deref().map(parse_status).transpose()?;
            input.automation_status = automation.as_deref().map(parse_automation).transpose()?;
            input.delay_notes = notes.unwrap_or_default();
            cmd_add(data, input)?;
        }
        Some(Commands::Edit {
            target,
            name,
            description,
            start,
            stage,
            status,
            automation,
            notes,
        }) => {
            let update = ProjectUpdate {
                name,
                description,
                start_date: start,
                stage,
                status: status.as_deref().map(parse_status).transpose()?,
                automation_status: automation.as_deref().map(parse_automation).transpose()?,
                delay_notes: notes,
            };
            cmd_edit(data, &target, update)?;
        }
        Some(Commands::Remove { target, yes }) => {
            cmd_remove(data, &target, yes)?;
        }
        Some(Commands::Stages { start_date }) => {
            cmd_stages(start_date.as_deref())?;
        }
        Some(Commands::Stats { format }) => {
            cmd_stats(data, &format)?;
        }
        Some(Commands::Search { query, status, from, until, sort, order, format }) => {
            let filters = SearchFilters {
                status: status.as_deref().map(parse_status).transpose()?,
                start_from: from,
                start_until: until,
                sort_by: sort
                    .as_deref()
                    .map(str::parse::<SortField>)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                order: order.parse::<SortOrder>().map_err(anyhow::Error::msg)?,
            };
            cmd_search(data, &query, &filters, &format)?;
        }
        Some(Commands::Export { output }) => {
            cmd_export(data, output.as_deref())?;
        }
        Some(Commands::Import { file }) => {
            cmd_import(data, &file)?;
        }
        Some(Commands::Url { route, params }) => {
            cmd_url(data, &route, &params)?;
        }
        Some(Commands::Watch { slug }) => {
            cmd_watch(data, &slug)?;
        }
        Some(Commands::Config { path }) => {
            cmd_config(path)?;
        }
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

fn parse_status(raw: &str) -> Result<ProjectStatus> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn parse_automation(raw: &str) -> Result<AutomationMode> {
    raw.parse().map_err(anyhow::Error::msg)
}

/// Open the project store named by `--data` or the config.
/// Single-threaded runtime for one command.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn open_store(config: &Config, data: Option<&Path>) -> Result<Arc<JsonStore>> {
    let path = match data {
        Some(path) => path.to_path_buf(),
        None => config.data_file()?,
    };
    tracing::debug!(path = %path.display(), "Opening project store");
    Ok(Arc::new(JsonStore::open(path)))
}

/// Build the app, rendering to stdout.
fn build_app(data: Option<&Path>) -> Result<App> {
    let config = Config::load()?;
    let store = open_store(&config, data)?;
    let surface = Arc::new(TerminalSurface::stdout(config.display.clone()));
    App::new(config, store, surface)
}

/// Find a project by slug, falling back to id.
async fn find_project(store: &JsonStore, target: &str) -> Result<Project> {
    if let Some(project) = store.get_by_slug(target).await? {
        return Ok(project);
    }
    store.get(target).await?.with_context(|| format!("No project matching '{target}' found"))
}

/// Show the dashboard.
fn cmd_list(data: Option<&Path>, format: &str) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        match format {
            "json" => {
                let config = Config::load()?;
                let store = open_store(&config, data)?;
                let engine = TimelineEngine::new();
                let rows: Vec<DashboardRow> = store
                    .list()
                    .await?
                    .iter()
                    .map(|p| DashboardRow::build(p, &engine))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            _ => {
                build_app(data)?.start("/").await?;
            }
        }
        Ok(())
    })
}

/// Render the page at `path`.
fn cmd_open(data: Option<&Path>, path: &str) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let app = build_app(data)?;
        app.start(path).await?;
        Ok(())
    })
}

/// Show one project.
fn cmd_show(data: Option<&Path>, slug: &str, format: &str) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        match format {
            "json" => {
                let config = Config::load()?;
                let store = open_store(&config, data)?;
                let project = store
                    .get_by_slug(slug)
                    .await?
                    .with_context(|| format!("No project with slug '{slug}'"))?;
                let view =
                    ProjectView::build(&project, &TimelineEngine::new(), &config.display.public_host);
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            _ => {
                build_app(data)?.start(&format!("/projects/{slug}")).await?;
            }
        }
        Ok(())
    })
}

/// Create a project.
fn cmd_add(data: Option<&Path>, input: NewProject) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let config = Config::load()?;
        let store = open_store(&config, data)?;
        let project = store.create(input).await?;

        println!("Created project {} ({})", project.name, project.slug);
        println!("  {}/projects/{}", config.display.public_host, project.slug);
        Ok(())
    })
}

/// Update a project, or show its edit page when nothing is given.
fn cmd_edit(data: Option<&Path>, target: &str, update: ProjectUpdate) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let app = build_app(data)?;
        let project = find_project(app.store(), target).await?;

        if update.is_empty() {
            app.start(&format!("/projects/{}/edit", project.slug)).await?;
            return Ok(());
        }

        let updated = app.store().update(&project.id, update).await?;
        println!("Updated project {} ({})", updated.name, updated.slug);
        if updated.slug != project.slug {
            println!("  Slug changed from '{}'", project.slug);
        }
        Ok(())
    })
}

/// Delete a project.
fn cmd_remove(data: Option<&Path>, target: &str, skip_confirm: bool) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let config = Config::load()?;
        let store = open_store(&config, data)?;
        let project = find_project(&store, target).await?;

        if !skip_confirm {
            print!("Remove '{}'? [y/N] ", project.name);
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled");
                return Ok(());
            }
        }

        let removed = store.delete(&project.id).await?;
        println!("Removed project {} ({})", removed.name, removed.slug);
        Ok(())
    })
}

/// Print the stage table.
fn cmd_stages(start_date: Option<&str>) -> Result<()> {
    let start = match start_date {
        Some(raw) => Some(
            timeline::parse_start_date(raw)
                .map(|dt| dt.date_naive())
                .with_context(|| format!("Invalid start date '{raw}'"))?,
        ),
        None => None,
    };

    for def in stages::all() {
        let days = if def.first_day == def.last_day {
            format!("day {}", def.first_day)
        } else {
            format!("days {}-{}", def.first_day, def.last_day)
        };
        let dates = match start {
            Some(start) => timeline::format_stage_dates(timeline::stage_date_range(start, def.number)?),
            None => String::new(),
        };
        println!("{:>2}. {:<36} {:<10} {}", def.number, def.title, days, dates);
    }
    println!("\nTotal: {} stages over {} days", stages::all().len(), timeline::TIMELINE_DAYS);
    Ok(())
}

/// Print counts per status and average progress.
fn cmd_stats(data: Option<&Path>, format: &str) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config, data)?;
    let stats = store.stats(&TimelineEngine::new());

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => {
            println!("Projects:         {}", stats.total);
            println!("  In Progress:    {}", stats.active);
            println!("  Delayed:        {}", stats.delayed);
            println!("  On Hold:        {}", stats.on_hold);
            println!("  Cancelled:      {}", stats.cancelled);
            println!("  Completed:      {}", stats.completed);
            println!("Average progress: {}%", stats.average_progress);
            if !stats.recent_activity.is_empty() {
                println!("\nRecent activity:");
                for entry in &stats.recent_activity {
                    println!(
                        "  {} {} ({})",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.name,
                        entry.action
                    );
                }
            }
        }
    }
    Ok(())
}

/// Search projects.
fn cmd_search(
    data: Option<&Path>,
    query: &str,
    filters: &SearchFilters,
    format: &str,
) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config, data)?;
    let results = store.search(query, filters);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        _ => {
            for project in &results {
                println!(
                    "{} ({}) - {}, started {}",
                    project.name, project.slug, project.status, project.start_date
                );
            }
            println!("\nTotal: {} projects", results.len());
        }
    }
    Ok(())
}

/// Write every project to a file or stdout.
fn cmd_export(data: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config, data)?;
    let bundle = store.export();
    let json = serde_json::to_string_pretty(&bundle)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} projects to {}", bundle.projects.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Merge an export file into the store.
fn cmd_import(data: Option<&Path>, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let config = Config::load()?;
    let store = open_store(&config, data)?;
    let summary = store.import(&document)?;

    println!("Imported {} projects ({} total)", summary.imported, summary.total);
    Ok(())
}

/// Print the path of a named route.
fn cmd_url(data: Option<&Path>, route: &str, raw_params: &[String]) -> Result<()> {
    let mut params = RouteParams::new();
    for raw in raw_params {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("Invalid parameter '{raw}', expected key=value"))?;
        params.insert(key.to_string(), value.to_string());
    }

    let app = build_app(data)?;
    let path = app.router().generate_url(route, &params)?;
    println!("{}{}", app.router().base_path(), path);
    Ok(())
}

/// Show a project and reload it on a timer until interrupted.
fn cmd_watch(data: Option<&Path>, slug: &str) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let app = build_app(data)?;
        let project = app
            .store()
            .get_by_slug(slug)
            .await?
            .with_context(|| format!("No project with slug '{slug}'"))?;

        app.start(&format!("/projects/{}", project.slug)).await?;

        let Some(mut refresh) = app.watch(project.automation_status) else {
            println!(
                "\nNot refreshing: automation is {} or refresh is disabled",
                project.automation_status
            );
            return Ok(());
        };

        eprintln!("Refreshing every {}s, press Ctrl+C to stop", refresh.interval().as_secs());
        let interrupted = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                true
            }
            () = refresh.stopped() => false,
        };
        if !interrupted {
            eprintln!("Automation is {}, stopped refreshing", refresh.mode());
        }
        drop(refresh);
        Ok(())
    })
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "stagetrack", &mut io::stdout());
}

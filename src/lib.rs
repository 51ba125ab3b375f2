#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::format_push_string)]

//! # Stagetrack
//!
//! Track projects through a fixed ten-stage, 28-day pipeline from your terminal.
//!
//! Each project's current stage and overall progress are derived from its
//! start date (or pinned manually while automation is paused). Pages are
//! addressed by path and dispatched through a small client router, the same
//! way a browser front end would address them.
//!
//! ## Features
//!
//! - **Timeline engine**: day-driven stage lookup, progress and roadmap
//! - **Router**: `/projects/:slug` style patterns, history, link handling
//! - **Store**: JSON-file persistence with search, stats, import and export
//! - **Live view**: auto refresh for running projects
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a project
//! stagetrack add "Vitamin D3" --start 2024-02-20
//!
//! # Show the dashboard
//! stg list
//!
//! # Open a project page
//! stg open /projects/vitamin-d3
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app;
pub mod core;
pub mod pages;
pub mod router;
pub mod store;
pub mod timeline;
pub mod view;

pub use app::App;
pub use core::{Config, EventBus, Notification, Subscription};
pub use router::{RouteError, RouteMatch, Router};
pub use store::{JsonStore, NewProject, Project, ProjectRepository, ProjectUpdate, StoreError};
pub use timeline::{ProgressResult, Stage, TimelineEngine, TimelineError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "stagetrack";

/// Default suffix for page titles
pub const DEFAULT_SITE_TITLE: &str = "Stagetrack";

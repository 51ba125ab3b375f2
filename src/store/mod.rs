//! Project records and their persistence.
//!
//! Projects live in a single JSON document. [`JsonStore`] implements
//! [`ProjectRepository`] over that file and announces every mutation on a
//! `dataChanged` [`EventBus`](crate::core::EventBus).

mod json;
mod query;
pub mod slug;
mod validation;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::{AutomationMode, TimelineSource};

pub use json::{ExportBundle, ImportSummary, JsonStore, StoreMetadata, FORMAT_VERSION};
pub use query::{
    search, stats, ProjectStats, RecentActivity, SearchFilters, SortField, SortOrder,
};
pub use validation::{validate_fields, validate_project};

/// Errors from project storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No project with this id or slug.
    #[error("Project not found: {0}")]
    NotFound(String),

    /// One or more fields failed validation.
    #[error("{0}")]
    Validation(String),

    /// Reading or writing the data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An import document was rejected.
    #[error("{0}")]
    InvalidImport(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Lifecycle status shown next to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    Delayed,
    #[serde(rename = "On Hold")]
    OnHold,
    Cancelled,
    Completed,
}

impl ProjectStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 5] =
        [Self::InProgress, Self::Delayed, Self::OnHold, Self::Cancelled, Self::Completed];

    /// Stored name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Delayed => "Delayed",
            Self::OnHold => "On Hold",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String =
            s.trim().to_lowercase().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        match normalized.as_str() {
            "inprogress" | "active" => Ok(Self::InProgress),
            "delayed" => Ok(Self::Delayed),
            "onhold" | "hold" => Ok(Self::OnHold),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(format!(
                "Invalid project status '{}' (expected one of: {})",
                s.trim(),
                Self::ALL.map(Self::as_str).join(", ")
            )),
        }
    }
}

/// A tracked project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique id (`proj_<uuid>`)
    pub id: String,
    /// Display name
    pub name: String,
    /// URL segment, unique across projects
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub start_date: String,
    /// Manually chosen stage, authoritative while paused
    #[serde(default = "default_stage")]
    pub stage: u8,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub automation_status: AutomationMode,
    #[serde(default)]
    pub delay_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_stage() -> u8 {
    1
}

impl TimelineSource for Project {
    fn start_date(&self) -> Option<&str> {
        Some(self.start_date.as_str())
    }

    fn automation_mode(&self) -> AutomationMode {
        self.automation_status
    }

    fn manual_stage(&self) -> Option<u8> {
        Some(self.stage)
    }
}

/// Generate a fresh project id.
pub fn generate_project_id() -> String {
    format!("proj_{}", uuid::Uuid::new_v4().simple())
}

/// Input for creating a project. Also the shape of imported records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProject {
    /// Kept when importing; generated otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub stage: Option<u8>,
    pub status: Option<ProjectStatus>,
    pub automation_status: Option<AutomationMode>,
    pub delay_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewProject {
    /// Minimal input: a name and a start date.
    pub fn new(name: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self { name: name.into(), start_date: start_date.into(), ..Self::default() }
    }

    /// Build a full record with defaults filled in. The slug is left to the caller.
    pub(crate) fn into_project(self, slug: String, now: DateTime<Utc>) -> Project {
        Project {
            id: self.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(generate_project_id),
            name: self.name.trim().to_string(),
            slug,
            description: self.description,
            start_date: self.start_date.trim().to_string(),
            stage: self.stage.unwrap_or(1),
            status: self.status.unwrap_or_default(),
            automation_status: self.automation_status.unwrap_or_default(),
            delay_notes: self.delay_notes,
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        }
    }

    /// The fields this record would overwrite on an existing project.
    pub(crate) fn as_update(&self) -> ProjectUpdate {
        ProjectUpdate {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            start_date: Some(self.start_date.clone()),
            stage: self.stage,
            status: self.status,
            automation_status: self.automation_status,
            delay_notes: Some(self.delay_notes.clone()),
        }
    }
}

/// A partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub stage: Option<u8>,
    pub status: Option<ProjectStatus>,
    pub automation_status: Option<AutomationMode>,
    pub delay_notes: Option<String>,
}

impl ProjectUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto `project`. Returns whether the name changed.
    pub(crate) fn apply_to(&self, project: &mut Project) -> bool {
        let mut renamed = false;
        if let Some(name) = &self.name {
            let name = name.trim();
            renamed = name != project.name;
            project.name = name.to_string();
        }
        if let Some(description) = &self.description {
            project.description.clone_from(description);
        }
        if let Some(start_date) = &self.start_date {
            project.start_date = start_date.trim().to_string();
        }
        if let Some(stage) = self.stage {
            project.stage = stage;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(mode) = self.automation_status {
            project.automation_status = mode;
        }
        if let Some(notes) = &self.delay_notes {
            project.delay_notes.clone_from(notes);
        }
        renamed
    }
}

/// Storage for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// All projects in stored order.
    async fn list(&self) -> StoreResult<Vec<Project>>;

    /// A project by id.
    async fn get(&self, id: &str) -> StoreResult<Option<Project>>;

    /// A project by slug.
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Project>>;

    /// Validate and store a new project.
    async fn create(&self, input: NewProject) -> StoreResult<Project>;

    /// Merge a partial update into an existing project.
    async fn update(&self, id: &str, update: ProjectUpdate) -> StoreResult<Project>;

    /// Remove a project, returning it.
    async fn delete(&self, id: &str) -> StoreResult<Project>;
}

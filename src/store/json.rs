//! JSON-file project repository.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::slug::unique_slug;
use super::validation::{validate_fields, validate_project};
use super::{
    NewProject, Project, ProjectRepository, ProjectStats, ProjectUpdate, SearchFilters,
    StoreError, StoreResult,
};
use crate::core::events::{EventBus, Subscription, DATA_CHANGED};
use crate::core::Notification;
use crate::timeline::TimelineEngine;

/// Version written to data files and exports.
pub const FORMAT_VERSION: &str = "1.0.0";

/// File-level bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub total_projects: usize,
}

impl StoreMetadata {
    fn for_projects(projects: &[Project]) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            last_updated: Utc::now(),
            total_projects: projects.len(),
        }
    }
}

/// On-disk document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    projects: Vec<Project>,
    metadata: StoreMetadata,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self { projects: Vec::new(), metadata: StoreMetadata::for_projects(&[]) }
    }
}

/// Full dump produced by [`JsonStore::export`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub projects: Vec<Project>,
    pub metadata: StoreMetadata,
}

/// Outcome of [`JsonStore::import`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records in the import document
    pub imported: usize,
    /// Projects stored afterwards
    pub total: usize,
}

/// Projects persisted as one JSON document.
///
/// Without a path the store lives in memory only.
pub struct JsonStore {
    path: Option<PathBuf>,
    data: RwLock<StoreFile>,
    events: EventBus,
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore")
            .field("path", &self.path)
            .field("projects", &self.data.read().projects.len())
            .finish()
    }
}

impl JsonStore {
    /// Open the data file at `path`.
    ///
    /// A missing file starts an empty store. An unreadable or corrupt file is
    /// logged, copied to `<name>.bak` and also starts empty; it is only
    /// overwritten by the next successful mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match Self::load(&path) {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "Failed to load projects; starting empty");
                Self::back_up(&path);
                StoreFile::default()
            }
        };
        tracing::debug!(path = %path.display(), projects = data.projects.len(), "Opened project store");
        Self { path: Some(path), data: RwLock::new(data), events: EventBus::new(DATA_CHANGED) }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None, data: RwLock::new(StoreFile::default()), events: EventBus::new(DATA_CHANGED) }
    }

    fn load(path: &Path) -> StoreResult<StoreFile> {
        if !path.exists() {
            return Ok(StoreFile::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Backup location for a data file that failed to load.
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".bak");
        path.with_file_name(name)
    }

    fn back_up(path: &Path) {
        if !path.is_file() {
            return;
        }
        let backup = Self::backup_path(path);
        match fs::copy(path, &backup) {
            Ok(_) => tracing::warn!(backup = %backup.display(), "Backed up unreadable project file"),
            Err(err) => {
                tracing::error!(backup = %backup.display(), error = %err, "Failed to back up project file")
            }
        }
    }

    /// Re-read the backing file, picking up writes made by other processes.
    ///
    /// In-memory stores are left as they are. A file that fails to load keeps
    /// the current data.
    pub fn reload(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let fresh = Self::load(path).inspect_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "Failed to reload projects");
        })?;
        tracing::debug!(projects = fresh.projects.len(), "Reloaded project store");
        *self.data.write() = fresh;
        Ok(())
    }

    fn persist(&self, data: &StoreFile) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(data)?;
        fs::write(path, content).inspect_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "Failed to save projects");
        })?;
        Ok(())
    }

    /// Apply `change` to a copy of the projects and commit it once saved.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Project>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut data = self.data.write();
        let mut projects = data.projects.clone();
        let outcome = change(&mut projects)?;

        let next = StoreFile { metadata: StoreMetadata::for_projects(&projects), projects };
        self.persist(&next)?;
        *data = next;
        Ok(outcome)
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current file metadata.
    pub fn metadata(&self) -> StoreMetadata {
        self.data.read().metadata.clone()
    }

    /// Snapshot of all projects.
    pub fn projects(&self) -> Vec<Project> {
        self.data.read().projects.clone()
    }

    /// Listen for `dataChanged` notifications.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Find projects; see [`super::search`].
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<Project> {
        super::search(&self.data.read().projects, query, filters)
    }

    /// Summary statistics; see [`super::stats`].
    pub fn stats(&self, engine: &TimelineEngine) -> ProjectStats {
        super::stats(&self.data.read().projects, engine)
    }

    /// Dump every project with the file metadata.
    pub fn export(&self) -> ExportBundle {
        let data = self.data.read();
        ExportBundle {
            version: FORMAT_VERSION.to_string(),
            export_date: Utc::now(),
            projects: data.projects.clone(),
            metadata: data.metadata.clone(),
        }
    }

    /// Merge an import document into the store.
    ///
    /// The document needs a `projects` array. Every record is validated before
    /// anything is written; records whose id exists update that project, the
    /// rest are added with fresh unique slugs.
    pub fn import(&self, document: &serde_json::Value) -> StoreResult<ImportSummary> {
        let records = document
            .get("projects")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| StoreError::InvalidImport("Invalid import data format".to_string()))?;

        let mut incoming = Vec::with_capacity(records.len());
        for record in records {
            let label = record.get("name").and_then(serde_json::Value::as_str).unwrap_or("");
            let input: NewProject = serde_json::from_value(record.clone()).map_err(|err| {
                StoreError::InvalidImport(format!("Invalid project \"{label}\": {err}"))
            })?;
            let errors = validate_fields(&input.name, &input.start_date, input.stage);
            if !errors.is_empty() {
                return Err(StoreError::InvalidImport(format!(
                    "Invalid project \"{}\": {}",
                    input.name,
                    errors.join(", ")
                )));
            }
            incoming.push(input);
        }

        let imported = incoming.len();
        let total = self.mutate(|projects| {
            let now = Utc::now();
            for input in incoming {
                let existing = input
                    .id
                    .as_deref()
                    .and_then(|id| projects.iter().position(|p| p.id == id));
                match existing {
                    Some(index) => {
                        let mut project = projects[index].clone();
                        if input.as_update().apply_to(&mut project) {
                            project.slug = unique_slug(&project.name, projects, Some(&project.id));
                        }
                        project.updated_at = now;
                        projects[index] = project;
                    }
                    None => {
                        let slug = unique_slug(&input.name, projects, None);
                        projects.push(input.into_project(slug, now));
                    }
                }
            }
            Ok(projects.len())
        })?;

        let summary = ImportSummary { imported, total };
        tracing::info!(imported, total, "Imported projects");
        self.emit("import", serde_json::to_value(summary)?);
        Ok(summary)
    }

    /// Remove every project.
    pub fn clear(&self) -> StoreResult<()> {
        self.mutate(|projects| {
            projects.clear();
            Ok(())
        })?;
        self.emit("clear", serde_json::Value::Null);
        Ok(())
    }

    fn emit(&self, action: &str, payload: serde_json::Value) {
        self.events.emit(action, payload);
    }

    fn emit_project(&self, action: &str, project: &Project) {
        let payload = serde_json::to_value(project).unwrap_or(serde_json::Value::Null);
        self.emit(action, payload);
    }
}

#[async_trait]
impl ProjectRepository for JsonStore {
    async fn list(&self) -> StoreResult<Vec<Project>> {
        Ok(self.projects())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.data.read().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Project>> {
        Ok(self.data.read().projects.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create(&self, input: NewProject) -> StoreResult<Project> {
        validate_project(&input)?;

        let project = self.mutate(|projects| {
            let slug = unique_slug(&input.name, projects, None);
            let project = input.into_project(slug, Utc::now());
            projects.push(project.clone());
            Ok(project)
        })?;

        tracing::info!(id = %project.id, slug = %project.slug, "Created project");
        self.emit_project("create", &project);
        Ok(project)
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> StoreResult<Project> {
        let project = self.mutate(|projects| {
            let index = projects
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            let mut project = projects[index].clone();
            let renamed = update.apply_to(&mut project);

            let errors = validate_fields(&project.name, &project.start_date, Some(project.stage));
            if !errors.is_empty() {
                return Err(StoreError::Validation(errors.join(", ")));
            }

            if renamed {
                project.slug = unique_slug(&project.name, projects, Some(id));
            }
            project.updated_at = Utc::now();
            projects[index] = project.clone();
            Ok(project)
        })?;

        tracing::info!(id = %project.id, slug = %project.slug, "Updated project");
        self.emit_project("update", &project);
        Ok(project)
    }

    async fn delete(&self, id: &str) -> StoreResult<Project> {
        let removed = self.mutate(|projects| {
            let index = projects
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            Ok(projects.remove(index))
        })?;

        tracing::info!(id = %removed.id, "Deleted project");
        self.emit_project("delete", &removed);
        Ok(removed)
    }
}

//! Route handlers for the built-in pages.
//!
//! Each handler loads what it needs from the store, then renders only if its
//! dispatch is still the latest one. A project that does not exist is shown
//! as an error message; store failures propagate to the router.

use std::sync::Arc;

use async_trait::async_trait;

use crate::router::{RouteHandler, RouteHandlers, RouteRequest};
use crate::store::{Project, ProjectRepository};
use crate::timeline::TimelineEngine;
use crate::view::{DashboardRow, PageSurface, ProjectView};

/// Message shown when a slug matches no project.
pub const PROJECT_NOT_FOUND_MESSAGE: &str = "Project not found";

/// Shared dependencies of the page handlers.
pub struct PageContext {
    pub store: Arc<dyn ProjectRepository>,
    pub surface: Arc<dyn PageSurface>,
    pub engine: TimelineEngine,
    pub site_title: String,
    pub public_host: String,
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("engine", &self.engine)
            .field("site_title", &self.site_title)
            .field("public_host", &self.public_host)
            .finish()
    }
}

impl PageContext {
    /// Look up the project named by the request's `slug`.
    async fn project_for(&self, request: &RouteRequest) -> anyhow::Result<Option<Project>> {
        let slug = request
            .param("slug")
            .ok_or_else(|| anyhow::anyhow!("route {} has no slug parameter", request.route_name))?;
        tracing::debug!(slug, "Loading project");
        Ok(self.store.get_by_slug(slug).await?)
    }

    /// Whether the request may still render; logs when it may not.
    fn still_current(request: &RouteRequest) -> bool {
        let current = request.is_current();
        if !current {
            tracing::debug!(
                route = %request.route_name,
                sequence = request.ticket.sequence(),
                "Discarding stale dispatch"
            );
        }
        current
    }
}

/// Handlers for every built-in route.
pub fn handlers(context: Arc<PageContext>) -> RouteHandlers {
    RouteHandlers {
        dashboard: Arc::new(DashboardPage(Arc::clone(&context))),
        project: Arc::new(ProjectPage(Arc::clone(&context))),
        project_edit: Arc::new(ProjectEditPage(Arc::clone(&context))),
        not_found: Arc::new(NotFoundPage(context)),
    }
}

/// `/`: every project with its current stage and progress.
#[derive(Debug)]
pub struct DashboardPage(Arc<PageContext>);

#[async_trait]
impl RouteHandler for DashboardPage {
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()> {
        let projects = self.0.store.list().await?;
        if !PageContext::still_current(&request) {
            return Ok(());
        }

        let rows: Vec<DashboardRow> =
            projects.iter().map(|p| DashboardRow::build(p, &self.0.engine)).collect();
        self.0.surface.show_dashboard(&rows);
        Ok(())
    }
}

/// `/projects/:slug`: the project page.
#[derive(Debug)]
pub struct ProjectPage(Arc<PageContext>);

#[async_trait]
impl RouteHandler for ProjectPage {
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()> {
        let ctx = &self.0;
        let project = ctx.project_for(&request).await?;
        if !PageContext::still_current(&request) {
            return Ok(());
        }

        let Some(project) = project else {
            ctx.surface.show_error(PROJECT_NOT_FOUND_MESSAGE);
            return Ok(());
        };

        ctx.surface.set_title(&format!("{} - {}", project.name, ctx.site_title));
        ctx.surface.show_project(&ProjectView::build(&project, &ctx.engine, &ctx.public_host));
        Ok(())
    }
}

/// `/projects/:slug/edit`: the editable fields of a project.
#[derive(Debug)]
pub struct ProjectEditPage(Arc<PageContext>);

#[async_trait]
impl RouteHandler for ProjectEditPage {
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()> {
        let ctx = &self.0;
        let project = ctx.project_for(&request).await?;
        if !PageContext::still_current(&request) {
            return Ok(());
        }

        match project {
            Some(project) => ctx.surface.show_edit_form(&project),
            None => ctx.surface.show_error(PROJECT_NOT_FOUND_MESSAGE),
        }
        Ok(())
    }
}

/// Fallback for unknown paths.
#[derive(Debug)]
pub struct NotFoundPage(Arc<PageContext>);

#[async_trait]
impl RouteHandler for NotFoundPage {
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()> {
        self.0.surface.show_not_found(&request.path);
        Ok(())
    }
}

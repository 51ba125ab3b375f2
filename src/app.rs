//! Application wiring.
//!
//! The `App` ties the project store, the timeline engine, a page surface and
//! the router together, and is what the CLI drives.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::core::Config;
use crate::pages::{self, PageContext};
use crate::router::{MemoryHistory, NavigateOptions, NavigationHost, RouteMatch, Router};
use crate::store::{JsonStore, ProjectRepository};
use crate::timeline::{AutoRefresh, AutomationMode, TimelineEngine};
use crate::view::PageSurface;

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Effective configuration
    pub config: Config,
    store: Arc<JsonStore>,
    engine: TimelineEngine,
    history: Arc<MemoryHistory>,
    router: Arc<Router>,
}

impl App {
    /// Wire up an app reading the system clock.
    pub fn new<S>(config: Config, store: Arc<JsonStore>, surface: Arc<S>) -> anyhow::Result<Self>
    where
        S: PageSurface + 'static,
    {
        Self::with_engine(config, store, surface, TimelineEngine::new())
    }

    /// Wire up an app with a specific engine.
    pub fn with_engine<S>(
        config: Config,
        store: Arc<JsonStore>,
        surface: Arc<S>,
        engine: TimelineEngine,
    ) -> anyhow::Result<Self>
    where
        S: PageSurface + 'static,
    {
        let history = Arc::new(MemoryHistory::default());
        let router = Router::new(history.clone(), surface.clone())
            .with_site_title(config.general.site_title.clone());
        router.set_base_path(&config.general.base_path);

        let context = Arc::new(PageContext {
            store: store.clone(),
            surface,
            engine,
            site_title: config.general.site_title.clone(),
            public_host: config.display.public_host.clone(),
        });
        router.register(pages::handlers(context))?;

        Ok(Self { config, store, engine, history, router: Arc::new(router) })
    }

    /// The project store.
    pub fn store(&self) -> &Arc<JsonStore> {
        &self.store
    }

    /// The timeline engine pages are computed with.
    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    /// The router.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Session history.
    pub fn history(&self) -> &Arc<MemoryHistory> {
        &self.history
    }

    /// Begin the session at `path` and dispatch it.
    pub async fn start(&self, path: &str) -> anyhow::Result<Option<RouteMatch>> {
        let location = format!("{}{}", self.router.base_path(), path);
        self.history.replace(&location, None);
        tracing::debug!(path = %location, "Starting session");
        Ok(self.router.start().await?)
    }

    /// Navigate to `path`.
    pub async fn open(&self, path: &str) -> anyhow::Result<Option<RouteMatch>> {
        Ok(self.router.navigate(path, NavigateOptions::push()).await?)
    }

    /// Re-dispatch the current page.
    pub async fn refresh(&self) -> anyhow::Result<Option<RouteMatch>> {
        Ok(self.router.reload().await?)
    }

    /// A timer that re-reads the store and reloads the current page.
    ///
    /// Returns `None` when refresh is disabled in the config. The timer is not
    /// armed; call [`AutoRefresh::arm`] with the project's mode. Once armed it
    /// stops by itself when the project on screen is no longer Running.
    pub fn auto_refresh(&self) -> Option<AutoRefresh> {
        let interval = self.config.refresh_interval()?;
        Some(reload_timer(Arc::clone(&self.store), Arc::clone(&self.router), interval))
    }

    /// Arm a reload timer for a project in `mode`.
    pub fn watch(&self, mode: AutomationMode) -> Option<AutoRefresh> {
        let mut refresh = self.auto_refresh()?;
        refresh.arm(mode);
        refresh.is_armed().then_some(refresh)
    }
}

fn reload_timer(store: Arc<JsonStore>, router: Arc<Router>, interval: Duration) -> AutoRefresh {
    AutoRefresh::new(
        interval,
        Arc::new(move || {
            let store = Arc::clone(&store);
            let router = Arc::clone(&router);
            async move {
                // Keep the previous data if the file is mid-write.
                let _ = store.reload();
                if let Err(err) = router.reload().await {
                    tracing::warn!(error = %err, "Auto refresh failed");
                }
                current_mode(&store, &router).await
            }
            .boxed()
        }),
    )
}

/// Mode of the project on screen; anything else counts as Paused.
async fn current_mode(store: &JsonStore, router: &Router) -> AutomationMode {
    let params = router.route_params();
    let Some(slug) = params.get("slug") else {
        return AutomationMode::Paused;
    };
    match store.get_by_slug(slug).await {
        Ok(Some(project)) => project.automation_status,
        Ok(None) => AutomationMode::Paused,
        Err(err) => {
            tracing::warn!(%slug, error = %err, "Auto refresh lookup failed");
            AutomationMode::Paused
        }
    }
}

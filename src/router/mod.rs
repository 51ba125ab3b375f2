//! Client navigation router.
//!
//! Routes are tried in registration order and the first match wins. The
//! wildcard fallback is always last, so it only catches paths nothing else
//! claimed. A path with no match at all is redirected to `/404` instead of
//! failing the caller.
//!
//! Every dispatch records the match as the current navigation state, updates
//! the page title, runs the handler, and then announces a `routeChanged`
//! notification whether or not the handler succeeded. Handler errors are
//! logged and shown as a generic message; they never reach the caller.

mod error;
mod handler;
mod host;
mod link;
mod pattern;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

pub use error::{RouteError, RouteResult};
pub use handler::{handler_fn, DispatchTicket, RouteHandler, RouteRequest, RouteSurface};
pub use host::{HistoryEntry, MemoryHistory, NavigationHost};
pub use link::{is_external_href, resolve_href, LinkClick, LinkDisposition, Modifiers, MouseButton};
pub use pattern::{RouteParams, RoutePattern, Token};

use crate::core::events::{EventBus, Subscription, ROUTE_CHANGED};
use crate::core::Notification;

/// Synthetic path dispatched when nothing matches.
pub const NOT_FOUND_PATH: &str = "/404";

/// Message shown when a handler fails.
pub const HANDLER_ERROR_MESSAGE: &str = "An error occurred while loading the page.";

/// Names of the built-in routes.
pub mod names {
    /// `/`
    pub const DASHBOARD: &str = "dashboard";
    /// `/projects/:slug`
    pub const PROJECT: &str = "project";
    /// `/projects/:slug/edit`
    pub const PROJECT_EDIT: &str = "project-edit";
    /// `*`
    pub const NOT_FOUND: &str = "404";
}

/// Lifecycle of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPhase {
    /// Routes may be registered; navigation is refused
    Uninitialized,
    /// Idle, waiting for navigation
    Ready,
    /// At least one handler is running
    Dispatching,
}

/// Options for [`Router::navigate`].
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// Opaque state stored with the history entry
    pub state: Option<serde_json::Value>,
}

impl NavigateOptions {
    /// Push a new entry.
    pub fn push() -> Self {
        Self::default()
    }

    /// Replace the current entry.
    pub fn replace() -> Self {
        Self { replace: true, state: None }
    }
}

/// Current navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch {
    /// Route name
    pub route: String,
    /// Route title
    pub title: String,
    /// Pattern source
    pub pattern: String,
    /// Extracted parameters
    pub params: RouteParams,
    /// Matched path (without base path)
    pub path: String,
    /// Dispatch sequence number
    pub sequence: u64,
}

/// A registered route.
struct Route {
    pattern: RoutePattern,
    name: String,
    title: String,
    handler: Arc<dyn RouteHandler>,
}

/// Handlers for the fixed route set installed by [`Router::initialize`].
#[derive(Clone)]
pub struct RouteHandlers {
    pub dashboard: Arc<dyn RouteHandler>,
    pub project: Arc<dyn RouteHandler>,
    pub project_edit: Arc<dyn RouteHandler>,
    pub not_found: Arc<dyn RouteHandler>,
}

/// Decrements the in-flight count even if the dispatch future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Pattern-based path dispatcher.
pub struct Router {
    routes: RwLock<Vec<Arc<Route>>>,
    host: Arc<dyn NavigationHost>,
    surface: Arc<dyn RouteSurface>,
    current: RwLock<Option<RouteMatch>>,
    base_path: RwLock<String>,
    site_title: String,
    initialized: AtomicBool,
    in_flight: AtomicUsize,
    sequence: Arc<AtomicU64>,
    events: EventBus,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.read().len())
            .field("phase", &self.phase())
            .field("current", &*self.current.read())
            .finish()
    }
}

impl Router {
    /// Create a router with no routes.
    pub fn new(host: Arc<dyn NavigationHost>, surface: Arc<dyn RouteSurface>) -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
            host,
            surface,
            current: RwLock::new(None),
            base_path: RwLock::new(String::new()),
            site_title: crate::DEFAULT_SITE_TITLE.to_string(),
            initialized: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            sequence: Arc::new(AtomicU64::new(0)),
            events: EventBus::new(ROUTE_CHANGED),
        }
    }

    /// Set the suffix used in page titles.
    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    /// Register a route after all existing ones.
    pub fn add_route(
        &self,
        pattern: &str,
        name: impl Into<String>,
        title: impl Into<String>,
        handler: Arc<dyn RouteHandler>,
    ) -> RouteResult<()> {
        let name = name.into();
        let pattern = RoutePattern::parse(pattern)?;

        let mut routes = self.routes.write();
        if routes.iter().any(|r| r.pattern.is_wildcard()) {
            return Err(RouteError::WildcardNotLast(name));
        }
        tracing::debug!(route = %name, pattern = %pattern, "Registered route");
        routes.push(Arc::new(Route { pattern, name, title: title.into(), handler }));
        Ok(())
    }

    /// Install the fixed route set without dispatching.
    pub fn register(&self, handlers: RouteHandlers) -> RouteResult<()> {
        self.add_route("/", names::DASHBOARD, "Project Dashboard", handlers.dashboard)?;
        self.add_route("/projects/:slug", names::PROJECT, "Project Dashboard", handlers.project)?;
        self.add_route(
            "/projects/:slug/edit",
            names::PROJECT_EDIT,
            "Edit Project",
            handlers.project_edit,
        )?;
        self.add_route("*", names::NOT_FOUND, "Page Not Found", handlers.not_found)
    }

    /// Install the fixed route set and dispatch the current location.
    ///
    /// The initial dispatch replaces the current history entry.
    pub async fn initialize(&self, handlers: RouteHandlers) -> RouteResult<Option<RouteMatch>> {
        self.register(handlers)?;
        self.start().await
    }

    /// Mark the router ready and dispatch the current location.
    pub async fn start(&self) -> RouteResult<Option<RouteMatch>> {
        self.initialized.store(true, Ordering::SeqCst);
        let path = self.current_path();
        self.navigate(&path, NavigateOptions::replace()).await
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RouterPhase {
        if !self.initialized.load(Ordering::SeqCst) {
            RouterPhase::Uninitialized
        } else if self.in_flight.load(Ordering::SeqCst) > 0 {
            RouterPhase::Dispatching
        } else {
            RouterPhase::Ready
        }
    }

    /// Set the prefix all app paths live under. A trailing `/` is dropped.
    pub fn set_base_path(&self, base_path: &str) {
        *self.base_path.write() = base_path.trim_end_matches('/').to_string();
    }

    /// The configured base path.
    pub fn base_path(&self) -> String {
        self.base_path.read().clone()
    }

    /// Host location with the base path removed.
    ///
    /// The base only matches whole segments: `/app` strips from `/app/x` but
    /// not from `/application/x`.
    pub fn current_path(&self) -> String {
        let full = self.host.current_path();
        let base = self.base_path.read();
        let path = match full.strip_prefix(base.as_str()) {
            Some(rest) if !base.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
            _ => full.as_str(),
        };
        if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        }
    }

    /// Navigate to `path`, updating history and dispatching its route.
    ///
    /// Unmatched paths are redirected to [`NOT_FOUND_PATH`]. Returns the
    /// dispatched match, or `None` if not even the not-found path matched.
    pub async fn navigate(
        &self,
        path: &str,
        options: NavigateOptions,
    ) -> RouteResult<Option<RouteMatch>> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(RouteError::NotInitialized);
        }

        let mut path = path.to_string();
        let mut options = options;
        let (route, params) = loop {
            if let Some(found) = self.match_route(&path) {
                break found;
            }
            if path == NOT_FOUND_PATH {
                tracing::error!("No route handles {NOT_FOUND_PATH}; register a wildcard route");
                return Ok(None);
            }
            tracing::warn!(path = %path, "No route found for path");
            path = NOT_FOUND_PATH.to_string();
            options = NavigateOptions::replace();
        };

        let full_path = format!("{}{}", self.base_path.read(), path);
        if options.replace {
            self.host.replace(&full_path, options.state);
        } else {
            self.host.push(&full_path, options.state);
        }

        Ok(Some(self.dispatch(route, params, path).await))
    }

    /// Navigate by replacing the current history entry.
    pub async fn redirect(&self, path: &str) -> RouteResult<Option<RouteMatch>> {
        self.navigate(path, NavigateOptions::replace()).await
    }

    /// Re-dispatch the current location.
    pub async fn reload(&self) -> RouteResult<Option<RouteMatch>> {
        let path = self.current_path();
        self.navigate(&path, NavigateOptions::replace()).await
    }

    /// React to the host moving through history.
    ///
    /// The host has already changed location, so history is left untouched.
    pub async fn handle_history_change(&self) -> Option<RouteMatch> {
        let path = self.current_path();
        let (route, params) = self.match_route(&path)?;
        Some(self.dispatch(route, params, path).await)
    }

    /// Step back in history and dispatch the new location.
    pub async fn back(&self) -> Option<RouteMatch> {
        if self.host.back() {
            self.handle_history_change().await
        } else {
            None
        }
    }

    /// Step forward in history and dispatch the new location.
    pub async fn forward(&self) -> Option<RouteMatch> {
        if self.host.forward() {
            self.handle_history_change().await
        } else {
            None
        }
    }

    /// Handle a link activation, routing in-app links.
    pub async fn handle_link_click(&self, click: &LinkClick) -> LinkDisposition {
        let Some(target) = click.router_target() else {
            return LinkDisposition::Default;
        };
        let path = resolve_href(&self.current_path(), target);

        match self.navigate(&path, NavigateOptions::push()).await {
            Ok(_) => LinkDisposition::Intercepted,
            Err(err) => {
                tracing::warn!(href = %target, error = %err, "Leaving link to default handling");
                LinkDisposition::Default
            }
        }
    }

    /// Build the path of a named route.
    pub fn generate_url(&self, route_name: &str, params: &RouteParams) -> RouteResult<String> {
        let routes = self.routes.read();
        let route = routes
            .iter()
            .find(|r| r.name == route_name)
            .ok_or_else(|| RouteError::UnknownRoute(route_name.to_string()))?;
        route.pattern.reverse_generate(params)
    }

    /// Name and parameters of the route `path` would dispatch to.
    pub fn resolve(&self, path: &str) -> Option<(String, RouteParams)> {
        self.match_route(path).map(|(route, params)| (route.name.clone(), params))
    }

    /// Registered routes as `(name, pattern)` in dispatch order.
    pub fn routes(&self) -> Vec<(String, String)> {
        self.routes
            .read()
            .iter()
            .map(|r| (r.name.clone(), r.pattern.as_str().to_string()))
            .collect()
    }

    /// The current navigation state.
    pub fn current_route(&self) -> Option<RouteMatch> {
        self.current.read().clone()
    }

    /// Parameters of the current route.
    pub fn route_params(&self) -> RouteParams {
        self.current.read().as_ref().map(|m| m.params.clone()).unwrap_or_default()
    }

    /// Whether the current route has the given name.
    pub fn is_current_route(&self, route_name: &str) -> bool {
        self.current.read().as_ref().is_some_and(|m| m.route == route_name)
    }

    /// Listen for completed dispatches.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    fn match_route(&self, path: &str) -> Option<(Arc<Route>, RouteParams)> {
        self.routes
            .read()
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|params| (Arc::clone(route), params)))
    }

    async fn dispatch(&self, route: Arc<Route>, params: RouteParams, path: String) -> RouteMatch {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let matched = RouteMatch {
            route: route.name.clone(),
            title: route.title.clone(),
            pattern: route.pattern.as_str().to_string(),
            params: params.clone(),
            path: path.clone(),
            sequence,
        };

        *self.current.write() = Some(matched.clone());
        self.surface.set_title(&format!("{} - {}", route.title, self.site_title));
        tracing::debug!(route = %route.name, path = %path, sequence, "Dispatching route");

        let request = RouteRequest {
            route_name: route.name.clone(),
            path,
            params,
            ticket: DispatchTicket::new(sequence, Arc::clone(&self.sequence)),
        };

        let outcome = {
            let _guard = InFlight::enter(&self.in_flight);
            route.handler.handle(request).await
        };

        if let Err(err) = outcome {
            tracing::error!(
                route = %route.name,
                path = %matched.path,
                error = %format!("{err:#}"),
                "Error executing route"
            );
            self.surface.show_error(HANDLER_ERROR_MESSAGE);
        }

        let payload = serde_json::to_value(&matched).unwrap_or(serde_json::Value::Null);
        self.events.emit(route.name.clone(), payload);
        matched
    }
}

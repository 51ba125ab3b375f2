//! Route handler contracts.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::pattern::RouteParams;

/// Where the router reports page titles and failures.
pub trait RouteSurface: Send + Sync {
    /// Show a new page title.
    fn set_title(&self, title: &str);

    /// Show an error message in place of the page.
    fn show_error(&self, message: &str);
}

/// Identifies one dispatch among overlapping navigations.
///
/// Handlers that await slow work should check [`is_current`](Self::is_current)
/// before rendering so that only the latest navigation paints.
#[derive(Debug, Clone)]
pub struct DispatchTicket {
    sequence: u64,
    latest: Arc<AtomicU64>,
}

impl DispatchTicket {
    pub(crate) fn new(sequence: u64, latest: Arc<AtomicU64>) -> Self {
        Self { sequence, latest }
    }

    /// Sequence number of this dispatch.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether no later dispatch has started.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.sequence
    }
}

/// Everything a handler receives for one dispatch.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// Name of the matched route
    pub route_name: String,
    /// Path that was matched (without base path)
    pub path: String,
    /// Extracted parameters
    pub params: RouteParams,
    /// Sequence token for this dispatch
    pub ticket: DispatchTicket,
}

impl RouteRequest {
    /// A parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether this dispatch is still the latest one.
    pub fn is_current(&self) -> bool {
        self.ticket.is_current()
    }
}

/// Work performed when a route is dispatched.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Handle a dispatch. Errors are caught and shown by the router.
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, request: RouteRequest) -> anyhow::Result<()> {
        (self.0)(request).await
    }
}

/// Wrap an async closure as a route handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sequence: u64, latest: &Arc<AtomicU64>) -> RouteRequest {
        let mut params = RouteParams::new();
        params.insert("slug".into(), "zinc".into());
        RouteRequest {
            route_name: "project".into(),
            path: "/projects/zinc".into(),
            params,
            ticket: DispatchTicket::new(sequence, Arc::clone(latest)),
        }
    }

    #[test]
    fn test_ticket_goes_stale() {
        let latest = Arc::new(AtomicU64::new(1));
        let req = request(1, &latest);
        assert!(req.is_current());

        latest.store(2, Ordering::SeqCst);
        assert!(!req.is_current());
        assert_eq!(req.ticket.sequence(), 1);
    }

    #[test]
    fn test_handler_fn_receives_params() {
        let latest = Arc::new(AtomicU64::new(1));
        let handler = handler_fn(|req: RouteRequest| async move {
            match req.param("slug") {
                Some("zinc") => Ok(()),
                other => Err(anyhow::anyhow!("unexpected slug {other:?}")),
            }
        });

        tokio_test::block_on(handler.handle(request(1, &latest))).unwrap();
    }

    #[test]
    fn test_handler_fn_propagates_errors() {
        let latest = Arc::new(AtomicU64::new(1));
        let handler = handler_fn(|_req: RouteRequest| async {
            Err::<(), _>(anyhow::anyhow!("store offline"))
        });

        let err = tokio_test::block_on(handler.handle(request(1, &latest))).unwrap_err();
        assert_eq!(err.to_string(), "store offline");
    }
}

//! Live navigation service.
//!
//! Owns a `NavigationSession` inside a tokio task, consumes a stream of
//! location fixes, and emits navigation events to the consumer. One
//! handle per session: stopping it (or dropping it, e.g. when a new
//! session is started) cancels the task and releases the fix
//! subscription, so no stale session keeps draining the device.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use saferoute_core::models::{Coordinate, InvalidCoordinate, LocationFix, Route};
use saferoute_core::session::{NavigationSession, NavigationUpdate};
use saferoute_providers::RoutingProvider;

use crate::acquire::RouteAcquirer;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Events delivered to the navigation consumer, strictly in fix-arrival
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// A fix was accepted and progress recomputed.
    Update(NavigationUpdate),
    /// No fix arrived within the first-fix timeout; the session is
    /// still awaiting one.
    LocationUnavailable,
    /// The session ended: explicit stop or the fix stream closed.
    Stopped,
}

/// Deferred route acquisition for sessions started with only a
/// destination (the route is computed from the first live fix).
#[async_trait]
pub trait AcquireRoute: Send + Sync {
    async fn acquire_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Arc<Route>, InvalidCoordinate>;
}

#[async_trait]
impl<P: RoutingProvider + 'static> AcquireRoute for RouteAcquirer<P> {
    async fn acquire_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Arc<Route>, InvalidCoordinate> {
        self.acquire(origin, destination).await
    }
}

/// Handle to a running navigation session.
pub struct NavigationHandle {
    events: mpsc::Receiver<NavigationEvent>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl NavigationHandle {
    /// Next event, or `None` once the session task has ended.
    pub async fn next_event(&mut self) -> Option<NavigationEvent> {
        self.events.recv().await
    }

    /// Stop the session. The task emits a final `Stopped` event, drops
    /// the fix subscription, and exits. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for NavigationHandle {
    fn drop(&mut self) {
        // Swapping in a new session must not leak the old subscription.
        self.task.abort();
    }
}

/// Start navigation along an already-acquired route.
pub fn start_navigation(
    route: Arc<Route>,
    fixes: mpsc::Receiver<LocationFix>,
    first_fix_timeout: Duration,
) -> NavigationHandle {
    spawn_session(SessionStart::Ready(route), fixes, first_fix_timeout)
}

/// Start navigation toward a destination with no route yet: the route
/// is acquired from the first live fix. If the provider is down at that
/// point, acquisition degrades to the straight-line fallback and the
/// session reports its single synthetic step.
pub fn start_navigation_to(
    acquirer: Arc<dyn AcquireRoute>,
    destination: Coordinate,
    fixes: mpsc::Receiver<LocationFix>,
    first_fix_timeout: Duration,
) -> NavigationHandle {
    spawn_session(
        SessionStart::Deferred { acquirer, destination },
        fixes,
        first_fix_timeout,
    )
}

enum SessionStart {
    Ready(Arc<Route>),
    Deferred {
        acquirer: Arc<dyn AcquireRoute>,
        destination: Coordinate,
    },
}

fn spawn_session(
    start: SessionStart,
    fixes: mpsc::Receiver<LocationFix>,
    first_fix_timeout: Duration,
) -> NavigationHandle {
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(run_session(start, fixes, stop_rx, events_tx, first_fix_timeout));

    NavigationHandle {
        events: events_rx,
        stop_tx: Some(stop_tx),
        task,
    }
}

async fn run_session(
    start: SessionStart,
    mut fixes: mpsc::Receiver<LocationFix>,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<NavigationEvent>,
    first_fix_timeout: Duration,
) {
    let (mut session, mut deferred) = match start {
        SessionStart::Ready(route) => (Some(NavigationSession::new(route)), None),
        SessionStart::Deferred { acquirer, destination } => (None, Some((acquirer, destination))),
    };
    let mut accepted_any = false;
    let mut reported_unavailable = false;

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                if let Some(session) = session.as_mut() {
                    session.stop();
                }
                let _ = events.send(NavigationEvent::Stopped).await;
                return;
            }
            maybe_fix = fixes.recv() => {
                let Some(fix) = maybe_fix else {
                    // Fix subscription ended underneath us.
                    if let Some(session) = session.as_mut() {
                        session.stop();
                    }
                    let _ = events.send(NavigationEvent::Stopped).await;
                    return;
                };

                if session.is_none() {
                    if let Some((acquirer, destination)) = deferred.take() {
                        match acquirer.acquire_route(fix.coordinate, destination).await {
                            Ok(route) => session = Some(NavigationSession::new(route)),
                            Err(err) => {
                                tracing::warn!("ignoring fix with invalid coordinates: {err}");
                                deferred = Some((acquirer, destination));
                                continue;
                            }
                        }
                    }
                }

                if let Some(session) = session.as_mut() {
                    if let Some(update) = session.on_location_fix(&fix) {
                        accepted_any = true;
                        if events.send(NavigationEvent::Update(update)).await.is_err() {
                            // Consumer went away; nothing left to drive.
                            return;
                        }
                    }
                }
            }
            _ = tokio::time::sleep(first_fix_timeout), if !accepted_any && !reported_unavailable => {
                // Surface as status, not failure: the session stays in
                // AwaitingFix and later fixes are still accepted.
                reported_unavailable = true;
                if events.send(NavigationEvent::LocationUnavailable).await.is_err() {
                    return;
                }
            }
        }
    }
}

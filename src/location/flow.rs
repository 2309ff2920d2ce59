//! The location flow as an explicit state machine.
//!
//! ```text
//! Initializing ──denied──▶ PermissionDenied   (terminal)
//!      │
//!   granted
//!      ▼
//!   Loading ──fix──▶ Ready ◀──refresh/fix──┐
//!      │               └───────────────────┘
//!    error
//!      ▼
//!  Unavailable ──refresh──▶ Loading
//! ```
//!
//! The flow performs no I/O. Every transition returns the [`Command`]s a
//! driver must execute; their results come back as [`FlowEvent`]s.
//! Fetches are numbered, and only the most recently issued fetch may
//! change the state. A later refresh therefore supersedes any fetch
//! still in flight.

use crate::model::{Fix, MapView};

use super::{PermissionStatus, ProviderError};

/// Notice shown when the user refuses location access.
pub const PERMISSION_DENIED_NOTICE: &str = "Permission to access location was denied";

/// Identifies one coordinate fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Where the flow stands.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    /// Waiting for the permission answer.
    Initializing,

    /// The user refused. Nothing else will happen.
    PermissionDenied,

    /// Permission granted, first fix pending.
    Loading,

    /// A fix is on screen. `refreshing` while a newer one is being fetched.
    Ready { fix: Fix, refreshing: bool },

    /// The first fix could not be obtained. A refresh retries.
    Unavailable(ProviderError),
}

/// Work the driver must do on the flow's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RequestPermission,
    FetchFix(RequestId),
    Notify(Notice),
}

/// Something the user must be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Blocking: the user must dismiss it.
    PermissionDenied,

    /// Non-blocking: a refresh failed, the previous fix is still shown.
    RefreshFailed(ProviderError),
}

impl Notice {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    pub fn message(&self) -> String {
        match self {
            Self::PermissionDenied => PERMISSION_DENIED_NOTICE.to_string(),
            Self::RefreshFailed(e) => format!("Could not refresh location: {e}"),
        }
    }
}

/// Results of commands, fed back into the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    PermissionResolved(PermissionStatus),
    FixAcquired { request: RequestId, fix: Fix },
    FixFailed { request: RequestId, error: ProviderError },
}

#[derive(Debug)]
pub struct LocationFlow {
    state: FlowState,
    started: bool,
    next_request: u64,
    latest: Option<RequestId>,
}

impl Default for LocationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Initializing,
            started: false,
            next_request: 1,
            latest: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// The fetch whose result the flow is waiting for, if any.
    pub fn pending(&self) -> Option<RequestId> {
        match self.state {
            FlowState::Loading | FlowState::Ready { refreshing: true, .. } => self.latest,
            _ => None,
        }
    }

    /// Whether the permission answer is still outstanding.
    pub fn awaiting_permission(&self) -> bool {
        self.started && self.state == FlowState::Initializing
    }

    /// The fix currently on screen.
    pub fn fix(&self) -> Option<&Fix> {
        match &self.state {
            FlowState::Ready { fix, .. } => Some(fix),
            _ => None,
        }
    }

    /// What the map should show. `None` unless the flow is `Ready`.
    pub fn map_view(&self, latitude_delta: f64, longitude_delta: f64) -> Option<MapView> {
        self.fix()
            .map(|fix| MapView::user_location(fix.coordinate, latitude_delta, longitude_delta))
    }

    /// Begin the flow by asking for permission. Only the first call does anything.
    pub fn start(&mut self) -> Vec<Command> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        vec![Command::RequestPermission]
    }

    /// User asked for a fresh position.
    ///
    /// From `Ready` this supersedes any refresh still in flight.
    /// From `Unavailable` it retries the first fetch.
    pub fn refresh(&mut self) -> Vec<Command> {
        match &mut self.state {
            FlowState::Ready { refreshing, .. } => {
                *refreshing = true;
                vec![self.issue_fetch()]
            }
            FlowState::Unavailable(_) => {
                self.state = FlowState::Loading;
                vec![self.issue_fetch()]
            }
            FlowState::Initializing | FlowState::Loading | FlowState::PermissionDenied => {
                Vec::new()
            }
        }
    }

    /// Apply the result of a command.
    pub fn handle(&mut self, event: FlowEvent) -> Vec<Command> {
        match event {
            FlowEvent::PermissionResolved(status) => self.on_permission(status),
            FlowEvent::FixAcquired { request, fix } => {
                if !self.is_current(request) {
                    tracing::debug!(?request, "discarding superseded fix");
                    return Vec::new();
                }
                self.latest = None;
                tracing::info!(coordinate = %fix.coordinate, "location ready");
                self.state = FlowState::Ready {
                    fix,
                    refreshing: false,
                };
                Vec::new()
            }
            FlowEvent::FixFailed { request, error } => {
                if !self.is_current(request) {
                    tracing::debug!(?request, "discarding superseded failure");
                    return Vec::new();
                }
                self.latest = None;
                self.on_fix_failed(error)
            }
        }
    }

    fn on_permission(&mut self, status: PermissionStatus) -> Vec<Command> {
        if self.state != FlowState::Initializing {
            return Vec::new();
        }
        match status {
            PermissionStatus::Granted => {
                self.state = FlowState::Loading;
                vec![self.issue_fetch()]
            }
            PermissionStatus::Denied => {
                tracing::warn!("location permission denied");
                self.state = FlowState::PermissionDenied;
                vec![Command::Notify(Notice::PermissionDenied)]
            }
        }
    }

    fn on_fix_failed(&mut self, error: ProviderError) -> Vec<Command> {
        match &mut self.state {
            FlowState::Loading => {
                tracing::warn!(%error, "location unavailable");
                self.state = FlowState::Unavailable(error);
                Vec::new()
            }
            FlowState::Ready { refreshing, .. } => {
                tracing::warn!(%error, "refresh failed, keeping previous fix");
                *refreshing = false;
                vec![Command::Notify(Notice::RefreshFailed(error))]
            }
            _ => Vec::new(),
        }
    }

    fn issue_fetch(&mut self) -> Command {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.latest = Some(id);
        Command::FetchFix(id)
    }

    fn is_current(&self, request: RequestId) -> bool {
        self.pending() == Some(request)
    }
}

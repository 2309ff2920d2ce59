//! Runs a [`LocationFlow`] against a real provider.
//!
//! Provider calls run as tasks on a tokio runtime. Their results come
//! back over a channel and are applied on the caller's thread, so the
//! flow itself is never shared. The UI calls [`LocationTracker::pump`]
//! every tick; headless callers await [`LocationTracker::settle`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::Fix;

use super::flow::{Command, FlowEvent, FlowState, LocationFlow, Notice};
use super::{LocationProvider, ProviderError};

pub struct LocationTracker {
    flow: LocationFlow,
    provider: Arc<dyn LocationProvider>,
    runtime: Handle,
    timeout: Option<Duration>,
    events_tx: mpsc::UnboundedSender<FlowEvent>,
    events: mpsc::UnboundedReceiver<FlowEvent>,
    permission_task: Option<JoinHandle<()>>,
    fetch_task: Option<JoinHandle<()>>,
    notices: VecDeque<Notice>,
}

impl LocationTracker {
    /// `timeout` bounds each fetch; `None` waits as long as the provider does.
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        runtime: Handle,
        timeout: Option<Duration>,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            flow: LocationFlow::new(),
            provider,
            runtime,
            timeout,
            events_tx,
            events,
            permission_task: None,
            fetch_task: None,
            notices: VecDeque::new(),
        }
    }

    pub fn flow(&self) -> &LocationFlow {
        &self.flow
    }

    pub fn state(&self) -> &FlowState {
        self.flow.state()
    }

    /// Ask for permission, then fetch the first fix.
    pub fn start(&mut self) {
        let commands = self.flow.start();
        self.dispatch(commands);
    }

    pub fn refresh(&mut self) {
        let commands = self.flow.refresh();
        self.dispatch(commands);
    }

    /// Next thing the user must be told, oldest first.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    /// Apply every result that has already arrived. Returns whether any did.
    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied = true;
        }
        applied
    }

    /// Whether the flow is waiting on the provider.
    pub fn is_busy(&self) -> bool {
        self.flow.awaiting_permission() || self.flow.pending().is_some()
    }

    /// Wait for one result and apply it. Returns `false` once nothing is outstanding.
    pub async fn settle_next(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.events.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Wait until the flow stops waiting on the provider.
    pub async fn settle(&mut self) {
        while self.settle_next().await {}
    }

    fn apply(&mut self, event: FlowEvent) {
        let commands = self.flow.handle(event);
        self.dispatch(commands);
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::RequestPermission => {
                    let provider = Arc::clone(&self.provider);
                    let tx = self.events_tx.clone();
                    self.permission_task = Some(self.runtime.spawn(async move {
                        let status = provider.request_foreground_permission().await;
                        let _ = tx.send(FlowEvent::PermissionResolved(status));
                    }));
                }
                Command::FetchFix(request) => {
                    if let Some(previous) = self.fetch_task.take() {
                        previous.abort();
                    }
                    tracing::debug!(?request, "fetching position");
                    let provider = Arc::clone(&self.provider);
                    let tx = self.events_tx.clone();
                    let timeout = self.timeout;
                    self.fetch_task = Some(self.runtime.spawn(async move {
                        let event = match fetch(provider.as_ref(), timeout).await {
                            Ok(fix) => FlowEvent::FixAcquired { request, fix },
                            Err(error) => FlowEvent::FixFailed { request, error },
                        };
                        let _ = tx.send(event);
                    }));
                }
                Command::Notify(notice) => self.notices.push_back(notice),
            }
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        for task in [self.permission_task.take(), self.fetch_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

async fn fetch(
    provider: &dyn LocationProvider,
    timeout: Option<Duration>,
) -> Result<Fix, ProviderError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, provider.current_position())
            .await
            .map_err(|_| ProviderError::Timeout(limit))?,
        None => provider.current_position().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::location::PermissionStatus;
    use crate::model::{Coordinate, DEFAULT_DELTA};

    /// Answers fetches from a script of (delay, result) pairs.
    struct Scripted {
        permission: PermissionStatus,
        script: Mutex<VecDeque<(Duration, Result<Fix, ProviderError>)>>,
        permission_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        /// Fetches that ran to the end of their delay.
        completed: AtomicUsize,
    }

    impl Scripted {
        fn new(
            permission: PermissionStatus,
            script: Vec<(u64, Result<(f64, f64), ProviderError>)>,
        ) -> Arc<Self> {
            let script = script
                .into_iter()
                .map(|(ms, r)| {
                    let r = r.map(|(lat, lon)| Fix::at(Coordinate::new(lat, lon).unwrap()));
                    (Duration::from_millis(ms), r)
                })
                .collect();
            Arc::new(Self {
                permission,
                script: Mutex::new(script),
                permission_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LocationProvider for Scripted {
        async fn request_foreground_permission(&self) -> PermissionStatus {
            self.permission_calls.fetch_add(1, Ordering::SeqCst);
            self.permission
        }

        async fn current_position(&self) -> Result<Fix, ProviderError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            tokio::time::sleep(delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    fn tracker(provider: &Arc<Scripted>, timeout: Option<Duration>) -> LocationTracker {
        let provider: Arc<dyn LocationProvider> = provider.clone();
        LocationTracker::new(provider, Handle::current(), timeout)
    }

    fn coordinate(tracker: &LocationTracker) -> Coordinate {
        tracker.flow().fix().unwrap().coordinate
    }

    #[tokio::test(start_paused = true)]
    async fn granted_renders_map_after_one_fetch() {
        let provider = Scripted::new(PermissionStatus::Granted, vec![(20, Ok((37.0, -122.0)))]);
        let mut tracker = tracker(&provider, None);

        tracker.start();
        assert!(tracker.flow().map_view(DEFAULT_DELTA, DEFAULT_DELTA).is_none());
        tracker.settle().await;

        assert_eq!(provider.permission_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 1);

        let view = tracker
            .flow()
            .map_view(DEFAULT_DELTA, DEFAULT_DELTA)
            .unwrap();
        assert_eq!(view.region.center, Coordinate::new(37.0, -122.0).unwrap());
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].title, "You are here");
        assert!(tracker.take_notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn denied_notifies_once_and_never_fetches() {
        let provider = Scripted::new(PermissionStatus::Denied, vec![]);
        let mut tracker = tracker(&provider, None);

        tracker.start();
        tracker.settle().await;
        tracker.refresh();
        tracker.settle().await;

        assert_eq!(tracker.state(), &FlowState::PermissionDenied);
        assert_eq!(tracker.take_notice(), Some(Notice::PermissionDenied));
        assert_eq!(tracker.take_notice(), None);
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 0);
        assert!(tracker.flow().map_view(DEFAULT_DELTA, DEFAULT_DELTA).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn last_refresh_wins_over_slow_earlier_one() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![
                (10, Ok((0.0, 0.0))),
                (500, Ok((1.0, 1.0))),
                (10, Ok((2.0, 2.0))),
            ],
        );
        let mut tracker = tracker(&provider, None);
        tracker.start();
        tracker.settle().await;

        tracker.refresh();
        // Let the first refresh reach the provider before superseding it.
        tokio::time::sleep(Duration::from_millis(1)).await;
        tracker.refresh();
        tracker.settle().await;

        // Give the slow call every chance to land late.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tracker.pump();

        assert_eq!(coordinate(&tracker), Coordinate::new(2.0, 2.0).unwrap());
        assert!(!tracker.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_never_completes() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![
                (10, Ok((0.0, 0.0))),
                (500, Ok((1.0, 1.0))),
                (10, Ok((2.0, 2.0))),
            ],
        );
        let mut tracker = tracker(&provider, None);
        tracker.start();
        tracker.settle().await;

        tracker.refresh();
        tokio::time::sleep(Duration::from_millis(1)).await;
        tracker.refresh();
        tracker.settle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 3);
        // The initial fetch and the last refresh; the slow one was aborted.
        assert_eq!(provider.completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_tracker_aborts_the_in_flight_fetch() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![(10, Ok((0.0, 0.0))), (500, Ok((1.0, 1.0)))],
        );
        let mut tracker = tracker(&provider, None);
        tracker.start();
        tracker.settle().await;

        tracker.refresh();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 2);

        drop(tracker);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_overwrites_previous_fix() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![(10, Ok((37.0, -122.0))), (10, Ok((37.5, -122.5)))],
        );
        let mut tracker = tracker(&provider, None);
        tracker.start();
        tracker.settle().await;
        assert_eq!(coordinate(&tracker), Coordinate::new(37.0, -122.0).unwrap());

        tracker.refresh();
        tracker.settle().await;
        assert_eq!(coordinate(&tracker), Coordinate::new(37.5, -122.5).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_into_unavailable() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![(60_000, Ok((1.0, 1.0))), (10, Ok((3.0, 4.0)))],
        );
        let mut tracker = tracker(&provider, Some(Duration::from_secs(5)));
        tracker.start();
        tracker.settle().await;

        assert_eq!(
            tracker.state(),
            &FlowState::Unavailable(ProviderError::Timeout(Duration::from_secs(5)))
        );

        tracker.refresh();
        tracker.settle().await;
        assert_eq!(coordinate(&tracker), Coordinate::new(3.0, 4.0).unwrap());
        assert_eq!(provider.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_surfaces_notice() {
        let provider = Scripted::new(
            PermissionStatus::Granted,
            vec![
                (10, Ok((37.0, -122.0))),
                (10, Err(ProviderError::Unavailable("receiver unplugged".into()))),
            ],
        );
        let mut tracker = tracker(&provider, None);
        tracker.start();
        tracker.settle().await;
        tracker.refresh();
        tracker.settle().await;

        assert_eq!(coordinate(&tracker), Coordinate::new(37.0, -122.0).unwrap());
        let notice = tracker.take_notice().unwrap();
        assert!(!notice.is_blocking());
    }
}

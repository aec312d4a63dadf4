//! Auto-refresh scheduler
//!
//! Owns two cancellable tasks: a periodic product refresh whose period comes
//! from the watcher's interval spec, and a once-per-second countdown tick.
//! Reconfiguring replaces both tasks; the watcher status poll is not owned
//! here and is never touched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::countdown::format_countdown;
use crate::interval::{refresh_period, DEFAULT_INTERVAL_MS};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Interval spec assumed when the server has none configured
const UNSET_INTERVAL: &str = "60";

/// What the scheduler drives
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Whether the dashboard is currently in the foreground
    async fn is_visible(&self) -> bool;

    /// Re-render the product list
    async fn refresh(&self);

    /// Display the auto-refresh countdown text
    async fn show_countdown(&self, text: String);
}

/// When the next automatic refresh happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    pub refresh_period: Duration,
    pub next_fire_at: Instant,
}

impl ScheduleState {
    pub fn new(refresh_period: Duration, now: Instant) -> Self {
        Self {
            refresh_period,
            next_fire_at: now + refresh_period,
        }
    }

    /// Whole seconds until the next refresh, never negative
    pub fn remaining_seconds(&self, now: Instant) -> u64 {
        self.next_fire_at.saturating_duration_since(now).as_secs()
    }
}

/// Countdown text for a number of remaining seconds
pub fn countdown_text(remaining_seconds: u64) -> String {
    if remaining_seconds > 0 {
        format!("Auto-refresh in: {}", format_countdown(remaining_seconds))
    } else {
        "Refreshing now...".to_string()
    }
}

struct TimerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimerTask {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Decrements the live task count when a timer task ends or is aborted
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(count))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Self-adjusting auto-refresh scheduler
pub struct Scheduler {
    target: Arc<dyn RefreshTarget>,
    state: Arc<RwLock<Option<ScheduleState>>>,
    parent: CancellationToken,
    refresh_task: Option<TimerTask>,
    countdown_task: Option<TimerTask>,
    live_tasks: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("armed", &self.is_armed())
            .field("live_tasks", &self.live_tasks())
            .finish()
    }
}

impl Scheduler {
    /// Create an idle scheduler; its tasks stop when `parent` is cancelled
    pub fn new(target: Arc<dyn RefreshTarget>, parent: CancellationToken) -> Self {
        Self {
            target,
            state: Arc::new(RwLock::new(None)),
            parent,
            refresh_task: None,
            countdown_task: None,
            live_tasks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Parse an interval spec and (re)arm both tasks. Returns the refresh period.
    pub async fn configure(&mut self, interval_spec: &str) -> Duration {
        let period = refresh_period(interval_spec);
        tracing::info!(
            "Setting up auto-refresh every {}s (from interval: {})",
            period.as_secs(),
            interval_spec
        );
        self.configure_period(period).await;
        period
    }

    /// Fetch the interval from the server and configure from it.
    ///
    /// If the fetch fails the scheduler still arms with the 60s default.
    pub async fn configure_from_server(&mut self, api: &ApiClient) -> Duration {
        match api.get_interval().await {
            Ok(setting) => {
                let spec = setting.configured().unwrap_or(UNSET_INTERVAL).to_string();
                self.configure(&spec).await
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to get interval, using {}s default: {}",
                    DEFAULT_INTERVAL_MS / 1000,
                    e
                );
                let period = Duration::from_millis(DEFAULT_INTERVAL_MS);
                self.configure_period(period).await;
                period
            }
        }
    }

    async fn configure_period(&mut self, period: Duration) {
        self.cancel();

        let now = Instant::now();
        let schedule = ScheduleState::new(period, now);
        *self.state.write().await = Some(schedule);
        tracing::debug!("Next auto-refresh in {}s", period.as_secs());

        self.tick(now).await;

        self.refresh_task = Some(self.spawn_refresh(period, now));
        self.countdown_task = Some(self.spawn_countdown(now));
    }

    /// Stop both owned tasks
    pub fn cancel(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.stop();
        }
        if let Some(task) = self.countdown_task.take() {
            task.stop();
        }
    }

    /// Recompute and display the countdown as of `now`
    pub async fn tick(&self, now: Instant) {
        show_countdown(&self.state, self.target.as_ref(), now).await;
    }

    /// Current schedule, if configured
    pub async fn schedule(&self) -> Option<ScheduleState> {
        *self.state.read().await
    }

    /// Whether both tasks are currently owned by this scheduler
    pub fn is_armed(&self) -> bool {
        self.refresh_task.is_some() && self.countdown_task.is_some()
    }

    /// Number of timer tasks still running, including ones being torn down
    pub fn live_tasks(&self) -> usize {
        self.live_tasks.load(Ordering::SeqCst)
    }

    fn spawn_refresh(&self, period: Duration, now: Instant) -> TimerTask {
        let cancel = self.parent.child_token();
        let task_cancel = cancel.clone();
        let target = Arc::clone(&self.target);
        let state = Arc::clone(&self.state);
        let guard = LiveGuard::enter(&self.live_tasks);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = tokio::time::interval_at(now + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_cancel.cancelled() => {
                        tracing::debug!("Auto-refresh task cancelled");
                        break;
                    }
                }

                if !target.is_visible().await {
                    tracing::debug!("Dashboard hidden, skipping auto-refresh");
                    continue;
                }

                tracing::debug!("Auto-refresh: refreshing products");
                let now = Instant::now();
                *state.write().await = Some(ScheduleState::new(period, now));
                target.refresh().await;
            }
        });

        TimerTask { cancel, handle }
    }

    fn spawn_countdown(&self, now: Instant) -> TimerTask {
        let cancel = self.parent.child_token();
        let task_cancel = cancel.clone();
        let target = Arc::clone(&self.target);
        let state = Arc::clone(&self.state);
        let guard = LiveGuard::enter(&self.live_tasks);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = tokio::time::interval_at(now + COUNTDOWN_TICK, COUNTDOWN_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_cancel.cancelled() => break,
                }
                show_countdown(&state, target.as_ref(), Instant::now()).await;
            }
        });

        TimerTask { cancel, handle }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn show_countdown(
    state: &RwLock<Option<ScheduleState>>,
    target: &dyn RefreshTarget,
    now: Instant,
) {
    let Some(schedule) = *state.read().await else {
        tracing::debug!("No next refresh time set");
        return;
    };
    target
        .show_countdown(countdown_text(schedule.remaining_seconds(now)))
        .await;
}

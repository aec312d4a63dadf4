//! Dashboard controller: staggered startup, watcher status polling and
//! scheduler reconfiguration after interval changes

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::DashboardConfig;
use crate::renderer::Renderer;
use crate::scheduler::{RefreshTarget, ScheduleState, Scheduler};

/// Delay before the scheduler fetches its interval and arms
const SCHEDULER_DELAY: Duration = Duration::from_millis(500);

/// Initial panel renders, spread out so the backend is not hit all at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartupStep {
    Products,
    Interval,
    Telegram,
    Notifications,
    Watcher,
}

impl StartupStep {
    const ALL: [StartupStep; 5] = [
        StartupStep::Products,
        StartupStep::Interval,
        StartupStep::Telegram,
        StartupStep::Notifications,
        StartupStep::Watcher,
    ];

    fn delay(self) -> Duration {
        Duration::from_millis(match self {
            StartupStep::Products => 0,
            StartupStep::Interval => 100,
            StartupStep::Telegram => 200,
            StartupStep::Notifications => 250,
            StartupStep::Watcher => 300,
        })
    }

    async fn render(self, renderer: &Renderer) {
        match self {
            StartupStep::Products => {
                renderer.render_products().await;
            }
            StartupStep::Interval => renderer.render_interval().await,
            StartupStep::Telegram => renderer.render_telegram().await,
            StartupStep::Notifications => renderer.render_notifications().await,
            StartupStep::Watcher => renderer.render_watcher_status().await,
        }
    }
}

async fn wait(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Drives the live dashboard
#[derive(Debug)]
pub struct Controller {
    renderer: Arc<Renderer>,
    scheduler: Arc<Mutex<Scheduler>>,
    status_poll: Duration,
    cancel: CancellationToken,
}

impl Controller {
    pub fn new(renderer: Arc<Renderer>, config: &DashboardConfig, cancel: CancellationToken) -> Self {
        let target: Arc<dyn RefreshTarget> = Arc::clone(&renderer) as Arc<dyn RefreshTarget>;
        let scheduler = Scheduler::new(target, cancel.child_token());
        Self {
            renderer,
            scheduler: Arc::new(Mutex::new(scheduler)),
            status_poll: config.status_poll(),
            cancel,
        }
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// Kick off the staggered initial renders, the delayed scheduler setup
    /// and the watcher status poll. All tasks stop on cancellation.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting dashboard controller");

        let mut handles: Vec<JoinHandle<()>> = StartupStep::ALL
            .into_iter()
            .map(|step| {
                let renderer = Arc::clone(&self.renderer);
                let cancel = self.cancel.child_token();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        _ = wait(step.delay()) => {
                            tracing::debug!("Initial render: {:?}", step);
                            step.render(&renderer).await;
                        }
                    }
                })
            })
            .collect();

        handles.push(self.spawn_scheduler_setup());
        handles.push(self.spawn_status_poll());
        handles
    }

    fn spawn_scheduler_setup(&self) -> JoinHandle<()> {
        let scheduler = Arc::clone(&self.scheduler);
        let renderer = Arc::clone(&self.renderer);
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(SCHEDULER_DELAY) => {
                    scheduler
                        .lock()
                        .await
                        .configure_from_server(renderer.api())
                        .await;
                }
            }
        })
    }

    fn spawn_status_poll(&self) -> JoinHandle<()> {
        let renderer = Arc::clone(&self.renderer);
        let cancel = self.cancel.child_token();
        let period = self.status_poll;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if renderer.is_visible().await {
                            renderer.render_watcher_status().await;
                        }
                    }
                }
            }
            tracing::debug!("Watcher status poll stopped");
        })
    }

    /// Save a new interval and re-arm the scheduler from the server's value
    pub async fn update_interval(&self, input: &str) -> crate::Result<()> {
        self.renderer.update_interval(input).await?;
        self.scheduler
            .lock()
            .await
            .configure_from_server(self.renderer.api())
            .await;
        Ok(())
    }

    /// Foreground/background switch for embedders that can tell whether
    /// the dashboard is on screen. The terminal view is always visible.
    /// Hidden dashboards skip periodic work.
    pub async fn set_visible(&self, visible: bool) {
        tracing::debug!("Dashboard visible: {}", visible);
        self.renderer.state().write().await.visible = visible;
    }

    pub async fn schedule(&self) -> Option<ScheduleState> {
        self.scheduler.lock().await.schedule().await
    }

    pub async fn scheduler_armed(&self) -> bool {
        self.scheduler.lock().await.is_armed()
    }

    /// Cancel every task the controller started
    pub async fn shutdown(&self) {
        tracing::info!("Stopping dashboard controller");
        self.cancel.cancel();
        self.scheduler.lock().await.cancel();
    }
}

//! BDD step definitions for the auto-refresh scheduler

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use pricewatch::api::ApiClient;
use pricewatch::scheduler::{RefreshTarget, Scheduler};

use crate::world::{PricewatchWorld, RecordingTarget, BASE_URL};

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[given("an idle scheduler")]
fn idle_scheduler(world: &mut PricewatchWorld) {
    let target = Arc::new(RecordingTarget::default());
    let scheduler = Scheduler::new(
        Arc::clone(&target) as Arc<dyn RefreshTarget>,
        CancellationToken::new(),
    );
    world.target = Some(target);
    world.scheduler = Some(scheduler);
}

#[given(expr = "the backend reports the interval {string}")]
fn backend_interval(world: &mut PricewatchWorld, interval: String) {
    let body = serde_json::json!({ "interval": interval }).to_string();
    world.backend.0.respond("GET", "/interval", 200, &body);
}

#[given("the backend is unreachable")]
fn backend_unreachable(world: &mut PricewatchWorld) {
    world.backend.0.unreachable("GET", "/interval");
}

#[when(expr = "the scheduler is configured with {string}")]
async fn configure(world: &mut PricewatchWorld, spec: String) {
    let scheduler = world.scheduler.as_mut().expect("scheduler not set");
    world.configured_period = Some(scheduler.configure(&spec).await);
    settle().await;
}

#[when("the scheduler is configured from the server")]
async fn configure_from_server(world: &mut PricewatchWorld) {
    let api = ApiClient::new(BASE_URL, Arc::new(world.backend.clone()));
    let scheduler = world.scheduler.as_mut().expect("scheduler not set");
    world.configured_period = Some(scheduler.configure_from_server(&api).await);
    settle().await;
}

#[when("the scheduler is cancelled")]
async fn cancel(world: &mut PricewatchWorld) {
    world.scheduler.as_mut().expect("scheduler not set").cancel();
    settle().await;
}

#[when(regex = r"^(\d+) seconds? (?:has|have) passed since configuration$")]
async fn time_passed(world: &mut PricewatchWorld, seconds: u64) {
    let scheduler = world.scheduler.as_ref().expect("scheduler not set");
    let schedule = scheduler.schedule().await.expect("scheduler not configured");
    let configured_at = schedule.next_fire_at - schedule.refresh_period;
    scheduler
        .tick(configured_at + Duration::from_secs(seconds))
        .await;
}

#[then(expr = "the refresh period should be {int} seconds")]
async fn period_is(world: &mut PricewatchWorld, seconds: u64) {
    let expected = Duration::from_secs(seconds);
    assert_eq!(world.configured_period, Some(expected));
    let schedule = world
        .scheduler
        .as_ref()
        .expect("scheduler not set")
        .schedule()
        .await
        .expect("scheduler not configured");
    assert_eq!(schedule.refresh_period, expected);
}

#[then(expr = "the countdown should show {string}")]
fn countdown_shows(world: &mut PricewatchWorld, expected: String) {
    let target = world.target.as_ref().expect("target not set");
    assert_eq!(target.last_countdown().as_deref(), Some(expected.as_str()));
}

#[then(expr = "exactly {int} timer tasks should be alive")]
fn live_tasks(world: &mut PricewatchWorld, expected: usize) {
    let scheduler = world.scheduler.as_ref().expect("scheduler not set");
    assert_eq!(scheduler.live_tasks(), expected);
}

//! BDD step definitions for settings panels and watcher control

use cucumber::{given, then, when};

use pricewatch::api::NotificationMode;
use pricewatch::frame;
use pricewatch::state::Panel;

use crate::world::PricewatchWorld;

#[given(expr = "the backend has Telegram token {string} and chat id {string}")]
fn backend_telegram(world: &mut PricewatchWorld, token: String, chat_id: String) {
    let body = serde_json::json!({
        "telegram_token": token,
        "telegram_chat_id": chat_id,
    })
    .to_string();
    world.backend.0.respond("GET", "/telegram", 200, &body);
}

#[given(expr = "the backend has Telegram token {string} and no chat id")]
fn backend_telegram_token_only(world: &mut PricewatchWorld, token: String) {
    let body = serde_json::json!({ "telegram_token": token }).to_string();
    world.backend.0.respond("GET", "/telegram", 200, &body);
}

#[given("the backend accepts Telegram settings")]
fn backend_accepts_telegram(world: &mut PricewatchWorld) {
    world
        .backend
        .0
        .respond("PUT", "/telegram", 200, r#"{"success": true}"#);
}

#[given("the backend starts the watcher")]
fn backend_starts_watcher(world: &mut PricewatchWorld) {
    world.backend.0.respond(
        "POST",
        "/watcher/start",
        200,
        r#"{"success": true, "message": "Watcher started"}"#,
    );
}

#[given(expr = "the backend answers watcher start requests with HTTP {int}")]
fn backend_start_status(world: &mut PricewatchWorld, status: u16) {
    world.backend.0.respond("POST", "/watcher/start", status, "");
}

#[given(expr = "the watcher is reported as running with countdown {int}")]
fn watcher_running_countdown(world: &mut PricewatchWorld, countdown: u64) {
    let body = serde_json::json!({ "is_running": true, "countdown": countdown }).to_string();
    world.backend.0.respond("GET", "/watcher/status", 200, &body);
}

#[when("the Telegram panel is rendered")]
async fn render_telegram(world: &mut PricewatchWorld) {
    world
        .renderer
        .as_ref()
        .expect("dashboard not set up")
        .render_telegram()
        .await;
}

#[when(expr = "the Telegram chat id is changed to {string}")]
async fn change_chat_id(world: &mut PricewatchWorld, chat_id: String) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    world.action_result = Some(renderer.update_telegram(None, Some(&chat_id)).await);
}

#[when(expr = "the interval is updated to {string}")]
async fn update_interval(world: &mut PricewatchWorld, interval: String) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    world.action_result = Some(renderer.update_interval(&interval).await);
}

#[when(expr = "the notification mode {string} is selected")]
async fn select_mode(world: &mut PricewatchWorld, mode: String) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    let result = match mode.parse::<NotificationMode>() {
        Ok(mode) => renderer.update_notifications(mode).await,
        Err(e) => Err(e),
    };
    world.action_result = Some(result);
}

#[when("the watcher is started")]
async fn start_watcher(world: &mut PricewatchWorld) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    world.action_result = Some(renderer.start_watcher().await);
}

#[then(expr = "the backend should have received Telegram token {string} and chat id {string}")]
fn telegram_received(world: &mut PricewatchWorld, token: String, chat_id: String) {
    let requests = world.backend.0.requests();
    let update = requests
        .iter()
        .find(|r| r.method == "PUT" && r.path == "/telegram")
        .expect("no Telegram update sent");
    let body = update.body.as_ref().expect("Telegram update without body");
    assert_eq!(body["token"], token.as_str());
    assert_eq!(body["chat_id"], chat_id.as_str());
}

#[then(expr = "the Telegram panel should include {string}")]
async fn telegram_panel_includes(world: &mut PricewatchWorld, expected: String) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    let state = renderer.state().read().await;
    let lines = frame::telegram_lines(&state.telegram);
    assert!(
        lines.contains(&expected),
        "Expected '{}' in {:?}",
        expected,
        lines
    );
}

#[then(expr = "the watcher header should read {string}")]
async fn watcher_header(world: &mut PricewatchWorld, expected: String) {
    let renderer = world.renderer.as_ref().expect("dashboard not set up");
    let state = renderer.state().read().await;
    assert!(matches!(state.watcher, Panel::Ready(_)));
    assert_eq!(frame::watcher_header(&state.watcher), expected);
}

//! BDD step definitions for product rendering and shared dashboard steps

use std::sync::Arc;

use cucumber::{given, then, when};

use pricewatch::api::ApiClient;
use pricewatch::config::DashboardConfig;
use pricewatch::forms::ProductForm;
use pricewatch::notice::NoticeKind;
use pricewatch::renderer::Renderer;
use pricewatch::state::{new_state_handle, PriceStatus, ProductItem, ProductsPanel};

use crate::world::{PricewatchWorld, BASE_URL};

fn renderer(world: &PricewatchWorld) -> &Arc<Renderer> {
    world.renderer.as_ref().expect("dashboard not set up")
}

async fn product_item(world: &PricewatchWorld, index: usize) -> ProductItem {
    let state = renderer(world).state().read().await;
    match &state.products {
        ProductsPanel::Items(items) => items[index].clone(),
        other => panic!("expected product items, got {:?}", other),
    }
}

async fn assert_notice(world: &PricewatchWorld, kind: NoticeKind, message: &str) {
    let state = renderer(world).state().read().await;
    assert!(
        state
            .notices
            .iter()
            .any(|n| n.kind == kind && n.message == message),
        "Expected {} notice '{}', got {:?}",
        kind,
        message,
        state.notices
    );
}

#[given("a dashboard connected to the backend")]
fn dashboard(world: &mut PricewatchWorld) {
    let config = DashboardConfig {
        price_stagger_ms: 0,
        ..Default::default()
    };
    let api = ApiClient::new(BASE_URL, Arc::new(world.backend.clone()));
    let renderer = Renderer::new(api, new_state_handle(config.history_size), &config);
    world.renderer = Some(Arc::new(renderer));
}

#[given(expr = "the backend lists a product {string} with target price {float}")]
fn backend_lists_product(world: &mut PricewatchWorld, name: String, target: f64) {
    let body = serde_json::json!([{
        "url": "https://www.vaurioajoneuvo.fi/tuote/1",
        "target_price": target,
        "name": name,
    }])
    .to_string();
    world.backend.0.respond("GET", "/products", 200, &body);
}

#[given("the backend lists no products")]
fn backend_lists_nothing(world: &mut PricewatchWorld) {
    world.backend.0.respond("GET", "/products", 200, "[]");
}

#[given("the backend accepts new products")]
fn backend_accepts_products(world: &mut PricewatchWorld) {
    world
        .backend
        .0
        .respond("POST", "/products", 200, r#"{"success": true}"#);
}

#[given(expr = "the backend quotes a price of {float}")]
fn backend_quotes(world: &mut PricewatchWorld, price: f64) {
    let body = serde_json::json!({ "price": price }).to_string();
    world.backend.0.respond("POST", "/price", 200, &body);
}

#[given(expr = "the backend fails the price lookup with {string}")]
fn backend_price_error(world: &mut PricewatchWorld, error: String) {
    let body = serde_json::json!({ "error": error }).to_string();
    world.backend.0.respond("POST", "/price", 200, &body);
}

#[given("the watcher is reported as stopped")]
fn watcher_stopped(world: &mut PricewatchWorld) {
    world
        .backend
        .0
        .respond("GET", "/watcher/status", 200, r#"{"is_running": false}"#);
}

#[given("the watcher is reported as running")]
fn watcher_running(world: &mut PricewatchWorld) {
    world
        .backend
        .0
        .respond("GET", "/watcher/status", 200, r#"{"is_running": true}"#);
}

#[when("the products are rendered and all lookups finish")]
async fn render_products(world: &mut PricewatchWorld) {
    for handle in renderer(world).render_products().await {
        handle.await.expect("price lookup panicked");
    }
}

#[when(expr = "a product is submitted with url {string} and target price {string}")]
async fn submit_product(world: &mut PricewatchWorld, url: String, target_price: String) {
    let renderer = Arc::clone(renderer(world));
    renderer
        .set_product_form(ProductForm {
            url,
            target_price,
            name: String::new(),
        })
        .await;
    world.action_result = Some(renderer.submit_product(false).await);
}

#[then(expr = "product {int} should show {string}")]
async fn product_shows(world: &mut PricewatchWorld, index: usize, expected: String) {
    let item = product_item(world, index).await;
    assert_eq!(item.price.label(), expected);
}

#[then(expr = "product {int} should be flagged below target")]
async fn product_flagged(world: &mut PricewatchWorld, index: usize) {
    let item = product_item(world, index).await;
    assert!(matches!(item.price, PriceStatus::Price(_)));
    assert!(item.below_target);
}

#[then(expr = "product {int} should not be flagged below target")]
async fn product_not_flagged(world: &mut PricewatchWorld, index: usize) {
    assert!(!product_item(world, index).await.below_target);
}

#[then(expr = "the products panel should read {string}")]
async fn products_panel_reads(world: &mut PricewatchWorld, expected: String) {
    let state = renderer(world).state().read().await;
    let lines = pricewatch::frame::products_lines(&state.products);
    assert_eq!(lines[0], expected);
}

#[then(expr = "a success notice {string} should be raised")]
async fn success_notice(world: &mut PricewatchWorld, message: String) {
    assert_notice(world, NoticeKind::Success, &message).await;
}

#[then(expr = "an error notice {string} should be raised")]
async fn error_notice(world: &mut PricewatchWorld, message: String) {
    assert_notice(world, NoticeKind::Error, &message).await;
}

#[then("no notices should be raised")]
async fn no_notices(world: &mut PricewatchWorld) {
    let state = renderer(world).state().read().await;
    assert!(state.notices.is_empty(), "got {:?}", state.notices);
}

#[then("the action should succeed")]
fn action_succeeded(world: &mut PricewatchWorld) {
    match world.action_result.as_ref().expect("no action performed") {
        Ok(()) => {}
        Err(e) => panic!("expected success, got {}", e),
    }
}

#[then(expr = "the action should fail with {string}")]
fn action_failed(world: &mut PricewatchWorld, expected: String) {
    match world.action_result.as_ref().expect("no action performed") {
        Ok(()) => panic!("expected failure '{}'", expected),
        Err(e) => assert_eq!(e.to_string(), expected),
    }
}

#[then("no requests should have been sent")]
fn no_requests(world: &mut PricewatchWorld) {
    let requests = world.backend.0.requests();
    assert!(requests.is_empty(), "got {:?}", requests);
}

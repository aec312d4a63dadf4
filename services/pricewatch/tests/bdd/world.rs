//! BDD test world for the pricewatch dashboard

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cucumber::World;
use pricewatch::io::{HttpClient, HttpResponse};
use pricewatch::renderer::Renderer;
use pricewatch::scheduler::{RefreshTarget, Scheduler};
use pricewatch::DashboardError;

pub const BASE_URL: &str = "http://backend.test";

/// A request seen by the fake backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    Unreachable,
}

/// In-memory stand-in for the price watch backend, keyed by method and path
#[derive(Debug, Default)]
pub struct FakeBackend {
    routes: Mutex<HashMap<(String, String), Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeBackend {
    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            Reply::Status(status, body.to_string()),
        );
    }

    pub fn unreachable(&self, method: &str, path: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), Reply::Unreachable);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn reply(
        &self,
        method: &str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> pricewatch::Result<HttpResponse> {
        let path = url
            .strip_prefix(BASE_URL)
            .and_then(|p| p.strip_prefix("/api"))
            .unwrap_or(url)
            .to_string();
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            body,
        });

        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(method.to_string(), path))
            .cloned()
            .unwrap_or(Reply::Unreachable);
        match reply {
            Reply::Status(status, body) => Ok(HttpResponse { status, body }),
            Reply::Unreachable => Err(DashboardError::Http("connection refused".to_string())),
        }
    }
}

/// Lets steps keep their own handle on the backend after handing it to the API client
#[derive(Debug, Clone, Default)]
pub struct SharedBackend(pub Arc<FakeBackend>);

#[async_trait::async_trait]
impl HttpClient for SharedBackend {
    async fn get(&self, url: &str) -> pricewatch::Result<HttpResponse> {
        self.0.reply("GET", url, None)
    }

    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> pricewatch::Result<HttpResponse> {
        self.0.reply("POST", url, Some(body))
    }

    async fn post(&self, url: &str) -> pricewatch::Result<HttpResponse> {
        self.0.reply("POST", url, None)
    }

    async fn put_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> pricewatch::Result<HttpResponse> {
        self.0.reply("PUT", url, Some(body))
    }

    async fn delete(&self, url: &str) -> pricewatch::Result<HttpResponse> {
        self.0.reply("DELETE", url, None)
    }
}

/// Scheduler target that records what it was asked to do
#[derive(Debug)]
pub struct RecordingTarget {
    pub visible: AtomicBool,
    pub refreshes: AtomicUsize,
    pub countdowns: Mutex<Vec<String>>,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self {
            visible: AtomicBool::new(true),
            refreshes: AtomicUsize::new(0),
            countdowns: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingTarget {
    pub fn last_countdown(&self) -> Option<String> {
        self.countdowns.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl RefreshTarget for RecordingTarget {
    async fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    async fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    async fn show_countdown(&self, text: String) {
        self.countdowns.lock().unwrap().push(text);
    }
}

#[derive(Debug, Default, World)]
pub struct PricewatchWorld {
    // Parser and formatter testing
    pub parsed_ms: Option<u64>,
    pub formatted: Option<String>,

    // Scheduler testing
    pub scheduler: Option<Scheduler>,
    pub target: Option<Arc<RecordingTarget>>,
    pub configured_period: Option<Duration>,

    // Renderer testing
    pub backend: SharedBackend,
    pub renderer: Option<Arc<Renderer>>,
    pub action_result: Option<pricewatch::Result<()>>,
}

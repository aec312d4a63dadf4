//! Typed client for the price watch backend
//!
//! Thin JSON-over-HTTP wrapper around the `/api` endpoints. Every non-2xx
//! response becomes [`DashboardError::Status`] so callers can treat all
//! failures uniformly.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::io::{HttpClient, HttpResponse};
use crate::DashboardError;

/// A watched product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    pub target_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Product {
    /// The product name, if one is set and non-blank
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.label().unwrap_or("Unnamed Product")
    }
}

/// Raw `/price` response: either a price or an error message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceLookup {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PriceLookup {
    /// Interpret the response; a non-empty error wins over a price
    pub fn outcome(&self) -> PriceOutcome {
        match (&self.error, self.price) {
            (Some(error), _) if !error.is_empty() => PriceOutcome::Error(error.clone()),
            (_, Some(price)) => PriceOutcome::Price(price),
            _ => PriceOutcome::Error("Missing price".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceOutcome {
    Price(f64),
    Error(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntervalSetting {
    #[serde(default, deserialize_with = "string_or_number")]
    pub interval: Option<String>,
}

impl IntervalSetting {
    /// The configured interval, treating an empty string as unset
    pub fn configured(&self) -> Option<&str> {
        self.interval.as_deref().filter(|i| !i.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TelegramSettings {
    #[serde(default, deserialize_with = "string_or_number")]
    pub telegram_token: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub telegram_chat_id: Option<String>,
}

impl TelegramSettings {
    pub fn token(&self) -> Option<&str> {
        self.telegram_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.telegram_chat_id.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_enabled(&self) -> bool {
        self.token().is_some() && self.chat_id().is_some()
    }
}

/// When the watcher sends Telegram notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationMode {
    #[default]
    BelowTarget,
    AnyChange,
    Both,
    None,
    #[serde(other)]
    Unknown,
}

impl NotificationMode {
    pub fn description(&self) -> &'static str {
        match self {
            NotificationMode::BelowTarget => "Only when price drops below target",
            NotificationMode::AnyChange => "On any price change (up or down)",
            NotificationMode::Both => "Both price changes and below target alerts",
            NotificationMode::None => "Never (monitoring only, no notifications)",
            NotificationMode::Unknown => "Unknown mode",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            NotificationMode::BelowTarget => "You'll only get target price alerts",
            NotificationMode::AnyChange => "You'll get notified of all price movements",
            NotificationMode::Both => "You'll get all price changes AND target alerts",
            NotificationMode::None => "No notifications (monitoring only)",
            NotificationMode::Unknown => "",
        }
    }
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationMode::BelowTarget => "below_target",
            NotificationMode::AnyChange => "any_change",
            NotificationMode::Both => "both",
            NotificationMode::None => "none",
            NotificationMode::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for NotificationMode {
    type Err = DashboardError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "below_target" => Ok(NotificationMode::BelowTarget),
            "any_change" => Ok(NotificationMode::AnyChange),
            "both" => Ok(NotificationMode::Both),
            "none" => Ok(NotificationMode::None),
            other => Err(DashboardError::Validation(format!(
                "Unknown notification mode '{}' (expected below_target, any_change, both or none)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub notification_mode: Option<NotificationMode>,
}

impl NotificationSettings {
    pub fn mode(&self) -> NotificationMode {
        self.notification_mode.unwrap_or_default()
    }
}

/// Watcher process status as reported by `/watcher/status`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WatcherStatus {
    pub is_running: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub countdown: Option<u64>,
    #[serde(default)]
    pub next_check: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub interval: Option<String>,
}

/// The backend hands back raw config values, so intervals and chat IDs may
/// arrive as numbers as well as strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Response to a watcher start/stop request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatcherAction {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the `/api` endpoints of the price watch backend
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = format!("{}/api", base_url.trim_end_matches('/'));
        tracing::debug!("Created ApiClient for {}", base_url);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_products(&self) -> crate::Result<Vec<Product>> {
        let response = self.http.get(&self.url("/products")).await?;
        decode(response)
    }

    pub async fn add_product(&self, product: &Product) -> crate::Result<()> {
        let body = serde_json::to_value(product)?;
        let response = self.http.post_json(&self.url("/products"), body).await?;
        check(response).map(|_| ())
    }

    pub async fn update_product(&self, idx: usize, product: &Product) -> crate::Result<()> {
        let body = serde_json::to_value(product)?;
        let response = self
            .http
            .put_json(&self.url(&format!("/products/{}", idx)), body)
            .await?;
        check(response).map(|_| ())
    }

    pub async fn delete_product(&self, idx: usize) -> crate::Result<()> {
        let response = self
            .http
            .delete(&self.url(&format!("/products/{}", idx)))
            .await?;
        check(response).map(|_| ())
    }

    pub async fn fetch_price(&self, url: &str) -> crate::Result<PriceLookup> {
        let body = serde_json::json!({ "url": url });
        let response = self.http.post_json(&self.url("/price"), body).await?;
        decode(response)
    }

    pub async fn get_interval(&self) -> crate::Result<IntervalSetting> {
        let response = self.http.get(&self.url("/interval")).await?;
        decode(response)
    }

    pub async fn set_interval(&self, interval: &str) -> crate::Result<()> {
        let body = serde_json::json!({ "interval": interval });
        let response = self.http.put_json(&self.url("/interval"), body).await?;
        check(response).map(|_| ())
    }

    pub async fn get_telegram(&self) -> crate::Result<TelegramSettings> {
        let response = self.http.get(&self.url("/telegram")).await?;
        decode(response)
    }

    pub async fn set_telegram(&self, token: &str, chat_id: &str) -> crate::Result<()> {
        let body = serde_json::json!({ "token": token, "chat_id": chat_id });
        let response = self.http.put_json(&self.url("/telegram"), body).await?;
        check(response).map(|_| ())
    }

    pub async fn get_notifications(&self) -> crate::Result<NotificationSettings> {
        let response = self.http.get(&self.url("/notifications")).await?;
        decode(response)
    }

    pub async fn set_notifications(&self, mode: NotificationMode) -> crate::Result<()> {
        let body = serde_json::json!({ "notification_mode": mode });
        let response = self
            .http
            .put_json(&self.url("/notifications"), body)
            .await?;
        check(response).map(|_| ())
    }

    pub async fn watcher_status(&self) -> crate::Result<WatcherStatus> {
        let response = self.http.get(&self.url("/watcher/status")).await?;
        decode(response)
    }

    pub async fn start_watcher(&self) -> crate::Result<WatcherAction> {
        let response = self.http.post(&self.url("/watcher/start")).await?;
        decode(response)
    }

    pub async fn stop_watcher(&self) -> crate::Result<WatcherAction> {
        let response = self.http.post(&self.url("/watcher/stop")).await?;
        decode(response)
    }
}

fn check(response: HttpResponse) -> crate::Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        tracing::debug!(
            "Request failed with status {}: {}",
            response.status,
            response.body
        );
        Err(DashboardError::from_status(response.status))
    }
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> crate::Result<T> {
    let response = check(response)?;
    Ok(serde_json::from_str(&response.body)?)
}

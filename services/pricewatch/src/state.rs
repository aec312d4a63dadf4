//! Shared view model for the dashboard panels and notice history
//!
//! The controller projects backend state onto [`DashboardState`]; the
//! terminal frame is drawn from it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::api::{NotificationMode, Product, TelegramSettings, WatcherStatus};
use crate::countdown::format_countdown;
use crate::forms::{MaskedField, ProductEditor};
use crate::notice::Notice;

/// A panel that loads from the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<T> {
    Loading,
    Ready(T),
    Failed(String),
}

/// The product list panel
#[derive(Debug, Clone, PartialEq)]
pub enum ProductsPanel {
    Loading,
    Empty,
    Failed(String),
    Items(Vec<ProductItem>),
}

/// Live price state of one product row
#[derive(Debug, Clone, PartialEq)]
pub enum PriceStatus {
    Checking,
    Price(f64),
    WatcherStopped,
    UnableToFetch,
    ConnectionFailed,
}

impl PriceStatus {
    pub fn label(&self) -> String {
        match self {
            PriceStatus::Checking => "Checking price...".to_string(),
            PriceStatus::Price(price) => format_euros(*price),
            PriceStatus::WatcherStopped => "Watcher turned off".to_string(),
            PriceStatus::UnableToFetch => "Unable to fetch".to_string(),
            PriceStatus::ConnectionFailed => "Connection failed".to_string(),
        }
    }
}

/// One row of the product list
#[derive(Debug, Clone, PartialEq)]
pub struct ProductItem {
    pub index: usize,
    pub product: Product,
    pub price: PriceStatus,
    pub below_target: bool,
}

impl ProductItem {
    pub fn new(index: usize, product: Product) -> Self {
        Self {
            index,
            product,
            price: PriceStatus::Checking,
            below_target: false,
        }
    }

    pub fn target_label(&self) -> String {
        format!("Target: {}", format_euros(self.product.target_price))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalView {
    pub interval: Option<String>,
}

impl IntervalView {
    pub fn summary(&self) -> String {
        format!(
            "Current interval: {}",
            self.interval.as_deref().unwrap_or("60 seconds (default)")
        )
    }

    /// Value the interval form is pre-filled with
    pub fn input_value(&self) -> &str {
        self.interval.as_deref().unwrap_or("60")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramView {
    pub settings: TelegramSettings,
    pub token_field: MaskedField,
    pub chat_id_field: MaskedField,
}

impl TelegramView {
    pub fn new(settings: TelegramSettings) -> Self {
        let token_field = MaskedField::new(settings.token());
        let chat_id_field = MaskedField::new(settings.chat_id());
        Self {
            settings,
            token_field,
            chat_id_field,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let token = if self.settings.token().is_some() {
            "✓ Set".to_string()
        } else {
            "✗ Not set".to_string()
        };
        let chat_id = match self.settings.chat_id() {
            Some(id) => format!("✓ {}", id),
            None => "✗ Not set".to_string(),
        };
        let enabled = if self.settings.is_enabled() {
            "✓ Telegram notifications are enabled"
        } else {
            "⚠ Telegram notifications are disabled"
        };
        vec![
            format!("Bot Token: {}", token),
            format!("Chat ID: {}", chat_id),
            enabled.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationsView {
    pub mode: NotificationMode,
}

impl NotificationsView {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Current mode: {}", self.mode.description())];
        if !self.mode.detail().is_empty() {
            lines.push(self.mode.detail().to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatcherView {
    pub status: WatcherStatus,
}

impl WatcherView {
    /// Short status shown in the dashboard header
    pub fn header(&self) -> String {
        if !self.status.is_running {
            return "Watcher Stopped".to_string();
        }
        match self.status.countdown {
            Some(seconds) => format!("Active ({})", format_countdown(seconds)),
            None => "Watcher Active".to_string(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let running = self.status.is_running;
        let mut lines = vec![format!(
            "Status: {}",
            if running { "Running" } else { "Stopped" }
        )];

        if let (true, Some(seconds)) = (running, self.status.countdown) {
            lines.push(format!("Next check in: {}", format_countdown(seconds)));
            let interval = match &self.status.interval {
                Some(interval) => format!("{}s", interval),
                None => "unknown".to_string(),
            };
            lines.push(format!("Interval: {}", interval));
        }

        lines.push(if running {
            "The watcher is actively monitoring your products and will send Telegram notifications when target prices are reached.".to_string()
        } else {
            "The watcher is stopped. Products are not being monitored for price changes."
                .to_string()
        });
        lines
    }

    pub fn can_start(&self) -> bool {
        !self.status.is_running
    }

    pub fn can_stop(&self) -> bool {
        self.status.is_running
    }
}

/// Everything the dashboard shows
#[derive(Debug)]
pub struct DashboardState {
    pub products: ProductsPanel,
    pub interval: Panel<IntervalView>,
    pub telegram: Panel<TelegramView>,
    pub notifications: Panel<NotificationsView>,
    pub watcher: Panel<WatcherView>,
    pub auto_refresh: Option<String>,
    pub editor: ProductEditor,
    pub notices: VecDeque<Notice>,
    pub history_max_size: usize,
    pub visible: bool,
    render_generation: u64,
}

impl DashboardState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            products: ProductsPanel::Loading,
            interval: Panel::Loading,
            telegram: Panel::Loading,
            notifications: Panel::Loading,
            watcher: Panel::Loading,
            auto_refresh: None,
            editor: ProductEditor::default(),
            notices: VecDeque::with_capacity(history_max_size),
            history_max_size,
            visible: true,
            render_generation: 0,
        }
    }

    /// Start a new product render; returns the generation its rows belong to
    pub fn begin_product_render(&mut self) -> u64 {
        self.render_generation += 1;
        self.products = ProductsPanel::Loading;
        self.render_generation
    }

    /// Install the rows of a render, unless a newer render has started
    pub fn set_products(&mut self, generation: u64, products: Vec<Product>) -> bool {
        if generation != self.render_generation {
            return false;
        }
        self.products = if products.is_empty() {
            ProductsPanel::Empty
        } else {
            ProductsPanel::Items(
                products
                    .into_iter()
                    .enumerate()
                    .map(|(index, product)| ProductItem::new(index, product))
                    .collect(),
            )
        };
        true
    }

    pub fn fail_products(&mut self, generation: u64, message: &str) {
        if generation == self.render_generation {
            self.products = ProductsPanel::Failed(message.to_string());
        }
    }

    /// Record a price lookup result, returning the updated row.
    ///
    /// Results from a superseded render are dropped.
    pub fn apply_price(
        &mut self,
        generation: u64,
        index: usize,
        price: PriceStatus,
    ) -> Option<&ProductItem> {
        if generation != self.render_generation {
            return None;
        }
        let ProductsPanel::Items(items) = &mut self.products else {
            return None;
        };
        let item = items.get_mut(index)?;
        item.below_target = matches!(price, PriceStatus::Price(p) if p < item.product.target_price);
        item.price = price;
        Some(item)
    }

    pub fn product(&self, index: usize) -> Option<&Product> {
        match &self.products {
            ProductsPanel::Items(items) => items.get(index).map(|item| &item.product),
            _ => None,
        }
    }

    /// Add a notice to history
    pub fn add_notice(&mut self, notice: Notice) {
        if self.history_max_size == 0 {
            return;
        }
        if self.notices.len() >= self.history_max_size {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Notices still on screen at `now`, oldest first
    pub fn visible_notices(&self, now: Instant, ttl: Duration) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(move |n| n.is_visible(now, ttl))
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(DashboardState::new(history_max_size)))
}

/// Format a price as euros with thousands separators, e.g. `€12,500` or `€99.5`
pub fn format_euros(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    match fraction {
        0 => format!("{}€{}", sign, grouped),
        f if f % 10 == 0 => format!("{}€{}.{}", sign, grouped, f / 10),
        f => format!("{}€{}.{:02}", sign, grouped, f),
    }
}

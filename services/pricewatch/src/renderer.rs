//! View renderer: projects backend state onto the dashboard view model
//!
//! Every fetch failure is caught here and turned into a panel placeholder plus
//! an error notice; nothing in the render path propagates errors upwards.
//! Actions (add/edit/delete product, settings updates, watcher control) do
//! return their error so one-shot CLI commands can exit non-zero.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, NotificationMode, PriceOutcome, Product};
use crate::config::DashboardConfig;
use crate::forms::{
    is_expected_listing, validate_interval, MaskedField, ProductForm, ProductSubmission,
    EXPECTED_LISTING_DOMAIN,
};
use crate::notice::{Notice, NoticeKind};
use crate::scheduler::RefreshTarget;
use crate::state::{
    format_euros, IntervalView, NotificationsView, Panel, PriceStatus, StateHandle, TelegramView,
    WatcherView,
};
use crate::DashboardError;

const PRODUCTS_FAILED: &str = "Failed to load products. Please refresh the page.";
const TELEGRAM_UNKNOWN: &str =
    "Could not load the stored Telegram settings; pass both --token and --chat-id";

/// Renders panels and performs user actions against the backend
#[derive(Debug, Clone)]
pub struct Renderer {
    api: ApiClient,
    state: StateHandle,
    price_stagger: Duration,
}

impl Renderer {
    pub fn new(api: ApiClient, state: StateHandle, config: &DashboardConfig) -> Self {
        Self {
            api,
            state,
            price_stagger: config.price_stagger(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    async fn notify(&self, notice: Notice) {
        raise(&self.state, notice).await;
    }

    /// Fetch the product list and install it without starting price lookups.
    ///
    /// Returns the render generation, or `None` if loading failed.
    pub async fn load_products(&self) -> Option<(u64, Vec<Product>)> {
        self.fetch_products().await.ok().flatten()
    }

    /// Load the product list ahead of an index-based action, returning the
    /// backend failure instead of leaving the list empty
    pub async fn require_products(&self) -> crate::Result<()> {
        self.fetch_products().await.map(|_| ())
    }

    async fn fetch_products(&self) -> crate::Result<Option<(u64, Vec<Product>)>> {
        let generation = self.state.write().await.begin_product_render();

        match self.api.list_products().await {
            Ok(products) => {
                tracing::debug!("Loaded {} products", products.len());
                if self
                    .state
                    .write()
                    .await
                    .set_products(generation, products.clone())
                {
                    Ok(Some((generation, products)))
                } else {
                    tracing::debug!("Product render {} superseded", generation);
                    Ok(None)
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load products: {}", e);
                self.state
                    .write()
                    .await
                    .fail_products(generation, PRODUCTS_FAILED);
                self.notify(Notice::error("Failed to load products")).await;
                Err(e)
            }
        }
    }
    /// Render the product list and schedule staggered live price lookups.
    ///
    /// All rows are in place before the first lookup is spawned. Item `i`
    /// is looked up after `i` stagger steps. The returned handles may be
    /// dropped; lookups keep running detached.
    pub async fn render_products(&self) -> Vec<JoinHandle<()>> {
        let Some((generation, products)) = self.load_products().await else {
            return Vec::new();
        };

        products
            .into_iter()
            .enumerate()
            .map(|(index, product)| {
                let api = self.api.clone();
                let state = self.state.clone();
                let delay = self
                    .price_stagger
                    .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    lookup_price(&api, &state, generation, index, &product).await;
                })
            })
            .collect()
    }

    pub async fn render_interval(&self) {
        let panel = match self.api.get_interval().await {
            Ok(setting) => Panel::Ready(IntervalView {
                interval: setting.configured().map(str::to_string),
            }),
            Err(e) => {
                tracing::warn!("Failed to load interval: {}", e);
                self.notify(Notice::error("Failed to load interval setting"))
                    .await;
                Panel::Failed("Failed to load interval setting".to_string())
            }
        };
        self.state.write().await.interval = panel;
    }

    pub async fn render_telegram(&self) {
        let panel = match self.api.get_telegram().await {
            Ok(settings) => Panel::Ready(TelegramView::new(settings)),
            Err(e) => {
                tracing::warn!("Failed to load Telegram settings: {}", e);
                self.notify(Notice::error("Failed to load Telegram settings"))
                    .await;
                Panel::Failed("Failed to load Telegram settings".to_string())
            }
        };
        self.state.write().await.telegram = panel;
    }

    pub async fn render_notifications(&self) {
        let panel = match self.api.get_notifications().await {
            Ok(settings) => {
                tracing::debug!("Notification mode: {}", settings.mode());
                Panel::Ready(NotificationsView {
                    mode: settings.mode(),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to load notification settings: {}", e);
                self.notify(Notice::error("Failed to load notification settings"))
                    .await;
                Panel::Failed("Failed to load notification settings".to_string())
            }
        };
        self.state.write().await.notifications = panel;
    }

    pub async fn render_watcher_status(&self) {
        let panel = match self.api.watcher_status().await {
            Ok(status) => Panel::Ready(WatcherView { status }),
            Err(e) => {
                tracing::warn!("Failed to load watcher status: {}", e);
                self.notify(Notice::error("Failed to load watcher status"))
                    .await;
                Panel::Failed("Failed to load watcher status".to_string())
            }
        };
        self.state.write().await.watcher = panel;
    }

    /// Replace the product form contents
    pub async fn set_product_form(&self, form: ProductForm) {
        self.state.write().await.editor.form = form;
    }

    /// Load a rendered product into the form for editing
    pub async fn begin_edit(&self, idx: usize) -> crate::Result<()> {
        let mut state = self.state.write().await;
        let product = state.product(idx).cloned().ok_or_else(|| {
            DashboardError::Validation(format!("No product at index {}", idx))
        })?;
        state.editor.begin_edit(idx, &product);
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.state.write().await.editor.cancel();
    }

    /// Submit the product form, adding or updating depending on edit mode.
    ///
    /// URLs outside the expected listing site need `confirmed`.
    pub async fn submit_product(&self, confirmed: bool) -> crate::Result<()> {
        let submission = self.state.read().await.editor.submission();
        let submission = match submission {
            Ok(submission) => submission,
            Err(e) => {
                self.notify(Notice::error(e.to_string())).await;
                return Err(e);
            }
        };

        let product = match &submission {
            ProductSubmission::Add(product) | ProductSubmission::Update(_, product) => product,
        };
        if !confirmed && !is_expected_listing(&product.url) {
            return Err(DashboardError::Validation(format!(
                "This URL doesn't appear to be from {}; confirm to continue anyway",
                EXPECTED_LISTING_DOMAIN
            )));
        }

        let result = match &submission {
            ProductSubmission::Add(product) => self.api.add_product(product).await,
            ProductSubmission::Update(idx, product) => {
                self.api.update_product(*idx, product).await
            }
        };

        match result {
            Ok(()) => {
                self.render_products().await;
                let message = match &submission {
                    ProductSubmission::Add(product) => format!(
                        "Added {} to watchlist!",
                        product.label().unwrap_or("new product")
                    ),
                    ProductSubmission::Update(_, product) => format!(
                        "Updated {} successfully!",
                        product.label().unwrap_or("product")
                    ),
                };
                self.state.write().await.editor.cancel();
                self.notify(Notice::success(message)).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to save product: {}", e);
                self.notify(Notice::error("Failed to save product. Please try again."))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn delete_product(&self, idx: usize) -> crate::Result<()> {
        let name = self
            .state
            .read()
            .await
            .product(idx)
            .and_then(|p| p.label().map(str::to_string))
            .unwrap_or_else(|| "this product".to_string());

        match self.api.delete_product(idx).await {
            Ok(()) => {
                self.render_products().await;
                self.notify(Notice::success(format!("Removed {}", name)))
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to remove product {}: {}", idx, e);
                self.notify(Notice::error("Failed to remove product")).await;
                Err(e)
            }
        }
    }

    /// Save a new interval spec and re-render the interval panel
    pub async fn update_interval(&self, input: &str) -> crate::Result<()> {
        let interval = match validate_interval(input) {
            Ok(interval) => interval,
            Err(e) => {
                self.notify(Notice::error(e.to_string())).await;
                return Err(e);
            }
        };

        match self.api.set_interval(&interval).await {
            Ok(()) => {
                self.render_interval().await;
                self.notify(Notice::success("Interval updated successfully!"))
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to update interval: {}", e);
                self.notify(Notice::error("Failed to update interval")).await;
                Err(e)
            }
        }
    }

    /// Save Telegram credentials.
    ///
    /// `None` leaves a field untouched, which submits the stored value.
    pub async fn update_telegram(
        &self,
        token: Option<&str>,
        chat_id: Option<&str>,
    ) -> crate::Result<()> {
        let fields = if token.is_some() && chat_id.is_some() {
            Some((MaskedField::default(), MaskedField::default()))
        } else {
            self.telegram_fields().await
        };
        // Without the stored values an omitted field would be wiped
        let Some((mut token_field, mut chat_id_field)) = fields else {
            tracing::warn!("Telegram settings unavailable; refusing partial update");
            self.notify(Notice::error(TELEGRAM_UNKNOWN)).await;
            return Err(DashboardError::Validation(TELEGRAM_UNKNOWN.to_string()));
        };
        edit_field(&mut token_field, token);
        edit_field(&mut chat_id_field, chat_id);

        match self
            .api
            .set_telegram(&token_field.submitted(), &chat_id_field.submitted())
            .await
        {
            Ok(()) => {
                self.render_telegram().await;
                self.notify(Notice::success("Telegram settings updated!"))
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to update Telegram settings: {}", e);
                self.notify(Notice::error("Failed to update Telegram settings"))
                    .await;
                Err(e)
            }
        }
    }

    /// Current masked fields, fetching the settings again if the panel
    /// never loaded
    async fn telegram_fields(&self) -> Option<(MaskedField, MaskedField)> {
        if !matches!(self.state.read().await.telegram, Panel::Ready(_)) {
            self.render_telegram().await;
        }
        match &self.state.read().await.telegram {
            Panel::Ready(view) => Some((view.token_field.clone(), view.chat_id_field.clone())),
            _ => None,
        }
    }

    pub async fn update_notifications(&self, mode: NotificationMode) -> crate::Result<()> {
        match self.api.set_notifications(mode).await {
            Ok(()) => {
                self.render_notifications().await;
                self.notify(Notice::success("Notification settings updated!"))
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to update notification settings: {}", e);
                self.notify(Notice::error("Failed to update notification settings"))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn start_watcher(&self) -> crate::Result<()> {
        match self.api.start_watcher().await {
            Ok(action) => {
                tracing::info!(
                    "Watcher start requested: {}",
                    action.message.as_deref().unwrap_or("ok")
                );
                self.notify(Notice::success("Watcher started successfully!"))
                    .await;
                self.render_watcher_status().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to start watcher: {}", e);
                self.notify(Notice::error("Failed to start watcher")).await;
                Err(e)
            }
        }
    }

    pub async fn stop_watcher(&self) -> crate::Result<()> {
        match self.api.stop_watcher().await {
            Ok(action) => {
                tracing::info!(
                    "Watcher stop requested: {}",
                    action.message.as_deref().unwrap_or("ok")
                );
                self.notify(Notice::success("Watcher stopped successfully!"))
                    .await;
                self.render_watcher_status().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to stop watcher: {}", e);
                self.notify(Notice::error("Failed to stop watcher")).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl RefreshTarget for Renderer {
    async fn is_visible(&self) -> bool {
        self.state.read().await.visible
    }

    async fn refresh(&self) {
        tracing::debug!("Auto-refreshing products");
        self.render_products().await;
    }

    async fn show_countdown(&self, text: String) {
        self.state.write().await.auto_refresh = Some(text);
    }
}

fn edit_field(field: &mut MaskedField, input: Option<&str>) {
    if let Some(text) = input {
        field.focus();
        field.input(text);
    }
}

async fn raise(state: &StateHandle, notice: Notice) {
    match notice.kind {
        NoticeKind::Success => tracing::info!("{}", notice.message),
        NoticeKind::Error => tracing::warn!("{}", notice.message),
    }
    state.write().await.add_notice(notice);
}

/// Look up one product's live price and record the outcome on its row
async fn lookup_price(
    api: &ApiClient,
    state: &StateHandle,
    generation: u64,
    index: usize,
    product: &Product,
) {
    let status = match api.fetch_price(&product.url).await {
        Ok(lookup) => match lookup.outcome() {
            PriceOutcome::Price(price) => PriceStatus::Price(price),
            PriceOutcome::Error(error) => {
                tracing::debug!("Price lookup for {} failed: {}", product.url, error);
                classify_failure(api, PriceStatus::UnableToFetch).await
            }
        },
        Err(e) => {
            tracing::debug!("Price request for {} failed: {}", product.url, e);
            classify_failure(api, PriceStatus::ConnectionFailed).await
        }
    };

    let below_target = {
        let mut state = state.write().await;
        match state.apply_price(generation, index, status.clone()) {
            Some(item) => item.below_target,
            None => {
                tracing::debug!("Dropping stale price for {}", product.url);
                return;
            }
        }
    };

    if let (true, PriceStatus::Price(price)) = (below_target, status) {
        raise(
            state,
            Notice::success(format!(
                "{} dropped below target price: {}!",
                product.label().unwrap_or("Product"),
                format_euros(price)
            )),
        )
        .await;
    }
}

/// Tell "watcher stopped" apart from a plain fetch failure
async fn classify_failure(api: &ApiClient, otherwise: PriceStatus) -> PriceStatus {
    match api.watcher_status().await {
        Ok(status) if !status.is_running => PriceStatus::WatcherStopped,
        _ => otherwise,
    }
}

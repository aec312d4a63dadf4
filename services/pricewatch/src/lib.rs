//! Pricewatch - terminal dashboard for the price watch service
//!
//! Renders the watched products with live prices, the watcher's settings and
//! status, and keeps itself fresh with a self-adjusting auto-refresh.

pub mod api;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod forms;
pub mod frame;
pub mod interval;
pub mod io;
pub mod notice;
pub mod renderer;
pub mod scheduler;
pub mod state;

pub use config::{load_config, Config};
pub use error::{DashboardError, Result};

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::controller::Controller;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::renderer::Renderer;

const REDRAW_PERIOD: Duration = Duration::from_secs(1);
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Assembles a [`Dashboard`] from configuration
pub struct DashboardBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
}

impl DashboardBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            cancel: None,
        }
    }

    /// Use a custom HTTP client instead of reqwest
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Dashboard {
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let cancel = self.cancel.unwrap_or_default();

        let api = ApiClient::new(&self.config.api.base_url, http);
        let state = state::new_state_handle(self.config.dashboard.history_size);
        let renderer = Arc::new(Renderer::new(api, state, &self.config.dashboard));
        let controller = Controller::new(
            Arc::clone(&renderer),
            &self.config.dashboard,
            cancel.clone(),
        );

        Dashboard {
            config: self.config,
            renderer,
            controller,
            cancel,
        }
    }
}

/// A wired-up dashboard
#[derive(Debug)]
pub struct Dashboard {
    config: Config,
    renderer: Arc<Renderer>,
    controller: Controller,
    cancel: CancellationToken,
}

impl Dashboard {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the live dashboard, redrawing into `out` once per second until cancelled
    pub async fn watch<W: Write>(&self, mut out: W) -> Result<()> {
        tracing::info!(
            "Watching price watch backend at {}",
            self.renderer.api().base_url()
        );
        let _handles = self.controller.start();

        let mut ticker = tokio::time::interval(REDRAW_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ttl = self.config.dashboard.notice_ttl();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let frame = {
                        let state = self.renderer.state().read().await;
                        frame::render_frame(&state, Instant::now(), ttl)
                    };
                    write!(out, "{}{}", CLEAR_SCREEN, frame)?;
                    out.flush()?;
                }
            }
        }

        self.controller.shutdown().await;
        tracing::info!("Dashboard stopped");
        Ok(())
    }
}

/// Run the live dashboard on stdout until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let dashboard = DashboardBuilder::new(config).build();

    let cancel_for_signal = dashboard.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    dashboard.watch(std::io::stdout()).await
}

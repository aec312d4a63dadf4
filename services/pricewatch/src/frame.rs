//! Plain-text rendering of the dashboard view model

use std::fmt::Write as _;
use std::time::Duration;

use tokio::time::Instant;

use crate::state::{
    DashboardState, IntervalView, NotificationsView, Panel, PriceStatus, ProductsPanel,
    TelegramView, WatcherView,
};

const RULE: &str = "────────────────────────────────────────";

/// Header text for the watcher panel
pub fn watcher_header(panel: &Panel<WatcherView>) -> String {
    match panel {
        Panel::Loading => "Checking status...".to_string(),
        Panel::Ready(view) => view.header(),
        Panel::Failed(_) => "Status Unknown".to_string(),
    }
}

pub fn products_lines(panel: &ProductsPanel) -> Vec<String> {
    match panel {
        ProductsPanel::Loading => vec!["Loading products...".to_string()],
        ProductsPanel::Failed(message) => vec![message.clone()],
        ProductsPanel::Empty => vec![
            "No products being watched".to_string(),
            "Add your first product below to get started!".to_string(),
        ],
        ProductsPanel::Items(items) => items
            .iter()
            .flat_map(|item| {
                let marker = if item.below_target { "▼" } else { " " };
                let price = match &item.price {
                    PriceStatus::Price(_) if item.below_target => {
                        format!("{} (below target)", item.price.label())
                    }
                    other => other.label(),
                };
                [
                    format!(
                        "{} [{}] {}",
                        marker,
                        item.index,
                        item.product.display_name()
                    ),
                    format!("      {}  |  {}", item.target_label(), price),
                    format!("      {}", item.product.url),
                ]
            })
            .collect(),
    }
}

fn panel_lines<T>(panel: &Panel<T>, ready: impl FnOnce(&T) -> Vec<String>) -> Vec<String> {
    match panel {
        Panel::Loading => vec!["Loading...".to_string()],
        Panel::Ready(view) => ready(view),
        Panel::Failed(message) => vec![message.clone()],
    }
}

pub fn interval_lines(panel: &Panel<IntervalView>) -> Vec<String> {
    panel_lines(panel, |view| vec![view.summary()])
}

pub fn telegram_lines(panel: &Panel<TelegramView>) -> Vec<String> {
    panel_lines(panel, TelegramView::lines)
}

pub fn notifications_lines(panel: &Panel<NotificationsView>) -> Vec<String> {
    panel_lines(panel, NotificationsView::lines)
}

pub fn watcher_lines(panel: &Panel<WatcherView>) -> Vec<String> {
    panel_lines(panel, WatcherView::lines)
}

fn section(out: &mut String, title: &str, lines: &[String]) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", RULE);
    for line in lines {
        let _ = writeln!(out, "  {}", line);
    }
    let _ = writeln!(out);
}

/// Draw the whole dashboard as of `now`; notices older than `notice_ttl` are left out
pub fn render_frame(state: &DashboardState, now: Instant, notice_ttl: Duration) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Price Watch Dashboard  [{}]",
        watcher_header(&state.watcher)
    );
    if let Some(countdown) = &state.auto_refresh {
        let _ = writeln!(out, "{}", countdown);
    }
    let _ = writeln!(out);

    section(&mut out, "Watched Products", &products_lines(&state.products));
    section(&mut out, "Check Interval", &interval_lines(&state.interval));
    section(&mut out, "Telegram", &telegram_lines(&state.telegram));
    section(
        &mut out,
        "Notifications",
        &notifications_lines(&state.notifications),
    );
    section(&mut out, "Watcher", &watcher_lines(&state.watcher));

    let notices: Vec<String> = state
        .visible_notices(now, notice_ttl)
        .map(|n| format!("[{}] {}", n.kind, n.message))
        .collect();
    if !notices.is_empty() {
        section(&mut out, "Notices", &notices);
    }

    out
}

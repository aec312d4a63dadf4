//! Pricewatch CLI
//!
//! Live terminal dashboard and one-shot commands for the price watch service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pricewatch::api::NotificationMode;
use pricewatch::forms::ProductForm;
use pricewatch::frame;
use pricewatch::renderer::Renderer;
use pricewatch::state::Panel;
use pricewatch::{load_config, Config, Dashboard, DashboardBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Dashboard for the price watch service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Live dashboard, redrawn every second until Ctrl-C
    Watch,
    /// Manage watched products
    Products {
        #[command(subcommand)]
        action: ProductsCommand,
    },
    /// Show or change the check interval
    Interval {
        #[command(subcommand)]
        action: IntervalCommand,
    },
    /// Show or change Telegram credentials
    Telegram {
        #[command(subcommand)]
        action: TelegramCommand,
    },
    /// Show or change when notifications are sent
    Notifications {
        #[command(subcommand)]
        action: NotificationsCommand,
    },
    /// Control the watcher process
    Watcher {
        #[command(subcommand)]
        action: WatcherCommand,
    },
}

#[derive(Subcommand)]
enum ProductsCommand {
    /// List products with their live prices
    List,
    /// Add a product to the watchlist
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        target_price: String,
        #[arg(long)]
        name: Option<String>,
        /// Accept a URL outside the expected listing site
        #[arg(long)]
        force: bool,
    },
    /// Edit the product at an index; omitted fields keep their value
    Edit {
        idx: usize,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        target_price: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Accept a URL outside the expected listing site
        #[arg(long)]
        force: bool,
    },
    /// Remove the product at an index
    Delete { idx: usize },
}

#[derive(Subcommand)]
enum IntervalCommand {
    Show,
    /// e.g. `300`, `5m`, `random:60-300`
    Set { spec: String },
}

#[derive(Subcommand)]
enum TelegramCommand {
    Show,
    /// Omitted values keep the stored credential
    Set {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        chat_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum NotificationsCommand {
    Show,
    /// One of below_target, any_change, both, none
    Set { mode: NotificationMode },
}

#[derive(Subcommand)]
enum WatcherCommand {
    Status,
    Start,
    Stop,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

async fn print_notices(renderer: &Renderer) {
    let state = renderer.state().read().await;
    for notice in &state.notices {
        println!("[{}] {}", notice.kind, notice.message);
    }
}

fn ensure_loaded<T>(panel: &Panel<T>) -> CliResult {
    match panel {
        Panel::Failed(message) => Err(message.clone().into()),
        _ => Ok(()),
    }
}

async fn products(renderer: &Renderer, action: ProductsCommand) -> CliResult {
    match action {
        ProductsCommand::List => {
            for handle in renderer.render_products().await {
                handle.await?;
            }
            let state = renderer.state().read().await;
            print_lines(&frame::products_lines(&state.products));
            if let pricewatch::state::ProductsPanel::Failed(message) = &state.products {
                return Err(message.clone().into());
            }
            Ok(())
        }
        ProductsCommand::Add {
            url,
            target_price,
            name,
            force,
        } => {
            renderer
                .set_product_form(ProductForm {
                    url,
                    target_price,
                    name: name.unwrap_or_default(),
                })
                .await;
            let result = renderer.submit_product(force).await;
            print_notices(renderer).await;
            Ok(result?)
        }
        ProductsCommand::Edit {
            idx,
            url,
            target_price,
            name,
            force,
        } => {
            if let Err(e) = renderer.require_products().await {
                print_notices(renderer).await;
                return Err(e.into());
            }
            renderer.begin_edit(idx).await?;
            {
                let mut state = renderer.state().write().await;
                let form = &mut state.editor.form;
                if let Some(url) = url {
                    form.url = url;
                }
                if let Some(target_price) = target_price {
                    form.target_price = target_price;
                }
                if let Some(name) = name {
                    form.name = name;
                }
            }
            let result = renderer.submit_product(force).await;
            print_notices(renderer).await;
            Ok(result?)
        }
        ProductsCommand::Delete { idx } => {
            if let Err(e) = renderer.require_products().await {
                print_notices(renderer).await;
                return Err(e.into());
            }
            let result = renderer.delete_product(idx).await;
            print_notices(renderer).await;
            Ok(result?)
        }
    }
}

async fn interval(dashboard: &Dashboard, action: IntervalCommand) -> CliResult {
    let renderer = dashboard.renderer();
    match action {
        IntervalCommand::Show => {
            renderer.render_interval().await;
            let state = renderer.state().read().await;
            print_lines(&frame::interval_lines(&state.interval));
            ensure_loaded(&state.interval)
        }
        IntervalCommand::Set { spec } => {
            let result = dashboard.controller().update_interval(&spec).await;
            print_notices(renderer).await;
            Ok(result?)
        }
    }
}

async fn telegram(renderer: &Renderer, action: TelegramCommand) -> CliResult {
    match action {
        TelegramCommand::Show => {
            renderer.render_telegram().await;
            let state = renderer.state().read().await;
            print_lines(&frame::telegram_lines(&state.telegram));
            ensure_loaded(&state.telegram)
        }
        TelegramCommand::Set { token, chat_id } => {
            renderer.render_telegram().await;
            let result = renderer
                .update_telegram(token.as_deref(), chat_id.as_deref())
                .await;
            print_notices(renderer).await;
            Ok(result?)
        }
    }
}

async fn notifications(renderer: &Renderer, action: NotificationsCommand) -> CliResult {
    match action {
        NotificationsCommand::Show => {
            renderer.render_notifications().await;
            let state = renderer.state().read().await;
            print_lines(&frame::notifications_lines(&state.notifications));
            ensure_loaded(&state.notifications)
        }
        NotificationsCommand::Set { mode } => {
            let result = renderer.update_notifications(mode).await;
            print_notices(renderer).await;
            Ok(result?)
        }
    }
}

async fn watcher(renderer: &Renderer, action: WatcherCommand) -> CliResult {
    let result = match action {
        WatcherCommand::Status => {
            renderer.render_watcher_status().await;
            Ok(())
        }
        WatcherCommand::Start => renderer.start_watcher().await,
        WatcherCommand::Stop => renderer.stop_watcher().await,
    };
    print_notices(renderer).await;

    let state = renderer.state().read().await;
    println!("{}", frame::watcher_header(&state.watcher));
    print_lines(&frame::watcher_lines(&state.watcher));
    result?;
    ensure_loaded(&state.watcher)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    let command = args.command.unwrap_or(Command::Watch);
    if let Command::Watch = command {
        tracing::info!("Starting pricewatch dashboard");
        pricewatch::run(config).await?;
        return Ok(());
    }

    let dashboard = DashboardBuilder::new(config).build();
    tracing::debug!("Using backend at {}", dashboard.config().api.base_url);
    let renderer = dashboard.renderer();
    match command {
        Command::Watch => Ok(()),
        Command::Products { action } => products(renderer, action).await,
        Command::Interval { action } => interval(&dashboard, action).await,
        Command::Telegram { action } => telegram(renderer, action).await,
        Command::Notifications { action } => notifications(renderer, action).await,
        Command::Watcher { action } => watcher(renderer, action).await,
    }
}

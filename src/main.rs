//! Pricewatch: watch product pages and alert on price drops

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricewatch::{
    checker::Checker,
    config::Config,
    notify::ChannelNotifier,
    scraping::{Acquirer, ChromiumRenderer, NoopRenderer, PageFetcher, PageRenderer},
    storage::{JsonStore, PriceStore},
    types::{ContactChannels, TrackedItem},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Watch product pages and alert on price drops")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "pricewatch.toml")]
    config: PathBuf,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new pricewatch configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Track a new product
    Add {
        /// Product page URL
        url: String,

        /// Alert when the price reaches this value or lower
        alert_price: f64,

        /// Telegram chat id to alert
        #[arg(short, long)]
        telegram: Option<String>,

        /// Email address to alert
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List tracked products
    List,

    /// Stop tracking a product
    Remove {
        /// Item id (as shown by `list`)
        id: String,
    },

    /// Show the recorded price history for a product
    History {
        /// Item id (as shown by `list`)
        id: String,
    },

    /// Check every active product once
    Check,

    /// Check continuously at the configured interval
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load or create config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    // Override data dir if specified
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }

    match cli.command {
        Commands::Init { path } => init_config(path),
        Commands::Add {
            url,
            alert_price,
            telegram,
            email,
        } => add_item(config, url, alert_price, telegram, email).await,
        Commands::List => list_items(config).await,
        Commands::Remove { id } => remove_item(config, id).await,
        Commands::History { id } => show_history(config, id).await,
        Commands::Check => run_check(config).await,
        Commands::Watch => run_watch(config).await,
    }
}

fn open_store(config: &Config) -> Result<Arc<JsonStore>> {
    Ok(Arc::new(JsonStore::open(&config.store.data_dir)?))
}

fn build_checker(config: &Config) -> Result<Checker> {
    let store = open_store(config)?;
    let fetcher = PageFetcher::new(config.fetch.clone())?;
    let renderer: Box<dyn PageRenderer> = if config.render.enabled {
        Box::new(ChromiumRenderer::new(config.render.clone()))
    } else {
        Box::new(NoopRenderer)
    };
    let acquirer = Arc::new(Acquirer::new(fetcher, renderer));
    let notifier = Arc::new(ChannelNotifier::from_config(&config.notify)?);

    Ok(Checker::new(
        store,
        acquirer,
        notifier,
        config.alerts.clone(),
        config.checker.clone(),
        config.store.currency.clone(),
    ))
}

async fn add_item(
    config: Config,
    url: String,
    alert_price: f64,
    telegram: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let channels = ContactChannels {
        telegram_chat_id: telegram,
        email,
    };
    let item = TrackedItem::new(&url, alert_price, channels)?;

    let store = open_store(&config)?;
    let added = store.add_item(item).await?;

    println!("Tracking {}", added.product_url);
    println!("  id:          {}", added.id);
    println!(
        "  alert price: {} {}",
        added.alert_price, config.store.currency
    );

    Ok(())
}

async fn list_items(config: Config) -> Result<()> {
    let store = open_store(&config)?;
    let items = store.list_items().await?;

    if items.is_empty() {
        println!("No tracked products. Add one with `pricewatch add <url> <price>`.");
        return Ok(());
    }

    println!("\nTracked products ({}):\n", items.len());
    for item in items {
        let status = if item.active { "active" } else { "inactive" };
        println!("{}  [{}]", item.id, status);
        println!("  url:    {}", item.product_url);
        println!("  target: {}", item.alert_price);
        match item.last_checked_price {
            Some(price) => println!(
                "  last:   {} (checks: {}, alerts: {})",
                price, item.check_count, item.alerts_sent
            ),
            None => println!("  last:   never checked"),
        }
        println!();
    }

    Ok(())
}

async fn remove_item(config: Config, id: String) -> Result<()> {
    let store = open_store(&config)?;
    store.remove_item(&id).await?;
    println!("Removed {}", id);
    Ok(())
}

async fn show_history(config: Config, id: String) -> Result<()> {
    let store = open_store(&config)?;
    let item = store.get_item(&id).await?;
    let history = store.price_history(&id).await?;

    println!("\nPrice history for {}", item.product_url);
    println!("Target: {} {}\n", item.alert_price, config.store.currency);

    if history.is_empty() {
        println!("No observations yet. Run `pricewatch check`.");
        return Ok(());
    }

    for point in history {
        println!(
            "{}  {} {}",
            point.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            point.price,
            point.currency
        );
    }

    Ok(())
}

async fn run_check(config: Config) -> Result<()> {
    let checker = build_checker(&config)?;
    let stats = checker.run_batch().await?;

    println!("\nBatch complete");
    println!("==============");
    println!("Checked: {}", stats.checked);
    println!("Alerts:  {}", stats.alerted);
    println!("Failed:  {}", stats.failed);
    println!("Skipped: {}", stats.skipped);

    Ok(())
}

async fn run_watch(config: Config) -> Result<()> {
    info!(
        "Watching every {}s, data in {}",
        config.checker.watch_interval_secs,
        config.store.data_dir.display()
    );
    let checker = build_checker(&config)?;
    checker.run_watch().await
}

fn init_config(path: PathBuf) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("pricewatch.toml");

    let toml_content = format!(
        r#"# Pricewatch configuration

[store]
# Directory for tracked items and price history
data_dir = "{data_dir}"
# Currency code recorded on every observation
currency = "{currency}"

[fetch]
user_agent = "{user_agent}"
retries = {retries}
backoff_base_ms = {backoff_base_ms}
timeout_secs = {fetch_timeout}

[render]
# Headless-browser fallback for JS-rendered pages (needs chromium installed)
enabled = {render_enabled}
timeout_secs = {render_timeout}

[alerts]
# One of: "every-check", "on-drop", "cooldown"
policy = "on-drop"
cooldown_secs = {cooldown_secs}

[notify]
# Telegram bot token; falls back to the TELEGRAM_BOT_TOKEN env var
# telegram_bot_token = "123456:ABC..."
timeout_secs = {notify_timeout}

# Uncomment to enable email alerts
# [notify.smtp]
# host = "smtp.example.com"
# port = 587
# username = "bot"
# password = "secret"
# from = "alerts@example.com"

[checker]
# Polite pause between products (milliseconds)
item_delay_ms = {item_delay_ms}
# Interval between batches in watch mode (seconds)
watch_interval_secs = {watch_interval}
"#,
        data_dir = config.store.data_dir.display(),
        currency = config.store.currency,
        user_agent = config.fetch.user_agent,
        retries = config.fetch.retries,
        backoff_base_ms = config.fetch.backoff_base_ms,
        fetch_timeout = config.fetch.timeout_secs,
        render_enabled = config.render.enabled,
        render_timeout = config.render.timeout_secs,
        cooldown_secs = config.alerts.cooldown_secs,
        notify_timeout = config.notify.timeout_secs,
        item_delay_ms = config.checker.item_delay_ms,
        watch_interval = config.checker.watch_interval_secs,
    );

    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    let data_dir = path.join(&config.store.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    println!("Created data directory: {}", data_dir.display());

    Ok(())
}

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use relay_bot::application::errors::{BotError, ConfigError};
use relay_bot::application::messaging::Dispatcher;
use relay_bot::application::services::Router;
use relay_bot::domain::traits::{Bot, InboundSource, MessageStore};
use relay_bot::infrastructure::adapters::{ConsoleAdapter, ConsoleSource, TelegramAdapter, TelegramSource};
use relay_bot::infrastructure::ai::HttpAiClient;
use relay_bot::infrastructure::config::Config;
use relay_bot::infrastructure::storage;

#[derive(Parser)]
#[command(name = "relay-bot")]
#[command(about = "Relays chat messages to an AI service and keeps a message log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run {
        /// Read messages from stdin instead of Telegram
        #[arg(long)]
        console: bool,
    },
    /// Check the configuration, the message store and the AI service
    Check {
        /// Skip the Telegram token check
        #[arg(long)]
        console: bool,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { console } => run_bot(&cli.config, cli.token, console),
        Commands::Check { console } => check(&cli.config, cli.token, console),
        Commands::Version => {
            println!("relay-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str, token_override: Option<String>, console: bool) -> Result<Config, BotError> {
    let mut config = Config::resolve(path)?;
    if let Some(token) = token_override {
        config.bot.token = Some(token);
    }
    config.validate(console)?;
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime, BotError> {
    tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))
}

fn ai_client(config: &Config) -> Result<Arc<HttpAiClient>, BotError> {
    let base_url = config
        .ai
        .base_url
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField("AI_SERVICE_URL".to_string()))?;
    Ok(Arc::new(HttpAiClient::new(base_url, config.ai_timeout())?))
}

fn telegram_adapter(config: &Config) -> Result<TelegramAdapter, BotError> {
    let token = config
        .bot
        .token
        .clone()
        .ok_or_else(|| ConfigError::MissingField("BOT_TOKEN".to_string()))?;
    TelegramAdapter::new(token)
}

fn run_bot(config_path: &str, token_override: Option<String>, console: bool) -> Result<(), BotError> {
    let config = load_config(config_path, token_override, console)?;
    tracing::info!("Starting {}", config.bot.name);

    let rt = runtime()?;
    rt.block_on(async {
        let store = storage::open_store(&config.storage, config.ai_timeout())?;
        let ai = ai_client(&config)?;
        if let Err(e) = ai.health().await {
            tracing::warn!("AI service at {} is not healthy yet: {}", ai.base_url(), e);
        }

        if console {
            let bot = Arc::new(ConsoleAdapter::new());
            tracing::info!("Starting console bot (dev mode)");
            let mut source = ConsoleSource::stdin();
            serve(&config, store, ai, bot, &mut source).await
        } else {
            let mut bot = telegram_adapter(&config)?;
            bot.fetch_bot_info().await?;
            if let Err(e) = bot.register_commands().await {
                tracing::warn!("Failed to register commands: {}", e);
            }

            let bot = Arc::new(bot);
            tracing::info!("Bot started: @{}", bot.bot_info().username);
            let mut source = TelegramSource::new(Arc::clone(&bot));
            serve(&config, store, ai, bot, &mut source).await
        }
    })
}

async fn serve(
    config: &Config,
    store: Arc<dyn MessageStore>,
    ai: Arc<HttpAiClient>,
    bot: Arc<dyn Bot>,
    source: &mut dyn InboundSource,
) -> Result<(), BotError> {
    let router = Router::new(store, ai, bot).with_ingest(config.ai.ingest);
    let dispatcher = Dispatcher::new(Arc::new(router));

    let received = dispatcher.run(source, shutdown_signal()).await;

    tracing::info!(received, "Bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn check(config_path: &str, token_override: Option<String>, console: bool) -> Result<(), BotError> {
    let config = load_config(config_path, token_override, console)?;
    println!("config: ok");

    let rt = runtime()?;
    rt.block_on(async {
        let store = storage::open_store(&config.storage, config.ai_timeout())?;
        println!("store: {} ok", store.name());

        let ai = ai_client(&config)?;
        ai.health().await?;
        println!("ai service: {} ok", ai.base_url());

        if !console {
            let mut bot = telegram_adapter(&config)?;
            bot.fetch_bot_info().await?;
            println!("telegram: @{} ok", bot.bot_info().username);
        }

        Ok::<(), BotError>(())
    })
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

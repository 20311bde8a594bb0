mod config_commands;
mod render_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "convo", about = "convo: chat message classification and sanitization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./convo.toml and ~/.config/convo/).
    #[arg(long, global = true, env = "CONVO_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print render plans for a JSON array of messages.
    Render {
        /// Message file, or `-` for stdin.
        input: String,
        /// Print compact JSON.
        #[arg(long)]
        compact: bool,
    },
    /// Sanitize an HTML fragment.
    Sanitize {
        /// HTML string, or `-` for stdin.
        html: String,
        /// Allowed tag; repeat to build a list that replaces the default.
        #[arg(long = "allow", value_name = "TAG")]
        allow: Vec<String>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "convo starting");

    match cli.command {
        Commands::Render { input, compact } => {
            render_commands::render(cli.config.as_deref(), &input, compact)
        },
        Commands::Sanitize { html, allow } => {
            render_commands::sanitize(cli.config.as_deref(), &html, &allow)
        },
        Commands::Config { action } => {
            config_commands::handle_config(cli.config.as_deref(), action)
        },
    }
}

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use paper_chat::cli::chat::view::TerminalCapabilities;
use paper_chat::cli::chat::ChatContext;
use paper_chat::config::ClientConfig;
use paper_chat::rag_client::RagClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the question-answering service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Show bot replies as plain text instead of formatted Markdown
    #[arg(long, global = true)]
    plain: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Paper to upload before chatting
        #[arg(short, long)]
        file: Option<String>,

        /// Question to ask once, without starting the interactive prompt
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Check whether the service is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = ClientConfig::resolve(cli.base_url.as_deref())?;
    info!("Starting Paper Chat CLI against {}", config.base_url);

    let client = RagClient::new(config);
    let capabilities = TerminalCapabilities::detect(cli.plain);

    match cli.command {
        Some(Commands::Health) => {
            let mut chat_context =
                ChatContext::new(Box::new(io::stdout()), capabilities, client, None, None);
            chat_context.health().await
        }
        Some(Commands::Chat { file, input }) => {
            let mut chat_context =
                ChatContext::new(Box::new(io::stdout()), capabilities, client, file, input);
            chat_context.run().await
        }
        None => {
            // Default to chat if no subcommand is provided
            let mut chat_context =
                ChatContext::new(Box::new(io::stdout()), capabilities, client, None, None);
            chat_context.run().await
        }
    }
}

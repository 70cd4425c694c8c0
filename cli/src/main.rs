use clap::{Parser, Subcommand};
use govdesk_core::turn::DEFAULT_SENDER_ID;

mod commands;
mod util;

#[derive(Parser)]
#[command(name = "govdesk", version, about = "GovDesk CLI: drive the decision engine's Turn API")]
struct Cli {
    /// API base URL
    #[arg(long, env = "GOVDESK_API_URL", default_value = "http://localhost:4100")]
    api_url: String,

    /// Conversation owner sent as `senderId`
    #[arg(long, global = true, env = "GOVDESK_SENDER_ID")]
    sender: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Send a single utterance and print the reply
    Say {
        /// Utterance text (Arabic transcript or chat text)
        #[arg(long)]
        text: String,
    },
    /// Interactive conversation over stdin (one line per turn)
    Chat,
    /// Forget the sender's conversation on the server
    Reset,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Say { text } => commands::turn::say(&cli.api_url, cli.sender, text).await,
        Commands::Chat => {
            // A fresh conversation per session unless one is named.
            let sender = cli
                .sender
                .unwrap_or_else(|| format!("cli-{}", uuid::Uuid::now_v7()));
            commands::turn::chat(&cli.api_url, sender).await
        }
        Commands::Reset => {
            let sender = cli.sender.as_deref().unwrap_or(DEFAULT_SENDER_ID);
            commands::reset::run(&cli.api_url, sender).await
        }
    };

    std::process::exit(code);
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use domo_server::report::build_conversation_report;
use domo_server::scoring::{score_color, score_label};
use domo_server::storage::Database;

#[derive(Parser)]
#[command(name = "score-report")]
#[command(about = "Inspect captured conversation data and Domo Scores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "domo.db")]
    db_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List all known conversations with their scores
    List,
    /// Print the full report for one conversation
    Report {
        /// Conversation id
        conversation_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("domo_server=warn")
        .init();

    let cli = Cli::parse();
    let db = Database::new(cli.db_path)?;

    match cli.command {
        Commands::List => {
            let conversations = db.list_conversations().await?;
            if conversations.is_empty() {
                info!("No conversations recorded yet");
                return Ok(());
            }

            println!("{:<40} {:<8} {:<6} LABEL", "CONVERSATION", "STATUS", "SCORE");
            for conversation in conversations {
                let report = build_conversation_report(&db, &conversation.conversation_id).await?;
                println!(
                    "{:<40} {:<8} {}/{}    {} ({})",
                    conversation.conversation_id,
                    conversation.status,
                    report.score.score,
                    report.score.max_score,
                    score_label(report.score.score),
                    score_color(report.score.score).as_str(),
                );
            }
        }
        Commands::Report { conversation_id } => {
            let report = build_conversation_report(&db, &conversation_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsbrief")]
#[command(about = "Company news analysis from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline and print the result as JSON
    Analyze {
        /// Company to search news for
        company: String,

        /// Use Google News discovery with local summaries and lexicon sentiment
        #[arg(long)]
        offline: bool,

        /// Print single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Run the full pipeline and print only the narration
    Narrate {
        /// Company to search news for
        company: String,

        /// Use Google News discovery with local summaries and lexicon sentiment
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = newsbrief_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            company,
            offline,
            compact,
        } => run::run_analyze(&config, &company, offline, compact).await,
        Commands::Narrate { company, offline } => {
            run::run_narrate(&config, &company, offline).await
        }
    }
}

#[cfg(test)]
mod tests;

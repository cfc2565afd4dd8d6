use clap::{Parser, Subcommand};
use page_qa::Result;
use page_qa::commands::{ask, scrape, serve};
use page_qa::config::{Config, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "page-qa")]
#[command(about = "Answer questions about a web page using a local Ollama model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the source page and Ollama connection
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Scrape and index the page, then serve the question form
    Serve {
        /// Page to scrape instead of the configured one
        #[arg(long)]
        url: Option<String>,
        /// Port to listen on instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
        /// Page to scrape instead of the configured one
        #[arg(long)]
        url: Option<String>,
        /// Print the retrieved passages before the answer
        #[arg(long)]
        show_context: bool,
    },
    /// Print the paragraphs that would be indexed
    Scrape {
        /// Page to scrape instead of the configured one
        #[arg(long)]
        url: Option<String>,
    },
}

fn load_config(url: Option<String>) -> Result<Config> {
    let mut config = Config::load_default()?;
    if let Some(url) = url {
        config.source.url = url;
        config.source.validate()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Serve { url, port } => {
            let mut config = load_config(url)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config).await?;
        }
        Commands::Ask {
            question,
            url,
            show_context,
        } => {
            let config = load_config(url)?;
            ask(&config, &question, show_context)?;
        }
        Commands::Scrape { url } => {
            let config = load_config(url)?;
            scrape(&config)?;
        }
    }

    Ok(())
}

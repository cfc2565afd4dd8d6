use anyhow::Context;
use console::style;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::generation::{AnswerModel, OllamaGenerator};
use crate::knowledge::KnowledgeBase;
use crate::page::{PageFetcher, validate_url};
use crate::server::{self, AppState};
use crate::{QaError, Result};

/// Scrape the configured page and build everything a request needs
#[inline]
pub fn build_state(config: &Config) -> Result<AppState> {
    let url = validate_url(&config.source.url).map_err(|e| QaError::Config(format!("{:#}", e)))?;

    let embedder = OllamaEmbedder::new(&config.ollama)
        .map_err(|e| QaError::Config(format!("{:#}", e)))?;
    if let Err(e) = embedder.health_check() {
        warn!("Ollama health check failed: {:#}", e);
    }

    let generator = OllamaGenerator::new(&config.ollama)
        .map_err(|e| QaError::Config(format!("{:#}", e)))?;

    info!("Scraping {}", url);
    let documents = PageFetcher::new(&config.source).fetch_paragraphs(url.as_str());
    let knowledge = KnowledgeBase::build(url.as_str(), documents, &embedder)?;

    Ok(AppState::new(
        knowledge,
        Arc::new(embedder) as Arc<dyn Embedder>,
        Arc::new(generator) as Arc<dyn AnswerModel>,
        config.retrieval.top_k,
    ))
}

/// Build the knowledge base, then serve the question form
#[inline]
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.server.socket_addr()?;

    let state_config = config.clone();
    let state = tokio::task::spawn_blocking(move || build_state(&state_config))
        .await
        .context("Startup task failed")??;

    eprintln!(
        "{} {} paragraphs from {}",
        style("Indexed").green().bold(),
        state.knowledge().len(),
        style(state.knowledge().source()).cyan()
    );
    eprintln!(
        "{} http://{}",
        style("Serving on").green().bold(),
        style(addr).cyan()
    );

    server::serve(Arc::new(state), addr).await
}

/// Answer one question from the command line
#[inline]
pub fn ask(config: &Config, question: &str, show_context: bool) -> Result<()> {
    let state = build_state(config)?;
    let knowledge = state.knowledge();

    if show_context {
        let passages = knowledge.passages(question, state.embedder(), state.top_k())?;
        eprintln!("{}", style("Context").bold().yellow());
        for passage in &passages {
            eprintln!(
                "  {} {}",
                style(format!("[{} @ {:.4}]", passage.index, passage.distance)).dim(),
                passage.text
            );
        }
        eprintln!();
    }

    let exchange = state.respond(Some(question));
    println!("{}", exchange.answer);

    Ok(())
}

/// Print the paragraphs that would be indexed
#[inline]
pub fn scrape(config: &Config) -> Result<()> {
    let url = validate_url(&config.source.url).map_err(|e| QaError::Config(format!("{:#}", e)))?;
    let paragraphs = PageFetcher::new(&config.source).fetch_paragraphs(url.as_str());

    if paragraphs.is_empty() {
        eprintln!(
            "{} no paragraphs longer than {} characters at {}",
            style("Found").yellow(),
            config.source.min_paragraph_chars,
            url
        );
        return Ok(());
    }

    for (position, paragraph) in paragraphs.iter().enumerate() {
        println!("{:>4}  {}", position, paragraph);
    }
    eprintln!(
        "{} {} paragraphs",
        style("Extracted").green(),
        paragraphs.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::embeddings::{Embedder, common_dimension};
use crate::index::FlatIndex;
use crate::retrieval::{Passage, retrieve_passages};
use crate::{QaError, Result};

/// Documents embedded per progress step
const EMBEDDING_STEP: usize = 32;

/// The scraped documents and their index, built once and read-only afterwards
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    source: String,
    documents: Vec<String>,
    index: FlatIndex,
}

impl KnowledgeBase {
    /// Embed every document and index the vectors.
    ///
    /// An empty document list is rejected: there is nothing to answer from.
    #[inline]
    pub fn build(
        source: impl Into<String>,
        documents: Vec<String>,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        let source = source.into();
        if documents.is_empty() {
            return Err(QaError::EmptyCorpus(source));
        }

        info!(
            "Embedding {} documents from {}",
            documents.len(),
            source
        );

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(documents.len() as u64).with_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding {msg}")
                    .map_err(|e| QaError::Other(e.into()))?,
            )
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(source.clone());

        let mut vectors = Vec::with_capacity(documents.len());
        for step in documents.chunks(EMBEDDING_STEP) {
            let batch = embedder
                .embed(step)
                .map_err(|e| QaError::Embedding(format!("{:#}", e)))?;
            if batch.len() != step.len() {
                bar.abandon();
                return Err(QaError::Embedding(format!(
                    "Embedder returned {} vectors for {} documents",
                    batch.len(),
                    step.len()
                )));
            }
            vectors.extend(batch);
            bar.inc(step.len() as u64);
        }
        bar.finish_and_clear();

        let dimension =
            common_dimension(&vectors).map_err(|e| QaError::Embedding(format!("{:#}", e)))?;
        debug!("Discovered embedding dimension {}", dimension);

        let index = FlatIndex::build(&vectors)?;
        info!(
            "Knowledge base ready: {} documents, {} dimensions",
            index.len(),
            index.dimension()
        );

        Ok(Self {
            source,
            documents,
            index,
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    #[inline]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Nearest documents to `query`, nearest first
    #[inline]
    pub fn passages(
        &self,
        query: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> anyhow::Result<Vec<Passage<'_>>> {
        retrieve_passages(query, embedder, &self.index, &self.documents, k)
    }
}

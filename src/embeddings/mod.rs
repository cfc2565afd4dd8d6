// Embeddings module
// Text-to-vector conversion backed by Ollama's sentence-embedding models

pub mod ollama;


use anyhow::{Result, anyhow, bail};

pub use ollama::OllamaEmbedder;

/// Maps texts to fixed-dimension vectors.
///
/// Used both for the document batch at startup and for single queries
/// (a slice of length one). Implementations must return exactly one vector
/// per input, all of the same dimension.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string
    #[inline]
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()])?;
        if vectors.len() != 1 {
            bail!("Expected one query embedding, got {}", vectors.len());
        }
        vectors
            .pop()
            .ok_or_else(|| anyhow!("Embedder returned no vector for query"))
    }
}

/// Check that every vector shares the first vector's non-zero dimension, returning it
#[inline]
pub fn common_dimension(vectors: &[Vec<f32>]) -> Result<usize> {
    let Some(first) = vectors.first() else {
        bail!("No embeddings to inspect");
    };

    let dimension = first.len();
    if dimension == 0 {
        bail!("Embedding model returned zero-dimensional vectors");
    }

    if let Some((position, vector)) = vectors
        .iter()
        .enumerate()
        .find(|(_, vector)| vector.len() != dimension)
    {
        bail!(
            "Embedding {} has dimension {}, expected {}",
            position,
            vector.len(),
            dimension
        );
    }

    Ok(dimension)
}


use anyhow::{Context, Result};
use tracing::debug;

use crate::embeddings::Embedder;
use crate::index::FlatIndex;

pub const DEFAULT_TOP_K: usize = 5;

/// A document text selected for a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Passage<'a> {
    pub index: usize,
    pub distance: f32,
    pub text: &'a str,
}

/// Embed `query` and return up to `k` matching documents, nearest first.
///
/// Index positions with no corresponding entry in `texts` are skipped.
#[inline]
pub fn retrieve_passages<'a>(
    query: &str,
    embedder: &dyn Embedder,
    index: &FlatIndex,
    texts: &'a [String],
    k: usize,
) -> Result<Vec<Passage<'a>>> {
    let query_vector = embedder
        .embed_query(query)
        .context("Failed to embed query")?;

    let neighbors = index
        .search(&query_vector, k)
        .context("Failed to search index")?;

    let passages: Vec<Passage<'a>> = neighbors
        .into_iter()
        .filter_map(|neighbor| {
            texts.get(neighbor.index).map(|text| Passage {
                index: neighbor.index,
                distance: neighbor.distance,
                text: text.as_str(),
            })
        })
        .collect();

    debug!(
        "Retrieved {} passages (k = {}) for query of {} chars",
        passages.len(),
        k,
        query.len()
    );

    Ok(passages)
}

/// Newline-joined text of the nearest documents, possibly empty
#[inline]
pub fn retrieve_context(
    query: &str,
    embedder: &dyn Embedder,
    index: &FlatIndex,
    texts: &[String],
    k: usize,
) -> Result<String> {
    let passages = retrieve_passages(query, embedder, index, texts, k)?;
    Ok(join_passages(&passages))
}

#[inline]
pub fn join_passages(passages: &[Passage<'_>]) -> String {
    passages
        .iter()
        .map(|passage| passage.text)
        .collect::<Vec<_>>()
        .join("\n")
}

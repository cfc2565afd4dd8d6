use super::*;
use crate::index::IndexError;
use crate::retrieval::join_passages;
use anyhow::bail;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Embeds by counting a few insurance keywords
struct KeywordEmbedder {
    calls: AtomicUsize,
}

const KEYWORDS: [&str; 3] = ["hospital", "maternity", "ambulance"];

impl KeywordEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                KEYWORDS
                    .iter()
                    .map(|keyword| lower.matches(keyword).count() as f32)
                    .collect()
            })
            .collect())
    }
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        bail!("connection refused")
    }
}

struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
    }
}

struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![0.0; i + 1])
            .collect())
    }
}

fn documents() -> Vec<String> {
    vec![
        "Hospital stays are covered including room rent and nursing.".to_string(),
        "Maternity cover includes delivery and newborn care.".to_string(),
        "Ambulance charges are paid up to a fixed limit per hospital visit.".to_string(),
    ]
}

#[test]
fn empty_corpus_is_rejected() {
    let embedder = KeywordEmbedder::new();

    let result = KnowledgeBase::build("https://example.com", Vec::new(), &embedder);

    assert!(matches!(result, Err(QaError::EmptyCorpus(url)) if url == "https://example.com"));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn builds_index_over_all_documents() {
    let embedder = KeywordEmbedder::new();

    let knowledge = KnowledgeBase::build("https://example.com", documents(), &embedder)
        .expect("knowledge base should build");

    assert_eq!(knowledge.source(), "https://example.com");
    assert_eq!(knowledge.len(), 3);
    assert!(!knowledge.is_empty());
    assert_eq!(knowledge.index().len(), 3);
    assert_eq!(knowledge.index().dimension(), KEYWORDS.len());
    assert_eq!(knowledge.documents(), documents().as_slice());
}

#[test]
fn large_corpora_are_embedded_in_steps() {
    let embedder = KeywordEmbedder::new();
    let docs: Vec<String> = (0..EMBEDDING_STEP * 2 + 1)
        .map(|i| format!("Document {} mentions the hospital network.", i))
        .collect();

    let knowledge =
        KnowledgeBase::build("https://example.com", docs, &embedder).expect("should build");

    assert_eq!(knowledge.len(), EMBEDDING_STEP * 2 + 1);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn passages_come_back_nearest_first() {
    let embedder = KeywordEmbedder::new();
    let knowledge = KnowledgeBase::build("https://example.com", documents(), &embedder)
        .expect("knowledge base should build");

    let passages = knowledge
        .passages("Does it pay for the ambulance?", &embedder, 2)
        .expect("retrieval should succeed");

    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0].index, 2);
    assert_eq!(
        join_passages(&passages),
        format!("{}\n{}", documents()[2], documents()[0])
    );
}

#[test]
fn embedding_failures_are_reported() {
    let result = KnowledgeBase::build("https://example.com", documents(), &BrokenEmbedder);
    assert!(matches!(result, Err(QaError::Embedding(message)) if message.contains("connection refused")));

    let result = KnowledgeBase::build("https://example.com", documents(), &ShortEmbedder);
    assert!(matches!(result, Err(QaError::Embedding(_))));

    let result = KnowledgeBase::build("https://example.com", documents(), &RaggedEmbedder);
    assert!(matches!(result, Err(QaError::Embedding(_))));
}

#[test]
fn zero_dimension_vectors_are_rejected() {
    struct EmptyVectors;
    impl Embedder for EmptyVectors {
        fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| Vec::new()).collect())
        }
    }

    let result = KnowledgeBase::build("https://example.com", documents(), &EmptyVectors);
    assert!(matches!(
        result,
        Err(QaError::Embedding(_) | QaError::Index(IndexError::ZeroDimension))
    ));
}

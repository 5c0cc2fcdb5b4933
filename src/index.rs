//! Corpus index: chunk storage, similarity search, and atomic refresh.
//!
//! A [`CorpusIndex`] is an immutable snapshot built from the document
//! sources: administrative records first, then the static knowledge file,
//! each chunked and embedded. Queries score every chunk by cosine
//! similarity and return the best matches above a threshold.
//!
//! [`IndexHandle`] wraps the current snapshot behind an async `RwLock` so
//! a rebuild can swap in a fresh index without blocking in-flight queries:
//! readers clone the `Arc` and keep searching the old snapshot until they
//! finish.
//!
//! Index builds never fail. Every fetch or embed error downgrades to a
//! smaller (possibly empty) index with a warning, so the assistant keeps
//! answering at reduced capability instead of going down.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::chunk::chunk_words;
use crate::config::Config;
use crate::embedding::{cosine_similarity, Embedder};
use crate::models::{Chunk, ScoredChunk, SourceKind};
use crate::sources::{DocumentSource, STATIC_TITLE};

/// An immutable snapshot of the embedded corpus.
pub struct CorpusIndex {
    chunks: Vec<Chunk>,
    static_text: String,
    built_at: DateTime<Utc>,
}

impl CorpusIndex {
    /// An index with no content, used before the first build completes.
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            static_text: String::new(),
            built_at: Utc::now(),
        }
    }

    /// Number of embedded chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of embedded chunks from one source kind.
    pub fn count_by_source(&self, kind: SourceKind) -> usize {
        self.chunks.iter().filter(|c| c.source == kind).count()
    }

    /// Raw static knowledge text, kept for the strict fallback path.
    pub fn static_text(&self) -> &str {
        &self.static_text
    }

    /// When this snapshot was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Rank chunks against a query vector.
    ///
    /// Scores are cosine similarity clamped to [0, 1]. Chunks below
    /// `threshold` are dropped, the rest are sorted by score descending
    /// (insertion order breaks ties) and truncated to `top_k`.
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let score = cosine_similarity(query, &chunk.embedding).clamp(0.0, 1.0);
                (i, score)
            })
            .filter(|(_, score)| *score >= threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                ScoredChunk {
                    score,
                    source: chunk.source,
                    title: chunk.title.clone(),
                    text: chunk.text.clone(),
                }
            })
            .collect()
    }
}

/// A chunk awaiting its embedding.
struct PendingChunk {
    source: SourceKind,
    title: String,
    text: String,
}

/// Build a fresh index snapshot from the configured sources.
///
/// Administrative records are chunked first, then the static file, so
/// newer administrative content wins score ties. Failures degrade:
/// an unreachable feed or a failed embedding batch shrinks the index,
/// it never aborts the build.
pub async fn build_index(
    source: &dyn DocumentSource,
    embedder: &dyn Embedder,
    config: &Config,
) -> CorpusIndex {
    let window = config.corpus.chunk_words;

    let admin_docs = match source.fetch_administrative(config.corpus.admin_limit).await {
        Ok(docs) => docs,
        Err(e) => {
            warn!("Administrative feed unavailable, continuing without it: {:#}", e);
            Vec::new()
        }
    };

    let static_text = match source.fetch_static().await {
        Ok(text) => text,
        Err(e) => {
            warn!("Static corpus unavailable, continuing without it: {:#}", e);
            String::new()
        }
    };

    let mut pending = Vec::new();

    for doc in &admin_docs {
        for piece in chunk_words(&doc.text, window) {
            pending.push(PendingChunk {
                source: SourceKind::Administrative,
                title: doc.title.clone(),
                text: piece,
            });
        }
    }

    for piece in chunk_words(&static_text, window) {
        pending.push(PendingChunk {
            source: SourceKind::Static,
            title: STATIC_TITLE.to_string(),
            text: piece,
        });
    }

    let mut chunks = Vec::with_capacity(pending.len());
    let batch_size = config.embedding.batch_size.max(1);

    for batch in pending.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();

        let vectors = match embedder.embed(&texts).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropping {} chunks, embedding failed: {:#}", batch.len(), e);
                continue;
            }
        };

        for (p, embedding) in batch.iter().zip(vectors) {
            if embedding.is_empty() {
                continue;
            }
            chunks.push(Chunk {
                source: p.source,
                title: p.title.clone(),
                text: p.text.clone(),
                embedding,
            });
        }
    }

    let index = CorpusIndex {
        chunks,
        static_text,
        built_at: Utc::now(),
    };

    info!(
        "Corpus index built: {} chunks ({} administrative, {} static), static corpus {} bytes",
        index.chunk_count(),
        index.count_by_source(SourceKind::Administrative),
        index.count_by_source(SourceKind::Static),
        index.static_text().len()
    );

    index
}

/// Shared handle to the current index snapshot.
///
/// Cheap to clone; all clones see the same snapshot. `replace` swaps the
/// snapshot atomically while readers keep their own `Arc`.
#[derive(Clone)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<CorpusIndex>>>,
}

impl IndexHandle {
    pub fn new(index: CorpusIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// A handle holding an empty index, for use before the first build.
    pub fn empty() -> Self {
        Self::new(CorpusIndex::empty())
    }

    /// Grab the current snapshot.
    pub async fn snapshot(&self) -> Arc<CorpusIndex> {
        self.current.read().await.clone()
    }

    /// Swap in a new snapshot.
    pub async fn replace(&self, index: CorpusIndex) -> Arc<CorpusIndex> {
        let fresh = Arc::new(index);
        let mut guard = self.current.write().await;
        *guard = fresh.clone();
        fresh
    }
}

use crate::error::EmbeddingError;
use crate::providers::EmbeddingProvider;
use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// How many embedding calls are in flight at once during a build.
const EMBED_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk_id: String,
    text: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub position: usize,
}

/// Flat in-memory similarity index over one batch of chunks.
///
/// Built once per process action and immutable afterwards; a session swaps
/// in a whole new index (with a fresh build id) rather than mutating this
/// one. Nothing is persisted.
pub struct EmbeddingIndex {
    entries: Vec<IndexedChunk>,
    dimensions: usize,
    build_id: Uuid,
}

impl EmbeddingIndex {
    /// Embeds every chunk and assembles the index. Chunks are embedded in
    /// bounded concurrent batches but the index only exists once every call
    /// has succeeded; any provider failure aborts the whole build.
    pub async fn build<P>(chunks: Vec<String>, provider: &P) -> Result<Self, EmbeddingError>
    where
        P: EmbeddingProvider + Sync + ?Sized,
    {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_CONCURRENCY) {
            let batch_embeddings =
                try_join_all(batch.iter().map(|chunk| provider.embed(chunk))).await?;
            embeddings.extend(batch_embeddings);
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        for embedding in &embeddings {
            if embedding.len() != dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimensions,
                    got: embedding.len(),
                });
            }
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| IndexedChunk {
                chunk_id: make_chunk_id(position, &text),
                text,
                embedding,
            })
            .collect::<Vec<_>>();

        let build_id = Uuid::new_v4();
        tracing::debug!(
            build_id = %build_id,
            chunk_count = entries.len(),
            dimensions,
            "embedding index built"
        );

        Ok(Self {
            entries,
            dimensions,
            build_id,
        })
    }

    /// Returns up to `k` chunks ranked by descending cosine similarity to
    /// the embedding of `text`. Ties keep insertion order (earlier chunk
    /// wins). An empty index answers with an empty sequence.
    pub async fn query<P>(
        &self,
        text: &str,
        k: usize,
        provider: &P,
    ) -> Result<Vec<RetrievedChunk>, EmbeddingError>
    where
        P: EmbeddingProvider + Sync + ?Sized,
    {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = provider.embed(text).await?;
        if query_embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: query_embedding.len(),
            });
        }

        let mut scored = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| RetrievedChunk {
                chunk_id: entry.chunk_id.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
                position,
            })
            .collect::<Vec<_>>();

        // Stable sort, so equal scores keep insertion order.
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }
}

fn make_chunk_id(position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((position as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

//! Pluggable text-to-vector embedding providers.
//!
//! Provides the [`EmbeddingProvider`] trait and a deterministic local
//! provider based on token feature hashing (384 dimensions, L2-normalized).
//! Embedding quality is explicitly out of scope here — what matters to the
//! reconciler is only that a provider exists at execution time and that its
//! failures surface as execution failures, never planning failures.

use anyhow::Result;

/// Number of dimensions in the embedding vectors.
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`]
/// dimensions. All methods are synchronous — callers in async contexts should
/// use `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for
    /// batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"hash"` is supported (deterministic token feature
/// hashing — no model files, no network).
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hash" => Ok(Box::new(HashEmbeddingProvider::default())),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: hash"),
    }
}

/// Deterministic feature-hashing provider.
///
/// Lowercased alphanumeric tokens and their bigrams are FNV-1a hashed into
/// bucket positions; the result is L2-normalized. The same text always maps
/// to the same vector, which is all the reconciler and its tests need.
#[derive(Debug, Default)]
pub struct HashEmbeddingProvider;

fn fnv1a(data: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in data.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        for token in &tokens {
            v[(fnv1a(token) % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        // Bigrams at half weight give neighboring tokens some influence
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            v[(fnv1a(&bigram) % EMBEDDING_DIM as u64) as usize] += 0.5;
        }

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::models::{ChatbotError, KnowledgeChunk};

/// Precomputed corpus of text chunks with their embeddings. Read-only
/// once loaded.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    chunks: Vec<KnowledgeChunk>,
}

/// How long a missing or unreadable corpus stays cached as empty before
/// the file is read again.
pub const CORPUS_RETRY_INTERVAL: Duration = Duration::from_secs(60);

struct CachedCorpus {
    base: Arc<KnowledgeBase>,
    retry_at: Option<Instant>,
}

fn loaded() -> &'static Mutex<HashMap<String, CachedCorpus>> {
    static LOADED: OnceLock<Mutex<HashMap<String, CachedCorpus>>> = OnceLock::new();
    LOADED.get_or_init(|| Mutex::new(HashMap::new()))
}

impl KnowledgeBase {
    pub fn new(chunks: Vec<KnowledgeChunk>) -> Self {
        Self { chunks }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChatbotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ChatbotError::Corpus(format!("{}: {}", path.display(), e)))?;
        let chunks: Vec<KnowledgeChunk> = serde_json::from_str(&raw)
            .map_err(|e| ChatbotError::Corpus(format!("{}: {}", path.display(), e)))?;

        info!("Loaded {} knowledge chunks from {}", chunks.len(), path.display());
        Ok(Self { chunks })
    }

    /// Process-wide corpus for `path`, read from disk on first use. A
    /// missing or unreadable corpus yields an empty base that is served
    /// until `CORPUS_RETRY_INTERVAL` has passed.
    pub fn shared(path: &str) -> Arc<KnowledgeBase> {
        Self::shared_at(path, Instant::now())
    }

    fn shared_at(path: &str, now: Instant) -> Arc<KnowledgeBase> {
        if let Ok(mut cache) = loaded().lock() {
            if let Some(cached) = cache.get_mut(path) {
                let retry_due = cached.retry_at.is_some_and(|retry_at| now >= retry_at);
                if !retry_due {
                    return cached.base.clone();
                }
                // Inside a runtime the retry runs off the request path and
                // callers keep the empty base until it lands.
                if let Ok(runtime) = Handle::try_current() {
                    cached.retry_at = Some(now + CORPUS_RETRY_INTERVAL);
                    let owned = path.to_string();
                    runtime.spawn_blocking(move || Self::reload(&owned, Instant::now()));
                    return cached.base.clone();
                }
            }
        }
        Self::reload(path, now)
    }

    fn reload(path: &str, now: Instant) -> Arc<KnowledgeBase> {
        let cached = match Self::load(path) {
            Ok(base) => CachedCorpus {
                base: Arc::new(base),
                retry_at: None,
            },
            Err(e) => {
                warn!("Assistant will answer without knowledge snippets: {}", e);
                CachedCorpus {
                    base: Arc::new(Self::default()),
                    retry_at: Some(now + CORPUS_RETRY_INTERVAL),
                }
            }
        };

        let base = cached.base.clone();
        if let Ok(mut cache) = loaded().lock() {
            cache.insert(path.to_string(), cached);
        }
        base
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first. Equal scores
    /// keep corpus order.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<&KnowledgeChunk> {
        let mut scored: Vec<(f32, &KnowledgeChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query, &chunk.embedding), chunk))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.into_iter().take(k).map(|(_, chunk)| chunk).collect()
    }
}

/// Cosine of the angle between `a` and `b`; 0 for mismatched lengths or a
/// zero vector.
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

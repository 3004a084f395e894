use rand::{distributions::Alphanumeric, Rng};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of identifiers for suggestions and terms the model left unnamed.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Timestamp plus random suffix, e.g. `ai_1718000000000_k3j9x0q2a1bc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        generate_item_id()
    }
}

/// Deterministic `prefix-1`, `prefix-2`, ... ids.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

impl<G: IdGenerator> IdGenerator for std::sync::Arc<G> {
    fn next_id(&self) -> String {
        (**self).next_id()
    }
}

pub fn generate_item_id() -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let random_part: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    format!("ai_{}_{}", timestamp, random_part.to_lowercase())
}

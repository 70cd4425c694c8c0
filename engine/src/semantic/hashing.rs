use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::collaborators::EmbeddingProvider;
use crate::error::CollaboratorError;

/// Deterministic bag-of-tokens embedder.
///
/// Used when no embedding service is configured. Shared words between a
/// request and a service name are enough for a usable ranking.
#[derive(Debug, Clone)]
pub struct HashingEmbeddings {
    dimensions: usize,
}

impl HashingEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddings {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>, CollaboratorError> {
        Ok(hashing_embedding(text, self.dimensions))
    }
}

/// Letters and digits of any script form tokens. The Arabic definite
/// article is dropped so "الهوية" and "هوية" share a bucket.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens.into_iter().map(strip_article).collect()
}

fn strip_article(token: String) -> String {
    match token.strip_prefix("ال") {
        Some(rest) if rest.chars().count() >= 2 => rest.to_string(),
        _ => token,
    }
}

pub fn hashing_embedding(text: &str, dimensions: usize) -> Vec<f64> {
    let mut vec = vec![0.0_f64; dimensions];
    if dimensions == 0 {
        return vec;
    }

    let tokens = tokenize(text);
    if tokens.is_empty() {
        return vec;
    }

    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }

    for (token, count) in counts {
        let digest = Sha256::digest(token.as_bytes());
        let bucket =
            u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % dimensions;
        let sign = if digest[4] % 2 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign * f64::from(count);
    }

    let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut vec {
            *value /= norm;
        }
    }

    vec
}

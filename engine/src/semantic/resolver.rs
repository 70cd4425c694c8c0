use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::collaborators::{EmbeddingProvider, ServiceCatalog};
use crate::config::AcceptancePolicy;
use crate::error::CollaboratorError;

use super::cosine::cosine_similarity;

/// A catalog service ranked against a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredService {
    pub service_id: String,
    pub canonical_name: String,
    pub score: f64,
}

/// Ranks active catalog services by embedding similarity.
#[derive(Clone)]
pub struct SemanticResolver {
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: Arc<dyn ServiceCatalog>,
}

impl SemanticResolver {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, catalog: Arc<dyn ServiceCatalog>) -> Self {
        Self { embedder, catalog }
    }

    /// Top `top_k` services for `query`, best first.
    ///
    /// Services without a stored embedding are embedded on the spot. A
    /// stored embedding whose length differs from the query's is skipped.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredService>, CollaboratorError> {
        let query_vec = self.embedder.embed(query).await?;
        let services = self.catalog.active_services().await?;

        let mut scored = Vec::with_capacity(services.len());
        for service in services {
            let embedding = match service.embedding {
                Some(embedding) => embedding,
                None => self.embedder.embed(&service.canonical_name).await?,
            };
            match cosine_similarity(&query_vec, &embedding) {
                Ok(score) => scored.push(ScoredService {
                    service_id: service.id,
                    canonical_name: service.canonical_name,
                    score: round_score(score),
                }),
                Err(err) => {
                    warn!(
                        service_id = %service.id,
                        provider = self.embedder.name(),
                        error = %err,
                        "skipping service with incompatible embedding"
                    );
                }
            }
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.service_id.cmp(&b.service_id))
        });
        scored.truncate(top_k);

        debug!(
            query_len = query.chars().count(),
            candidates = scored.len(),
            top_score = scored.first().map(|s| s.score),
            "semantic search ranked services"
        );
        Ok(scored)
    }
}

fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Outcome of the acceptance policy for one ranked list.
#[derive(Debug, Clone, PartialEq)]
pub struct Acceptance {
    pub top_score: f64,
    /// Distance to the runner-up; `None` when there is only one candidate
    pub gap: Option<f64>,
    pub meets_threshold: bool,
    pub has_clear_winner: bool,
    pub meets_fallback: bool,
    pub accepted: bool,
}

/// Applies `policy` to a ranked list. `None` for an empty list.
pub fn evaluate_acceptance(results: &[ScoredService], policy: &AcceptancePolicy) -> Option<Acceptance> {
    let top = results.first()?;
    let second = results.get(1);
    let gap = second.map(|s| round_score(top.score - s.score));

    let meets_threshold = top.score >= policy.threshold;
    let has_clear_winner = gap.is_none_or(|gap| gap >= policy.min_gap);
    let strictly_ahead = second.is_none_or(|s| top.score > s.score);
    let meets_fallback = top.score >= policy.fallback_threshold && has_clear_winner && strictly_ahead;

    Some(Acceptance {
        top_score: top.score,
        gap,
        meets_threshold,
        has_clear_winner,
        meets_fallback,
        accepted: meets_threshold || meets_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCatalog, FixedEmbeddings};

    fn scored(id: &str, score: f64) -> ScoredService {
        ScoredService {
            service_id: id.to_string(),
            canonical_name: id.to_string(),
            score,
        }
    }

    #[test]
    fn clear_winner_is_accepted() {
        let policy = AcceptancePolicy::default();
        let eval = evaluate_acceptance(&[scored("a", 0.50), scored("b", 0.30)], &policy).unwrap();
        assert!(eval.accepted);
        assert!(eval.has_clear_winner);
        assert_eq!(eval.gap, Some(0.2));
    }

    #[test]
    fn close_fallback_score_is_not_accepted() {
        let policy = AcceptancePolicy::default();
        let eval = evaluate_acceptance(&[scored("a", 0.42), scored("b", 0.40)], &policy).unwrap();
        assert!(!eval.meets_threshold);
        assert!(!eval.meets_fallback);
        assert!(!eval.accepted);
    }

    #[test]
    fn single_candidate_above_fallback_is_accepted() {
        let policy = AcceptancePolicy::default();
        let eval = evaluate_acceptance(&[scored("a", 0.41)], &policy).unwrap();
        assert!(eval.meets_fallback);
        assert!(eval.accepted);
        assert!(evaluate_acceptance(&[], &policy).is_none());
    }

    #[test]
    fn gap_at_exact_minimum_counts_as_clear() {
        let policy = AcceptancePolicy::default();
        let eval = evaluate_acceptance(&[scored("a", 0.48), scored("b", 0.40)], &policy).unwrap();
        assert!(eval.has_clear_winner);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_truncates() {
        let embedder = Arc::new(
            FixedEmbeddings::new()
                .with("جواز سفر", vec![1.0, 0.0, 0.0])
                .with("passport", vec![0.9, 0.1, 0.0])
                .with("رخصة قيادة", vec![0.0, 1.0, 0.0])
                .with("شهادة ميلاد", vec![0.0, 0.0, 1.0]),
        );
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_service("PASSPORT", "جواز سفر", None)
                .with_service("LICENSE", "رخصة قيادة", Some(vec![0.0, 1.0, 0.0]))
                .with_service("BIRTH", "شهادة ميلاد", None),
        );
        let resolver = SemanticResolver::new(embedder, catalog);

        let results = resolver.search("passport", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].service_id, "PASSPORT");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn search_skips_incompatible_stored_embeddings() {
        let embedder = Arc::new(FixedEmbeddings::new().with("query", vec![1.0, 0.0]));
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_service("OLD", "old model", Some(vec![1.0, 0.0, 0.0]))
                .with_service("NEW", "new model", Some(vec![1.0, 0.0])),
        );
        let resolver = SemanticResolver::new(embedder, catalog);

        let results = resolver.search("query", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].service_id, "NEW");
        assert_eq!(results[0].score, 1.0);
    }
}

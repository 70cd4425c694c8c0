//! Free-text to catalog-service resolution.

pub mod cosine;
pub mod hashing;
pub mod resolver;

pub use cosine::cosine_similarity;
pub use hashing::HashingEmbeddings;
pub use resolver::{Acceptance, ScoredService, SemanticResolver, evaluate_acceptance};

//! Multi-turn dialogue decision engine for the government-service assistant.
//!
//! One call to [`DecisionEngine::next_turn`] consumes one user utterance and
//! returns one reply. Everything the engine talks to (intent classifier,
//! embedding provider, service catalog, appointment directory) sits behind a
//! trait in [`collaborators`].

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod messages;
pub mod parsers;
pub mod router;
pub mod semantic;
pub mod store;
pub mod vocabulary;

pub(crate) mod flows;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collaborators::{
    CatalogService, ClassifiedIntent, Directory, EmbeddingProvider, IntentClassifier,
    ServiceCatalog,
};
pub use config::{AcceptancePolicy, EngineConfig};
pub use engine::{DecisionEngine, DecisionEngineBuilder};
pub use error::{CollaboratorError, EngineError};
pub use semantic::HashingEmbeddings;
pub use store::{ContextStore, InMemoryContextStore};
pub use vocabulary::Vocabulary;

//! HTTP and database adapters behind the engine's collaborator traits.

pub mod azure_embeddings;
pub mod catalog;
pub mod directory;
pub mod rasa;

pub use azure_embeddings::AzureOpenAiEmbeddings;
pub use catalog::PgServiceCatalog;
pub use directory::HttpDirectory;
pub use rasa::RasaClassifier;

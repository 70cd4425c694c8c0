//! Seams to the systems the engine calls out to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use govdesk_core::directory::{ServiceDetails, UpcomingAppointment};

use crate::error::CollaboratorError;

/// Labeled intent returned by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedIntent {
    pub name: String,
    pub confidence: f64,
}

impl ClassifiedIntent {
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            confidence: 0.0,
        }
    }
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ClassifiedIntent, CollaboratorError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short label for logs, e.g. `azure-openai` or `hashing`.
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f64>, CollaboratorError>;
}

/// One active catalog service as the resolver ranks it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogService {
    pub id: String,
    pub canonical_name: String,
    /// Pre-computed embedding. `None` means "embed the name on demand".
    pub embedding: Option<Vec<f64>>,
}

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn active_services(&self) -> Result<Vec<CatalogService>, CollaboratorError>;
}

/// The Appointment & Directory Service.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn upcoming_appointments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<UpcomingAppointment>, CollaboratorError>;

    async fn create_appointment(
        &self,
        service_id: &str,
        at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<(), CollaboratorError>;

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<(), CollaboratorError>;

    async fn cancel_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<(), CollaboratorError>;

    async fn service_by_id(&self, service_id: &str) -> Result<ServiceDetails, CollaboratorError>;

    async fn request_otp(
        &self,
        national_id: &str,
        phone_number: &str,
    ) -> Result<(), CollaboratorError>;

    /// Returns the session token. A wrong or already used code is a
    /// `CollaboratorError::Directory` with a 4xx status.
    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<String, CollaboratorError>;
}

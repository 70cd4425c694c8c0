//! Offline `AppState` for route tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use govdesk_core::directory::{ServiceDetails, UpcomingAppointment};
use govdesk_engine::{
    CatalogService, ClassifiedIntent, CollaboratorError, DecisionEngine, Directory,
    HashingEmbeddings, IntentClassifier, ServiceCatalog,
};
use sqlx::postgres::PgPoolOptions;

use crate::state::AppState;

struct UnknownIntent;

#[async_trait]
impl IntentClassifier for UnknownIntent {
    async fn parse(&self, _text: &str) -> Result<ClassifiedIntent, CollaboratorError> {
        Ok(ClassifiedIntent::unknown())
    }
}

struct StaticCatalog;

#[async_trait]
impl ServiceCatalog for StaticCatalog {
    async fn active_services(&self) -> Result<Vec<CatalogService>, CollaboratorError> {
        Ok(vec![CatalogService {
            id: "PASSPORT".to_string(),
            canonical_name: "جواز سفر".to_string(),
            embedding: None,
        }])
    }
}

/// Directory that is never reachable.
struct OfflineDirectory;

fn offline() -> CollaboratorError {
    CollaboratorError::Transport("directory offline in tests".to_string())
}

#[async_trait]
impl Directory for OfflineDirectory {
    async fn upcoming_appointments(
        &self,
        _auth_token: &str,
    ) -> Result<Vec<UpcomingAppointment>, CollaboratorError> {
        Err(offline())
    }

    async fn create_appointment(
        &self,
        _service_id: &str,
        _at: DateTime<Utc>,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        Err(offline())
    }

    async fn reschedule_appointment(
        &self,
        _appointment_id: &str,
        _at: DateTime<Utc>,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        Err(offline())
    }

    async fn cancel_appointment(
        &self,
        _appointment_id: &str,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        Err(offline())
    }

    async fn service_by_id(&self, _service_id: &str) -> Result<ServiceDetails, CollaboratorError> {
        Err(offline())
    }

    async fn request_otp(
        &self,
        _national_id: &str,
        _phone_number: &str,
    ) -> Result<(), CollaboratorError> {
        Err(offline())
    }

    async fn verify_otp(&self, _phone_number: &str, _otp: &str) -> Result<String, CollaboratorError> {
        Err(offline())
    }
}

/// State whose database never answers and whose collaborators are local.
pub fn test_state() -> AppState {
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(300))
        .connect_lazy("postgres://govdesk@127.0.0.1:1/govdesk")
        .expect("lazy pool");
    let engine = DecisionEngine::builder(
        Arc::new(UnknownIntent),
        Arc::new(HashingEmbeddings::new(64)),
        Arc::new(StaticCatalog),
        Arc::new(OfflineDirectory),
    )
    .build();
    AppState {
        db,
        engine: Arc::new(engine),
    }
}

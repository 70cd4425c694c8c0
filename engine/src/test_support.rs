//! In-crate fakes of every collaborator.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use govdesk_core::directory::{
    AppointmentService, STATUS_UPCOMING, ServiceDetails, ServiceDocument, UpcomingAppointment,
};

use crate::collaborators::{
    CatalogService, ClassifiedIntent, Directory, EmbeddingProvider, IntentClassifier,
    ServiceCatalog,
};
use crate::error::CollaboratorError;

/// Returns a preset intent per exact text, `unknown` otherwise.
#[derive(Default)]
pub struct ScriptedClassifier {
    intents: HashMap<String, ClassifiedIntent>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, name: &str, confidence: f64) -> Self {
        self.intents.insert(
            text.to_string(),
            ClassifiedIntent {
                name: name.to_string(),
                confidence,
            },
        );
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn parse(&self, text: &str) -> Result<ClassifiedIntent, CollaboratorError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.failing {
            return Err(CollaboratorError::Classifier("connection refused".into()));
        }
        Ok(self
            .intents
            .get(text)
            .cloned()
            .unwrap_or_else(ClassifiedIntent::unknown))
    }
}

/// Fixed vector per exact text; anything else embeds to all zeros.
#[derive(Default)]
pub struct FixedEmbeddings {
    vectors: HashMap<String, Vec<f64>>,
    dimensions: usize,
}

impl FixedEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, vector: Vec<f64>) -> Self {
        self.dimensions = vector.len();
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbeddings {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>, CollaboratorError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimensions]))
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    services: Vec<CatalogService>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, id: &str, name: &str, embedding: Option<Vec<f64>>) -> Self {
        self.services.push(CatalogService {
            id: id.to_string(),
            canonical_name: name.to_string(),
            embedding,
        });
        self
    }
}

#[async_trait]
impl ServiceCatalog for FakeCatalog {
    async fn active_services(&self) -> Result<Vec<CatalogService>, CollaboratorError> {
        Ok(self.services.clone())
    }
}

struct OtpSeed {
    national_id: String,
    code: String,
    token: String,
}

/// Directory double that keeps appointments in memory and records every call.
#[derive(Default)]
pub struct RecordingDirectory {
    services: HashMap<String, ServiceDetails>,
    upcoming: Mutex<Vec<UpcomingAppointment>>,
    otps: Mutex<HashMap<String, OtpSeed>>,
    calls: Mutex<Vec<String>>,
    unreachable: bool,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, id: &str, name: &str, price: f64) -> Self {
        self.services.insert(
            id.to_string(),
            ServiceDetails {
                id: id.to_string(),
                canonical_name: name.to_string(),
                voice_text: None,
                price: Some(govdesk_core::directory::Price::Number(price)),
                currency: Some("شيكل".to_string()),
                documents: vec![ServiceDocument {
                    id: format!("{id}-doc"),
                    voice_text: "صورة شخصية".to_string(),
                    is_required: true,
                }],
            },
        );
        self
    }

    pub fn with_upcoming(self, id: &str, service_id: &str, name: &str, at: DateTime<Utc>) -> Self {
        self.upcoming.lock().unwrap().push(UpcomingAppointment {
            id: id.to_string(),
            service_id: service_id.to_string(),
            status: STATUS_UPCOMING.to_string(),
            appointment_date: at,
            service: AppointmentService {
                canonical_name: name.to_string(),
            },
        });
        self
    }

    /// Registers a user whose next OTP for `phone` is `code`.
    pub fn with_user(self, national_id: &str, phone: &str, code: &str, token: &str) -> Self {
        self.otps.lock().unwrap().insert(
            phone.to_string(),
            OtpSeed {
                national_id: national_id.to_string(),
                code: code.to_string(),
                token: token.to_string(),
            },
        );
        self
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().push(call);
        if self.unreachable {
            return Err(CollaboratorError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

fn rejected(status: u16, message: &str) -> CollaboratorError {
    CollaboratorError::Directory {
        status,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl Directory for RecordingDirectory {
    async fn upcoming_appointments(
        &self,
        _auth_token: &str,
    ) -> Result<Vec<UpcomingAppointment>, CollaboratorError> {
        self.record("upcoming".into())?;
        Ok(self.upcoming.lock().unwrap().clone())
    }

    async fn create_appointment(
        &self,
        service_id: &str,
        at: DateTime<Utc>,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("create {service_id} {}", at.to_rfc3339()))?;
        let mut upcoming = self.upcoming.lock().unwrap();
        if upcoming.iter().any(|a| a.service_id == service_id) {
            return Err(rejected(409, "لديك موعد قادم لهذه الخدمة بالفعل"));
        }
        let name = self
            .services
            .get(service_id)
            .map(|s| s.canonical_name.clone())
            .unwrap_or_default();
        let next_id = upcoming.len() + 1;
        upcoming.push(UpcomingAppointment {
            id: format!("appt-{next_id}"),
            service_id: service_id.to_string(),
            status: STATUS_UPCOMING.to_string(),
            appointment_date: at,
            service: AppointmentService {
                canonical_name: name,
            },
        });
        Ok(())
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        at: DateTime<Utc>,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("reschedule {appointment_id} {}", at.to_rfc3339()))?;
        let mut upcoming = self.upcoming.lock().unwrap();
        match upcoming.iter_mut().find(|a| a.id == appointment_id) {
            Some(appointment) => {
                appointment.appointment_date = at;
                Ok(())
            }
            None => Err(rejected(404, "الموعد غير موجود")),
        }
    }

    async fn cancel_appointment(
        &self,
        appointment_id: &str,
        _auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("cancel {appointment_id}"))?;
        let mut upcoming = self.upcoming.lock().unwrap();
        match upcoming.iter_mut().find(|a| a.id == appointment_id) {
            Some(appointment) => {
                appointment.status = "CANCELLED".to_string();
                Ok(())
            }
            None => Err(rejected(404, "الموعد غير موجود")),
        }
    }

    async fn service_by_id(&self, service_id: &str) -> Result<ServiceDetails, CollaboratorError> {
        self.record(format!("service {service_id}"))?;
        self.services
            .get(service_id)
            .cloned()
            .ok_or_else(|| rejected(404, "Service not found"))
    }

    async fn request_otp(
        &self,
        national_id: &str,
        phone_number: &str,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("otp {national_id} {phone_number}"))?;
        match self.otps.lock().unwrap().get(phone_number) {
            Some(seed) if seed.national_id == national_id => Ok(()),
            _ => Err(rejected(404, "المستخدم غير موجود")),
        }
    }

    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<String, CollaboratorError> {
        self.record(format!("verify {phone_number} {otp}"))?;
        let mut otps = self.otps.lock().unwrap();
        match otps.get(phone_number) {
            Some(seed) if seed.code == otp => {
                let token = seed.token.clone();
                // Codes are single use.
                otps.remove(phone_number);
                Ok(token)
            }
            _ => Err(rejected(401, "Invalid OTP")),
        }
    }
}

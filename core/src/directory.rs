//! Wire types of the Appointment & Directory Service.
//!
//! The service owns appointments, users, and the service catalog. The
//! engine only ever sees these shapes; field names follow the service's
//! camelCase JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status value the directory uses for appointments that still lie ahead.
pub const STATUS_UPCOMING: &str = "UPCOMING";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentService {
    pub canonical_name: String,
}

/// An appointment as returned by `GET /appointments/upcoming`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingAppointment {
    pub id: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub appointment_date: DateTime<Utc>,
    pub service: AppointmentService,
}

fn default_status() -> String {
    STATUS_UPCOMING.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingAppointmentsEnvelope {
    #[serde(default)]
    pub upcoming: Vec<UpcomingAppointment>,
}

/// Fee of a service. The directory emits decimals either as JSON numbers
/// or as strings, depending on the column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(value) if value.fract() == 0.0 => write!(f, "{}", *value as i64),
            Price::Number(value) => write!(f, "{value}"),
            Price::Text(text) => f.write_str(text.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDocument {
    pub id: String,
    /// Sentence read out to the user for this document
    pub voice_text: String,
    #[serde(default)]
    pub is_required: bool,
}

/// Service details as returned by `GET /services/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub voice_text: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub documents: Vec<ServiceDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEnvelope {
    pub service: ServiceDetails,
}

/// Session token issued by `POST /auth/verify-otp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpToken {
    pub token: String,
}

/// Error body the directory attaches to 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use govdesk_core::directory::{
    DirectoryErrorBody, OtpToken, ServiceDetails, ServiceEnvelope, UpcomingAppointment,
    UpcomingAppointmentsEnvelope,
};
use govdesk_engine::{CollaboratorError, Directory};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

/// REST client for the Appointment & Directory Service.
pub struct HttpDirectory {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpDirectory {
    /// `base_url` must end with `/`; paths are joined onto it.
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<RequestBuilder, CollaboratorError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| CollaboratorError::Transport(format!("bad directory url: {err}")))?;
        let builder = self.http.request(method, url);
        Ok(match auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, CollaboratorError> {
        let response = builder
            .send()
            .await
            .map_err(|err| CollaboratorError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(failure(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, CollaboratorError> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|err| CollaboratorError::Transport(format!("bad directory response: {err}")))
    }
}

/// Client errors keep the directory's own message so the user can hear it.
fn failure(status: StatusCode, body: &str) -> CollaboratorError {
    if status.is_client_error() {
        let message = serde_json::from_str::<DirectoryErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message);
        return CollaboratorError::Directory {
            status: status.as_u16(),
            message,
        };
    }
    CollaboratorError::Transport(format!("directory returned {status}: {body}"))
}

fn wire_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn upcoming_appointments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<UpcomingAppointment>, CollaboratorError> {
        let request = self.request(Method::GET, "appointments/upcoming", Some(auth_token))?;
        let envelope: UpcomingAppointmentsEnvelope = self.send_json(request).await?;
        Ok(envelope.upcoming)
    }

    async fn create_appointment(
        &self,
        service_id: &str,
        at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        let request = self
            .request(Method::POST, "appointments", Some(auth_token))?
            .json(&json!({ "serviceId": service_id, "date": wire_date(at) }));
        self.send(request).await.map(drop)
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        let request = self
            .request(
                Method::PATCH,
                &format!("appointments/{appointment_id}"),
                Some(auth_token),
            )?
            .json(&json!({ "date": wire_date(at) }));
        self.send(request).await.map(drop)
    }

    async fn cancel_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<(), CollaboratorError> {
        let request = self.request(
            Method::DELETE,
            &format!("appointments/{appointment_id}"),
            Some(auth_token),
        )?;
        self.send(request).await.map(drop)
    }

    async fn service_by_id(&self, service_id: &str) -> Result<ServiceDetails, CollaboratorError> {
        let request = self.request(Method::GET, &format!("services/{service_id}"), None)?;
        let envelope: ServiceEnvelope = self.send_json(request).await?;
        Ok(envelope.service)
    }

    async fn request_otp(
        &self,
        national_id: &str,
        phone_number: &str,
    ) -> Result<(), CollaboratorError> {
        let request = self
            .request(Method::POST, "auth/request-otp", None)?
            .json(&json!({ "nationalId": national_id, "phoneNumber": phone_number }));
        self.send(request).await.map(drop)
    }

    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<String, CollaboratorError> {
        let request = self
            .request(Method::POST, "auth/verify-otp", None)?
            .json(&json!({ "phoneNumber": phone_number, "otp": otp }));
        let issued: OtpToken = self.send_json(request).await?;
        Ok(issued.token)
    }
}

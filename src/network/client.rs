//! HTTP client wrapper - typed calls against the booking API

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::availability::day_query;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{
    ApiErrorBody, Appointment, AppointmentRequest, AvailabilitySlot, ProfileUpdate, Provider,
    Session, SignInCredentials, SignUpRequest, UserProfile,
};

/// Client for the booking REST API
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST /sessions`. Every failure is an authentication failure.
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn create_session(&self, credentials: &SignInCredentials) -> Result<Session, AppError> {
        let request = self.http.post(self.url("sessions")).json(credentials);
        send_json(request).await.map_err(|e| match e {
            AppError::Network(msg) => AppError::Authentication(msg),
            other => other,
        })
    }

    /// `POST /users`
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: &SignUpRequest) -> Result<UserProfile, AppError> {
        send_json(self.http.post(self.url("users")).json(request)).await
    }

    /// `PUT /profile`
    #[tracing::instrument(skip_all)]
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        let request = self.http.put(self.url("profile")).bearer_auth(token).json(update);
        send_json(request).await
    }

    /// `PATCH /users/avatar` with the image as the `avatar` multipart field
    #[tracing::instrument(skip(self, token, image), fields(bytes = image.len()))]
    pub async fn update_avatar(
        &self,
        token: &str,
        user_id: &str,
        image: Vec<u8>,
    ) -> Result<UserProfile, AppError> {
        let part = Part::bytes(image)
            .file_name(format!("{}.jpg", user_id))
            .mime_str("image/jpeg")
            .map_err(|e| AppError::Network(format!("Invalid upload: {}", e)))?;
        let form = Form::new().part("avatar", part);
        let request = self
            .http
            .patch(self.url("users/avatar"))
            .bearer_auth(token)
            .multipart(form);
        send_json(request).await
    }

    /// `GET /providers`
    #[tracing::instrument(skip_all)]
    pub async fn list_providers(&self, token: &str) -> Result<Vec<Provider>, AppError> {
        send_json(self.http.get(self.url("providers")).bearer_auth(token)).await
    }

    /// `GET /providers/:id/day-availability?year&month&day`
    #[tracing::instrument(skip(self, token))]
    pub async fn day_availability(
        &self,
        token: &str,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        let request = self
            .http
            .get(self.url(&format!("providers/{}/day-availability", provider_id)))
            .bearer_auth(token)
            .query(&day_query(date));
        send_json(request).await
    }

    /// `POST /appointments`
    #[tracing::instrument(skip(self, token, request), fields(provider_id = %request.provider_id))]
    pub async fn create_appointment(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let builder = self.http.post(self.url("appointments")).bearer_auth(token).json(request);
        send_json(builder).await
    }
}

/// Send a request and decode a JSON success body
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AppError> {
    let start = std::time::Instant::now();
    let response = request.send().await.map_err(describe_send_error)?;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !status.is_success() {
        let message = error_message(response).await;
        tracing::warn!(status = status.as_u16(), elapsed_ms, error = %message, "Request rejected");
        return Err(AppError::Network(message));
    }

    tracing::info!(status = status.as_u16(), elapsed_ms, "Request completed");
    response.json::<T>().await.map_err(|e| {
        tracing::error!(error = %e, "Response parse error");
        AppError::Network(format!("Failed to parse response: {}", e))
    })
}

fn describe_send_error(e: reqwest::Error) -> AppError {
    let msg = if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    };
    tracing::error!(error = %e, "Request failed");
    AppError::Network(msg)
}

/// The backend's `message` when the body carries one, the status otherwise
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Server responded with {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("{}/", server.uri()),
            timeout_secs: 5,
        })
    }

    fn user_json() -> serde_json::Value {
        json!({ "id": "u1", "name": "Ana", "email": "ana@example.com", "avatar_url": null })
    }

    #[tokio::test]
    async fn test_create_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "123456" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": "t0k", "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = client_for(&server)
            .create_session(&SignInCredentials {
                email: "ana@example.com".into(),
                password: "123456".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.token, "t0k");
        assert_eq!(session.user.name, "Ana");
    }

    #[tokio::test]
    async fn test_rejected_session_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "status": "error", "message": "Incorrect email/password combination." })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_session(&SignInCredentials {
                email: "ana@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        match err {
            AppError::Authentication(msg) => assert_eq!(msg, "Incorrect email/password combination."),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let err = client.list_providers("t0k").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_list_providers_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "p1", "name": "Bruno", "avatar_url": "http://img/p1.jpg" },
                { "id": "p2", "name": "Carla" }
            ])))
            .mount(&server)
            .await;

        let providers = client_for(&server).list_providers("t0k").await.unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[1].avatar_url, None);
    }

    #[tokio::test]
    async fn test_day_availability_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers/p1/day-availability"))
            .and(query_param("year", "2020"))
            .and(query_param("month", "6"))
            .and(query_param("day", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "hour": 9, "available": true },
                { "hour": 14, "available": false }
            ])))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        let slots = client_for(&server).day_availability("t0k", "p1", date).await.unwrap();
        assert_eq!(slots, vec![
            AvailabilitySlot { hour: 9, available: true },
            AvailabilitySlot { hour: 14, available: false },
        ]);
    }

    #[tokio::test]
    async fn test_day_availability_tolerates_out_of_range_hour() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers/p1/day-availability"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "hour": -1, "available": true },
                { "hour": 9, "available": true }
            ])))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        let slots = client_for(&server).day_availability("t0k", "p1", date).await.unwrap();
        let day = crate::availability::DayAvailability::partition(&slots);
        assert_eq!(day.available_hours(), vec![9]);
    }

    #[tokio::test]
    async fn test_update_profile_without_password() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/profile"))
            .and(body_json(json!({ "name": "Ana B", "email": "ana@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "name": "Ana B", "email": "ana@example.com", "avatar_url": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = ProfileUpdate {
            name: "Ana B".into(),
            email: "ana@example.com".into(),
            old_password: None,
            password: None,
            password_confirmation: None,
        };
        let user = client_for(&server).update_profile("t0k", &update).await.unwrap();
        assert_eq!(user.name, "Ana B");
    }

    #[tokio::test]
    async fn test_update_avatar_is_multipart_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/avatar"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "name": "Ana", "email": "ana@example.com",
                "avatar_url": "http://img/u1.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server)
            .update_avatar("t0k", "u1", vec![0xff, 0xd8, 0xff])
            .await
            .unwrap();
        assert_eq!(user.avatar_url.as_deref(), Some("http://img/u1.jpg"));

        let received = server.received_requests().await.unwrap();
        let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"avatar\""));
        assert!(body.contains("filename=\"u1.jpg\""));
        assert!(body.contains("image/jpeg"));
    }

    #[tokio::test]
    async fn test_error_without_message_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/appointments"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        let request = AppointmentRequest {
            provider_id: "p1".into(),
            date: crate::availability::appointment_datetime(date, 9).unwrap(),
        };
        let err = client_for(&server).create_appointment("t0k", &request).await.unwrap_err();
        match err {
            AppError::Network(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

//! Network actor - runs API calls in the Tokio runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::AppError;
use crate::messages::{ApiRequest, NetworkCommand, NetworkResponse};
use crate::network::client::ApiClient;

/// Network actor that runs API calls in the background
pub struct NetworkActor {
    api: ApiClient,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(api: ApiClient, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            api,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Execute { id, request }) => {
                            let response_tx = self.response_tx.clone();
                            let api = self.api.clone();

                            self.active_requests.spawn(async move {
                                let name = request.name();
                                tracing::info!(id, request = name, "Executing request");
                                let response = execute(&api, id, request).await;
                                match &response {
                                    NetworkResponse::Failed { error, .. } => {
                                        tracing::warn!(id, request = name, error = %error, "Request failed");
                                    }
                                    _ => tracing::info!(id, request = name, "Request completed"),
                                }
                                let _ = response_tx.send(response);
                            });
                        }

                        Some(NetworkCommand::Shutdown) => {
                            self.active_requests.abort_all();
                            break;
                        }

                        None => break,
                    }
                }

                // Reap finished tasks
                Some(result) = self.active_requests.join_next() => {
                    if let Err(e) = result {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Request task panicked");
                        }
                    }
                }
            }
        }
    }
}

/// Run one API call and wrap its outcome in a response
pub async fn execute(api: &ApiClient, id: u64, request: ApiRequest) -> NetworkResponse {
    let result = match request {
        ApiRequest::SignUp(request) => api
            .create_user(&request)
            .await
            .map(|user| NetworkResponse::SignedUp { id, user }),
        ApiRequest::ListProviders { token } => api
            .list_providers(&token)
            .await
            .map(|providers| NetworkResponse::Providers { id, providers }),
        ApiRequest::DayAvailability {
            token,
            provider_id,
            date,
        } => api
            .day_availability(&token, &provider_id, date)
            .await
            .map(|slots| NetworkResponse::DayAvailability {
                id,
                provider_id,
                date,
                slots,
            }),
        ApiRequest::CreateAppointment { token, request } => api
            .create_appointment(&token, &request)
            .await
            .map(|appointment| NetworkResponse::AppointmentCreated { id, appointment }),
        ApiRequest::UpdateProfile { token, update } => api
            .update_profile(&token, &update)
            .await
            .map(|user| NetworkResponse::ProfileUpdated { id, user }),
        ApiRequest::UpdateAvatar {
            token,
            user_id,
            path,
        } => match tokio::fs::read(&path).await {
            Ok(image) => api
                .update_avatar(&token, &user_id, image)
                .await
                .map(|user| NetworkResponse::AvatarUpdated { id, user }),
            Err(e) => Err(AppError::Storage(format!(
                "Could not read {}: {}",
                path.display(),
                e
            ))),
        },
    };

    result.unwrap_or_else(|error| NetworkResponse::Failed { id, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_execute_list_providers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "p1", "name": "Bruno", "avatar_url": null }
            ])))
            .mount(&server)
            .await;

        let response = execute(&client_for(&server), 7, ApiRequest::ListProviders { token: "t0k".into() }).await;
        match response {
            NetworkResponse::Providers { id, providers } => {
                assert_eq!(id, 7);
                assert_eq!(providers[0].name, "Bruno");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_avatar_file_fails_without_request() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        let request = ApiRequest::UpdateAvatar {
            token: "t0k".into(),
            user_id: "u1".into(),
            path: dir.path().join("missing.jpg"),
        };
        let response = execute(&client_for(&server), 3, request).await;
        assert!(matches!(
            response,
            NetworkResponse::Failed { id: 3, error: AppError::Storage(_) }
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_actor_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
            .mount(&server)
            .await;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let actor = tokio::spawn(NetworkActor::new(client_for(&server), resp_tx).run(cmd_rx));

        cmd_tx
            .send(NetworkCommand::Execute {
                id: 1,
                request: ApiRequest::ListProviders { token: "t0k".into() },
            })
            .unwrap();
        let response = resp_rx.recv().await.unwrap();
        match response {
            NetworkResponse::Failed { id, error } => {
                assert_eq!(id, 1);
                assert_eq!(error.detail(), "boom");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
        actor.await.unwrap();
    }
}

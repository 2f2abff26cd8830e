//! App actor - message loop processing UI events, network responses and
//! session changes

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::ui_events::Screen;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use crate::network::client::ApiClient;
use crate::session::SessionStore;

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    api: ApiClient,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        session: SessionStore,
        api: ApiClient,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(session),
            api,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Routing follows the session; the first change is the restore below
        let mut session_rx = self.state.session.subscribe();
        self.state.session.restore();

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    // Input that arrives while sign-in is in flight is queued here
                    let mut queue = VecDeque::from([event]);
                    let mut quit = false;
                    while let Some(event) = queue.pop_front() {
                        if self.handle_ui_event(event, &mut ui_rx, &mut queue).await {
                            quit = true;
                            break;
                        }
                    }
                    if quit {
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    self.render();
                }
                Some(response) = net_rx.recv() => {
                    let commands = self.state.handle_response(response);
                    self.dispatch(commands);
                    self.render();
                }
                Ok(()) = session_rx.changed() => {
                    let commands = self.state.on_session_changed();
                    self.dispatch(commands);
                    self.render();
                }
                else => break,
            }
        }
    }

    fn render(&self) {
        let _ = self.render_tx.send(self.state.to_render_state());
    }

    fn dispatch(&self, commands: Vec<NetworkCommand>) {
        for cmd in commands {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    async fn handle_ui_event(
        &mut self,
        event: UiEvent,
        ui_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
        queue: &mut VecDeque<UiEvent>,
    ) -> bool {
        match event {
            // Forms
            UiEvent::FieldChar(c) => self.state.field_char(c),
            UiEvent::FieldBackspace => self.state.field_backspace(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::Submit if self.state.screen == Screen::SignIn => {
                return self.sign_in(ui_rx, queue).await;
            }
            UiEvent::Submit => {
                let commands = self.state.submit();
                self.dispatch(commands);
            }

            // Navigation
            UiEvent::Back => {
                let commands = self.state.back();
                self.dispatch(commands);
            }
            UiEvent::OpenSignUp => {
                let commands = self.state.go_to(Screen::SignUp);
                self.dispatch(commands);
            }
            UiEvent::OpenProfile => {
                let commands = self.state.go_to(Screen::Profile);
                self.dispatch(commands);
            }
            UiEvent::SignOut => self.state.sign_out(),

            // Providers
            UiEvent::NextProvider => {
                let commands = self.state.next_provider();
                self.dispatch(commands);
            }
            UiEvent::PrevProvider => {
                let commands = self.state.prev_provider();
                self.dispatch(commands);
            }
            UiEvent::SelectProvider => {
                let commands = self.state.select_provider();
                self.dispatch(commands);
            }
            UiEvent::RefreshProviders => {
                let commands = self.state.refresh_providers();
                self.dispatch(commands);
            }

            // Booking
            UiEvent::NextDay => {
                let commands = self.state.next_day();
                self.dispatch(commands);
            }
            UiEvent::PrevDay => {
                let commands = self.state.prev_day();
                self.dispatch(commands);
            }
            UiEvent::NextHour => self.state.next_hour(),
            UiEvent::PrevHour => self.state.prev_hour(),

            // Avatar
            UiEvent::OpenAvatarInput => self.state.open_avatar_input(),
            UiEvent::AvatarPathChar(c) => self.state.avatar_path_char(c),
            UiEvent::AvatarPathBackspace => self.state.avatar_path_backspace(),
            UiEvent::UploadAvatar => {
                if let Some(cmd) = self.state.upload_avatar() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::CancelAvatarInput => self.state.cancel_avatar_input(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),
            UiEvent::DismissAlert => self.state.dismiss_alert(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }

    /// The session store is only ever written from this loop, so sign-in
    /// is awaited here rather than handed to the network actor. Quit drops
    /// the request; other input is queued. Returns true on quit.
    async fn sign_in(
        &mut self,
        ui_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
        queue: &mut VecDeque<UiEvent>,
    ) -> bool {
        let Some(credentials) = self.state.prepare_sign_in() else {
            return false;
        };
        self.render();

        let result = {
            let sign_in = self.state.session.sign_in(&self.api, &credentials);
            tokio::pin!(sign_in);
            loop {
                tokio::select! {
                    result = &mut sign_in => break result,
                    Some(event) = ui_rx.recv() => {
                        if event == UiEvent::Quit {
                            tracing::info!("Quit while signing in, dropping the request");
                            return true;
                        }
                        queue.push_back(event);
                    }
                }
            }
        };
        self.state.finish_sign_in(result);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::messages::ApiRequest;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        ui_tx: mpsc::UnboundedSender<UiEvent>,
        _net_resp_tx: mpsc::UnboundedSender<NetworkResponse>,
        net_cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>,
        render_rx: mpsc::UnboundedReceiver<RenderState>,
        handle: tokio::task::JoinHandle<()>,
    }

    fn spawn_actor(server: &MockServer) -> Harness {
        let api = ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        });
        let session = SessionStore::new(Box::new(MemoryStore::new()));
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel();
        let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(session, api, net_cmd_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, net_resp_rx));
        Harness {
            ui_tx,
            _net_resp_tx: net_resp_tx,
            net_cmd_rx,
            render_rx,
            handle,
        }
    }

    async fn wait_for(
        render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
        f: impl Fn(&RenderState) -> bool,
    ) -> RenderState {
        loop {
            let state = render_rx.recv().await.expect("actor stopped rendering");
            if f(&state) {
                return state;
            }
        }
    }

    fn type_text(ui_tx: &mpsc::UnboundedSender<UiEvent>, text: &str) {
        for c in text.chars() {
            ui_tx.send(UiEvent::FieldChar(c)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_sign_in_routes_to_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t0k",
                "user": { "id": "u1", "name": "Ana", "email": "ana@example.com", "avatar_url": null }
            })))
            .mount(&server)
            .await;

        let mut h = spawn_actor(&server);
        wait_for(&mut h.render_rx, |s| !s.session_loading && s.screen == Screen::SignIn).await;

        type_text(&h.ui_tx, "ana@example.com");
        h.ui_tx.send(UiEvent::NextField).unwrap();
        type_text(&h.ui_tx, "123456");
        h.ui_tx.send(UiEvent::Submit).unwrap();

        let state = wait_for(&mut h.render_rx, |s| s.screen == Screen::Dashboard).await;
        assert_eq!(state.user.unwrap().name, "Ana");

        let cmd = h.net_cmd_rx.recv().await.unwrap();
        assert!(matches!(
            cmd,
            NetworkCommand::Execute { request: ApiRequest::ListProviders { ref token }, .. } if token == "t0k"
        ));

        h.ui_tx.send(UiEvent::Quit).unwrap();
        h.handle.await.unwrap();
        assert!(matches!(h.net_cmd_rx.recv().await, Some(NetworkCommand::Shutdown)));
    }

    #[tokio::test]
    async fn test_quit_during_slow_sign_in_stops_promptly() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(30)))
            .mount(&server)
            .await;

        let mut h = spawn_actor(&server);
        type_text(&h.ui_tx, "ana@example.com");
        h.ui_tx.send(UiEvent::NextField).unwrap();
        type_text(&h.ui_tx, "123456");
        h.ui_tx.send(UiEvent::Submit).unwrap();
        wait_for(&mut h.render_rx, |s| s.busy).await;

        h.ui_tx.send(UiEvent::Quit).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(2), h.handle)
            .await
            .expect("actor kept waiting on sign-in")
            .unwrap();
        assert!(matches!(h.net_cmd_rx.recv().await, Some(NetworkCommand::Shutdown)));
    }

    #[tokio::test]
    async fn test_rejected_sign_in_shows_alert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "message": "Incorrect email/password combination." })),
            )
            .mount(&server)
            .await;

        let mut h = spawn_actor(&server);
        type_text(&h.ui_tx, "ana@example.com");
        h.ui_tx.send(UiEvent::NextField).unwrap();
        type_text(&h.ui_tx, "wrong1");
        h.ui_tx.send(UiEvent::Submit).unwrap();

        let state = wait_for(&mut h.render_rx, |s| s.alert.is_some()).await;
        let alert = state.alert.unwrap();
        assert_eq!(alert.title, "Authentication error");
        assert!(alert.message.contains("Incorrect email/password combination."));
        assert_eq!(state.screen, Screen::SignIn);
        assert!(!state.busy);

        h.ui_tx.send(UiEvent::Quit).unwrap();
        h.handle.await.unwrap();
    }
}

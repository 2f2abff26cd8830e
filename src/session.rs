//! Session store - the one place that knows who is signed in
//!
//! The store owns the key-value storage and the current [`SessionState`].
//! Every transition is published on a watch channel so views can follow it.
//!
//! Sign-in and sign-out write storage first and only then change the
//! in-memory state; a failed write leaves the state where it was. A profile
//! update goes the other way round: memory first, then the user entry.

use tokio::sync::watch;

use crate::constants::{TOKEN_KEY, USER_KEY};
use crate::error::AppError;
use crate::models::{Session, SignInCredentials, UserProfile};
use crate::network::client::ApiClient;
use crate::storage::KeyValueStore;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Loading,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

pub struct SessionStore {
    storage: Box<dyn KeyValueStore>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// The store is `Loading` until [`SessionStore::restore`] has run
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Loading);
        SessionStore { storage, state_tx }
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state_tx.borrow().session().cloned()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state_tx.borrow().session().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state_tx.borrow().session().map(|s| s.token.clone())
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state_tx.borrow(), SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().session().is_some()
    }

    /// Load a persisted session. Missing or unreadable entries leave the user
    /// signed out.
    pub fn restore(&mut self) {
        self.state_tx.send_replace(SessionState::Loading);

        let restored = match self.storage.multi_get(&[TOKEN_KEY, USER_KEY]) {
            Ok(values) => match (values.first().cloned().flatten(), values.get(1).cloned().flatten()) {
                (Some(token), Some(user)) if !token.is_empty() => {
                    match serde_json::from_str::<UserProfile>(&user) {
                        Ok(user) => Some(Session { token, user }),
                        Err(e) => {
                            tracing::warn!(error = %e, "Stored user record is unreadable");
                            None
                        }
                    }
                }
                _ => None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored session");
                None
            }
        };

        let next = match restored {
            Some(session) => {
                tracing::info!(user_id = %session.user.id, "Session restored");
                SessionState::Authenticated(session)
            }
            None => {
                tracing::info!("No stored session");
                SessionState::Unauthenticated
            }
        };
        self.state_tx.send_replace(next);
    }

    /// Exchange credentials for a session and persist it
    pub async fn sign_in(
        &mut self,
        api: &ApiClient,
        credentials: &SignInCredentials,
    ) -> Result<(), AppError> {
        let session = api.create_session(credentials).await?;
        self.persist_session(&session)?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.state_tx.send_replace(SessionState::Authenticated(session));
        Ok(())
    }

    /// Forget the session. Safe to call when already signed out.
    pub fn sign_out(&mut self) -> Result<(), AppError> {
        self.storage
            .multi_remove(&[TOKEN_KEY, USER_KEY])
            .map_err(|e| AppError::Storage(format!("{:#}", e)))?;
        let previous = self.state_tx.send_replace(SessionState::Unauthenticated);
        if previous.session().is_some() {
            tracing::info!("Signed out");
        }
        Ok(())
    }

    /// Replace the user of the active session, keeping its token
    pub fn update_user(&mut self, user: UserProfile) -> Result<(), AppError> {
        let mut session = self
            .session()
            .ok_or_else(|| AppError::Authentication("Not signed in".to_string()))?;
        session.user = user;
        let serialized = serde_json::to_string(&session.user)
            .map_err(|e| AppError::Storage(format!("Failed to serialize user: {}", e)))?;

        tracing::info!(user_id = %session.user.id, "User updated");
        self.state_tx.send_replace(SessionState::Authenticated(session));

        self.storage
            .multi_set(&[(USER_KEY, serialized.as_str())])
            .map_err(|e| AppError::Storage(format!("{:#}", e)))
    }

    fn persist_session(&mut self, session: &Session) -> Result<(), AppError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| AppError::Storage(format!("Failed to serialize user: {}", e)))?;
        self.storage
            .multi_set(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user.as_str())])
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to persist session");
                AppError::Storage(format!("{:#}", e))
            })
    }
}

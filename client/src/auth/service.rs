//! Core session logic: login validation, id issuance and the logout gate.
//!
//! The controller only tracks identity. Starting and stopping the tracker,
//! the sync channel and the map is orchestrated by [`crate::app::App`].

use std::collections::HashSet;

use adapters::{Confirm, UserId};

use super::errors::ValidationError;
use super::models::{DisplayName, Session};
use crate::storage::{PersistedSession, SessionStore};
use crate::utils::generate_user_id;

pub const LOGOUT_PROMPT: &str = "Are you sure you want to disconnect?";

pub struct SessionController {
    storage: SessionStore,
    confirm: Box<dyn Confirm>,
    current: Option<Session>,
    issued: HashSet<UserId>,
}

impl SessionController {
    pub fn new(storage: SessionStore, confirm: Box<dyn Confirm>) -> Self {
        Self {
            storage,
            confirm,
            current: None,
            issued: HashSet::new(),
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Starts a new session under `raw_name`.
    ///
    /// On rejection nothing is stored and the current state is untouched.
    pub fn login(&mut self, raw_name: &str) -> Result<Session, ValidationError> {
        let user_name = DisplayName::parse(raw_name)?;

        let mut user_id = generate_user_id();
        while self.issued.contains(&user_id) {
            user_id = generate_user_id();
        }
        self.issued.insert(user_id.clone());

        let session = Session { user_id, user_name };
        self.storage.save_session(&PersistedSession {
            user_id: session.user_id.clone(),
            user_name: session.user_name.as_str().to_owned(),
        });
        tracing::info!(user_id = %session.user_id, user_name = %session.user_name, "session started");

        self.current = Some(session.clone());
        Ok(session)
    }

    /// Asks the user to confirm a logout. Always `false` without a session.
    pub fn confirm_logout(&mut self) -> bool {
        if self.current.is_none() {
            tracing::debug!("logout requested without an active session");
            return false;
        }
        let confirmed = self.confirm.confirm(LOGOUT_PROMPT);
        if !confirmed {
            tracing::debug!("logout cancelled by user");
        }
        confirmed
    }

    /// Ends the session and clears every persisted key.
    pub fn end(&mut self) -> Option<Session> {
        let session = self.current.take()?;
        self.storage.clear_all();
        tracing::info!(user_id = %session.user_id, "session ended");
        Some(session)
    }
}

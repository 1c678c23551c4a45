//! View-model of the user interface.
//!
//! Holds what the screen shows: which view is active, the name field, the
//! current user's name, a transient notice, the offline banner and the
//! roster panel. A front end renders this state; nothing here draws.

pub mod roster;

use std::time::{Duration, Instant};

pub use roster::{MemberTag, RosterPanel};

pub const OFFLINE_BANNER: &str = "No connection - offline mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Map,
}

/// A message that hides itself after a fixed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }
}

#[derive(Debug)]
pub struct UiState {
    screen: Screen,
    name_field: String,
    current_user_name: Option<String>,
    notice: Option<Notice>,
    offline: bool,
    notice_ttl: Duration,
    pub roster: RosterPanel,
}

impl UiState {
    pub fn new(notice_ttl: Duration) -> Self {
        Self {
            screen: Screen::Login,
            name_field: String::new(),
            current_user_name: None,
            notice: None,
            offline: false,
            notice_ttl,
            roster: RosterPanel::default(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn name_field(&self) -> &str {
        &self.name_field
    }

    pub fn set_name_field(&mut self, value: &str) {
        value.clone_into(&mut self.name_field);
    }

    pub fn current_user_name(&self) -> Option<&str> {
        self.current_user_name.as_deref()
    }

    /// Switches to the map view for `user_name`.
    pub fn enter_map(&mut self, user_name: &str) {
        self.current_user_name = Some(user_name.to_owned());
        self.screen = Screen::Map;
    }

    /// Back to an empty login form.
    pub fn reset_to_login(&mut self) {
        self.screen = Screen::Login;
        self.name_field.clear();
        self.current_user_name = None;
        self.roster.clear();
    }

    pub fn show_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            shown_at: Instant::now(),
            ttl: self.notice_ttl,
        });
    }

    /// The notice still visible at `now`, if any.
    pub fn notice_at(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.is_visible_at(now))
            .map(|notice| notice.message.as_str())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice_at(Instant::now())
    }

    pub fn set_offline_banner(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn banner(&self) -> Option<&'static str> {
        self.offline.then_some(OFFLINE_BANNER)
    }
}

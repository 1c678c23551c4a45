//! NetHelp live location board.
//!
//! Participants join under a display name; each device's position is shared
//! through a realtime store and every participant appears as a marker on a
//! common map. The collaborators (store, storage, sensor, map canvas, dialog)
//! come from the `adapters` crate; this crate wires them into an [`app::App`].

pub mod app;
pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod services;
pub mod storage;
pub mod ui;
pub mod utils;

pub use app::{Adapters, App, Flow, Incoming, UiEvent};
pub use config::AppConfig;
pub use errors::AppError;

//! Session management: who the local participant is.
//!
//! This module owns login validation, the generated participant id, the
//! locally persisted session, and the confirmation gate in front of logout.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::*;
pub use models::*;
pub use service::*;

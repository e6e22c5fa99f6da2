//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use triathlon_core::{ports::DatabaseService, ProgramGenerator};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub generator: Arc<ProgramGenerator>,
}

//! HTTP API for finbot

mod catalog;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::resolver::TurnResolver;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TurnResolver>,
}

impl AppState {
    pub fn new(resolver: TurnResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

pub mod client;
mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use client::{IcaNotesClient, NotesClient};
pub use services::FormsGateway;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::forms_routes())
}

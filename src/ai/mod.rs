use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod dto;
pub mod handlers;
pub mod parse;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::ai_routes())
}

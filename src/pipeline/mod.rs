pub mod dto;
mod extract;
pub mod handlers;
mod prompts;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(upload_limit: usize) -> Router<AppState> {
    handlers::pipeline_routes(upload_limit)
}

use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod scope;
pub mod seed;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

//! Registration, login and user lookup: request DTOs, the credential store,
//! password hashing, token issuing and the service tying them together.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod token;

pub use services::AuthService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_routes())
}

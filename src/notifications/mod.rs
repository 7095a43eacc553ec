mod handlers;
pub mod push;
pub mod service;

use crate::state::AppState;
use axum::Router;

pub use push::{FcmPush, PushClient};

pub fn router() -> Router<AppState> {
    handlers::router()
}

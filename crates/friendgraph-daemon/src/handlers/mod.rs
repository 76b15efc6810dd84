use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fastrace::prelude::*;
use friendgraph_store::{StoreError, UserGraphStore};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

mod friends;
mod session;
mod users;

pub use friends::{handle_list_friends, handle_make_friends};
pub use session::handle_stats;
pub use users::{handle_create_user, handle_delete_user, handle_get_user, handle_update_age};

#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<UserGraphStore>,
}

impl HandlerContext {
    pub fn new(store: Arc<UserGraphStore>) -> Self {
        Self { store }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Request timed out")]
    Timeout,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Store(StoreError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound(id)) => {
                debug!("Unknown user id {}", id);
                StatusCode::NOT_FOUND
            }
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        };
        (status, self.to_string()).into_response()
    }
}

/// Bodies are decoded regardless of Content-Type.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Runs a store call under a fresh root span so its `#[trace]` children are collected.
pub(crate) fn in_root_span<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let root = Span::root(name, SpanContext::random());
    let _guard = root.set_local_parent();
    f()
}

use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use threadwerk_common::model::{
    Id,
    comment::CommentMarker,
    post::PostMarker,
    user::UserMarker,
};
use threadwerk_store::{
    ErrorKind, StoreError,
    clock::SystemClock,
    comments::CommentStore,
    id::SnowflakeIdAllocator,
    object::{FsObjectStore, GzipObjectStore},
    post::StaticPostStore,
};
use tracing::error;

mod auth;
mod json;
mod routes;

pub type Comments = CommentStore<
    GzipObjectStore<FsObjectStore>,
    StaticPostStore,
    SnowflakeIdAllocator,
    SystemClock,
>;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub comments: Arc<Comments>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("User header was missing or invalid: {0}")]
    InvalidUserHeader(TypedHeaderRejection),
    #[error("User {user} is not the author of comment {comment} on post {post}")]
    NotCommentAuthor {
        user: Id<UserMarker>,
        post: Id<PostMarker>,
        comment: Id<CommentMarker>,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidUserHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::JsonRejection(_) | ServerError::InvalidUserHeader(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotCommentAuthor { .. } => StatusCode::FORBIDDEN,
            ServerError::JsonResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Store(err) => match err.kind() {
                ErrorKind::PostNotFound | ErrorKind::CommentNotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
        };
        (status, Json(error_response)).into_response()
    }
}

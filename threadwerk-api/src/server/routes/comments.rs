use crate::server::{Comments, Result, ServerError, ServerRouter, auth::ActingUser, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Deserializer};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};
use threadwerk_common::model::{
    Id,
    comment::{Comment, CommentBody, CommentMarker, CreateComment},
    post::PostMarker,
};

const TOP_LEVEL: &str = "toplevel";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_comment)
        .typed_delete(delete_comment)
        .typed_get(get_replies)
        .typed_post(create_reply)
}

/// A parent in a path: either a comment id or `toplevel`.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
enum ParentRef {
    TopLevel,
    Comment(Id<CommentMarker>),
}

impl ParentRef {
    fn as_comment(&self) -> Option<&Id<CommentMarker>> {
        match self {
            ParentRef::TopLevel => None,
            ParentRef::Comment(id) => Some(id),
        }
    }

    fn into_comment(self) -> Option<Id<CommentMarker>> {
        match self {
            ParentRef::TopLevel => None,
            ParentRef::Comment(id) => Some(id),
        }
    }
}

impl Display for ParentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentRef::TopLevel => f.write_str(TOP_LEVEL),
            ParentRef::Comment(id) => Display::fmt(id, f),
        }
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Ok(if inner == TOP_LEVEL {
            ParentRef::TopLevel
        } else {
            ParentRef::Comment(Id::new(inner))
        })
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post}/comments/{comment}", rejection(ServerError))]
struct CommentPath {
    post: Id<PostMarker>,
    comment: Id<CommentMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post}/comments/{parent}/replies", rejection(ServerError))]
struct RepliesPath {
    post: Id<PostMarker>,
    parent: ParentRef,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct ReplyContent {
    body: CommentBody,
}

async fn get_comment(
    CommentPath { post, comment }: CommentPath,
    State(comments): State<Arc<Comments>>,
) -> Result<Json<Comment>> {
    let comment = comments.fetch(&post, &comment).await?;

    Ok(Json(comment))
}

async fn get_replies(
    RepliesPath { post, parent }: RepliesPath,
    State(comments): State<Arc<Comments>>,
) -> Result<Json<Vec<Comment>>> {
    let parent = parent.as_comment();
    if let Some(parent) = parent {
        comments.fetch(&post, parent).await?;
    }

    let replies = comments.list_replies(&post, parent).await?;

    Ok(Json(replies))
}

async fn create_reply(
    RepliesPath { post, parent }: RepliesPath,
    State(comments): State<Arc<Comments>>,
    user: ActingUser,
    Json(ReplyContent { body }): Json<ReplyContent>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = comments
        .create(CreateComment {
            post,
            parent: parent.into_comment(),
            author: user.into_user_id(),
            body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    CommentPath { post, comment }: CommentPath,
    State(comments): State<Arc<Comments>>,
    user: ActingUser,
) -> Result<StatusCode> {
    let existing = comments.fetch(&post, &comment).await?;
    if existing.author != *user.user_id() {
        return Err(ServerError::NotCommentAuthor {
            user: user.into_user_id(),
            post,
            comment,
        });
    }

    comments.delete(&post, &comment).await?;

    Ok(StatusCode::NO_CONTENT)
}

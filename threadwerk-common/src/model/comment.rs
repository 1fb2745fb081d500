use crate::model::{Id, post::PostMarker, user::UserMarker};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::OffsetDateTime;

pub const COMMENT_BODY_MIN_LEN: usize = 8;
pub const COMMENT_BODY_MAX_LEN: usize = 2056;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// A stored comment.
///
/// `parent` is `None` for top-level comments. A parent that has since been
/// deleted still shows up here; comments are never re-parented.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post: Id<PostMarker>,
    pub parent: Option<Id<CommentMarker>>,
    pub author: Id<UserMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    pub body: String,
}

/// Input for creating a comment. The identifier and timestamps are assigned by
/// the store.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreateComment {
    pub post: Id<PostMarker>,
    pub parent: Option<Id<CommentMarker>>,
    pub author: Id<UserMarker>,
    pub body: CommentBody,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentBody(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidCommentBodyError {
    #[error("The comment body is shorter than {COMMENT_BODY_MIN_LEN} characters")]
    TooShort(String),
    #[error("The comment body is longer than {COMMENT_BODY_MAX_LEN} characters")]
    TooLong(String),
}

impl InvalidCommentBodyError {
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::TooShort(body) | Self::TooLong(body) => body,
        }
    }
}

impl CommentBody {
    pub fn new(body: String) -> Result<Self, InvalidCommentBodyError> {
        let len = body.chars().count();
        if len < COMMENT_BODY_MIN_LEN {
            Err(InvalidCommentBodyError::TooShort(body))
        } else if len > COMMENT_BODY_MAX_LEN {
            Err(InvalidCommentBodyError::TooLong(body))
        } else {
            Ok(CommentBody(body))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for CommentBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CommentBody::new(inner).map_err(|err| {
            Error::invalid_value(
                Unexpected::Str(err.body()),
                &"a comment body of 8 to 2056 characters",
            )
        })
    }
}

impl TryFrom<String> for CommentBody {
    type Error = InvalidCommentBodyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::comment::{
        COMMENT_BODY_MAX_LEN, Comment, CommentBody, CreateComment, InvalidCommentBodyError,
    };
    use time::macros::datetime;

    #[test]
    fn comment_body_bounds() {
        assert!(CommentBody::new("x".repeat(COMMENT_BODY_MAX_LEN)).is_ok());
        assert!(CommentBody::new("hello, world".to_owned()).is_ok());

        assert_eq!(
            CommentBody::new("short".to_owned()),
            Err(InvalidCommentBodyError::TooShort("short".to_owned()))
        );
        assert!(matches!(
            CommentBody::new("x".repeat(COMMENT_BODY_MAX_LEN + 1)),
            Err(InvalidCommentBodyError::TooLong(_))
        ));

        // Counted in characters, not bytes.
        assert!(CommentBody::new("ööööööö".to_owned()).is_err());
        assert!(CommentBody::new("öööööööö".to_owned()).is_ok());
    }

    #[test]
    fn create_comment_rejects_short_body() {
        let json = r#"{"post": "p", "parent": null, "author": "adam", "body": "hi"}"#;
        assert!(serde_json::from_str::<CreateComment>(json).is_err());

        let json = r#"{"post": "p", "parent": "1", "author": "adam", "body": "hello, world"}"#;
        let create: CreateComment = serde_json::from_str(json).unwrap();
        assert_eq!(create.parent.unwrap().as_str(), "1");
        assert_eq!(create.body.get(), "hello, world");
    }

    #[test]
    fn comment_timestamps_are_rfc3339() {
        let comment = Comment {
            id: "1".into(),
            post: "p".into(),
            parent: None,
            author: "adam".into(),
            created: datetime!(2025-10-24 10:30:00.5 UTC),
            modified: datetime!(2025-10-24 10:30:00.5 UTC),
            body: "hello, world".to_owned(),
        };

        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["created"], "2025-10-24T10:30:00.5Z");
        assert_eq!(json["parent"], serde_json::Value::Null);

        let back: Comment = serde_json::from_value(json).unwrap();
        assert_eq!(back, comment);
    }
}

//! Stored form of a comment.
//!
//! Records are JSON objects with the fields `id`, `post`, `parent`, `author`,
//! `created`, `modified` and `body`. Top-level comments store an empty
//! `parent`, and timestamps are RFC 3339 strings.

use serde::{Deserialize, Serialize};
use threadwerk_common::model::{Id, comment::Comment};
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub(crate) struct CommentRecord {
    pub id: String,
    pub post: String,
    #[serde(default)]
    pub parent: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    pub body: String,
}

impl From<&Comment> for CommentRecord {
    fn from(value: &Comment) -> Self {
        Self {
            id: value.id.as_str().to_owned(),
            post: value.post.as_str().to_owned(),
            parent: value
                .parent
                .as_ref()
                .map(|parent| parent.as_str().to_owned())
                .unwrap_or_default(),
            author: value.author.as_str().to_owned(),
            created: value.created,
            modified: value.modified,
            body: value.body.clone(),
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(value: CommentRecord) -> Self {
        Self {
            id: value.id.into(),
            post: value.post.into(),
            parent: (!value.parent.is_empty()).then(|| Id::new(value.parent)),
            author: value.author.into(),
            created: value.created,
            modified: value.modified,
            body: value.body,
        }
    }
}

pub fn encode(comment: &Comment) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&CommentRecord::from(comment))
}

pub fn decode(data: &[u8]) -> serde_json::Result<Comment> {
    serde_json::from_slice::<CommentRecord>(data).map(Comment::from)
}

#[cfg(test)]
mod tests {
    use crate::record::{decode, encode};
    use threadwerk_common::model::{Id, comment::Comment};
    use time::macros::datetime;

    fn comment(parent: Option<&str>) -> Comment {
        Comment {
            id: "7".into(),
            post: "hello-world".into(),
            parent: parent.map(Id::new),
            author: "adam".into(),
            created: datetime!(2021-03-04 05:06:07.123456789 UTC),
            modified: datetime!(2021-03-04 05:06:07.123456789 UTC),
            body: "hello, world".to_owned(),
        }
    }

    #[test]
    fn top_level_parent_is_stored_empty() {
        let data = encode(&comment(None)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();

        assert_eq!(json["parent"], "");
        assert_eq!(json["created"], "2021-03-04T05:06:07.123456789Z");
        assert_eq!(decode(&data).unwrap(), comment(None));
    }

    #[test]
    fn reply_keeps_its_parent() {
        let data = encode(&comment(Some("3"))).unwrap();
        assert_eq!(decode(&data).unwrap().parent.unwrap().as_str(), "3");
    }

    #[test]
    fn reads_records_written_elsewhere() {
        let data = br#"{
            "id": "7",
            "post": "hello-world",
            "parent": "",
            "author": "adam",
            "created": "2021-03-04T07:06:07.123456789+02:00",
            "modified": "2021-03-04T05:06:07.123456789Z",
            "body": "hello, world"
        }"#;

        assert_eq!(decode(data).unwrap(), comment(None));
        assert!(decode(b"{\"id\": \"7\"}").is_err());
    }
}

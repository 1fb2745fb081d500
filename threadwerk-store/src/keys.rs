//! Object key layout.
//!
//! Per post `p` and comment `c`:
//!
//! ```text
//! {prefix}/posts/{p}/comments/{c}/__comment__              record
//! {prefix}/posts/{p}/comments/{parent}/comments/{c}        link
//! ```
//!
//! Top-level comments link under the `__toplevel__` parent. Listing the
//! replies of a comment is a prefix listing of its link namespace.

use thiserror::Error;
use threadwerk_common::model::Id;

pub const RECORD_NAME: &str = "__comment__";
pub const TOP_LEVEL_PARENT: &str = "__toplevel__";
const RESERVED_MARKER: &str = "__";

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("The {kind} id {id:?} cannot be used in an object key")]
pub struct InvalidKeySegmentError {
    kind: &'static str,
    id: String,
}

/// Checks that `id` fits in a single key segment and cannot collide with the
/// reserved `__comment__` and `__toplevel__` names.
pub fn check_segment<Marker>(
    kind: &'static str,
    id: &Id<Marker>,
) -> Result<(), InvalidKeySegmentError> {
    let segment = id.as_str();
    if segment.is_empty() || segment.contains('/') || segment.starts_with(RESERVED_MARKER) {
        return Err(InvalidKeySegmentError {
            kind,
            id: segment.to_owned(),
        });
    }
    Ok(())
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct KeyLayout {
    root: String,
}

impl KeyLayout {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        let root = if prefix.is_empty() {
            "posts".to_owned()
        } else {
            format!("{prefix}/posts")
        };
        Self { root }
    }

    #[must_use]
    pub fn record(&self, post: &str, comment: &str) -> String {
        let root = &self.root;
        format!("{root}/{post}/comments/{comment}/{RECORD_NAME}")
    }

    #[must_use]
    pub fn link(&self, post: &str, parent: Option<&str>, comment: &str) -> String {
        let links = self.links(post, parent);
        format!("{links}{comment}")
    }

    /// Prefix shared by every link under `parent`, ending in `/`.
    #[must_use]
    pub fn links(&self, post: &str, parent: Option<&str>) -> String {
        let root = &self.root;
        let parent = parent.unwrap_or(TOP_LEVEL_PARENT);
        format!("{root}/{post}/comments/{parent}/comments/")
    }

    /// The child id named by a link key listed under `links`, if the key is a
    /// direct child of that namespace.
    #[must_use]
    pub fn child<'k>(links: &str, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(links)
            .filter(|child| !child.is_empty() && !child.contains('/'))
    }
}

#[cfg(test)]
mod tests {
    use crate::keys::{KeyLayout, check_segment};
    use threadwerk_common::model::{Id, comment::CommentMarker};

    #[test]
    fn layout_without_prefix() {
        let keys = KeyLayout::new("");

        assert_eq!(keys.record("p", "1"), "posts/p/comments/1/__comment__");
        assert_eq!(
            keys.link("p", None, "1"),
            "posts/p/comments/__toplevel__/comments/1"
        );
        assert_eq!(
            keys.link("p", Some("1"), "2"),
            "posts/p/comments/1/comments/2"
        );
        assert_eq!(keys.links("p", Some("1")), "posts/p/comments/1/comments/");
    }

    #[test]
    fn layout_with_prefix() {
        let keys = KeyLayout::new("/site/blog/");

        assert_eq!(
            keys.record("p", "1"),
            "site/blog/posts/p/comments/1/__comment__"
        );
        assert_eq!(
            keys.links("p", None),
            "site/blog/posts/p/comments/__toplevel__/comments/"
        );
    }

    #[test]
    fn child_ids_come_from_direct_children_only() {
        let links = "posts/p/comments/1/comments/";

        assert_eq!(
            KeyLayout::child(links, "posts/p/comments/1/comments/2"),
            Some("2")
        );
        assert_eq!(
            KeyLayout::child(links, "posts/p/comments/1/comments/2/x"),
            None
        );
        assert_eq!(KeyLayout::child(links, "posts/p/comments/1/comments/"), None);
        assert_eq!(KeyLayout::child(links, "posts/q/comments/1/comments/2"), None);
    }

    #[test]
    fn reserved_and_structural_ids_are_rejected() {
        for id in ["", "a/b", "__toplevel__", "__comment__", "__x"] {
            assert!(check_segment("comment", &Id::<CommentMarker>::new(id)).is_err());
        }
        for id in ["1", "hello-world", "_x", "a__b"] {
            assert!(check_segment("comment", &Id::<CommentMarker>::new(id)).is_ok());
        }
    }
}

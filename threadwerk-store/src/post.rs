use std::{collections::HashSet, future::Future};
use thiserror::Error;
use threadwerk_common::model::{Id, post::PostMarker};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PostStoreError {
    #[error("Post with id {0} was not found.")]
    NotFound(Id<PostMarker>),
    #[error("Post lookup failed: {0}")]
    Lookup(#[source] BoxError),
}

/// Answers whether a post exists. Comments may only be attached to existing
/// posts.
pub trait PostStore: Send + Sync {
    fn exists(
        &self,
        post: &Id<PostMarker>,
    ) -> impl Future<Output = Result<(), PostStoreError>> + Send;
}

/// A fixed set of known posts.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct StaticPostStore {
    posts: HashSet<Id<PostMarker>>,
}

impl StaticPostStore {
    #[must_use]
    pub fn new(posts: HashSet<Id<PostMarker>>) -> Self {
        Self { posts }
    }

    pub fn insert(&mut self, post: Id<PostMarker>) -> bool {
        self.posts.insert(post)
    }
}

impl<P: Into<Id<PostMarker>>> FromIterator<P> for StaticPostStore {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl PostStore for StaticPostStore {
    async fn exists(&self, post: &Id<PostMarker>) -> Result<(), PostStoreError> {
        if self.posts.contains(post) {
            Ok(())
        } else {
            Err(PostStoreError::NotFound(post.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::post::{PostStore, PostStoreError, StaticPostStore};
    use threadwerk_common::model::Id;

    #[tokio::test]
    async fn only_known_posts_exist() {
        let mut posts: StaticPostStore = ["hello-world"].into_iter().collect();
        posts.insert(Id::new("about"));

        assert!(posts.exists(&Id::new("hello-world")).await.is_ok());
        assert!(posts.exists(&Id::new("about")).await.is_ok());
        assert!(matches!(
            posts.exists(&Id::new("missing")).await,
            Err(PostStoreError::NotFound(post)) if post.as_str() == "missing"
        ));
    }
}

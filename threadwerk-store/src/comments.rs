use crate::{
    clock::{Clock, SystemClock},
    id::IdAllocator,
    keys::{InvalidKeySegmentError, KeyLayout, check_segment},
    object::{ObjectStore, ObjectStoreError},
    post::{PostStore, PostStoreError},
    record,
};
use thiserror::Error;
use threadwerk_common::model::{
    Id,
    comment::{Comment, CommentMarker, CreateComment},
    post::PostMarker,
};
use tracing::{debug, warn};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Coarse classification of [`StoreError`]s for callers that only need to
/// know which way a request failed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    PostNotFound,
    CommentNotFound,
    Validation,
    Storage,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A comment must name the post it belongs to")]
    MissingPost,
    #[error(transparent)]
    InvalidKeySegment(#[from] InvalidKeySegmentError),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error("Comment {comment} on post {post} was not found.")]
    CommentNotFound {
        post: Id<PostMarker>,
        comment: Id<CommentMarker>,
    },
    #[error("Parent comment {parent} on post {post} was not found.")]
    ParentNotFound {
        post: Id<PostMarker>,
        parent: Id<CommentMarker>,
    },
    #[error("Reply {comment} on post {post} is linked but its record is unreadable: {source}")]
    DanglingLink {
        post: Id<PostMarker>,
        comment: Id<CommentMarker>,
        source: Box<StoreError>,
    },
    #[error("Checking existence of post {post} failed: {source}")]
    PostLookup {
        post: Id<PostMarker>,
        source: PostStoreError,
    },
    #[error("{context} failed: {source}")]
    Object {
        context: &'static str,
        source: ObjectStoreError,
    },
    #[error("{context} failed: {source}")]
    Codec {
        context: &'static str,
        source: serde_json::Error,
    },
}

impl StoreError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MissingPost | StoreError::InvalidKeySegment(_) => ErrorKind::Validation,
            StoreError::PostNotFound(_) => ErrorKind::PostNotFound,
            StoreError::CommentNotFound { .. } | StoreError::ParentNotFound { .. } => {
                ErrorKind::CommentNotFound
            }
            StoreError::DanglingLink { source, .. } => source.kind(),
            StoreError::PostLookup { .. }
            | StoreError::Object { .. }
            | StoreError::Codec { .. } => ErrorKind::Storage,
        }
    }

    fn object(context: &'static str) -> impl FnOnce(ObjectStoreError) -> Self {
        move |source| StoreError::Object { context, source }
    }

    fn codec(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| StoreError::Codec { context, source }
    }
}

/// Threaded comments kept in a flat object store.
///
/// Every comment is two objects: its record, and a link under its parent's
/// namespace that makes it show up in [`CommentStore::list_replies`]. Nothing
/// spans both writes atomically, so the order of writes is what keeps links
/// from pointing at missing records:
///
/// - create writes the record first, then the link,
/// - delete removes the link first, then the record.
///
/// An interruption therefore leaves at worst a record nobody links to, never a
/// link to nothing. Deleting a comment leaves its replies in place.
#[derive(Debug)]
pub struct CommentStore<O, P, I, C = SystemClock> {
    objects: O,
    posts: P,
    ids: I,
    clock: C,
    bucket: String,
    keys: KeyLayout,
}

impl<O, P, I, C> CommentStore<O, P, I, C>
where
    O: ObjectStore,
    P: PostStore,
    I: IdAllocator,
    C: Clock,
{
    #[must_use]
    pub fn new(objects: O, posts: P, ids: I, clock: C, bucket: impl Into<String>) -> Self {
        Self {
            objects,
            posts,
            ids,
            clock,
            bucket: bucket.into(),
            keys: KeyLayout::new(""),
        }
    }

    /// Places every key under `prefix` inside the bucket.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.keys = KeyLayout::new(prefix);
        self
    }

    #[must_use]
    pub fn object_store(&self) -> &O {
        &self.objects
    }

    #[must_use]
    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    /// Stores a new comment and links it under its parent.
    ///
    /// The post must exist, and so must the parent if one is named. An empty
    /// parent means a top-level comment. If the link cannot be written the
    /// record stays behind, reachable by id but not listed; the error is
    /// returned and nothing is retried.
    pub async fn create(&self, comment: CreateComment) -> Result<Comment> {
        let CreateComment {
            post,
            parent,
            author,
            body,
        } = comment;
        let parent = parent.filter(|parent| !parent.is_empty());

        if post.is_empty() {
            return Err(StoreError::MissingPost);
        }
        check_segment("post", &post)?;

        self.posts
            .exists(&post)
            .await
            .map_err(|source| match source {
                PostStoreError::NotFound(post) => StoreError::PostNotFound(post),
                source => StoreError::PostLookup {
                    post: post.clone(),
                    source,
                },
            })?;

        if let Some(parent) = &parent {
            self.fetch(&post, parent).await.map_err(|err| match err {
                StoreError::CommentNotFound { post, comment } => StoreError::ParentNotFound {
                    post,
                    parent: comment,
                },
                err => err,
            })?;
        }

        let id = self.ids.allocate();
        check_segment("comment", &id)?;
        let now = self.clock.now();
        let comment = Comment {
            id,
            post,
            parent,
            author,
            created: now,
            modified: now,
            body: body.into_inner(),
        };

        let data = record::encode(&comment).map_err(StoreError::codec("Encoding comment"))?;
        let record_key = self.keys.record(comment.post.as_str(), comment.id.as_str());
        self.objects
            .put(&self.bucket, &record_key, data)
            .await
            .map_err(StoreError::object("Writing comment record"))?;

        let link_key = self.keys.link(
            comment.post.as_str(),
            comment.parent.as_ref().map(Id::as_str),
            comment.id.as_str(),
        );
        self.objects
            .put(&self.bucket, &link_key, Vec::new())
            .await
            .map_err(StoreError::object("Writing reply link"))?;

        debug!(
            post = %comment.post,
            comment = %comment.id,
            parent = ?comment.parent,
            "Created comment"
        );
        Ok(comment)
    }

    pub async fn fetch(
        &self,
        post: &Id<PostMarker>,
        comment: &Id<CommentMarker>,
    ) -> Result<Comment> {
        check_segment("post", post)?;
        check_segment("comment", comment)?;

        let key = self.keys.record(post.as_str(), comment.as_str());
        let data = match self.objects.get(&self.bucket, &key).await {
            Ok(data) => data,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StoreError::CommentNotFound {
                    post: post.clone(),
                    comment: comment.clone(),
                });
            }
            Err(source) => return Err(StoreError::object("Reading comment record")(source)),
        };

        record::decode(&data).map_err(StoreError::codec("Decoding comment record"))
    }

    /// Replies to `parent`, or the top-level comments of `post` if `parent` is
    /// `None` or empty, oldest first.
    ///
    /// The parent itself is not looked up: an unknown parent simply has no
    /// replies. A link whose record cannot be read fails the whole listing.
    pub async fn list_replies(
        &self,
        post: &Id<PostMarker>,
        parent: Option<&Id<CommentMarker>>,
    ) -> Result<Vec<Comment>> {
        let parent = parent.filter(|parent| !parent.is_empty());
        check_segment("post", post)?;
        if let Some(parent) = parent {
            check_segment("comment", parent)?;
        }

        let links = self.keys.links(post.as_str(), parent.map(Id::as_str));
        let keys = self
            .objects
            .list(&self.bucket, &links)
            .await
            .map_err(StoreError::object("Listing reply links"))?;

        let mut replies = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(child) = KeyLayout::child(&links, key) else {
                debug!(key, "Ignoring object nested below reply links");
                continue;
            };
            let child = Id::new(child);

            let reply = self
                .fetch(post, &child)
                .await
                .map_err(|source| StoreError::DanglingLink {
                    post: post.clone(),
                    comment: child,
                    source: Box::new(source),
                })?;
            replies.push(reply);
        }

        replies.sort_by_key(|reply| reply.created);
        Ok(replies)
    }

    /// Removes a comment and its link. Replies to it are left untouched and
    /// keep naming it as their parent.
    pub async fn delete(&self, post: &Id<PostMarker>, comment: &Id<CommentMarker>) -> Result<()> {
        let existing = self.fetch(post, comment).await?;

        let link_key = self.keys.link(
            post.as_str(),
            existing.parent.as_ref().map(Id::as_str),
            comment.as_str(),
        );
        match self.objects.delete(&self.bucket, &link_key).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                warn!(
                    %post,
                    %comment,
                    parent = ?existing.parent,
                    error = %err,
                    "Reply link was already gone"
                );
            }
            Err(source) => return Err(StoreError::object("Deleting reply link")(source)),
        }

        let record_key = self.keys.record(post.as_str(), comment.as_str());
        match self.objects.delete(&self.bucket, &record_key).await {
            Ok(()) => {
                debug!(%post, %comment, "Deleted comment");
                Ok(())
            }
            Err(ObjectStoreError::NotFound { .. }) => Err(StoreError::CommentNotFound {
                post: post.clone(),
                comment: comment.clone(),
            }),
            Err(source) => Err(StoreError::object("Deleting comment record")(source)),
        }
    }
}

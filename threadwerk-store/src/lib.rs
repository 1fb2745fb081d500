pub mod clock;
pub mod comments;
pub mod id;
pub mod keys;
pub mod object;
pub mod post;
pub mod record;

pub use comments::{CommentStore, ErrorKind, Result, StoreError};

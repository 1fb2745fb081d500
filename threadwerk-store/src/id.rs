use std::sync::{Mutex, PoisonError};
use threadwerk_common::{
    model::{Id, ThreadwerkSnowflakeGenerator, comment::CommentMarker},
    snowflake::{ProcessId, WorkerId},
};

/// Produces fresh comment identifiers.
///
/// The comment store trusts the allocator completely: an identifier handed
/// out twice for the same post silently overwrites the earlier comment.
pub trait IdAllocator: Send + Sync {
    fn allocate(&self) -> Id<CommentMarker>;
}

impl<F> IdAllocator for F
where
    F: Fn() -> Id<CommentMarker> + Send + Sync,
{
    fn allocate(&self) -> Id<CommentMarker> {
        self()
    }
}

#[derive(Debug)]
pub struct SnowflakeIdAllocator {
    generator: Mutex<ThreadwerkSnowflakeGenerator>,
}

impl SnowflakeIdAllocator {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            generator: Mutex::new(ThreadwerkSnowflakeGenerator::new(worker_id, process_id)),
        }
    }
}

impl IdAllocator for SnowflakeIdAllocator {
    fn allocate(&self) -> Id<CommentMarker> {
        let snowflake = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate();
        snowflake.into()
    }
}

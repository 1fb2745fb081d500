pub mod comment;
pub mod post;
pub mod user;

use crate::snowflake::{Epoch, Snowflake, SnowflakeGenerator};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Formatter},
    marker::PhantomData,
};
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ThreadwerkEpoch;
impl Epoch for ThreadwerkEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type ThreadwerkSnowflake = Snowflake<ThreadwerkEpoch>;
pub type ThreadwerkSnowflakeGenerator = SnowflakeGenerator<ThreadwerkEpoch>;

/// Opaque string identifier, tagged with the kind of thing it names.
///
/// Identifiers are stored and compared as plain strings so records written by
/// other implementations stay readable.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<Marker>(String, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into(), PhantomData)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<Marker> Debug for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<String> for Id<Marker> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<&str> for Id<Marker> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<ThreadwerkSnowflake> for Id<Marker> {
    fn from(value: ThreadwerkSnowflake) -> Self {
        Self::new(value.to_string())
    }
}

impl<Marker> AsRef<str> for Id<Marker> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! The acting user is asserted by an authenticating proxy in front of this
//! service through the `User` request header. It is trusted as given.

use crate::server::ServerError;
use axum::{
    extract::FromRequestParts,
    http::{HeaderName, HeaderValue, request::Parts},
};
use axum_extra::TypedHeader;
use headers::Header;
use threadwerk_common::model::{Id, user::UserMarker};

static USER: HeaderName = HeaderName::from_static("user");

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct UserHeader(Id<UserMarker>);

impl Header for UserHeader {
    fn name() -> &'static HeaderName {
        &USER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let user = value.to_str().map_err(|_| headers::Error::invalid())?.trim();
        if user.is_empty() {
            return Err(headers::Error::invalid());
        }
        Ok(Self(Id::new(user)))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(self.0.as_str()) {
            values.extend(std::iter::once(value));
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ActingUser {
    id: Id<UserMarker>,
}

impl ActingUser {
    #[must_use]
    pub fn user_id(&self) -> &Id<UserMarker> {
        &self.id
    }

    #[must_use]
    pub fn into_user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(UserHeader(id)) =
            TypedHeader::<UserHeader>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidUserHeader)?;

        Ok(Self { id })
    }
}

//! Identity of the caller.
//!
//! Authentication happens upstream: the session layer forwards the
//! authenticated user's id in the `x-user-id` header. This module resolves
//! that id against the `users` table and exposes the result as an extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use staybook_shared::constants::IDENTITY_HEADER;
use staybook_shared::UserRole;
use staybook_store::{Property, StoreError, User};

use crate::api::AppState;
use crate::error::ServerError;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
    pub email: Option<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            email: user.email.clone(),
        }
    }
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins manage everything; hosts manage the properties they own.
    pub fn can_manage(&self, property: &Property) -> bool {
        self.is_admin() || (self.role == UserRole::Host && property.host_id == self.id)
    }

    pub fn ensure_can_manage(&self, property: &Property) -> Result<(), ServerError> {
        if self.can_manage(property) {
            Ok(())
        } else {
            Err(ServerError::Forbidden(
                "only the property's host or an admin may do this".into(),
            ))
        }
    }
}

/// The caller, if the request carries an identity.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    /// The caller, or `Unauthorized` for anonymous requests.
    pub fn require(self) -> Result<Actor, ServerError> {
        self.0.ok_or(ServerError::Unauthorized)
    }
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(IDENTITY_HEADER) else {
            return Ok(Self(None));
        };

        let id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or(ServerError::Unauthorized)?;

        let user = state
            .db
            .run(move |db| match db.get_user(id) {
                Ok(user) => Ok(user),
                Err(StoreError::NotFound) => Err(ServerError::Unauthorized),
                Err(other) => Err(other.into()),
            })
            .await?;

        Ok(Self(Some(Actor::from(&user))))
    }
}

//! Bearer-token auth boundary
//!
//! Token resolution belongs to an external collaborator; this module only
//! defines the seam (`AuthResolver`) and the extractor that turns the
//! `Authorization` header into a verified `{user_id, role}` pair. A static
//! token table ships for tests and local runs.

use crate::{error::ApiError, state::AppState};
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use dashmap::DashMap;
use order_engine::{Actor, Role};
use uuid::Uuid;

/// Resolves bearer tokens into verified identities
pub trait AuthResolver: Send + Sync {
    /// Resolve a token; None when unknown or expired
    fn resolve(&self, token: &str) -> Option<Actor>;
}

/// Static token table (tests and local runs)
#[derive(Default)]
pub struct StaticTokenResolver {
    tokens: DashMap<String, Actor>,
}

impl StaticTokenResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an actor
    pub fn insert(&self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }

    /// Register and return a token for a fresh actor
    pub fn issue(&self, user_id: Uuid, role: Role) -> String {
        let token = format!("tok_{}", Uuid::new_v4().simple());
        self.insert(token.clone(), Actor { user_id, role });
        token
    }
}

impl AuthResolver for StaticTokenResolver {
    fn resolve(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).map(|actor| *actor)
    }
}

/// Verified identity attached to a request
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    /// Resolved actor
    pub actor: Actor,
}

impl AuthContext {
    /// Require a role (admins always pass)
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.actor.role == role || self.actor.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{:?} role required",
                role
            )))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(ApiError::unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(ApiError::unauthorized)?;

        let actor = state
            .auth
            .resolve(token)
            .ok_or_else(ApiError::unauthorized)?;

        Ok(AuthContext { actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticTokenResolver::new();
        let user_id = Uuid::new_v4();
        let token = resolver.issue(user_id, Role::Farmer);

        let actor = resolver.resolve(&token).unwrap();
        assert_eq!(actor.user_id, user_id);
        assert_eq!(actor.role, Role::Farmer);

        assert!(resolver.resolve("tok_unknown").is_none());
    }

    #[test]
    fn test_require_role() {
        let buyer = AuthContext {
            actor: Actor {
                user_id: Uuid::new_v4(),
                role: Role::Buyer,
            },
        };
        let admin = AuthContext {
            actor: Actor {
                user_id: Uuid::new_v4(),
                role: Role::Admin,
            },
        };

        buyer.require_role(Role::Buyer).unwrap();
        admin.require_role(Role::Buyer).unwrap();
        admin.require_role(Role::Farmer).unwrap();

        let err = buyer.require_role(Role::Farmer).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}

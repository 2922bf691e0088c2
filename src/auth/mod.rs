//! Authorization interface (consumed).
//!
//! Weir only needs "is this request authorized, and for which user";
//! session issuance and token formats live outside the engine.

use async_trait::async_trait;

use crate::error::{Result, WeirError};

/// Opaque per-request context handed to the authorizer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub bearer_token: Option<String>,
}

impl RequestContext {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }
}

/// The authorized principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub user_id: String,
}

/// Authorization check for incoming turn requests.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, context: &RequestContext) -> Result<AuthedUser>;
}

/// Authorizer that accepts every request as a fixed user. For tests, demos,
/// and single-user deployments.
pub struct StaticAuthorizer {
    user_id: String,
}

impl StaticAuthorizer {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self, _context: &RequestContext) -> Result<AuthedUser> {
        Ok(AuthedUser {
            user_id: self.user_id.clone(),
        })
    }
}

/// Authorizer that rejects everything. Useful as a fail-closed default.
pub struct DenyAll;

#[async_trait]
impl Authorizer for DenyAll {
    async fn authorize(&self, _context: &RequestContext) -> Result<AuthedUser> {
        Err(WeirError::Unauthorized("no authorizer configured".into()))
    }
}

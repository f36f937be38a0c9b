//! Axum extractors for handlers behind the auth gate
//!
//! These re-check capabilities at the handler boundary, so a handler that
//! needs a role states it in its signature instead of trusting the route
//! table alone.

use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::error::GateError;
use crate::principal::{Principal, Role};

/// The authenticated principal of the current request.
///
/// Rejects with 401 when the gate did not resolve a principal, e.g. on a
/// public route.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(GateError::TokenMissing)
    }
}

/// Type-level role name for [`RequireRole`]
pub trait RoleMarker: Send + Sync + 'static {
    const ROLE: &'static str;
}

/// The `ADMIN` role
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl RoleMarker for Admin {
    const ROLE: &'static str = "ADMIN";
}

/// Principal that holds role `R`; 401 without a principal, 403 without the role.
#[derive(Debug, Clone)]
pub struct RequireRole<R: RoleMarker> {
    pub principal: Principal,
    _role: PhantomData<R>,
}

impl<R: RoleMarker> RequireRole<R> {
    pub fn into_inner(self) -> Principal {
        self.principal
    }
}

#[async_trait]
impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleMarker,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        principal.require_role(&Role::new(R::ROLE))?;
        Ok(Self {
            principal,
            _role: PhantomData,
        })
    }
}

//! JWT-based authentication extractors for Axum handlers.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folio_core::error::CoreError;
use folio_core::pages::DomainRole;
use folio_core::visibility::Viewer;
use folio_db::repositories::{DomainRepo, UserRepo};
use folio_db::DbPool;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// The token only carries the user id; karma, admin flag and domain
/// memberships are read from the database on every request so permission
/// changes apply immediately.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
    pub viewer: Viewer,
}

/// Optional authentication: `None` when no `Authorization` header was sent.
///
/// A header that is present but invalid is still rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    /// The request's viewer, anonymous when logged out.
    pub fn viewer(&self) -> Viewer {
        match &self.0 {
            Some(user) => user.viewer.clone(),
            None => Viewer::anonymous(),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization header".into(),
        ))
    })?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;
    Ok(Some(token))
}

/// Build the [`Viewer`] for a user id from the users and members tables.
pub async fn load_viewer(pool: &DbPool, user_id: &str) -> Result<Viewer, AppError> {
    let user = UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    let mut domain_roles = HashMap::new();
    for member in DomainRepo::list_roles_for_user(pool, user_id).await? {
        let role: DomainRole = member.role.parse()?;
        domain_roles.insert(member.domain_id, role);
    }

    Ok(Viewer {
        id: user.id,
        karma: user.karma,
        is_admin: user.is_admin,
        domain_roles,
    })
}

async fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;
    let viewer = load_viewer(&state.pool, &claims.sub).await?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
        viewer,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;
        authenticate(token, state).await
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(token, state).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

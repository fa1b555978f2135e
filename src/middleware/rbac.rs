// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{CurrentUser, UserRole},
};

/// 1. O Trait que define um nível de acesso
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
    fn label() -> &'static str;
}

/// 2. O Extractor (Guardião). 401 sem sessão, 403 com papel insuficiente.
pub struct RequireRole<T> {
    pub user: CurrentUser,
    _marker: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)?;

        if !T::allows(user.role) {
            return Err(AppError::Forbidden(format!(
                "Acesso restrito a {}.",
                T::label()
            )));
        }

        Ok(RequireRole {
            user,
            _marker: PhantomData,
        })
    }
}

// ---
// NÍVEIS DE ACESSO
// ---

/// Equipe da loja (caixa) ou administrador.
pub struct StaffAccess;
impl RoleDef for StaffAccess {
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Staff | UserRole::Admin)
    }
    fn label() -> &'static str {
        "equipe ou administradores"
    }
}

pub struct AdminAccess;
impl RoleDef for AdminAccess {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Admin
    }
    fn label() -> &'static str {
        "administradores"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use uuid::Uuid;

    fn parts_with(role: Option<UserRole>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(role) = role {
            parts.extensions.insert(CurrentUser {
                id: Uuid::new_v4(),
                email: "x@loja.com".into(),
                role,
            });
        }
        parts
    }

    async fn check<T: RoleDef>(role: Option<UserRole>) -> Result<(), StatusCode> {
        let mut parts = parts_with(role);
        RequireRole::<T>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .map_err(|e| e.status())
    }

    #[tokio::test]
    async fn staff_routes_accept_staff_and_admin() {
        assert_eq!(check::<StaffAccess>(Some(UserRole::Staff)).await, Ok(()));
        assert_eq!(check::<StaffAccess>(Some(UserRole::Admin)).await, Ok(()));
        assert_eq!(check::<StaffAccess>(Some(UserRole::Customer)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn admin_routes_reject_staff() {
        assert_eq!(check::<AdminAccess>(Some(UserRole::Admin)).await, Ok(()));
        assert_eq!(check::<AdminAccess>(Some(UserRole::Staff)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn missing_session_is_401() {
        assert_eq!(check::<StaffAccess>(None).await, Err(StatusCode::UNAUTHORIZED));
    }
}

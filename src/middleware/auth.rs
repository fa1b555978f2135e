// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::CurrentUser};

// Camada de sessão: roda em toda requisição. Sem cabeçalho segue anônima;
// com cabeçalho, o token precisa ser válido e o usuário ainda existir.
pub async fn session_layer(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let has_header = request.headers().contains_key(AUTHORIZATION);

    match request.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => {
            let user = app_state.auth_service.validate_token(bearer.token()).await?;
            // Insere o usuário nos "extensions" da requisição
            request.extensions_mut().insert(user);
        }
        None if has_header => return Err(AppError::InvalidToken),
        None => {}
    }

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthenticated)
    }
}

// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, CurrentUser, RegisterUserPayload, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, ttl_hours: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            ttl_hours,
        }
    }

    // Cadastro público: sempre entra como cliente
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        // Hashing é caro; roda fora do executor assíncrono
        let password = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let new_user = self
            .user_repo
            .create_user(
                &payload.email,
                &hashed_password,
                payload.name.as_deref(),
                payload.phone.as_deref(),
            )
            .await?;

        tracing::info!(user_id = %new_user.id, "Novo usuário cadastrado");
        self.create_token(&new_user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = user.password_hash.clone();

        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Decodifica o token e relê o usuário: papel alterado ou conta removida
    /// valem já na próxima requisição.
    pub async fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self.user_repo.get_user(claims.sub).await?.ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "Token de usuário inexistente");
            AppError::InvalidToken
        })?;

        Ok(CurrentUser::from(user))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))
    }

    pub async fn update_role(&self, id: Uuid, role: UserRole) -> Result<User, AppError> {
        let user = self
            .user_repo
            .update_role(id, role)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;

        tracing::info!(user_id = %id, role = role.as_str(), "Papel do usuário alterado");
        Ok(user)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        encode_token(&self.jwt_secret, user.id, &user.email, user.role, self.ttl_hours)
    }
}

pub fn encode_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    role: UserRole,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_carries_identity_and_role() {
        let id = Uuid::new_v4();
        let token = encode_token("segredo", id, "caixa@loja.com", UserRole::Staff, 1).unwrap();

        let claims = decode_token("segredo", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "caixa@loja.com");
        assert_eq!(claims.role, UserRole::Staff);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_token("segredo", Uuid::new_v4(), "a@b.com", UserRole::Admin, 1).unwrap();
        assert!(matches!(decode_token("outro", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Bem além da folga padrão de 60s do validador
        let token = encode_token("segredo", Uuid::new_v4(), "a@b.com", UserRole::Customer, -2).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token("segredo", "nao.e.jwt"), Err(AppError::InvalidToken)));
    }
}

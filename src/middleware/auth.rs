use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, entity::users::UserRole, error::AppError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_catalog_manager(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.can_manage_catalog() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Account data is visible to its owner and to admins.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id != owner_id && user.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        decode_token(token, &state.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn staff_roles_pass_staff_guard() {
        assert!(ensure_staff(&user(UserRole::Buyer)).is_err());
        assert!(ensure_staff(&user(UserRole::Worker)).is_ok());
        assert!(ensure_staff(&user(UserRole::Manager)).is_ok());
        assert!(ensure_staff(&user(UserRole::Admin)).is_ok());
    }

    #[test]
    fn workers_cannot_edit_catalog() {
        assert!(ensure_catalog_manager(&user(UserRole::Worker)).is_err());
        assert!(ensure_catalog_manager(&user(UserRole::Manager)).is_ok());
    }

    #[test]
    fn owners_and_admins_reach_account_data() {
        let buyer = user(UserRole::Buyer);
        assert!(ensure_owner_or_admin(&buyer, buyer.user_id).is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&buyer, Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));
        assert!(ensure_owner_or_admin(&user(UserRole::Admin), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn garbage_tokens_are_unauthorized() {
        assert!(matches!(
            decode_token("not-a-jwt", "secret"),
            Err(AppError::Unauthorized)
        ));
    }
}

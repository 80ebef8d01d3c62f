use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::users::UserRole;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: LoginUser,
}

/// Field names follow the storefront's existing client contract.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginUser {
    pub id: uuid::Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "rol")]
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    pub exp: usize,
}

/// Minimal sanity check; deliverability is not our concern.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }
    Some(email)
}

pub const MIN_PASSWORD_LEN: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Ana@History.Example "),
            Some("ana@history.example".to_string())
        );
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("a@localhost"), None);
    }

    #[test]
    fn register_accepts_legacy_field_name() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "nombre": "Ana",
            "email": "ana@example.com",
            "password": "secret1"
        }))
        .unwrap();
        assert_eq!(req.name, "Ana");
    }

    #[test]
    fn login_user_serializes_legacy_keys() {
        let user = LoginUser {
            id: uuid::Uuid::nil(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            role: UserRole::Worker,
        };
        let value = serde_json::to_value(user).unwrap();
        assert_eq!(value["nombre"], "Ana");
        assert_eq!(value["rol"], "worker");
    }
}

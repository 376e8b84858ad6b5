use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bearer token claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

pub fn create_jwt(user_id: Uuid, secret: &str, expiration_hours: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(expiration_hours))
        .ok_or(AppError::InternalError)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: None,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::InternalError)
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_carries_user_id() {
        let user_id = Uuid::new_v4();
        let token = create_jwt(user_id, "secret", 1).unwrap();

        let claims = verify_jwt(&token, "secret").unwrap();

        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = create_jwt(Uuid::new_v4(), "secret", 1).unwrap();

        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }
}

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Bearer-token claims: the owning user id plus issue/expiry instants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Sign a token for the given user with the server secret (HS256).
    pub fn issue(user_id: &str, secret: &str, expiry_hours: i64) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + expiry_hours * 3600,
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Decode and validate a token. Expired, tampered, and malformed tokens
    /// all come back as authentication errors.
    pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
        match jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => Ok(data.claims),
            Err(e) if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                Err(AppError::Auth("Token expired".to_string()))
            }
            Err(_) => Err(AppError::Auth("Invalid Token".to_string())),
        }
    }
}

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, TokenValidator};
use crate::shared::error::AppError;

/// JWT claims issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

/// HS256 JWT validator
pub struct JwtTokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenValidator for JwtTokenValidator {
    fn validate(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".into())
                }
                _ => AppError::Unauthorized("Invalid token".into()),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))?;

        Ok(Identity {
            user_id,
            username: data.claims.username,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn token(sub: &str, secret: &str, expires_in: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let validator = JwtTokenValidator::new(SECRET);
        let identity = validator
            .validate(&token("42", SECRET, Duration::minutes(5)))
            .unwrap();

        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtTokenValidator::new(SECRET);
        let result = validator.validate(&token("42", SECRET, Duration::minutes(-10)));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_and_bad_subject_are_rejected() {
        let validator = JwtTokenValidator::new(SECRET);
        let forged = token("42", "another-secret-that-is-long-enough!!", Duration::minutes(5));
        assert!(validator.validate(&forged).is_err());

        let bad_sub = token("not-a-number", SECRET, Duration::minutes(5));
        assert!(validator.validate(&bad_sub).is_err());
    }
}

use booklog_core::config::AuthConfig;
use booklog_core::{Actor, Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// The caller described by the token, if its subject and role are well formed.
    pub fn actor(&self) -> Option<Actor> {
        let role: Role = self.role.parse().ok()?;
        Some(Actor::new(self.user_id()?, role))
    }
}

/// HS256 signing and validation keys plus the token parameters.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], issuer: &str, audience: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Keys from the configured secret variable. Without one, a random
    /// secret is generated and every token dies with the process.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret().unwrap_or_else(|| {
            tracing::warn!(
                env = %config.jwt_secret_env,
                "JWT secret not set, using a random per-process secret"
            );
            format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
        });
        Self::new(
            secret.as_bytes(),
            &config.issuer,
            &config.audience,
            config.token_ttl_minutes,
        )
    }

    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(ApiError::Token)
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret-test-secret", "booklog", "booklog-client", 120)
    }

    fn user() -> User {
        User {
            id: 7,
            username: "author1".into(),
            role: Role::Author,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys();
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.name, "author1");
        assert_eq!(claims.role, "Author");
        assert_eq!(claims.actor(), Some(Actor::new(7, Role::Author)));
        assert_eq!(claims.exp - claims.iat, 120 * 60);
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = keys().issue(&user()).unwrap();
        let other = JwtKeys::new(b"another-secret-entirely", "booklog", "booklog-client", 120);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_wrong_audience_or_issuer() {
        let token = keys().issue(&user()).unwrap();
        let wrong_aud = JwtKeys::new(b"test-secret-test-secret", "booklog", "someone-else", 120);
        let wrong_iss = JwtKeys::new(b"test-secret-test-secret", "elsewhere", "booklog-client", 120);
        assert!(wrong_aud.verify(&token).is_err());
        assert!(wrong_iss.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired() {
        let expired = JwtKeys::new(b"test-secret-test-secret", "booklog", "booklog-client", -10);
        let token = expired.issue(&user()).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(keys().verify("not.a.token").is_err());
    }
}

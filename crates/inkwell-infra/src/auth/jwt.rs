//! Bearer tokens signed with HS256.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkwell_core::ports::{AuthError, TokenClaims, TokenService};

pub const DEFAULT_JWT_SECRET: &str = "inkwell-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "inkwell".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    #[serde(default)]
    roles: Vec<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        if config.secret == DEFAULT_JWT_SECRET {
            tracing::warn!("Using the built-in JWT secret. Set JWT_SECRET outside development.");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            roles,
            exp: (now + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(TokenClaims {
            user_id: data.claims.sub,
            email: data.claims.email,
            roles: data.claims.roles,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        TimeDelta::hours(self.config.expiration_hours).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(issuer: &str, hours: i64) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: hours,
            issuer: issuer.to_string(),
        })
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let tokens = service("inkwell", 1);
        let user_id = Uuid::new_v4();

        let token = tokens
            .generate_token(user_id, "author@example.com", vec!["admin".to_string()])
            .unwrap();
        let claims = tokens.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "author@example.com");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn garbage_is_rejected() {
        let result = service("inkwell", 1).validate_token("not-a-jwt");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let token = service("elsewhere", 1)
            .generate_token(Uuid::new_v4(), "a@b.c", vec![])
            .unwrap();
        assert!(service("inkwell", 1).validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = service("inkwell", -2);
        let token = tokens.generate_token(Uuid::new_v4(), "a@b.c", vec![]).unwrap();
        assert!(matches!(
            tokens.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn expiration_is_reported_in_seconds() {
        assert_eq!(service("inkwell", 24).expiration_seconds(), 86_400);
    }
}

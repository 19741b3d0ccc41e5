//! Authentication extractors.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use url::form_urlencoded;

use inkwell_core::DomainError;
use inkwell_core::policy::Actor;
use inkwell_core::ports::{AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Rejects anonymous requests with a login redirect:
/// ```ignore
/// async fn me(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

/// `{login_url}?next=<path>`, keeping any query the login URL already has.
pub fn login_location(login_url: &str, next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{separator}{query}")
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })
}

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn identify(req: &HttpRequest, state: &AppState) -> Result<Option<Identity>, AuthError> {
    match bearer_token(req)? {
        Some(token) => Ok(Some(state.tokens.validate_token(token)?.into())),
        None => Ok(None),
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match app_state(req) {
            Ok(state) => state,
            Err(e) => return ready(Err(e)),
        };

        ready(match identify(req, state) {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(AppError::LoginRequired {
                location: login_location(&state.settings.login_url, req.path()),
            }),
            Err(e) => Err(e.into()),
        })
    }
}

/// The requester as seen by the policy: possibly anonymous.
///
/// An absent or unusable token makes an anonymous viewer; rejecting is left to
/// the policy, which turns it into a login redirect back to this request's path.
#[derive(Debug, Clone)]
pub struct Viewer {
    actor: Option<Actor>,
    login_location: String,
}

impl Viewer {
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// Reject anonymous viewers before the request body is looked at.
    pub fn require_login(&self) -> Result<&Actor, AppError> {
        self.actor()
            .ok_or_else(|| self.reject(DomainError::Unauthenticated))
    }

    /// Convert a service error, sending unauthenticated requests to the login page.
    pub fn reject(&self, err: DomainError) -> AppError {
        match err {
            DomainError::Unauthenticated => AppError::LoginRequired {
                location: self.login_location.clone(),
            },
            other => other.into(),
        }
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match app_state(req) {
            Ok(state) => state,
            Err(e) => return ready(Err(e)),
        };

        let identity = identify(req, state).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Ignoring unusable bearer token");
            None
        });

        ready(Ok(Viewer {
            actor: identity.as_ref().map(Identity::actor),
            login_location: login_location(&state.settings.login_url, req.path()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_location_encodes_next() {
        assert_eq!(
            login_location("/api/auth/login", "/api/posts/1/publish"),
            "/api/auth/login?next=%2Fapi%2Fposts%2F1%2Fpublish"
        );
        assert_eq!(
            login_location("/login?theme=dark", "/x"),
            "/login?theme=dark&next=%2Fx"
        );
    }
}

//! Session tokens issued by the identity provider.
//!
//! The provider signs an HS256 JWT with the shared secret. The portal only verifies it and
//! keeps the user row in step with the claims.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ApiError;
use super::AppState;
use crate::config::SessionConfig;
use crate::schema::{UpsertUser, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(sub: impl Into<String>, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            exp,
        }
    }

    fn into_upsert(self) -> UpsertUser {
        UpsertUser {
            id: self.sub,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
        }
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_name: String,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.secret, config.cookie_name.clone())
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, ApiError> {
        decode::<SessionClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "session token rejected");
                ApiError::Unauthorized
            })
    }

    /// Sign claims the way the identity provider does. Used by the demo and tests.
    pub fn mint(&self, claims: &SessionClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }
}

/// The signed-in user, created on first sight of a valid token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = match parts
            .extract::<Option<TypedHeader<Authorization<Bearer>>>>()
            .await
            .ok()
            .flatten()
        {
            Some(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            None => CookieJar::from_headers(&parts.headers)
                .get(state.sessions.cookie_name())
                .map(|cookie| cookie.value().to_string())
                .ok_or(ApiError::Unauthorized)?,
        };
        let claims = state.sessions.verify(&token)?;

        if let Some(user) = state.storage.user(&claims.sub).await? {
            return Ok(CurrentUser(user));
        }
        let user = state.storage.upsert_user(claims.into_upsert()).await?;
        info!(user_id = %user.id, role = %user.role, "user registered on first login");
        Ok(CurrentUser(user))
    }
}

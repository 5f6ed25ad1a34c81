//! Sign-in and bearer-token resolution against the store's auth service.
//!
//! Roles live in the user's metadata. `app_metadata.role` (server-set) wins
//! over `user_metadata.role` (client-set at sign-up).

#[cfg(test)]
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session token is invalid or expired")]
    InvalidToken,
    #[error("Auth service unreachable: {0}")]
    Unavailable(String),
    #[error("Auth service error ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed auth response: {0}")]
    Decode(String),
}

/// User as known to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    /// Raw role string from metadata; validated by the API layer.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, IdentityError>;
}

// ═══════════════════════════════════════════════════════════
// Hosted auth service
// ═══════════════════════════════════════════════════════════

pub struct SupabaseAuth {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RawUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    app_metadata: Value,
    #[serde(default)]
    user_metadata: Value,
}

impl From<RawUser> for AuthUser {
    fn from(raw: RawUser) -> Self {
        let role = [&raw.app_metadata, &raw.user_metadata]
            .into_iter()
            .find_map(|meta| meta.get("role").and_then(Value::as_str))
            .map(str::to_string);
        Self {
            id: raw.id,
            email: raw.email,
            role,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: RawUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
        })
    }

    async fn error_from(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                ["msg", "error_description", "message"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or(body);
        IdentityError::Rejected { status, message }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .client
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            400 | 401 => return Err(IdentityError::InvalidCredentials),
            _ => return Err(Self::error_from(response).await),
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;

        Ok(AuthSession {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_in: parsed.expires_in,
            user: parsed.user.into(),
        })
    }

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => return Err(IdentityError::InvalidToken),
            _ => return Err(Self::error_from(response).await),
        }

        let raw: RawUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(raw.into())
    }
}

// ═══════════════════════════════════════════════════════════
// Static provider for tests
// ═══════════════════════════════════════════════════════════

/// Fixed token → user table. Passwords are checked in plain text.
#[cfg(test)]
#[derive(Default)]
pub struct StaticIdentity {
    users: HashMap<String, AuthUser>,
    credentials: HashMap<String, (String, String)>,
}

#[cfg(test)]
impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable by `token`, signing in with `email`/`password`.
    pub fn with_user(mut self, token: &str, user: AuthUser, password: &str) -> Self {
        if let Some(email) = &user.email {
            self.credentials
                .insert(email.clone(), (password.to_string(), token.to_string()));
        }
        self.users.insert(token.to_string(), user);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let (expected, token) = self
            .credentials
            .get(email)
            .ok_or(IdentityError::InvalidCredentials)?;
        if expected != password {
            return Err(IdentityError::InvalidCredentials);
        }
        let user = self
            .users
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(AuthSession {
            access_token: token.clone(),
            refresh_token: None,
            expires_in: Some(3600),
            user,
        })
    }

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, IdentityError> {
        self.users.get(token).cloned().ok_or(IdentityError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    const USER_ID: &str = "6f1c2a44-1b0e-4c55-9a43-1f0e6c1d2b7a";

    async fn spawn_stub() -> String {
        async fn token(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if body["password"] != "secret" {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error_description": "Invalid login credentials"})),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": "jwt-abc",
                    "refresh_token": "r1",
                    "expires_in": 3600,
                    "user": {
                        "id": USER_ID,
                        "email": body["email"],
                        "user_metadata": {"role": "patient"},
                        "app_metadata": {"role": "doctor"}
                    }
                })),
            )
        }

        async fn user(headers: HeaderMap) -> (StatusCode, Json<Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if auth != "Bearer jwt-abc" {
                return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid JWT"})));
            }
            (
                StatusCode::OK,
                Json(json!({
                    "id": USER_ID,
                    "email": "asha@example.com",
                    "user_metadata": {"role": "patient"}
                })),
            )
        }

        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn sign_in_prefers_app_metadata_role() {
        let auth = SupabaseAuth::new(&spawn_stub().await, "anon").unwrap();
        let session = auth.sign_in("asha@example.com", "secret").await.unwrap();

        assert_eq!(session.access_token, "jwt-abc");
        assert_eq!(session.user.id.to_string(), USER_ID);
        assert_eq!(session.user.role.as_deref(), Some("doctor"));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let auth = SupabaseAuth::new(&spawn_stub().await, "anon").unwrap();
        let err = auth.sign_in("asha@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn token_resolves_to_user() {
        let auth = SupabaseAuth::new(&spawn_stub().await, "anon").unwrap();
        let user = auth.user_for_token("jwt-abc").await.unwrap();
        assert_eq!(user.role.as_deref(), Some("patient"));

        let err = auth.user_for_token("forged").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken));
    }

    #[tokio::test]
    async fn static_identity_checks_password() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some("a@b.c".into()),
            role: Some("admin".into()),
        };
        let identity = StaticIdentity::new().with_user("tok", user.clone(), "pw");

        assert_eq!(identity.user_for_token("tok").await.unwrap(), user);
        assert_eq!(identity.sign_in("a@b.c", "pw").await.unwrap().access_token, "tok");
        assert!(identity.sign_in("a@b.c", "bad").await.is_err());
    }
}

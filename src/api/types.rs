//! Shared types for the HTTP API layer.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::config::{AppConfig, UploadConfig, ROOM_TOKEN_TTL_SECS};
use crate::db::{DataStore, Privilege, RestStore};
use crate::identity::{AuthUser, IdentityProvider, SupabaseAuth};
use crate::models::Role;
use crate::payment::{CashfreeGateway, PaymentGateway};
use crate::video::{VideoRooms, ZegoTokenIssuer};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Everything a handler may call out to. Cloned per request; all members
/// are immutable and shared behind `Arc`.
#[derive(Clone)]
pub struct ApiContext {
    /// Anonymous-key store client, for public listings.
    pub public_store: Arc<dyn DataStore>,
    /// Service-role store client, for writes and role-scoped reads.
    pub service_store: Arc<dyn DataStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    pub video: Arc<dyn VideoRooms>,
    pub uploads: Arc<UploadConfig>,
    pub public_base_url: Arc<str>,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to initialize {component}: {reason}")]
pub struct ContextError {
    pub component: &'static str,
    pub reason: String,
}

impl ContextError {
    fn new(component: &'static str, reason: impl std::fmt::Display) -> Self {
        Self {
            component,
            reason: reason.to_string(),
        }
    }
}

impl ApiContext {
    /// Construct the production clients from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ContextError> {
        let public_store =
            RestStore::new(&config.store.url, &config.store.anon_key, Privilege::Anon)
                .map_err(|e| ContextError::new("public store", e))?;
        let service_store = RestStore::new(
            &config.store.url,
            &config.store.service_role_key,
            Privilege::ServiceRole,
        )
        .map_err(|e| ContextError::new("service store", e))?;
        let identity = SupabaseAuth::new(&config.store.url, &config.store.anon_key)
            .map_err(|e| ContextError::new("identity provider", e))?;
        let payments = CashfreeGateway::new(
            config.payment.environment,
            &config.payment.client_id,
            &config.payment.client_secret,
        )
        .map_err(|e| ContextError::new("payment gateway", e))?;
        let video = ZegoTokenIssuer::new(
            config.video.app_id,
            &config.video.server_secret,
            ROOM_TOKEN_TTL_SECS,
        )
        .map_err(|e| ContextError::new("video rooms", e))?;

        Ok(Self {
            public_store: Arc::new(public_store),
            service_store: Arc::new(service_store),
            identity: Arc::new(identity),
            payments: Arc::new(payments),
            video: Arc::new(video),
            uploads: Arc::new(config.uploads.clone()),
            public_base_url: Arc::from(config.public_base_url.as_str()),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Principal: injected by the auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl Principal {
    /// Reject with 403 unless the caller has one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "{} accounts cannot perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Role carried in the user's metadata. Accounts without a recognized role
/// may authenticate but cannot use any role-gated route.
pub fn role_of(user: &AuthUser) -> Result<Role, ApiError> {
    user.role
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("Account has no role".into()))?
        .parse()
        .map_err(|_| ApiError::Forbidden("Account role is not recognized".into()))
}

/// Handlers taking `Principal` require authentication; `Option<Principal>`
/// makes it optional.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

// ═══════════════════════════════════════════════════════════
// Envelope + request body helpers
// ═══════════════════════════════════════════════════════════

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        data,
    }))
}

/// JSON body whose parse failures become enveloped 400s.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Presence check: `None` or blank → `MissingField`.
pub fn required(field: &'static str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingField(field))
}

pub fn required_id(field: &'static str, value: Option<String>) -> Result<Uuid, ApiError> {
    let raw = required(field, value)?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::BadRequest(format!("{field} is not a valid id")))
}

/// Path segment → id, 400 on garbage.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

pub fn required_date(
    field: &'static str,
    value: Option<String>,
) -> Result<chrono::NaiveDate, ApiError> {
    let raw = required(field, value)?;
    chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field} format (expected YYYY-MM-DD)")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(matches!(required("purpose", None), Err(ApiError::MissingField("purpose"))));
        assert!(matches!(
            required("purpose", Some("   ".into())),
            Err(ApiError::MissingField("purpose"))
        ));
        assert_eq!(required("purpose", Some(" checkup ".into())).unwrap(), "checkup");
    }

    #[test]
    fn required_date_validates_format() {
        assert!(required_date("date", Some("2026-10-20".into())).is_ok());
        assert!(matches!(
            required_date("date", Some("20/10/2026".into())),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn required_id_validates_uuid() {
        assert!(required_id("center_id", Some(Uuid::new_v4().to_string())).is_ok());
        assert!(matches!(
            required_id("center_id", Some("42".into())),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn role_of_reads_metadata_role() {
        let mut user = AuthUser {
            id: Uuid::new_v4(),
            email: None,
            role: Some("health_center".into()),
        };
        assert_eq!(role_of(&user).unwrap(), Role::HealthCenter);

        user.role = Some("superuser".into());
        assert!(matches!(role_of(&user), Err(ApiError::Forbidden(_))));

        user.role = None;
        assert!(matches!(role_of(&user), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn principal_role_gate() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            email: None,
            role: Role::Patient,
        };
        assert!(principal.require(&[Role::Patient, Role::Admin]).is_ok());
        assert!(matches!(
            principal.require(&[Role::Doctor]),
            Err(ApiError::Forbidden(_))
        ));
        assert!(!principal.is_admin());
    }
}

//! Health center directory, profile and schedule endpoints.
//!
//! Listings are enriched with each center's availability and services.
//! The two lookups per center run concurrently, and all centers of a page
//! are enriched concurrently; the response waits for every lookup.

use axum::extract::{Path, Query, State};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::doctors::ApprovalRequest;
use crate::api::error::ApiError;
use crate::api::types::{ok, parse_id, required, ApiContext, ApiResult, Payload, Principal};
use crate::availability::{self, weekday_index};
use crate::db::{repository, DataStore, DatabaseError};
use crate::models::{
    AvailabilitySlot, CenterListing, CenterProfile, CenterService, DatedSlot, HealthCenter, Role,
};

/// Centers per listing page.
pub const PAGE_SIZE: usize = 10;

#[derive(Deserialize)]
pub struct DirectoryQuery {
    pub pincode: Option<String>,
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct CenterPage {
    pub page: usize,
    pub page_size: usize,
    pub centers: Vec<CenterListing>,
}

/// `GET /api/centers?pincode=&page=`: approved centers, 1-based pages.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<DirectoryQuery>,
) -> ApiResult<CenterPage> {
    let page = match query.page.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ApiError::BadRequest("page must be a positive integer".into()))?,
    };
    let pincode = query
        .pincode
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let offset = (page - 1)
        .checked_mul(PAGE_SIZE)
        .ok_or_else(|| ApiError::BadRequest("page is out of range".into()))?;

    let store = ctx.public_store.as_ref();
    let centers = repository::list_approved_centers(store, pincode, offset, PAGE_SIZE).await?;
    let centers = try_join_all(centers.into_iter().map(|center| enrich(store, center))).await?;

    ok(CenterPage {
        page,
        page_size: PAGE_SIZE,
        centers,
    })
}

/// `GET /api/centers/:id`: unapproved centers only for admins and owner.
pub async fn detail(
    State(ctx): State<ApiContext>,
    principal: Option<Principal>,
    Path(id): Path<String>,
) -> ApiResult<CenterListing> {
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound("Health center not found".into());

    let store = ctx.service_store.as_ref();
    let center = repository::find_center(store, id)
        .await?
        .ok_or_else(not_found)?;
    let privileged = principal
        .as_ref()
        .is_some_and(|p| p.is_admin() || p.user_id == center.id);
    if !center.approved && !privileged {
        return Err(not_found());
    }
    ok(enrich(store, center).await?)
}

async fn enrich(
    store: &dyn DataStore,
    center: HealthCenter,
) -> Result<CenterListing, DatabaseError> {
    let (availability, services) = tokio::try_join!(
        repository::list_availability(store, center.id),
        repository::list_services(store, center.id),
    )?;
    Ok(CenterListing {
        center,
        availability,
        services,
    })
}

#[derive(Deserialize)]
pub struct CenterProfileRequest {
    pub name: Option<String>,
    pub pincode: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// `POST /api/centers`: center creates or edits its own profile.
pub async fn upsert_profile(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Payload(body): Payload<CenterProfileRequest>,
) -> ApiResult<HealthCenter> {
    principal.require(&[Role::HealthCenter])?;

    let profile = CenterProfile {
        id: principal.user_id,
        name: required("name", body.name)?,
        pincode: required("pincode", body.pincode)?,
        address: body.address.filter(|a| !a.trim().is_empty()),
        phone: body.phone.filter(|p| !p.trim().is_empty()),
    };

    let center = repository::upsert_center_profile(ctx.service_store.as_ref(), &profile).await?;
    tracing::info!(center_id = %center.id, approved = center.approved, "center profile saved");
    ok(center)
}

/// `GET /api/centers/:id/availability`: weekly slots with their next date.
pub async fn availability(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Vec<DatedSlot>> {
    let slots = repository::list_availability(ctx.public_store.as_ref(), parse_id(&id)?).await?;
    ok(availability::date_slots(availability::today(), slots))
}

#[derive(Deserialize)]
pub struct SlotInput {
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub slots: Option<Vec<SlotInput>>,
}

/// `PUT /api/centers/:id/availability`: owner replaces its weekly slots.
pub async fn replace_availability(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<ReplaceAvailabilityRequest>,
) -> ApiResult<Vec<DatedSlot>> {
    let center_id = owned_center(&principal, &id)?;
    let inputs = body.slots.ok_or(ApiError::MissingField("slots"))?;

    let mut slots = Vec::with_capacity(inputs.len());
    for input in inputs {
        let day = required("day", input.day)?;
        weekday_index(&day)?;
        slots.push(AvailabilitySlot {
            id: None,
            center_id,
            day,
            start_time: required("start_time", input.start_time)?,
            end_time: required("end_time", input.end_time)?,
        });
    }

    let saved =
        repository::replace_availability(ctx.service_store.as_ref(), center_id, &slots).await?;
    tracing::info!(%center_id, slots = saved.len(), "availability replaced");
    ok(availability::date_slots(availability::today(), saved))
}

#[derive(Deserialize)]
pub struct ServiceInput {
    pub name: Option<String>,
    pub price: Option<f64>,
}

#[derive(Deserialize)]
pub struct ReplaceServicesRequest {
    pub services: Option<Vec<ServiceInput>>,
}

/// `PUT /api/centers/:id/services`: owner replaces its service list.
pub async fn replace_services(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<ReplaceServicesRequest>,
) -> ApiResult<Vec<CenterService>> {
    let center_id = owned_center(&principal, &id)?;
    let inputs = body.services.ok_or(ApiError::MissingField("services"))?;

    let mut services = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(ApiError::BadRequest("price must be a non-negative number".into()));
        }
        services.push(CenterService {
            id: None,
            center_id,
            name: required("name", input.name)?,
            price: input.price,
        });
    }

    let saved =
        repository::replace_services(ctx.service_store.as_ref(), center_id, &services).await?;
    tracing::info!(%center_id, services = saved.len(), "services replaced");
    ok(saved)
}

/// `PATCH /api/centers/:id/approval`: admin only.
pub async fn set_approval(
    State(ctx): State<ApiContext>,
    principal: Principal,
    Path(id): Path<String>,
    Payload(body): Payload<ApprovalRequest>,
) -> ApiResult<HealthCenter> {
    principal.require(&[Role::Admin])?;
    let approved = body.approved.ok_or(ApiError::MissingField("approved"))?;

    let center =
        repository::set_center_approval(ctx.service_store.as_ref(), parse_id(&id)?, approved)
            .await?;
    tracing::info!(
        center_id = %center.id,
        approved,
        admin = %principal.user_id,
        "center approval set"
    );
    ok(center)
}

/// Center id from the path, which must be the caller's own center.
fn owned_center(principal: &Principal, raw_id: &str) -> Result<Uuid, ApiError> {
    principal.require(&[Role::HealthCenter])?;
    let center_id = parse_id(raw_id)?;
    if center_id != principal.user_id {
        return Err(ApiError::Forbidden("Not your health center".into()));
    }
    Ok(center_id)
}

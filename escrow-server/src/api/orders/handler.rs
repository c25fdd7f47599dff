//! Escrow Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::core::error::{Result, ServerError};
use crate::core::ServerState;
use crate::escrow::CreateOrderInput;
use shared::order::{DisputeEvidence, EscrowOrder, TrackingEvent, UserRole};
use shared::util::now_millis;

fn validated<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(|e| ServerError::Validation(e.to_string()))
}

/// Create order request (arrives after the external charge succeeded)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub product_id: i64,
    #[validate(length(min = 1, max = 256))]
    pub product_title: String,
    pub product_image: Option<String>,
    #[validate(length(min = 1))]
    pub buyer_id: String,
    #[validate(length(min = 1, max = 128))]
    pub buyer_name: String,
    #[validate(length(min = 1))]
    pub seller_id: String,
    #[validate(length(min = 1, max = 128))]
    pub seller_name: String,
    pub price: Decimal,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 256))]
    pub charity_name: String,
    #[validate(range(min = 0, max = 100))]
    pub donation_percent: i32,
}

/// Create an order with payment confirmed
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<EscrowOrder>> {
    validated(&payload)?;
    let order = state
        .order_service()
        .create_order(CreateOrderInput {
            product_id: payload.product_id,
            product_title: payload.product_title,
            product_image: payload.product_image,
            buyer_id: payload.buyer_id,
            buyer_name: payload.buyer_name,
            seller_id: payload.seller_id,
            seller_name: payload.seller_name,
            price: payload.price,
            quantity: payload.quantity,
            charity_name: payload.charity_name,
            donation_percent: payload.donation_percent,
        })
        .await?;
    Ok(Json(order))
}

/// Query params for listing a user's orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: String,
    pub role: UserRole,
}

/// List orders where the user participates under the given role
pub async fn list_by_user(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<EscrowOrder>>> {
    if query.user_id.trim().is_empty() {
        return Err(ServerError::Validation("user_id is required".to_string()));
    }
    let orders = state
        .order_service()
        .get_orders_by_user(&query.user_id, query.role)
        .await?;
    Ok(Json(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().get_order(&id).await?;
    Ok(Json(order))
}

/// Add tracking request
#[derive(Debug, Deserialize, Validate)]
pub struct AddTrackingRequest {
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: String,
    #[validate(length(min = 1, max = 64))]
    pub carrier: String,
}

/// Seller registers the shipment tracking number
pub async fn add_tracking(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AddTrackingRequest>,
) -> Result<Json<EscrowOrder>> {
    validated(&payload)?;
    let order = state
        .order_service()
        .add_tracking_info(&id, &payload.tracking_number, &payload.carrier)
        .await?;
    Ok(Json(order))
}

/// Carrier scan event request
#[derive(Debug, Deserialize, Validate)]
pub struct TrackingEventRequest {
    /// Scan timestamp (Unix millis); defaults to server time
    pub timestamp: Option<i64>,
    #[validate(length(min = 1, max = 64))]
    pub status: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Append a carrier scan to the tracking history
pub async fn append_tracking_event(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TrackingEventRequest>,
) -> Result<Json<EscrowOrder>> {
    validated(&payload)?;
    let scan = TrackingEvent {
        timestamp: payload.timestamp.unwrap_or_else(now_millis),
        status: payload.status,
        location: payload.location,
        description: payload.description,
    };
    let order = state
        .order_service()
        .append_tracking_event(&id, scan)
        .await?;
    Ok(Json(order))
}

/// Confirm delivery (carrier webhook or buyer confirmation)
pub async fn mark_delivered(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().mark_delivered(&id).await?;
    Ok(Json(order))
}

/// Dispute report request
#[derive(Debug, Deserialize, Validate)]
pub struct ReportIssueRequest {
    #[validate(length(min = 1, max = 64))]
    pub reason: String,
    #[validate(length(min = 1, max = 4096))]
    pub description: String,
    #[serde(default)]
    pub photo_refs: Vec<String>,
}

/// Buyer reports an issue inside the inspection window
pub async fn report_issue(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ReportIssueRequest>,
) -> Result<Json<EscrowOrder>> {
    validated(&payload)?;
    let order = state
        .order_service()
        .report_issue(
            &id,
            DisputeEvidence {
                reason: payload.reason,
                description: payload.description,
                photo_refs: payload.photo_refs,
            },
        )
        .await?;
    Ok(Json(order))
}

/// Move a reported dispute into review
pub async fn start_dispute_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().start_dispute_review(&id).await?;
    Ok(Json(order))
}

/// Approve a return for a disputed order
pub async fn approve_return(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().approve_return(&id).await?;
    Ok(Json(order))
}

/// Return tracking request
#[derive(Debug, Deserialize, Validate)]
pub struct ReturnTrackingRequest {
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: String,
}

/// Buyer registers the return shipment tracking number
pub async fn add_return_tracking(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ReturnTrackingRequest>,
) -> Result<Json<EscrowOrder>> {
    validated(&payload)?;
    let order = state
        .order_service()
        .add_return_tracking(&id, &payload.tracking_number)
        .await?;
    Ok(Json(order))
}

/// Release escrowed funds to the seller and complete the order
pub async fn release_escrow(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().release_escrow(&id).await?;
    Ok(Json(order))
}

/// Refund the buyer
pub async fn refund_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowOrder>> {
    let order = state.order_service().refund_order(&id).await?;
    Ok(Json(order))
}

//! Bill handlers for students and admins.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use uuid::Uuid;

use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::bill::{Bill, NewBill};
use dormhub_storage::UploadCategory;

use crate::dto::request::{BillQuery, BillStatusRequest, PaymentDto, ReturnBillRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::handlers::uploads::store_single;
use crate::state::AppState;

/// GET /api/{students|admin}/bills
pub async fn list_bills(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BillQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Bill>>>, ApiError> {
    let bills = state
        .billing_service
        .list(
            &auth,
            query.student_id,
            query.status,
            params.into_page_request(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(bills)))
}

/// GET /api/{students|admin}/bills/{id}
pub async fn get_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let bill = state.billing_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(bill)))
}

/// POST /api/students/bills/{id}/pay and POST /api/admin/bills/{id}/payments
pub async fn pay_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<PaymentDto>,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let bill = state.billing_service.pay(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(bill)))
}

/// POST /api/students/bills/{id}/receipt
pub async fn upload_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let previous = state.billing_service.get(&auth, id).await?.receipt_path;

    let stored = store_single(&state, UploadCategory::Receipts, multipart).await?;
    match state
        .billing_service
        .attach_receipt(&auth, id, stored.path.clone())
        .await
    {
        Ok(bill) => {
            if let Some(old) = previous {
                state.upload_service.discard(&old).await;
            }
            Ok(Json(ApiResponse::ok(bill)))
        }
        Err(e) => {
            state.upload_service.discard(&stored.path).await;
            Err(e.into())
        }
    }
}

/// POST /api/admin/bills
pub async fn create_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewBill>,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let bill = state.billing_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(bill)))
}

/// PUT /api/admin/bills/{id}/status
pub async fn update_bill_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<BillStatusRequest>,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let bill = state
        .billing_service
        .update_status(&auth, id, req.status, req.notes)
        .await?;
    Ok(Json(ApiResponse::ok(bill)))
}

/// POST /api/admin/bills/{id}/return
pub async fn return_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ReturnBillRequest>>,
) -> Result<Json<ApiResponse<Bill>>, ApiError> {
    let reason = body.and_then(|Json(req)| req.reason);
    let bill = state
        .billing_service
        .return_to_student(&auth, id, reason)
        .await?;
    Ok(Json(ApiResponse::ok(bill)))
}

/// DELETE /api/admin/bills/{id}
pub async fn delete_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.billing_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Bill deleted"))))
}

// InstallmentController: HTTP handlers for student fee schedules
//
// Endpoints:
// - GET   /student-fees/{id}              - Ledger and installments
// - GET   /student-fees/{id}/summary      - Fee summary
// - POST  /student-fees/{id}/materialize  - Create the schedule from the batch plan
// - PATCH /student-fees/{id}/statuses     - Batch of status changes
// - PATCH /student-fees/{id}/schedule     - Administrator edit
// - POST  /student-fees/{id}/settle       - Mark the first N installments paid
// - POST  /student-fees/{id}/overdue      - Overdue sweep
// - POST  /student-fees/{id}/recompute    - Balance recompute

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::middleware::AdminCapability;
use crate::modules::installments::models::{
    Installment, ScheduleEdit, ScheduleState, StatusUpdate,
};
use crate::state::AppState;

/// Response for a single installment
#[derive(Debug, Serialize)]
pub struct InstallmentResponse {
    pub id: String,
    pub sequence: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub repayment_period_days: u32,
}

impl From<Installment> for InstallmentResponse {
    fn from(installment: Installment) -> Self {
        Self {
            id: installment.id,
            sequence: installment.sequence,
            due_date: installment.due_date,
            amount: installment.amount,
            status: installment.status.to_string(),
            payment_date: installment.payment_date,
            repayment_period_days: installment.repayment_period_days,
        }
    }
}

/// Ledger together with its schedule
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub student_fee_id: String,
    pub batch_id: String,
    pub user_id: i64,
    pub remaining_amount: Decimal,
    pub installments: Vec<InstallmentResponse>,
}

impl From<ScheduleState> for ScheduleResponse {
    fn from(state: ScheduleState) -> Self {
        Self {
            student_fee_id: state.ledger.id,
            batch_id: state.ledger.batch_id,
            user_id: state.ledger.user_id,
            remaining_amount: state.ledger.remaining_amount,
            installments: state
                .installments
                .into_iter()
                .map(InstallmentResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MaterializeResponse {
    pub student_fee_id: String,
    pub materialized: bool,
    pub installments: Vec<InstallmentResponse>,
}

/// Request for PATCH /student-fees/{id}/statuses
#[derive(Debug, Deserialize)]
pub struct UpdateStatusesRequest {
    pub updates: Vec<StatusUpdate>,
}

/// Request for POST /student-fees/{id}/settle
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub paid_count: u32,
}

pub async fn get_schedule(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state.installments.get_schedule(&student_fee_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn get_summary(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let summary = state.installments.summary(&student_fee_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// 201 when installments were created, 200 when the schedule already existed
///
/// The anchor is the student's enrollment date in the batch's course.
pub async fn materialize(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let outcome = state
        .franchises
        .materialize_student_schedule(&student_fee_id)
        .await?;

    let materialized = outcome.was_materialized();
    let response = MaterializeResponse {
        student_fee_id: student_fee_id.into_inner(),
        materialized,
        installments: outcome
            .into_installments()
            .into_iter()
            .map(InstallmentResponse::from)
            .collect(),
    };

    Ok(if materialized {
        HttpResponse::Created().json(response)
    } else {
        HttpResponse::Ok().json(response)
    })
}

pub async fn update_statuses(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    request: web::Json<UpdateStatusesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state
        .installments
        .update_statuses(&student_fee_id, request.into_inner().updates)
        .await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn edit_schedule(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    request: web::Json<ScheduleEdit>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state
        .installments
        .edit_schedule(&student_fee_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn settle_paid_count(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    request: web::Json<SettleRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state
        .installments
        .settle_paid_count(&student_fee_id, request.paid_count)
        .await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn mark_overdue(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state.installments.mark_overdue(&student_fee_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn recompute(
    _admin: AdminCapability,
    student_fee_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state.installments.recompute(&student_fee_id).await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

/// Configure installment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/student-fees/{student_fee_id}")
            .route("", web::get().to(get_schedule))
            .route("/summary", web::get().to(get_summary))
            .route("/materialize", web::post().to(materialize))
            .route("/statuses", web::patch().to(update_statuses))
            .route("/schedule", web::patch().to(edit_schedule))
            .route("/settle", web::post().to(settle_paid_count))
            .route("/overdue", web::post().to(mark_overdue))
            .route("/recompute", web::post().to(recompute)),
    );
}

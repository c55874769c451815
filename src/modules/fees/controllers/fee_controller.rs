// FeeController: HTTP handlers for batch fee ledgers
//
// Endpoints:
// - GET  /batches/{batch_id}/fees                 - Batch fee ledger (created if absent)
// - PUT  /batches/{batch_id}/fees                 - Set total fee and discount
// - PUT  /batches/{batch_id}/fees/defaults        - Set installment defaults
// - GET  /batches/{batch_id}/fees/templates       - Installment plan
// - PUT  /batches/{batch_id}/fees/templates       - Replace the installment plan
// - POST /batches/{batch_id}/fees/recompute       - Recompute every student balance
// - POST /batches/{batch_id}/fees/overdue-sweep   - Mark past-due installments overdue

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::middleware::AdminCapability;
use crate::modules::fees::models::{BatchFeeLedger, InstallmentTemplate, TemplateInput};
use crate::state::AppState;

/// Request for PUT /batches/{batch_id}/fees
#[derive(Debug, Deserialize)]
pub struct SetFeesRequest {
    pub total_fee: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

/// Request for PUT /batches/{batch_id}/fees/defaults
#[derive(Debug, Deserialize)]
pub struct SetDefaultsRequest {
    pub installment_amount: Decimal,
    pub repayment_period_days: u32,
}

/// Request for PUT /batches/{batch_id}/fees/templates
#[derive(Debug, Deserialize)]
pub struct ReplaceTemplatesRequest {
    pub templates: Vec<TemplateInput>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub batch_id: String,
    pub plan_total: Decimal,
    pub templates: Vec<InstallmentTemplate>,
}

impl TemplatesResponse {
    fn new(batch_id: String, templates: Vec<InstallmentTemplate>) -> Self {
        Self {
            batch_id,
            plan_total: InstallmentTemplate::plan_total(&templates),
            templates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchSweepResponse {
    pub batch_id: String,
    pub ledgers_updated: usize,
}

pub async fn get_batch_fees(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ledger: BatchFeeLedger = state.fees.ensure_batch_ledger(&batch_id).await?.into_inner();
    Ok(HttpResponse::Ok().json(ledger))
}

pub async fn set_batch_fees(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    request: web::Json<SetFeesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ledger = state
        .fees
        .set_fees(&batch_id, request.total_fee, request.discount)
        .await?;
    Ok(HttpResponse::Ok().json(ledger))
}

pub async fn set_installment_defaults(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    request: web::Json<SetDefaultsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ledger = state
        .fees
        .set_installment_defaults(
            &batch_id,
            request.installment_amount,
            request.repayment_period_days,
        )
        .await?;
    Ok(HttpResponse::Ok().json(ledger))
}

pub async fn get_templates(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let templates = state.fees.list_templates(&batch_id).await?;
    Ok(HttpResponse::Ok().json(TemplatesResponse::new(batch_id.into_inner(), templates)))
}

/// Validates the whole plan before replacing the stored one
pub async fn replace_templates(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    request: web::Json<ReplaceTemplatesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let templates = state
        .fees
        .replace_templates(&batch_id, &request.templates)
        .await?;
    Ok(HttpResponse::Ok().json(TemplatesResponse::new(batch_id.into_inner(), templates)))
}

pub async fn recompute_batch(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ledgers_updated = state.installments.recompute_batch(&batch_id).await?;
    Ok(HttpResponse::Ok().json(BatchSweepResponse {
        batch_id: batch_id.into_inner(),
        ledgers_updated,
    }))
}

pub async fn overdue_sweep(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ledgers_updated = state.installments.mark_overdue_batch(&batch_id).await?;
    Ok(HttpResponse::Ok().json(BatchSweepResponse {
        batch_id: batch_id.into_inner(),
        ledgers_updated,
    }))
}

/// Configure fee routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/batches/{batch_id}/fees")
            .route("", web::get().to(get_batch_fees))
            .route("", web::put().to(set_batch_fees))
            .route("/defaults", web::put().to(set_installment_defaults))
            .route("/templates", web::get().to(get_templates))
            .route("/templates", web::put().to(replace_templates))
            .route("/recompute", web::post().to(recompute_batch))
            .route("/overdue-sweep", web::post().to(overdue_sweep)),
    );
}

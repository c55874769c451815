use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::core::Result;
use crate::middleware::AdminCapability;
use crate::modules::reports::models::{BatchFeeLine, FranchiseFeeReport};
use crate::state::AppState;

/// Response for GET /franchises/{franchise_id}/fee-report
///
/// Amounts are rendered as strings to keep decimal precision in JSON.
#[derive(Debug, Serialize)]
pub struct FranchiseFeeReportResponse {
    pub franchise_id: String,
    pub franchise_name: String,
    pub generated_on: String, // Format: YYYY-MM-DD
    pub batches: Vec<BatchFeeLineResponse>,
    pub totals: FeeTotalsResponse,
}

#[derive(Debug, Serialize)]
pub struct BatchFeeLineResponse {
    pub batch_id: String,
    pub batch_name: String,
    pub student_count: i64,
    pub expected_total: String,
    pub collected: String,
    pub outstanding: String,
}

#[derive(Debug, Serialize)]
pub struct FeeTotalsResponse {
    pub student_count: i64,
    pub expected_total: String,
    pub collected: String,
    pub outstanding: String,
}

impl From<BatchFeeLine> for BatchFeeLineResponse {
    fn from(line: BatchFeeLine) -> Self {
        Self {
            batch_id: line.batch_id,
            batch_name: line.batch_name,
            student_count: line.student_count,
            expected_total: line.expected_total.to_string(),
            collected: line.collected.to_string(),
            outstanding: line.outstanding.to_string(),
        }
    }
}

impl From<FranchiseFeeReport> for FranchiseFeeReportResponse {
    fn from(report: FranchiseFeeReport) -> Self {
        Self {
            franchise_id: report.franchise_id,
            franchise_name: report.franchise_name,
            generated_on: report.generated_on.format("%Y-%m-%d").to_string(),
            batches: report
                .batches
                .into_iter()
                .map(BatchFeeLineResponse::from)
                .collect(),
            totals: FeeTotalsResponse {
                student_count: report.totals.student_count,
                expected_total: report.totals.expected_total.to_string(),
                collected: report.totals.collected.to_string(),
                outstanding: report.totals.outstanding.to_string(),
            },
        }
    }
}

/// GET /franchises/{franchise_id}/fee-report
///
/// Expected, collected and outstanding fees for every batch of the franchise.
pub async fn franchise_fee_report(
    _admin: AdminCapability,
    franchise_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let report = state.reports.franchise_fee_report(&franchise_id).await?;
    Ok(HttpResponse::Ok().json(FranchiseFeeReportResponse::from(report)))
}

/// Configure routes for reports module
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/franchises/{franchise_id}/fee-report")
            .route(web::get().to(franchise_fee_report)),
    );
}

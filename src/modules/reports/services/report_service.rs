use std::sync::Arc;

use tracing::info;

use crate::core::{Clock, Result};
use crate::modules::franchises::services::FranchiseService;
use crate::modules::reports::models::FranchiseFeeReport;
use crate::modules::reports::repositories::ReportRepository;

/// Builds franchise fee reports
#[derive(Clone)]
pub struct ReportService {
    repository: Arc<dyn ReportRepository>,
    franchises: FranchiseService,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        repository: Arc<dyn ReportRepository>,
        franchises: FranchiseService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            franchises,
            clock,
        }
    }

    /// Expected, collected and outstanding fees per batch of the franchise
    pub async fn franchise_fee_report(&self, franchise_id: &str) -> Result<FranchiseFeeReport> {
        let franchise = self.franchises.get_franchise(franchise_id).await?;
        let lines = self.repository.batch_fee_lines(&franchise.id).await?;

        let report = FranchiseFeeReport::new(franchise.id, franchise.name, self.clock.today(), lines);

        info!(
            franchise_id,
            batches = report.batches.len(),
            outstanding = %report.totals.outstanding,
            "Franchise fee report generated"
        );

        Ok(report)
    }
}

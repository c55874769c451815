// FeeService: batch fee ledger operations
//
// Implements:
// - Ensure-exists for a batch's ledger (created with zero defaults)
// - Setting total fee and discount (remaining amount re-derived on every save)
// - Informational installment defaults
// - Transactional replacement of the installment template list

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::{AppError, Clock, Ensured, Result};
use crate::modules::fees::{
    models::{BatchFeeLedger, InstallmentTemplate, TemplateInput},
    repositories::FeeRepository,
};

/// Service for batch fee ledgers
#[derive(Clone)]
pub struct FeeService {
    repository: Arc<dyn FeeRepository>,
    clock: Arc<dyn Clock>,
}

impl FeeService {
    pub fn new(repository: Arc<dyn FeeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Returns the batch's ledger, creating it with zero defaults if absent
    pub async fn ensure_batch_ledger(&self, batch_id: &str) -> Result<Ensured<BatchFeeLedger>> {
        let ensured = self
            .repository
            .ensure_ledger(BatchFeeLedger::new(batch_id, self.clock.now()))
            .await?;

        if ensured.was_created() {
            info!(batch_id, ledger_id = ensured.get().id.as_str(), "Batch fee ledger created");
        }

        Ok(ensured)
    }

    /// Looks up the ledger without creating it
    pub async fn get_batch_ledger(&self, batch_id: &str) -> Result<BatchFeeLedger> {
        self.repository
            .find_by_batch(batch_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Fee ledger for batch {} not found", batch_id))
            })
    }

    pub async fn get_ledger_by_id(&self, id: &str) -> Result<BatchFeeLedger> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch fee ledger {} not found", id)))
    }

    /// Sets total fee and discount; the remaining amount follows
    pub async fn set_fees(
        &self,
        batch_id: &str,
        total_fee: Decimal,
        discount: Decimal,
    ) -> Result<BatchFeeLedger> {
        let mut ledger = self.ensure_batch_ledger(batch_id).await?.into_inner();

        ledger.set_fees(total_fee, discount, self.clock.now())?;
        let ledger = self.repository.update_fees(&ledger).await?;

        info!(
            batch_id,
            total_fee = %ledger.total_fee,
            discount = %ledger.discount,
            remaining_amount = %ledger.remaining_amount,
            "Batch fees updated"
        );

        Ok(ledger)
    }

    pub async fn set_installment_defaults(
        &self,
        batch_id: &str,
        installment_amount: Decimal,
        repayment_period_days: u32,
    ) -> Result<BatchFeeLedger> {
        let mut ledger = self.ensure_batch_ledger(batch_id).await?.into_inner();

        ledger.set_installment_defaults(
            installment_amount,
            repayment_period_days,
            self.clock.now(),
        )?;

        self.repository.update_installment_defaults(&ledger).await
    }

    /// Replaces the batch's installment plan
    ///
    /// The whole list is validated before anything is written, then the old
    /// templates are deleted and the new ones inserted in one transaction.
    pub async fn replace_templates(
        &self,
        batch_id: &str,
        inputs: &[TemplateInput],
    ) -> Result<Vec<InstallmentTemplate>> {
        let ledger = self.ensure_batch_ledger(batch_id).await?.into_inner();

        let templates = InstallmentTemplate::build_plan(&ledger.id, inputs, self.clock.now())?;
        self.repository
            .replace_templates(&ledger.id, &templates)
            .await?;

        let plan_total = InstallmentTemplate::plan_total(&templates);
        if plan_total != ledger.remaining_amount {
            tracing::warn!(
                batch_id,
                plan_total = %plan_total,
                remaining_amount = %ledger.remaining_amount,
                "Installment plan does not add up to the batch remaining amount"
            );
        }

        info!(
            batch_id,
            template_count = templates.len(),
            "Installment templates replaced"
        );

        Ok(templates)
    }

    /// Templates of the batch in plan order; empty when the batch has no ledger yet
    pub async fn list_templates(&self, batch_id: &str) -> Result<Vec<InstallmentTemplate>> {
        match self.repository.find_by_batch(batch_id).await? {
            Some(ledger) => self.repository.list_templates(&ledger.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_templates_for_ledger(
        &self,
        batch_fee_id: &str,
    ) -> Result<Vec<InstallmentTemplate>> {
        self.repository.list_templates(batch_fee_id).await
    }
}

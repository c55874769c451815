// FeeRepository: batch fee ledgers and installment templates
//
// Implements:
// - Ensure one ledger per batch (insert-if-absent on the unique batch_id key)
// - Targeted updates of the fee columns and of the installment defaults
// - Replace a batch's template list in one transaction

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Ensured, Result};
use crate::modules::fees::models::{BatchFeeLedger, InstallmentTemplate};

/// Persistence seam for batch fee ledgers
#[async_trait]
pub trait FeeRepository: Send + Sync {
    /// Inserts `ledger` unless the batch already has one
    ///
    /// Returns the stored ledger either way. Fails with `NotFound` when the
    /// batch does not exist.
    async fn ensure_ledger(&self, ledger: BatchFeeLedger) -> Result<Ensured<BatchFeeLedger>>;

    async fn find_by_batch(&self, batch_id: &str) -> Result<Option<BatchFeeLedger>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<BatchFeeLedger>>;

    /// Writes total fee, discount and remaining amount only; returns the stored ledger
    async fn update_fees(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger>;

    /// Writes the installment defaults only; returns the stored ledger
    async fn update_installment_defaults(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger>;

    /// Deletes every template of the ledger and inserts `templates`, atomically
    async fn replace_templates(
        &self,
        batch_fee_id: &str,
        templates: &[InstallmentTemplate],
    ) -> Result<()>;

    /// Templates ordered by position
    async fn list_templates(&self, batch_fee_id: &str) -> Result<Vec<InstallmentTemplate>>;
}

/// MySQL implementation
pub struct MySqlFeeRepository {
    pool: MySqlPool,
}

impl MySqlFeeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Reads the ledger inside `tx`, after this transaction's own writes
    async fn fetch_in(tx: &mut Transaction<'_, MySql>, id: &str) -> Result<BatchFeeLedger> {
        sqlx::query_as::<_, BatchFeeLedgerRow>(&format!(
            "SELECT {} FROM batch_fee_ledgers WHERE id = ?",
            LEDGER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .map(BatchFeeLedger::from)
        .ok_or_else(|| AppError::not_found(format!("Batch fee ledger {} not found", id)))
    }
}

const LEDGER_COLUMNS: &str = "id, batch_id, total_fee, discount, remaining_amount, \
     installment_amount, repayment_period_days, created_at, updated_at";

#[async_trait]
impl FeeRepository for MySqlFeeRepository {
    async fn ensure_ledger(&self, ledger: BatchFeeLedger) -> Result<Ensured<BatchFeeLedger>> {
        // INSERT IGNORE also swallows the foreign key failure for an unknown
        // batch; the follow-up lookup turns that into NotFound.
        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO batch_fee_ledgers (
                id, batch_id, total_fee, discount, remaining_amount,
                installment_amount, repayment_period_days, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ledger.id)
        .bind(&ledger.batch_id)
        .bind(ledger.total_fee)
        .bind(ledger.discount)
        .bind(ledger.remaining_amount)
        .bind(ledger.installment_amount)
        .bind(ledger.repayment_period_days)
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let stored = self
            .find_by_batch(&ledger.batch_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {} not found", ledger.batch_id)))?;

        Ok(if inserted {
            Ensured::Created(stored)
        } else {
            Ensured::Existing(stored)
        })
    }

    async fn find_by_batch(&self, batch_id: &str) -> Result<Option<BatchFeeLedger>> {
        let row = sqlx::query_as::<_, BatchFeeLedgerRow>(&format!(
            "SELECT {} FROM batch_fee_ledgers WHERE batch_id = ?",
            LEDGER_COLUMNS
        ))
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BatchFeeLedger::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BatchFeeLedger>> {
        let row = sqlx::query_as::<_, BatchFeeLedgerRow>(&format!(
            "SELECT {} FROM batch_fee_ledgers WHERE id = ?",
            LEDGER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BatchFeeLedger::from))
    }

    async fn update_fees(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE batch_fee_ledgers
            SET total_fee = ?, discount = ?, remaining_amount = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ledger.total_fee)
        .bind(ledger.discount)
        .bind(ledger.remaining_amount)
        .bind(ledger.updated_at)
        .bind(&ledger.id)
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_in(&mut tx, &ledger.id).await?;
        tx.commit().await?;

        Ok(stored)
    }

    async fn update_installment_defaults(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE batch_fee_ledgers
            SET installment_amount = ?, repayment_period_days = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ledger.installment_amount)
        .bind(ledger.repayment_period_days)
        .bind(ledger.updated_at)
        .bind(&ledger.id)
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_in(&mut tx, &ledger.id).await?;
        tx.commit().await?;

        Ok(stored)
    }

    async fn replace_templates(
        &self,
        batch_fee_id: &str,
        templates: &[InstallmentTemplate],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Lock the ledger so concurrent replacements serialize
        let locked: Option<(String,)> =
            sqlx::query_as("SELECT id FROM batch_fee_ledgers WHERE id = ? FOR UPDATE")
                .bind(batch_fee_id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Err(AppError::not_found("Batch fee ledger not found"));
        }

        sqlx::query("DELETE FROM installment_templates WHERE batch_fee_id = ?")
            .bind(batch_fee_id)
            .execute(&mut *tx)
            .await?;

        for template in templates {
            sqlx::query(
                r#"
                INSERT INTO installment_templates (
                    id, batch_fee_id, position, amount, repayment_period_days, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&template.id)
            .bind(batch_fee_id)
            .bind(template.position)
            .bind(template.amount)
            .bind(template.repayment_period_days)
            .bind(template.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_templates(&self, batch_fee_id: &str) -> Result<Vec<InstallmentTemplate>> {
        let rows = sqlx::query_as::<_, InstallmentTemplateRow>(
            r#"
            SELECT id, batch_fee_id, position, amount, repayment_period_days, created_at
            FROM installment_templates
            WHERE batch_fee_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(batch_fee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InstallmentTemplate::from).collect())
    }
}

/// Database row for batch_fee_ledgers
#[derive(sqlx::FromRow)]
struct BatchFeeLedgerRow {
    id: String,
    batch_id: String,
    total_fee: Decimal,
    discount: Decimal,
    remaining_amount: Decimal,
    installment_amount: Decimal,
    repayment_period_days: u32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<BatchFeeLedgerRow> for BatchFeeLedger {
    fn from(row: BatchFeeLedgerRow) -> Self {
        Self {
            id: row.id,
            batch_id: row.batch_id,
            total_fee: row.total_fee,
            discount: row.discount,
            remaining_amount: row.remaining_amount,
            installment_amount: row.installment_amount,
            repayment_period_days: row.repayment_period_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for installment_templates
#[derive(sqlx::FromRow)]
struct InstallmentTemplateRow {
    id: String,
    batch_fee_id: String,
    position: u32,
    amount: Decimal,
    repayment_period_days: u32,
    created_at: NaiveDateTime,
}

impl From<InstallmentTemplateRow> for InstallmentTemplate {
    fn from(row: InstallmentTemplateRow) -> Self {
        Self {
            id: row.id,
            batch_fee_id: row.batch_fee_id,
            position: row.position,
            amount: row.amount,
            repayment_period_days: row.repayment_period_days,
            created_at: row.created_at,
        }
    }
}

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::reports::models::BatchFeeLine;

/// Aggregation queries for fee reports
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// One line per batch of the franchise, ordered by start date
    async fn batch_fee_lines(&self, franchise_id: &str) -> Result<Vec<BatchFeeLine>>;
}

pub struct MySqlReportRepository {
    pool: MySqlPool,
}

impl MySqlReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn batch_fee_lines(&self, franchise_id: &str) -> Result<Vec<BatchFeeLine>> {
        let rows = sqlx::query_as::<_, BatchFeeLineRow>(
            r#"
            SELECT
                b.id AS batch_id,
                b.name AS batch_name,
                COUNT(s.id) AS student_count,
                COALESCE(MAX(f.remaining_amount), 0) * COUNT(s.id) AS expected_total,
                COALESCE(SUM(p.paid), 0) AS collected
            FROM batches b
            LEFT JOIN batch_fee_ledgers f ON f.batch_id = b.id
            LEFT JOIN student_fee_ledgers s ON s.batch_fee_id = f.id
            LEFT JOIN (
                SELECT student_fee_id, SUM(amount) AS paid
                FROM installments
                WHERE status = 'paid'
                GROUP BY student_fee_id
            ) p ON p.student_fee_id = s.id
            WHERE b.franchise_id = ?
            GROUP BY b.id, b.name, b.start_date
            ORDER BY b.start_date ASC, b.name ASC
            "#,
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                BatchFeeLine::new(
                    row.batch_id,
                    row.batch_name,
                    row.student_count,
                    row.expected_total,
                    row.collected,
                )
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct BatchFeeLineRow {
    batch_id: String,
    batch_name: String,
    student_count: i64,
    expected_total: Decimal,
    collected: Decimal,
}

// MySQL repository tests
//
// Same flows as the MemoryStore tests, against a real database. Ignored
// unless TEST_DATABASE_URL points at a MySQL server.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use franchise_fees::core::{AppError, Clock, FixedClock, Result};
use franchise_fees::modules::enrollments::repositories::{
    CourseEnrollmentStore, MySqlCourseEnrollmentStore,
};
use franchise_fees::modules::franchises::models::RegistrationInput;
use franchise_fees::modules::installments::models::{
    InstallmentChange, InstallmentStatus, MaterializeOutcome, ScheduleEdit,
};
use franchise_fees::{AppState, Repositories};
use helpers::{create_test_pool, date, TestDataFactory};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn mysql_state() -> AppState {
    let pool = create_test_pool().await;
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(date(2024, 1, 1)));
    AppState::new(Repositories::mysql(&pool), clock, false)
}

/// User ids that do not collide across runs against the same database
fn test_user_id() -> i64 {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as i64 + 1_000_000
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_enrollment_and_payment_roundtrip() -> Result<()> {
    let state = mysql_state().await;

    let franchise = state
        .franchises
        .register_franchise(&TestDataFactory::franchise_input())
        .await?;
    let batch = state
        .franchises
        .create_batch(&franchise.id, &TestDataFactory::new_batch())
        .await?
        .batch;

    state.fees.set_fees(&batch.id, dec!(1000), dec!(100)).await?;
    state
        .fees
        .replace_templates(&batch.id, &TestDataFactory::even_plan(3, dec!(300), 30))
        .await?;

    let user_id = test_user_id();
    let enrollment = state.franchises.enroll_student(&batch.id, user_id).await?;
    assert!(enrollment.schedule.was_materialized());
    assert_eq!(enrollment.ledger.get().remaining_amount, dec!(900));

    let again = state.franchises.enroll_student(&batch.id, user_id).await?;
    assert!(!again.membership.was_created());
    assert!(!again.schedule.was_materialized());

    let ledger_id = enrollment.ledger.get().id.clone();
    let settled = state.installments.settle_paid_count(&ledger_id, 1).await?;
    assert_eq!(settled.ledger.remaining_amount, dec!(600));
    assert_eq!(settled.installments[0].status, InstallmentStatus::Paid);

    let reloaded = state.installments.get_schedule(&ledger_id).await?;
    assert_eq!(reloaded.ledger.remaining_amount, dec!(600));
    assert_eq!(
        reloaded.installments.iter().map(|i| i.due_date).collect::<Vec<_>>(),
        vec![date(2024, 1, 31), date(2024, 3, 1), date(2024, 3, 31)]
    );

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_rejected_edit_rolls_back() -> Result<()> {
    let state = mysql_state().await;

    let franchise = state
        .franchises
        .register_franchise(&TestDataFactory::franchise_input())
        .await?;
    let batch = state
        .franchises
        .create_batch(&franchise.id, &TestDataFactory::new_batch())
        .await?
        .batch;
    state.fees.set_fees(&batch.id, dec!(600), Decimal::ZERO).await?;
    state
        .fees
        .replace_templates(&batch.id, &TestDataFactory::even_plan(2, dec!(300), 30))
        .await?;

    let enrollment = state
        .franchises
        .enroll_student(&batch.id, test_user_id())
        .await?;
    let ledger_id = enrollment.ledger.get().id.clone();
    let before = state.installments.get_schedule(&ledger_id).await?;

    let err = state
        .installments
        .edit_schedule(
            &ledger_id,
            ScheduleEdit {
                changes: vec![
                    InstallmentChange {
                        installment_id: before.installments[0].id.clone(),
                        status: Some(InstallmentStatus::Paid),
                        ..Default::default()
                    },
                    InstallmentChange {
                        installment_id: "not-in-this-schedule".to_string(),
                        amount: Some(dec!(5)),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let after = state.installments.get_schedule(&ledger_id).await?;
    assert_eq!(after.installments, before.installments);
    assert_eq!(after.ledger.remaining_amount, dec!(600));

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_franchise_report_query() -> Result<()> {
    let state = mysql_state().await;

    let franchise = state
        .franchises
        .register_franchise(&TestDataFactory::franchise_input())
        .await?;
    let batch = state
        .franchises
        .create_batch(&franchise.id, &TestDataFactory::new_batch())
        .await?
        .batch;
    state.fees.set_fees(&batch.id, dec!(500), Decimal::ZERO).await?;
    state
        .fees
        .replace_templates(&batch.id, &TestDataFactory::even_plan(1, dec!(500), 7))
        .await?;

    let enrollment = state
        .franchises
        .enroll_student(&batch.id, test_user_id())
        .await?;
    state
        .installments
        .settle_paid_count(&enrollment.ledger.get().id, 1)
        .await?;

    let report = state.reports.franchise_fee_report(&franchise.id).await?;
    assert_eq!(report.totals.student_count, 1);
    assert_eq!(report.totals.expected_total, dec!(500));
    assert_eq!(report.totals.collected, dec!(500));
    assert_eq!(report.totals.outstanding, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_repeated_writes_report_existing() -> Result<()> {
    let pool = create_test_pool().await;
    let store = MySqlCourseEnrollmentStore::new(pool.clone());
    let user_id = test_user_id();
    let course = format!("course-v1:Academy+{}", Uuid::new_v4().simple());
    let now = date(2024, 1, 1).and_hms_opt(12, 0, 0).unwrap();

    assert!(store.enroll(user_id, &course, now).await?.was_created());
    // Already active: nothing new
    assert!(!store.enroll(user_id, &course, now).await?.was_created());

    assert!(store.unenroll(user_id, &course).await?);
    let reactivated = store.enroll(user_id, &course, now).await?;
    assert!(!reactivated.was_created());
    assert!(reactivated.get().is_active);

    let state = AppState::new(
        Repositories::mysql(&pool),
        Arc::new(FixedClock::new(date(2024, 1, 1))),
        false,
    );
    let registration = RegistrationInput {
        phone_number: Some("0812 555".to_string()),
        ..Default::default()
    };
    assert!(state.franchises.register_student(user_id, &registration).await?.was_created());
    // Identical values within the same second
    assert!(!state.franchises.register_student(user_id, &registration).await?.was_created());

    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_concurrent_fee_and_default_updates() -> Result<()> {
    let state = mysql_state().await;

    let franchise = state
        .franchises
        .register_franchise(&TestDataFactory::franchise_input())
        .await?;
    let batch = state
        .franchises
        .create_batch(&franchise.id, &TestDataFactory::new_batch())
        .await?
        .batch;

    let (fees, defaults) = tokio::join!(
        state.fees.set_fees(&batch.id, dec!(1000), dec!(100)),
        state.fees.set_installment_defaults(&batch.id, dec!(300), 30),
    );
    fees?;
    defaults?;

    let stored = state.fees.get_batch_ledger(&batch.id).await?;
    assert_eq!(stored.total_fee, dec!(1000));
    assert_eq!(stored.remaining_amount, dec!(900));
    assert_eq!(stored.installment_amount, dec!(300));
    assert_eq!(stored.repayment_period_days, 30);

    Ok(())
}

/// Two materializations racing on one ledger insert the plan once
#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_concurrent_materialization_inserts_once() -> Result<()> {
    let state = mysql_state().await;

    let franchise = state
        .franchises
        .register_franchise(&TestDataFactory::franchise_input())
        .await?;
    let batch = state
        .franchises
        .create_batch(&franchise.id, &TestDataFactory::new_batch())
        .await?
        .batch;
    state.fees.set_fees(&batch.id, dec!(900), Decimal::ZERO).await?;
    state
        .fees
        .replace_templates(&batch.id, &TestDataFactory::even_plan(3, dec!(300), 30))
        .await?;

    let ledger = state
        .installments
        .open_student_ledger(&batch.id, test_user_id())
        .await?
        .into_inner();

    let (first, second) = tokio::join!(
        state.installments.materialize_schedule(&ledger.id, date(2024, 1, 1)),
        state.installments.materialize_schedule(&ledger.id, date(2024, 1, 1)),
    );
    let (first, second) = (first?, second?);

    assert!(first.was_materialized() ^ second.was_materialized());
    let ids = |outcome: &MaterializeOutcome| {
        outcome.installments().iter().map(|i| i.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));

    let stored = state.installments.get_schedule(&ledger.id).await?;
    assert_eq!(stored.installments.len(), 3);

    Ok(())
}

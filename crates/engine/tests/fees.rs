mod common;

use chrono::NaiveDate;
use engine::{
    AssignFeeCmd, EngineError, FEES_CATEGORY, FeeStatus, Role, TransactionKind,
    TransactionListFilter,
};

use common::{actor, engine, profile};

#[tokio::test]
async fn payments_update_the_fee_and_book_income() {
    let engine = engine().await;
    let finance = actor(&engine, "finance", Role::Finance).await;
    let student = profile(&engine, "Ali Hassan", Role::Student).await;
    let due = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();

    let fee = engine
        .assign_fee(
            &finance,
            AssignFeeCmd::new(student.id, "Term 1 tuition", 150_000).due_date(due),
        )
        .await
        .unwrap();
    assert_eq!(fee.status(), FeeStatus::Unpaid);
    assert_eq!(fee.due_date, Some(due));

    let payment = engine
        .record_fee_payment(&finance, fee.id, 50_000)
        .await
        .unwrap();
    assert_eq!(payment.fee.status(), FeeStatus::Partial);
    assert_eq!(payment.fee.outstanding_minor(), 100_000);
    assert_eq!(payment.transaction.kind, TransactionKind::Income);
    assert_eq!(payment.transaction.category, FEES_CATEGORY);
    assert_eq!(payment.transaction.amount_minor, 50_000);
    assert_eq!(payment.transaction.profile_id, Some(student.id));

    assert!(matches!(
        engine.record_fee_payment(&finance, fee.id, 100_001).await,
        Err(EngineError::InvalidAmount(_))
    ));

    let payment = engine
        .record_fee_payment(&finance, fee.id, 100_000)
        .await
        .unwrap();
    assert_eq!(payment.fee.status(), FeeStatus::Paid);

    let fees = engine.list_fees(&finance, Some(student.id)).await.unwrap();
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].paid_minor, 150_000);

    let incomes = engine
        .list_transactions(
            &finance,
            &TransactionListFilter {
                category: Some("FEES".to_string()),
                ..Default::default()
            },
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(incomes.transactions.len(), 2);
}

#[tokio::test]
async fn fees_only_target_students() {
    let engine = engine().await;
    let finance = actor(&engine, "finance", Role::Finance).await;
    let teacher = profile(&engine, "Mr. Salim", Role::Teacher).await;

    assert!(matches!(
        engine
            .assign_fee(&finance, AssignFeeCmd::new(teacher.id, "Bus", 10_000))
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine
            .assign_fee(&finance, AssignFeeCmd::new(uuid::Uuid::new_v4(), "Bus", 10_000))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .record_fee_payment(&finance, uuid::Uuid::new_v4(), 10)
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn students_see_only_their_own_fees() {
    let engine = engine().await;
    let finance = actor(&engine, "finance", Role::Finance).await;
    let student = actor(&engine, "student", Role::Student).await;
    let other = profile(&engine, "Other", Role::Student).await;
    let student_id = student.profile_id.unwrap();

    engine
        .assign_fee(&finance, AssignFeeCmd::new(student_id, "Books", 20_000))
        .await
        .unwrap();
    engine
        .assign_fee(&finance, AssignFeeCmd::new(other.id, "Books", 20_000))
        .await
        .unwrap();

    let own = engine.list_fees(&student, Some(student_id)).await.unwrap();
    assert_eq!(own.len(), 1);
    assert!(matches!(
        engine.list_fees(&student, Some(other.id)).await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.list_fees(&student, None).await,
        Err(EngineError::Forbidden(_))
    ));
    assert_eq!(engine.list_fees(&finance, None).await.unwrap().len(), 2);
    assert!(matches!(
        engine
            .assign_fee(&student, AssignFeeCmd::new(student_id, "Free lunch", 1))
            .await,
        Err(EngineError::Forbidden(_))
    ));
}

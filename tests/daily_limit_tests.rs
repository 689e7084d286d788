use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use wirepay::config::PaymentConfig;
use wirepay::domain::ports::TransactionStore;
use wirepay::domain::transaction::{TransactionStatus, UserId};
use wirepay::error::PaymentError;
use wirepay::infrastructure::in_memory::InMemoryTransactionStore;

mod common;

#[tokio::test]
async fn test_limit_exceeded_reports_available() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "alice",
            dec!(49900.00),
            TransactionStatus::Pending,
            Utc::now(),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());

    let err = service
        .submit(&UserId::new("alice"), &common::request("200.00"))
        .await
        .unwrap_err();

    match err {
        PaymentError::DailyLimitExceeded {
            limit,
            attempted,
            available,
        } => {
            assert_eq!(limit, dec!(50000.00));
            assert_eq!(attempted, dec!(200.00));
            assert_eq!(available, dec!(100.00));
        }
        other => panic!("expected DailyLimitExceeded, got {:?}", other),
    }
    assert_eq!(store.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_limit_exceeded_message() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "alice",
            dec!(49900.00),
            TransactionStatus::Verified,
            Utc::now(),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());

    let err = service
        .submit(&UserId::new("alice"), &common::request("200.00"))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("50000.00"), "{}", message);
    assert!(message.contains("100.00"), "{}", message);
}

#[tokio::test]
async fn test_reaching_the_limit_exactly_is_allowed() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "alice",
            dec!(49900.00),
            TransactionStatus::Processing,
            Utc::now(),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());
    let user = UserId::new("alice");

    service.submit(&user, &common::request("100.00")).await.unwrap();

    let usage = service.daily_usage(&user).await.unwrap();
    assert_eq!(usage.used, dec!(50000.00));
    assert_eq!(usage.available, dec!(0));
    assert!(matches!(
        service.submit(&user, &common::request("1.00")).await,
        Err(PaymentError::DailyLimitExceeded { .. })
    ));
}

#[tokio::test]
async fn test_rejected_and_cancelled_do_not_count() {
    let store = InMemoryTransactionStore::new();
    for status in [TransactionStatus::Rejected, TransactionStatus::Cancelled] {
        store
            .create(common::seeded("alice", dec!(40000.00), status, Utc::now()))
            .await
            .unwrap();
    }
    let service = common::service_on(&store, common::utc_config());

    let usage = service.daily_usage(&UserId::new("alice")).await.unwrap();
    assert_eq!(usage.used, dec!(0));
    assert!(
        service
            .submit(&UserId::new("alice"), &common::request("50000.00"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_completed_transactions_count() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "alice",
            dec!(30000.00),
            TransactionStatus::Completed,
            Utc::now(),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());

    let usage = service.daily_usage(&UserId::new("alice")).await.unwrap();
    assert_eq!(usage.used, dec!(30000.00));
    assert_eq!(usage.available, dec!(20000.00));
}

#[tokio::test]
async fn test_previous_days_do_not_count() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "alice",
            dec!(50000.00),
            TransactionStatus::Completed,
            Utc::now() - Duration::days(1) - Duration::hours(1),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());

    assert!(
        service
            .submit(&UserId::new("alice"), &common::request("50000.00"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_limit_is_per_user() {
    let store = InMemoryTransactionStore::new();
    store
        .create(common::seeded(
            "bob",
            dec!(50000.00),
            TransactionStatus::Pending,
            Utc::now(),
        ))
        .await
        .unwrap();
    let service = common::service_on(&store, common::utc_config());

    assert!(
        service
            .submit(&UserId::new("alice"), &common::request("50000.00"))
            .await
            .is_ok()
    );
    assert!(matches!(
        service
            .submit(&UserId::new("bob"), &common::request("1.00"))
            .await,
        Err(PaymentError::DailyLimitExceeded { .. })
    ));
}

#[tokio::test]
async fn test_fees_are_not_counted_towards_the_limit() {
    let service = common::service_with(common::utc_config());
    let user = UserId::new("alice");

    // 50000.00 + 50.00 fee would overshoot if fees counted.
    service
        .submit(&user, &common::request("50000.00"))
        .await
        .unwrap();
    let usage = service.daily_usage(&user).await.unwrap();
    assert_eq!(usage.used, dec!(50000.00));
}

#[tokio::test]
async fn test_configured_limit_is_used() {
    let config = PaymentConfig {
        daily_limit: dec!(1000.00),
        ..common::utc_config()
    };
    let service = common::service_with(config);
    let user = UserId::new("alice");

    service.submit(&user, &common::request("600.00")).await.unwrap();
    let err = service
        .submit(&user, &common::request("600.00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::DailyLimitExceeded { available, .. } if available == dec!(400.00)
    ));
}

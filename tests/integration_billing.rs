//! Webhook reconciliation against a real database: idempotency, out-of-order
//! arrival, and the forward-only installment lifecycle. Each test skips
//! itself when `DATABASE_URL` is not set.

mod common;

use serde_json::json;
use uuid::Uuid;

use lectern::modules::billing::webhook::{StripeEvent, StripeEventData, process_event};

fn event(event_type: &str, object: serde_json::Value) -> StripeEvent {
    StripeEvent {
        id: format!("evt_{}", Uuid::new_v4().simple()),
        event_type: event_type.to_string(),
        created: chrono::Utc::now().timestamp(),
        livemode: false,
        data: StripeEventData { object },
    }
}

fn unique_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_checkout_completed_creates_customer_and_plan() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let email = common::generate_unique_email();
    let customer = unique_id("cus");
    let subscription = unique_id("sub");

    process_event(
        &db,
        &event(
            "checkout.session.completed",
            json!({
                "id": unique_id("cs"),
                "customer": customer,
                "subscription": subscription,
                "payment_status": "paid",
                "customer_details": { "email": email }
            }),
        ),
    )
    .await
    .unwrap();

    let stored: Option<String> =
        sqlx::query_scalar("SELECT stripe_customer_id FROM customers WHERE email = $1")
            .bind(&email)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(stored.as_deref(), Some(customer.as_str()));

    let plan_status: String = sqlx::query_scalar(
        "SELECT status FROM payment_plans WHERE stripe_subscription_id = $1",
    )
    .bind(&subscription)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(plan_status, "active");
}

#[tokio::test]
async fn test_subscription_update_before_create_degrades_to_upsert() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let subscription = unique_id("sub");

    // "updated" arrives first
    process_event(
        &db,
        &event(
            "customer.subscription.updated",
            json!({ "id": subscription, "status": "past_due" }),
        ),
    )
    .await
    .unwrap();

    let status: String = sqlx::query_scalar(
        "SELECT status FROM payment_plans WHERE stripe_subscription_id = $1",
    )
    .bind(&subscription)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(status, "past_due");

    // the late "created" just refreshes the same row
    process_event(
        &db,
        &event(
            "customer.subscription.created",
            json!({ "id": subscription, "status": "active" }),
        ),
    )
    .await
    .unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payment_plans WHERE stripe_subscription_id = $1",
    )
    .bind(&subscription)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_invoice_paid_settles_installment_and_issues_voucher() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let subscription = unique_id("sub");
    let invoice = unique_id("in");
    let paid_event = event(
        "invoice.paid",
        json!({
            "id": invoice,
            "subscription": subscription,
            "amount_paid": 4900,
            "currency": "usd"
        }),
    );

    process_event(&db, &paid_event).await.unwrap();

    let (status, amount): (String, i64) = sqlx::query_as(
        "SELECT status, amount_cents FROM installments WHERE stripe_invoice_id = $1",
    )
    .bind(&invoice)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(status, "paid");
    assert_eq!(amount, 4900);

    let vouchers: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payment_vouchers pv
         INNER JOIN payments p ON p.id = pv.payment_id
         INNER JOIN installments i ON i.id = p.installment_id
         WHERE i.stripe_invoice_id = $1",
    )
    .bind(&invoice)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(vouchers, 1);

    // Gateway redelivery must not double-book the payment
    process_event(&db, &paid_event).await.unwrap();

    let payments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments p
         INNER JOIN installments i ON i.id = p.installment_id
         WHERE i.stripe_invoice_id = $1",
    )
    .bind(&invoice)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(payments, 1);
}

#[tokio::test]
async fn test_payment_failure_never_regresses_a_paid_installment() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let subscription = unique_id("sub");
    let invoice = unique_id("in");

    process_event(
        &db,
        &event(
            "invoice.paid",
            json!({
                "id": invoice,
                "subscription": subscription,
                "amount_paid": 1500,
                "currency": "usd"
            }),
        ),
    )
    .await
    .unwrap();

    // A stale failure for the same invoice arrives afterwards
    process_event(
        &db,
        &event(
            "invoice.payment_failed",
            json!({
                "id": invoice,
                "subscription": subscription,
                "customer": unique_id("cus"),
                "attempt_count": 2
            }),
        ),
    )
    .await
    .unwrap();

    let status: String =
        sqlx::query_scalar("SELECT status FROM installments WHERE stripe_invoice_id = $1")
            .bind(&invoice)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(status, "paid");
}

#[tokio::test]
async fn test_subscription_deleted_cancels_plan() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let subscription = unique_id("sub");

    process_event(
        &db,
        &event(
            "customer.subscription.created",
            json!({ "id": subscription, "status": "active" }),
        ),
    )
    .await
    .unwrap();

    process_event(
        &db,
        &event(
            "customer.subscription.deleted",
            json!({ "id": subscription, "status": "canceled" }),
        ),
    )
    .await
    .unwrap();

    let status: String = sqlx::query_scalar(
        "SELECT status FROM payment_plans WHERE stripe_subscription_id = $1",
    )
    .bind(&subscription)
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(status, "canceled");
}

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;

use lectern::modules::billing::error::BillingError;
use lectern::modules::billing::webhook::{
    EventOutcome, StripeEvent, StripeEventData, process_event, retry_with_backoff,
    verify_stripe_signature,
};

// ============ Signature verification ============

#[test]
fn test_valid_signature_passes() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid"}"#;
    let header = common::stripe_signature_header(payload, common::TEST_WEBHOOK_SECRET);

    let result =
        verify_stripe_signature(payload.as_bytes(), Some(&header), common::TEST_WEBHOOK_SECRET);
    assert!(result.is_ok());
}

#[test]
fn test_missing_header_fails() {
    let result =
        verify_stripe_signature(b"{}", None, common::TEST_WEBHOOK_SECRET);
    assert!(matches!(result, Err(BillingError::Signature(_))));
}

#[test]
fn test_tampered_payload_fails() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid"}"#;
    let header = common::stripe_signature_header(payload, common::TEST_WEBHOOK_SECRET);

    let tampered = r#"{"id":"evt_2","type":"invoice.paid"}"#;
    let result =
        verify_stripe_signature(tampered.as_bytes(), Some(&header), common::TEST_WEBHOOK_SECRET);
    assert!(matches!(result, Err(BillingError::Signature(_))));
}

#[test]
fn test_wrong_secret_fails() {
    let payload = r#"{"id":"evt_1"}"#;
    let header = common::stripe_signature_header(payload, "whsec_other_secret");

    let result =
        verify_stripe_signature(payload.as_bytes(), Some(&header), common::TEST_WEBHOOK_SECRET);
    assert!(matches!(result, Err(BillingError::Signature(_))));
}

#[test]
fn test_header_without_timestamp_fails() {
    let result = verify_stripe_signature(
        b"{}",
        Some("v1=deadbeef"),
        common::TEST_WEBHOOK_SECRET,
    );
    assert!(matches!(result, Err(BillingError::Signature(_))));
}

#[test]
fn test_stale_timestamp_fails() {
    // Signed correctly, but an hour ago
    let payload = r#"{"id":"evt_1"}"#;
    let timestamp = chrono::Utc::now().timestamp() - 3600;
    let signed_payload = format!("{}.{}", timestamp, payload);

    use hmac::{Hmac, Mac};
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(common::TEST_WEBHOOK_SECRET.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    let header = format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()));

    let result =
        verify_stripe_signature(payload.as_bytes(), Some(&header), common::TEST_WEBHOOK_SECRET);
    assert!(matches!(result, Err(BillingError::Signature(_))));
}

// ============ Dispatch ============

#[tokio::test]
async fn test_unrecognized_event_is_skipped_not_an_error() {
    // The fallthrough arm never touches the database
    let db = common::lazy_pool();
    let event = StripeEvent {
        id: "evt_unknown".to_string(),
        event_type: "customer.tax_id.created".to_string(),
        created: 0,
        livemode: false,
        data: StripeEventData { object: json!({}) },
    };

    let outcome = process_event(&db, &event).await.unwrap();
    match outcome {
        EventOutcome::Skipped(message) => {
            assert!(message.contains("customer.tax_id.created"));
        }
        other => panic!("expected Skipped, got {:?}", other),
    }
}

// ============ Retry policy ============

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_third_attempt_with_backoff() {
    let attempts = Arc::new(AtomicU32::new(0));
    let started = tokio::time::Instant::now();

    let result = {
        let attempts = attempts.clone();
        retry_with_backoff(3, Duration::from_secs(2), move || {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(BillingError::Processing("transient failure".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
    };

    assert_eq!(result.unwrap(), 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    // Backoff waits 2s then 4s between the three attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_returns_last_error() {
    let attempts = Arc::new(AtomicU32::new(0));
    let started = tokio::time::Instant::now();

    let result: Result<(), BillingError> = {
        let attempts = attempts.clone();
        retry_with_backoff(3, Duration::from_secs(2), move || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(BillingError::Processing("permanent failure".to_string()))
            }
        })
        .await
    };

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    // No sleep after the final attempt
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_retry_first_success_skips_backoff() {
    let attempts = Arc::new(AtomicU32::new(0));

    let result = {
        let attempts = attempts.clone();
        retry_with_backoff(3, Duration::from_secs(2), move || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            }
        })
        .await
    };

    assert_eq!(result.unwrap(), "done");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

// ============ Event parsing ============

#[test]
fn test_event_parses_from_gateway_payload() {
    let payload = json!({
        "id": "evt_123",
        "object": "event",
        "type": "checkout.session.completed",
        "created": 1_700_000_000,
        "livemode": false,
        "data": {
            "object": {
                "id": "cs_test_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "customer_details": { "email": "buyer@example.com" }
            }
        }
    });

    let event: StripeEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.id, "evt_123");
    assert_eq!(event.event_type, "checkout.session.completed");
    assert_eq!(
        event.data.object.pointer("/customer_details/email").and_then(|v| v.as_str()),
        Some("buyer@example.com")
    );
}

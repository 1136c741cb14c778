use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reservation_core::backend::BackendClient;
use reservation_core::domain::{FeeSchedule, PaymentMethod};
use reservation_core::services::{
    CheckoutOutcome, CheckoutRequest, CheckoutService, ReconciliationOutcome,
    ReconciliationReporter, ReturnSlots,
};

const UNIT_BODY: &str = r#"{"id":"unit-5","title":"Casa Cieneguilla","nightlyRate":"100.00","currency":"PEN","maxGuests":6}"#;

const BOOKING_BODY: &str = r#"{
    "id": "bk-900",
    "propertyId": "unit-5",
    "guestId": "guest-1",
    "checkIn": "2026-06-01",
    "checkOut": "2026-06-08",
    "guestCount": 2,
    "subtotal": "700.00",
    "cleaningFee": "50.00",
    "serviceFee": "70.00",
    "taxes": "147.60",
    "total": "967.60"
}"#;

fn client(server: &Server) -> Arc<BackendClient> {
    Arc::new(BackendClient::with_circuit_breaker(server.url(), Duration::from_secs(2), 5, 60).unwrap())
}

fn request(method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
        property_id: "unit-5".to_string(),
        guest_id: "guest-1".to_string(),
        check_in: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        check_out: NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
        guest_count: 2,
        method,
        notes: None,
        return_to: Some("/units/unit-5".to_string()),
    }
}

#[tokio::test]
async fn test_checkout_submits_quoted_amounts() {
    let mut server = Server::new_async().await;
    let _unit = server
        .mock("GET", "/units/unit-5")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(UNIT_BODY)
        .create_async()
        .await;
    let booking = server
        .mock("POST", "/bookings")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "propertyId": "unit-5",
            "checkIn": "2026-06-01",
            "checkOut": "2026-06-08",
            "guestCount": 2
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(BOOKING_BODY)
        .expect(1)
        .create_async()
        .await;
    let payment = server
        .mock("POST", "/payments")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "bookingId": "bk-900",
            "method": "yape",
            "status": "pending"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"pay-3","bookingId":"bk-900","amount":"967.60","method":"yape","status":"pending"}"#)
        .expect(1)
        .create_async()
        .await;

    let slots = ReturnSlots::new("/my-bookings");
    let service = CheckoutService::new(client(&server), FeeSchedule::default(), slots.clone());

    let outcome = service.checkout(request(PaymentMethod::Yape)).await.unwrap();

    booking.assert_async().await;
    payment.assert_async().await;
    assert!(matches!(outcome, CheckoutOutcome::Confirmed { payment: Some(_), .. }));
    assert_eq!(outcome.booking().total, BigDecimal::from_str("967.60").unwrap());
    assert_eq!(outcome.order_id(), Some("bk-900"));
    assert_eq!(slots.take(Some("bk-900")), "/units/unit-5");
}

#[tokio::test]
async fn test_payment_endpoint_down_leaves_booking() {
    let mut server = Server::new_async().await;
    let _unit = server
        .mock("GET", "/units/unit-5")
        .with_status(200)
        .with_body(UNIT_BODY)
        .create_async()
        .await;
    let _booking = server
        .mock("POST", "/bookings")
        .with_status(201)
        .with_body(BOOKING_BODY)
        .create_async()
        .await;
    let _payment = server
        .mock("POST", "/payments")
        .with_status(503)
        .create_async()
        .await;
    // The booking must never be rolled back
    let rollback = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let slots = ReturnSlots::new("/my-bookings");
    let service = CheckoutService::new(client(&server), FeeSchedule::default(), slots.clone());

    let outcome = service.checkout(request(PaymentMethod::BankTransfer)).await.unwrap();

    assert_eq!(outcome.status(), "payment_not_registered");
    assert_eq!(outcome.booking().id, "bk-900");
    assert_eq!(slots.pending(), 0);
    rollback.assert_async().await;
}

#[tokio::test]
async fn test_reconcile_uses_order_id_as_idempotency_key_and_posts_once() {
    let mut server = Server::new_async().await;
    let webhook = server
        .mock("POST", "/webhooks/izipay")
        .match_header("x-idempotency-key", "ORD-55")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "orderId": "ORD-55",
            "providerTransactionId": "ORD-55",
            "providerStatus": "SUCCEEDED"
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let reporter = ReconciliationReporter::new(
        client(&server),
        "izipay",
        ReturnSlots::new("/my-bookings"),
        Duration::from_millis(100),
    );

    let query = "orderId=ORD-55&amount=967.60&status=SUCCEEDED";
    let first = reporter.handle_return(query).await;
    let second = reporter.handle_return(query).await;

    assert_eq!(first.state, ReconciliationOutcome::Success);
    assert_eq!(second.state, ReconciliationOutcome::Success);
    webhook.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_backend_downgrades_to_warning() {
    // Nothing listens on port 9 locally
    let backend = Arc::new(
        BackendClient::with_circuit_breaker("http://127.0.0.1:9".to_string(), Duration::from_secs(1), 3, 60)
            .unwrap(),
    );
    let slots = ReturnSlots::new("/my-bookings");
    slots.store("ORD-56", "/units/unit-5");
    let reporter = ReconciliationReporter::new(backend, "izipay", slots, Duration::from_millis(100));

    let screen = reporter
        .handle_return("orderId=ORD-56&amount=100&status=SUCCEEDED")
        .await;

    assert_eq!(screen.state, ReconciliationOutcome::SuccessWithWarning);
    assert_eq!(screen.redirect_to.as_deref(), Some("/units/unit-5"));
}

#[tokio::test]
async fn test_backend_outage_then_recovery_records_the_payment() {
    let mut server = Server::new_async().await;
    let outage = server
        .mock("POST", "/webhooks/izipay")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let reporter = ReconciliationReporter::new(
        client(&server),
        "izipay",
        ReturnSlots::new("/my-bookings"),
        Duration::from_millis(100),
    );

    let query = "orderId=ORD-57&amount=250.00&status=SUCCEEDED";
    let first = reporter.handle_return(query).await;
    assert_eq!(first.state, ReconciliationOutcome::SuccessWithWarning);
    outage.assert_async().await;
    outage.remove_async().await;

    let recovered = server
        .mock("POST", "/webhooks/izipay")
        .match_header("x-idempotency-key", "ORD-57")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let second = reporter.handle_return(query).await;
    assert_eq!(second.state, ReconciliationOutcome::Success);
    recovered.assert_async().await;
}

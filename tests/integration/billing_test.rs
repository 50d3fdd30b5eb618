//! Bill ledger over HTTP against a real database.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::helpers::{STRONG_PASSWORD, TestApp};

/// A student with a 1000 + 50 + 100 bill.
struct BilledStudent {
    admin: String,
    token: String,
    bill_id: String,
}

async fn billed_student(app: &TestApp) -> BilledStudent {
    let admin = app.admin_session().await;
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("payer-{tag}@dorm.test");

    let student = app
        .request(
            "POST",
            "/api/admin/students",
            Some(json!({
                "student_number": format!("P-{tag}"),
                "name": "Carla Diaz",
                "email": email,
                "password": STRONG_PASSWORD,
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(student.status, StatusCode::OK, "{}", student.body);
    let student_id = student.body["data"]["id"].as_str().unwrap().to_string();

    let now = Utc::now();
    let bill = app
        .request(
            "POST",
            "/api/admin/bills",
            Some(json!({
                "student_id": student_id,
                "rental_fee": 1000,
                "water_fee": 50,
                "other_fees": [{ "description": "Laundry", "amount": 100 }],
                "billing_period_start": now - Duration::days(30),
                "billing_period_end": now,
                "due_date": now + Duration::days(14),
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(bill.status, StatusCode::OK, "{}", bill.body);
    let bill_id = bill.body["data"]["id"].as_str().unwrap().to_string();

    let token = app.login("students", &email, STRONG_PASSWORD).await;
    BilledStudent {
        admin,
        token,
        bill_id,
    }
}

fn pay(amount: i64) -> Option<Value> {
    Some(json!({ "amount": amount, "method": "cash" }))
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_partial_then_full_payment() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let BilledStudent { token, bill_id, .. } = billed_student(&app).await;
    let pay_path = format!("/api/students/bills/{bill_id}/pay");

    let partial = app.request("POST", &pay_path, pay(600), Some(&token)).await;
    assert_eq!(partial.status, StatusCode::OK, "{}", partial.body);
    assert_eq!(partial.body["data"]["status"], "pending");
    assert_eq!(partial.body["data"]["payment_status"], "Partially Paid");
    assert_eq!(partial.body["data"]["amount_paid"], 600);

    let full = app.request("POST", &pay_path, pay(550), Some(&token)).await;
    assert_eq!(full.status, StatusCode::OK, "{}", full.body);
    assert_eq!(full.body["data"]["status"], "paid");
    assert_eq!(full.body["data"]["amount_paid"], 1150);

    // Another student cannot see the bill.
    let (_, stranger) = app.token_for(dormhub_entity::account::Role::Student);
    let hidden = app
        .request(
            "GET",
            &format!("/api/students/bills/{bill_id}"),
            None,
            Some(&stranger),
        )
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_concurrent_payments_are_all_recorded() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let BilledStudent {
        admin,
        token,
        bill_id,
    } = billed_student(&app).await;

    let student_path = format!("/api/students/bills/{bill_id}/pay");
    let admin_path = format!("/api/admin/bills/{bill_id}/payments");
    let (a, b, c) = tokio::join!(
        app.request("POST", &student_path, pay(300), Some(&token)),
        app.request("POST", &student_path, pay(200), Some(&token)),
        app.request("POST", &admin_path, pay(100), Some(&admin)),
    );
    for response in [&a, &b, &c] {
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    }

    let bill = app
        .request("GET", &format!("/api/admin/bills/{bill_id}"), None, Some(&admin))
        .await;
    assert_eq!(bill.body["data"]["amount_paid"], 600);
    assert_eq!(bill.body["data"]["payments"].as_array().unwrap().len(), 3);
    assert_eq!(bill.body["data"]["payment_status"], "Partially Paid");
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_receipt_upload_keeps_payments() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let BilledStudent {
        admin,
        token,
        bill_id,
    } = billed_student(&app).await;

    let receipt_uri = format!("/api/students/bills/{bill_id}/receipt");
    let payments_uri = format!("/api/admin/bills/{bill_id}/payments");
    let (receipt, paid) = tokio::join!(
        app.upload(
            &receipt_uri,
            "receipt.pdf",
            b"%PDF-1.4 receipt",
            &token,
        ),
        app.request(
            "POST",
            &payments_uri,
            pay(400),
            Some(&admin),
        ),
    );
    assert_eq!(receipt.status, StatusCode::OK, "{}", receipt.body);
    assert_eq!(paid.status, StatusCode::OK, "{}", paid.body);

    let bill = app
        .request("GET", &format!("/api/admin/bills/{bill_id}"), None, Some(&admin))
        .await;
    assert_eq!(bill.body["data"]["amount_paid"], 400);
    assert_eq!(bill.body["data"]["payments"].as_array().unwrap().len(), 1);
    assert!(bill.body["data"]["receipt_path"].is_string());
}

#[tokio::test]
#[ignore = "needs DORMHUB_TEST_DATABASE_URL"]
async fn test_oversized_payment_is_rejected() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let BilledStudent { token, bill_id, .. } = billed_student(&app).await;
    let pay_path = format!("/api/students/bills/{bill_id}/pay");

    app.request("POST", &pay_path, pay(1), Some(&token)).await;
    let huge = app
        .request("POST", &pay_path, pay(i64::MAX), Some(&token))
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST, "{}", huge.body);
    assert_eq!(huge.body["error"], "VALIDATION");

    let bill = app
        .request("GET", &format!("/api/students/bills/{bill_id}"), None, Some(&token))
        .await;
    assert_eq!(bill.body["data"]["amount_paid"], 1);
}

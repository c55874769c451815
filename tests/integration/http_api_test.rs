// HTTP API tests
//
// The full route table and middleware stack over MemoryStore, called through
// actix_web::test with the administrator key attached.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test, web, App};
use franchise_fees::middleware::{hash_api_key, json_error_handler, AdminApiKey, ErrorHandler, RequestId};
use franchise_fees::modules;
use helpers::{app_state, date, MemoryStore, TestDataFactory};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

const API_KEY: &str = "test-admin-key";

macro_rules! init_app {
    () => {{
        let store = MemoryStore::new();
        let state = web::Data::new(app_state(&store, date(2024, 1, 1)));
        test::init_service(
            App::new()
                .app_data(state)
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .wrap(AdminApiKey::new(hash_api_key(API_KEY).unwrap()))
                .wrap(ErrorHandler)
                .wrap(RequestId)
                .configure(modules::configure),
        )
        .await
    }};
}

fn amount(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.insert_header(("X-API-Key", API_KEY)).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = init_app!();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_api_key_is_unauthorized() {
    let app = init_app!();

    let err = test::try_call_service(&app, test::TestRequest::get().uri("/franchises").to_request())
        .await
        .unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/franchises")
            .insert_header(("X-API-Key", "wrong-key"))
            .to_request(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_fee_flow_over_http() {
    let app = init_app!();

    let (status, franchise) = call!(
        app,
        test::TestRequest::post()
            .uri("/franchises")
            .set_json(TestDataFactory::franchise_payload())
    );
    assert_eq!(status, StatusCode::CREATED);
    let franchise_id = franchise["id"].as_str().unwrap().to_string();

    let (status, created) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/franchises/{}/batches", franchise_id))
            .set_json(TestDataFactory::batch_payload())
    );
    assert_eq!(status, StatusCode::CREATED);
    let batch_id = created["batch"]["id"].as_str().unwrap().to_string();
    assert_eq!(amount(&created["fee_ledger"]["remaining_amount"]), Decimal::ZERO);

    let (status, ledger) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/batches/{}/fees", batch_id))
            .set_json(json!({"total_fee": 1000, "discount": 100}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&ledger["remaining_amount"]), Decimal::from(900));

    let (status, plan) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/batches/{}/fees/templates", batch_id))
            .set_json(json!({"templates": [
                {"amount": 300, "repayment_period_days": 30},
                {"amount": 300, "repayment_period_days": 30},
                {"amount": 300, "repayment_period_days": 30}
            ]}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&plan["plan_total"]), Decimal::from(900));

    let (status, enrollment) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/batches/{}/students", batch_id))
            .set_json(json!({"user_id": 900}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(enrollment["schedule"]["outcome"], "materialized");
    let student_fee_id = enrollment["ledger"]["record"]["id"].as_str().unwrap().to_string();

    // Second enrollment is a no-op
    let (status, _) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/batches/{}/students", batch_id))
            .set_json(json!({"user_id": 900}))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, schedule) = call!(
        app,
        test::TestRequest::get().uri(&format!("/batches/{}/students/900/fees", batch_id))
    );
    assert_eq!(status, StatusCode::OK);
    let installments = schedule["installments"].as_array().unwrap();
    assert_eq!(installments.len(), 3);
    assert_eq!(installments[0]["due_date"], "2024-01-31");
    assert_eq!(installments[1]["due_date"], "2024-03-01");
    assert_eq!(installments[2]["due_date"], "2024-03-31");
    let first_id = installments[0]["id"].as_str().unwrap().to_string();

    let (status, updated) = call!(
        app,
        test::TestRequest::patch()
            .uri(&format!("/student-fees/{}/statuses", student_fee_id))
            .set_json(json!({"updates": [{"installment_id": first_id, "status": "paid"}]}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&updated["remaining_amount"]), Decimal::from(600));
    assert_eq!(updated["installments"][0]["payment_date"], "2024-01-01");

    let (status, summary) = call!(
        app,
        test::TestRequest::get().uri(&format!("/student-fees/{}/summary", student_fee_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["paid_count"], 1);

    let (status, report) = call!(
        app,
        test::TestRequest::get().uri(&format!("/franchises/{}/fee-report", franchise_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totals"]["student_count"], 1);
    assert_eq!(amount(&report["totals"]["collected"]), Decimal::from(300));
    assert_eq!(amount(&report["totals"]["outstanding"]), Decimal::from(600));
}

#[actix_web::test]
async fn test_validation_error_body() {
    let app = init_app!();

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/franchises")
            .set_json(json!({"name": "", "location": "Somewhere", "joining_date": "2024-01-01"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"].as_str().unwrap().contains("name"));
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let app = init_app!();

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/franchises")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}

#[actix_web::test]
async fn test_unknown_resources_are_not_found() {
    let app = init_app!();

    let (status, body) = call!(app, test::TestRequest::get().uri("/franchises/missing"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);

    let (status, _) = call!(app, test::TestRequest::get().uri("/student-fees/missing"));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call!(app, test::TestRequest::get().uri("/batches/missing/students/1/fees"));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_materialize_endpoint_reports_existing_schedule() {
    let app = init_app!();

    let (_, franchise) = call!(
        app,
        test::TestRequest::post()
            .uri("/franchises")
            .set_json(TestDataFactory::franchise_payload())
    );
    let (_, created) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/franchises/{}/batches", franchise["id"].as_str().unwrap()))
            .set_json(TestDataFactory::batch_payload())
    );
    let batch_id = created["batch"]["id"].as_str().unwrap().to_string();

    call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/batches/{}/fees/templates", batch_id))
            .set_json(json!({"templates": [{"amount": 500, "repayment_period_days": 14}]}))
    );
    let (_, enrollment) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/batches/{}/students", batch_id))
            .set_json(json!({"user_id": 12}))
    );
    let student_fee_id = enrollment["ledger"]["record"]["id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri(&format!("/student-fees/{}/materialize", student_fee_id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["materialized"], false);
    assert_eq!(body["installments"][0]["due_date"], "2024-01-15");
}

/// A plan added after enrollment is anchored at the course enrollment date
#[actix_web::test]
async fn test_materialize_endpoint_builds_late_plan() {
    let app = init_app!();

    let (_, franchise) = call!(
        app,
        test::TestRequest::post()
            .uri("/franchises")
            .set_json(TestDataFactory::franchise_payload())
    );
    let (_, created) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/franchises/{}/batches", franchise["id"].as_str().unwrap()))
            .set_json(TestDataFactory::batch_payload())
    );
    let batch_id = created["batch"]["id"].as_str().unwrap().to_string();

    let (_, enrollment) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/batches/{}/students", batch_id))
            .set_json(json!({"user_id": 13}))
    );
    assert_eq!(enrollment["schedule"]["installments"].as_array().unwrap().len(), 0);
    let student_fee_id = enrollment["ledger"]["record"]["id"].as_str().unwrap().to_string();

    call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/batches/{}/fees/templates", batch_id))
            .set_json(json!({"templates": [
                {"amount": 250, "repayment_period_days": 10},
                {"amount": 250, "repayment_period_days": 20}
            ]}))
    );

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri(&format!("/student-fees/{}/materialize", student_fee_id))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["materialized"], true);
    assert_eq!(body["installments"][0]["due_date"], "2024-01-11");
    assert_eq!(body["installments"][1]["due_date"], "2024-01-31");
}

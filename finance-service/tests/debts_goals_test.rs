//! Debt, goal and investment integration tests.

mod common;

use chrono::{Duration, Utc};
use common::{money, spawn_app};
use finance_service::services::scheduler::sweep_overdue_debts;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[tokio::test]
#[ignore] // Requires database
async fn partial_payments_settle_a_debt() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/debts",
            &json!({ "name": "Empréstimo", "amount": "1000.00", "due_date": "2030-01-10" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let debt: Value = response.json().await.unwrap();
    assert_eq!(debt["status"], "pending");
    let payments = format!("/debts/{}/payments", debt["debt_id"].as_str().unwrap());

    let response = app.post(&payments, &json!({ "amount": "400.00" })).await;
    let debt: Value = response.json().await.unwrap();
    assert_eq!(money(&debt["amount_paid"]), dec!(400));
    assert_eq!(debt["status"], "pending");

    let response = app.post(&payments, &json!({ "amount": "600.00" })).await;
    let debt: Value = response.json().await.unwrap();
    assert_eq!(debt["status"], "paid");

    let response = app.post(&payments, &json!({ "amount": "1.00" })).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore]
async fn sweep_marks_past_due_debts_overdue() {
    let app = spawn_app().await;
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();

    let late: Value = app
        .post(
            "/debts",
            &json!({ "name": "Conta atrasada", "amount": "90.00", "due_date": yesterday }),
        )
        .await
        .json()
        .await
        .unwrap();
    let on_time: Value = app
        .post(
            "/debts",
            &json!({ "name": "Conta futura", "amount": "90.00", "due_date": tomorrow }),
        )
        .await
        .json()
        .await
        .unwrap();

    let count = sweep_overdue_debts(&app.db).await.expect("sweep failed");
    assert!(count >= 1);

    let late: Value = app
        .get(&format!("/debts/{}", late["debt_id"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(late["status"], "overdue");
    let on_time: Value = app
        .get(&format!("/debts/{}", on_time["debt_id"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(on_time["status"], "pending");

    let summary: Value = app.get("/debts/summary").await.json().await.unwrap();
    assert_eq!(money(&summary["total_overdue"]), dec!(90));
    assert_eq!(money(&summary["outstanding"]), dec!(180));
}

#[tokio::test]
#[ignore]
async fn contributions_complete_goal() {
    let app = spawn_app().await;

    let goal: Value = app
        .post(
            "/goals",
            &json!({ "name": "Viagem", "target_amount": "3000.00", "current_amount": "2500.00" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let goal_path = format!("/goals/{}", goal["goal_id"].as_str().unwrap());

    let response = app
        .post(&format!("{}/contribute", goal_path), &json!({ "amount": "500.00" }))
        .await;
    let goal: Value = response.json().await.unwrap();
    assert_eq!(goal["status"], "completed");
    assert_eq!(money(&goal["current_amount"]), dec!(3000));

    app.patch(&goal_path, &json!({ "status": "cancelled" })).await;
    let response = app
        .post(&format!("{}/contribute", goal_path), &json!({ "amount": "10.00" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore]
async fn investment_summary_groups_by_type() {
    let app = spawn_app().await;
    for (kind, amount) in [
        ("fixed_income", "1000.00"),
        ("fixed_income", "500.00"),
        ("crypto", "250.00"),
    ] {
        let response = app
            .post(
                "/investments",
                &json!({ "investment_type": kind, "name": "Aplicação", "amount": amount, "date": "2024-02-01" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let summary: Value = app.get("/investments/summary").await.json().await.unwrap();
    assert_eq!(money(&summary["total"]), dec!(1750));
    let by_type = summary["by_type"].as_array().unwrap();
    let fixed = by_type
        .iter()
        .find(|t| t["investment_type"] == "fixed_income")
        .unwrap();
    assert_eq!(money(&fixed["total"]), dec!(1500));
    assert_eq!(fixed["count"], 2);
}

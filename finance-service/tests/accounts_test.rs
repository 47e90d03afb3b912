//! Account and credit-card invoice integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -p finance-service -- --ignored

mod common;

use common::{money, spawn_app};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires database
async fn account_balance_reflects_transactions() {
    let app = spawn_app().await;

    let account = app
        .create_account(json!({
            "name": "Conta Corrente",
            "account_type": "checking",
            "initial_balance": "1000.00"
        }))
        .await;
    let account_id = account["account_id"].as_str().unwrap();

    app.create_transactions(json!({
        "account_id": account_id,
        "amount": "2500.00",
        "transaction_type": "income",
        "description": "Salário",
        "date": "2024-03-05"
    }))
    .await;
    app.create_transactions(json!({
        "account_id": account_id,
        "amount": "300.50",
        "transaction_type": "expense",
        "description": "Mercado",
        "date": "2024-03-06"
    }))
    .await;

    let response = app.get(&format!("/accounts/{}", account_id)).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(money(&body["current_balance"]), dec!(3199.50));
}

#[tokio::test]
#[ignore]
async fn accounts_of_other_users_are_not_found() {
    let app = spawn_app().await;
    let account = app
        .create_account(json!({ "name": "Carteira", "account_type": "cash" }))
        .await;

    let intruder = app.as_user(Uuid::new_v4());
    let response = intruder
        .get(&format!("/accounts/{}", account["account_id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn patch_keeps_absent_fields_and_clears_nulls() {
    let app = spawn_app().await;
    let account = app
        .create_account(json!({
            "name": "Poupança",
            "account_type": "savings",
            "color": "#00ff00",
            "icon": "piggy-bank"
        }))
        .await;
    let path = format!("/accounts/{}", account["account_id"].as_str().unwrap());

    let response = app.patch(&path, &json!({ "color": null, "name": "Reserva" })).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Reserva");
    assert!(body["color"].is_null());
    assert_eq!(body["icon"], "piggy-bank");
}

#[tokio::test]
#[ignore]
async fn credit_card_invoice_lifecycle() {
    let app = spawn_app().await;

    let card = app
        .create_account(json!({
            "name": "Cartão",
            "account_type": "credit_card",
            "credit_limit": "5000.00",
            "closing_day": 10,
            "due_day": 20
        }))
        .await;
    let card_id = card["account_id"].as_str().unwrap();

    for (amount, kind, date) in [
        ("100.00", "expense", "2024-03-05"),
        ("20.00", "income", "2024-03-08"),
        ("50.00", "expense", "2024-03-15"),
    ] {
        app.create_transactions(json!({
            "account_id": card_id,
            "amount": amount,
            "transaction_type": kind,
            "date": date
        }))
        .await;
    }

    // Current invoice: 2024-02-11 .. 2024-03-10
    let response = app
        .get(&format!("/accounts/{}/invoice?reference_date=2024-03-05", card_id))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let invoice: Value = response.json().await.unwrap();
    assert_eq!(invoice["period_start"], "2024-02-11");
    assert_eq!(invoice["period_end"], "2024-03-10");
    assert_eq!(invoice["due_date"], "2024-03-20");
    assert_eq!(money(&invoice["total"]), dec!(80.00));
    assert_eq!(invoice["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(invoice["is_paid"], false);

    // Pay it, twice
    let pay_path = format!("/accounts/{}/invoices/pay", card_id);
    let response = app
        .post(&pay_path, &json!({ "reference_date": "2024-03-01" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let response = app
        .post(&pay_path, &json!({ "reference_date": "2024-03-10" }))
        .await;
    assert_eq!(response.status().as_u16(), 409);

    // History walks backwards from the reference period
    let response = app
        .get(&format!(
            "/accounts/{}/invoices?months=3&reference_date=2024-03-15",
            card_id
        ))
        .await;
    let history: Vec<Value> = response.json().await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["period_end"], "2024-04-10");
    assert_eq!(money(&history[0]["total"]), dec!(50.00));
    assert_eq!(history[1]["is_paid"], true);
    assert_eq!(history[2]["period_end"], "2024-02-10");

    // Unpay
    let response = app
        .delete(&format!("{}?reference_date=2024-03-05", pay_path))
        .await;
    assert_eq!(response.status().as_u16(), 204);
    let response = app
        .delete(&format!("{}?reference_date=2024-03-05", pay_path))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn invoice_of_non_card_account_is_bad_request() {
    let app = spawn_app().await;
    let account = app
        .create_account(json!({ "name": "Conta", "account_type": "checking" }))
        .await;

    let response = app
        .get(&format!(
            "/accounts/{}/invoice",
            account["account_id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

//! Transactions and the dashboard.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TestApp, body_json};

async fn create_transaction(
    app: &TestApp,
    token: &str,
    description: &str,
    amount: f64,
    kind: &str,
    status: &str,
    due_date: &str,
) {
    let response = app
        .post_json(
            "/api/transactions",
            json!({
                "description": description,
                "amount": amount,
                "type": kind,
                "status": status,
                "dueDate": due_date,
            }),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED, "{description}");
}

#[tokio::test]
async fn transaction_validation() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("owner@example.com", "Loja").await;

    let missing = app
        .post_json(
            "/api/transactions",
            json!({ "description": "Aluguel", "amount": 100.0 }),
            Some(&token),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(missing).await["message"],
        "Description, amount, type and due date are required"
    );

    let bad_type = app
        .post_json(
            "/api/transactions",
            json!({ "description": "X", "amount": 1.0, "type": "GIFT", "dueDate": "2025-01-10" }),
            Some(&token),
        )
        .await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad_type).await["message"], "Type must be INCOME or EXPENSE");

    let zero = app
        .post_json(
            "/api/transactions",
            json!({ "description": "X", "amount": 0.0, "type": "INCOME", "dueDate": "2025-01-10" }),
            Some(&token),
        )
        .await;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let foreign_order = app
        .post_json(
            "/api/transactions",
            json!({
                "description": "X",
                "amount": 10.0,
                "type": "INCOME",
                "dueDate": "2025-01-10",
                "orderId": uuid::Uuid::new_v4(),
            }),
            Some(&token),
        )
        .await;
    assert_eq!(foreign_order.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn paid_transactions_are_stamped() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("owner@example.com", "Loja").await;

    let response = app
        .post_json(
            "/api/transactions",
            json!({
                "description": "Venda balcão",
                "amount": 45.5,
                "type": "INCOME",
                "status": "PAID",
                "dueDate": "2025-03-01",
            }),
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["transaction"]["type"], "INCOME");
    assert!(body["transaction"]["paidAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn transaction_list_filters_and_orders_by_due_date() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("owner@example.com", "Loja").await;

    create_transaction(&app, &token, "Fornecedor", 300.0, "EXPENSE", "PENDING", "2025-02-20").await;
    create_transaction(&app, &token, "Venda", 150.0, "INCOME", "PENDING", "2025-02-05").await;
    create_transaction(&app, &token, "Aluguel", 1000.0, "EXPENSE", "PAID", "2025-02-28T18:30:00Z").await;
    create_transaction(&app, &token, "Março", 10.0, "INCOME", "PENDING", "2025-03-01").await;

    let all = body_json(app.get("/api/transactions", Some(&token)).await).await;
    let descriptions: Vec<_> = all["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(descriptions, ["Venda", "Fornecedor", "Aluguel", "Março"]);

    let expenses = body_json(app.get("/api/transactions?type=EXPENSE", Some(&token)).await).await;
    assert_eq!(expenses["pagination"]["total"], 2);

    let february = body_json(
        app.get(
            "/api/transactions?startDate=2025-02-01&endDate=2025-02-28",
            Some(&token),
        )
        .await,
    )
    .await;
    assert_eq!(february["pagination"]["total"], 3);

    let bad = app.get("/api/transactions?startDate=yesterday", Some(&token)).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn dashboard_summarizes_workspace() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("owner@example.com", "Loja").await;
    let client_id = app.create_client(&token, "Ana").await;
    let mouse = app.create_product(&token, "Mouse", 50.0, 3).await;
    app.create_product(&token, "Cabo", 10.0, 40).await;

    let sale = app
        .post_json(
            "/api/orders",
            json!({
                "clientId": client_id,
                "status": "SOLD",
                "items": [{ "productId": mouse, "quantity": 2 }],
            }),
            Some(&token),
        )
        .await;
    assert_eq!(sale.status(), StatusCode::CREATED);

    create_transaction(&app, &token, "A receber", 500.0, "INCOME", "PENDING", "2025-05-01").await;
    create_transaction(&app, &token, "A pagar", 200.0, "EXPENSE", "PENDING", "2025-05-01").await;
    create_transaction(&app, &token, "Pago", 999.0, "EXPENSE", "PAID", "2025-05-01").await;

    let response = app.get("/api/dashboard", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = &body_json(response).await["dashboard"];

    assert_eq!(dashboard["overview"]["totalClients"], 1);
    assert_eq!(dashboard["overview"]["totalProducts"], 2);
    assert_eq!(dashboard["overview"]["lowStockProducts"], 1);
    assert_eq!(dashboard["overview"]["currentMonthRevenue"], 100.0);
    assert_eq!(dashboard["overview"]["currentMonthOrders"], 1);
    assert_eq!(dashboard["financial"]["pendingReceivables"], 500.0);
    assert_eq!(dashboard["financial"]["pendingPayables"], 200.0);
    assert_eq!(dashboard["financial"]["cashFlow"], 300.0);
    assert_eq!(dashboard["recentOrders"][0]["clientName"], "Ana");
    Ok(())
}

//! Demo workspace seeding
//!
//! Everything goes through the repositories, so the seeded data obeys the
//! same rules as data created over HTTP (stock is taken by the sold order,
//! totals are computed from items).

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;

use crate::auth::hash_password;
use crate::models::{OrderStatus, TransactionStatus, TransactionType};
use crate::repositories::{
    ClientRepository, OrderRepository, ProductRepository, TransactionRepository, UserRepository,
    client::NewClient,
    order::{NewOrder, NewOrderItem},
    product::NewProduct,
    transaction::NewTransaction,
    user::NewRegistration,
};

pub const DEMO_EMAIL: &str = "admin@teste.com";
pub const DEMO_PASSWORD: &str = "123456";
const DEMO_WORKSPACE: &str = "Empresa Demo";

/// Seeds the demo workspace. Does nothing if the demo admin already exists.
///
/// Returns `true` when data was inserted.
pub async fn seed_demo(db: &DatabaseConnection) -> Result<bool> {
    let users = UserRepository::new(db);
    if users.find_by_email(DEMO_EMAIL).await?.is_some() {
        tracing::info!(email = DEMO_EMAIL, "Demo data already present, skipping");
        return Ok(false);
    }

    let password_hash = hash_password(DEMO_PASSWORD.to_string()).await?;
    let (_, workspace) = users
        .register(NewRegistration {
            name: "Administrador".to_string(),
            email: DEMO_EMAIL.to_string(),
            password_hash,
            workspace_name: DEMO_WORKSPACE.to_string(),
        })
        .await
        .context("Failed to create demo user")?;
    let ws = workspace.id;

    let client_repo = ClientRepository::new(db);
    let mut clients = Vec::new();
    for (name, document, email, phone) in [
        ("João Silva", "12345678901", "joao@email.com", "(11) 99999-1111"),
        ("Maria Santos", "98765432100", "maria@email.com", "(11) 99999-2222"),
        ("Empresa ABC Ltda", "12345678000199", "contato@empresaabc.com", "(11) 3333-4444"),
    ] {
        let client = client_repo
            .create(
                ws,
                NewClient {
                    name: name.to_string(),
                    document: Some(document.to_string()),
                    email: Some(email.to_string()),
                    phone: Some(phone.to_string()),
                },
            )
            .await?;
        clients.push(client);
    }

    let product_repo = ProductRepository::new(db);
    let goods = |name: &str, sku: &str, price: f64, cost: f64, quantity: i32, min_stock: i32| {
        NewProduct {
            name: name.to_string(),
            sku: Some(sku.to_string()),
            price,
            cost_price: Some(cost),
            quantity: Some(quantity),
            min_stock: Some(min_stock),
            ..Default::default()
        }
    };
    let product_a = product_repo
        .create(ws, goods("Produto A", "PROD-001", 99.90, 50.00, 100, 10))
        .await?;
    let product_b = product_repo
        .create(ws, goods("Produto B", "PROD-002", 149.90, 75.00, 50, 5))
        .await?;
    let consulting = product_repo
        .create(
            ws,
            NewProduct {
                name: "Consultoria".to_string(),
                price: 200.00,
                is_service: true,
                ..Default::default()
            },
        )
        .await?;
    product_repo
        .create(
            ws,
            goods("Produto C - Estoque Baixo", "PROD-003", 79.90, 40.00, 3, 10),
        )
        .await?;

    let order_repo = OrderRepository::new(db);
    let (sale, _) = order_repo
        .create(
            ws,
            NewOrder {
                client_id: clients[0].id,
                status: OrderStatus::Sold,
                notes: None,
                items: vec![
                    NewOrderItem {
                        product_id: product_a.id,
                        quantity: 2,
                        unit_price: None,
                    },
                    NewOrderItem {
                        product_id: product_b.id,
                        quantity: 1,
                        unit_price: None,
                    },
                ],
            },
        )
        .await?;
    order_repo
        .create(
            ws,
            NewOrder {
                client_id: clients[1].id,
                status: OrderStatus::Budget,
                notes: None,
                items: vec![NewOrderItem {
                    product_id: consulting.id,
                    quantity: 1,
                    unit_price: None,
                }],
            },
        )
        .await?;

    let now = Utc::now();
    let transaction_repo = TransactionRepository::new(db);
    for new_transaction in [
        NewTransaction {
            description: "Venda para João Silva".to_string(),
            amount: sale.total_amount,
            kind: TransactionType::Income,
            status: TransactionStatus::Paid,
            category: Some("Vendas".to_string()),
            due_date: now,
            order_id: Some(sale.id),
        },
        NewTransaction {
            description: "Pagamento fornecedor".to_string(),
            amount: 500.00,
            kind: TransactionType::Expense,
            status: TransactionStatus::Pending,
            category: Some("Fornecedores".to_string()),
            due_date: now + Duration::days(7),
            order_id: None,
        },
        NewTransaction {
            description: "Aluguel do escritório".to_string(),
            amount: 1200.00,
            kind: TransactionType::Expense,
            status: TransactionStatus::Paid,
            category: Some("Despesas Fixas".to_string()),
            due_date: now,
            order_id: None,
        },
    ] {
        transaction_repo.create(ws, new_transaction).await?;
    }

    tracing::info!(workspace_id = %ws, email = DEMO_EMAIL, "Seeded demo workspace");
    Ok(true)
}

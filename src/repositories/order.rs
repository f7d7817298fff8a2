//! # Order Repository
//!
//! Orders are created together with their items in one database
//! transaction. Selling (`SOLD`) takes the items out of stock; if any
//! product lacks stock the whole order is rolled back.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{PageRequest, product};
use crate::error::RepositoryError;
use crate::models::{
    Client, Order, OrderItem, OrderStatus,
    client::{self, Model as ClientModel},
    order::{self, Model as OrderModel},
    order_item::{self, Model as OrderItemModel},
};

/// One requested line of a new order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Falls back to the product's current price
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Filters for [`OrderRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<Uuid>,
}

/// An order row with its client and item count
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order: OrderModel,
    pub client: Option<ClientModel>,
    pub items_count: i64,
}

pub struct OrderRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrderRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List orders newest first.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<OrderSummary>, u64), RepositoryError> {
        let mut query = Order::find().filter(order::Column::WorkspaceId.eq(workspace_id));

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(order::Column::ClientId.eq(client_id));
        }

        let rows = query
            .clone()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .find_also_related(Client)
            .all(self.db);
        let total = query.count(self.db);
        let (orders, total) = tokio::try_join!(rows, total)?;

        let ids: Vec<Uuid> = orders.iter().map(|(order, _)| order.id).collect();
        let counts = self.item_counts(&ids).await?;

        let orders = orders
            .into_iter()
            .map(|(order, client)| OrderSummary {
                items_count: counts.get(&order.id).copied().unwrap_or(0),
                order,
                client,
            })
            .collect();

        Ok((orders, total))
    }

    /// Create an order and its items.
    ///
    /// The client and every product must belong to the workspace. For a
    /// `SOLD` order each stocked product must have enough units on hand.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        new_order: NewOrder,
    ) -> Result<(OrderModel, Vec<OrderItemModel>), RepositoryError> {
        validate(&new_order)?;

        let txn = self.db.begin().await?;

        let client = Client::find_by_id(new_order.client_id)
            .filter(client::Column::WorkspaceId.eq(workspace_id))
            .one(&txn)
            .await?;
        if client.is_none() {
            return Err(RepositoryError::not_found("Client not found"));
        }

        let mut product_ids: Vec<Uuid> = new_order.items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products: HashMap<Uuid, _> =
            product::find_in_workspace(&txn, workspace_id, &product_ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();
        if products.len() != product_ids.len() {
            return Err(RepositoryError::not_found("Product not found"));
        }

        let mut lines = Vec::with_capacity(new_order.items.len());
        let mut wanted: HashMap<Uuid, i32> = HashMap::new();
        for item in &new_order.items {
            let Some(product) = products.get(&item.product_id) else {
                return Err(RepositoryError::not_found("Product not found"));
            };
            let unit_price = item.unit_price.unwrap_or(product.price);
            if !unit_price.is_finite() || unit_price < 0.0 {
                return Err(RepositoryError::validation_error(
                    "Unit price cannot be negative",
                ));
            }
            if !product.is_service {
                let total = wanted.entry(product.id).or_default();
                *total = total.checked_add(item.quantity).ok_or_else(|| {
                    RepositoryError::validation_error("Item quantity is too large")
                })?;
            }
            lines.push((item.product_id, item.quantity, unit_price));
        }

        if new_order.status == OrderStatus::Sold {
            for product_id in &product_ids {
                let Some(&quantity) = wanted.get(product_id) else {
                    continue;
                };
                if !product::decrement_stock(&txn, *product_id, quantity).await? {
                    let name = products
                        .get(product_id)
                        .map(|p| p.name.as_str())
                        .unwrap_or_default();
                    return Err(RepositoryError::conflict(format!(
                        "Insufficient stock for product {name}"
                    )));
                }
            }
        }

        let total_amount: f64 = lines
            .iter()
            .map(|(_, quantity, unit_price)| f64::from(*quantity) * unit_price)
            .sum();

        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            client_id: Set(new_order.client_id),
            status: Set(new_order.status),
            total_amount: Set(total_amount),
            notes: Set(new_order.notes),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity, unit_price) in lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        txn.commit().await?;

        tracing::info!(
            order_id = %order.id,
            workspace_id = %workspace_id,
            status = %order.status,
            total_amount = order.total_amount,
            "Created order"
        );
        Ok((order, items))
    }

    async fn item_counts(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = OrderItem::find()
            .select_only()
            .column(order_item::Column::OrderId)
            .column_as(order_item::Column::Id.count(), "items_count")
            .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
            .group_by(order_item::Column::OrderId)
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}

fn validate(new_order: &NewOrder) -> Result<(), RepositoryError> {
    if new_order.status == OrderStatus::Canceled {
        return Err(RepositoryError::validation_error(
            "Orders can only be created as BUDGET or SOLD",
        ));
    }
    if new_order.items.is_empty() {
        return Err(RepositoryError::validation_error(
            "An order needs at least one item",
        ));
    }
    if new_order.items.iter().any(|item| item.quantity <= 0) {
        return Err(RepositoryError::validation_error(
            "Item quantity must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::repositories::client::{ClientRepository, NewClient};
    use crate::repositories::product::{NewProduct, ProductRepository};
    use crate::repositories::test_support::{create_workspace, setup_db};

    struct Fixture {
        db: DatabaseConnection,
        ws: Uuid,
        client_id: Uuid,
        stocked_id: Uuid,
        service_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = setup_db().await;
        let ws = create_workspace(&db, "Loja").await;

        let client_id = ClientRepository::new(&db)
            .create(
                ws,
                NewClient {
                    name: "Ana".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id;

        let products = ProductRepository::new(&db);
        let stocked_id = products
            .create(
                ws,
                NewProduct {
                    name: "Cadeira".to_string(),
                    price: 200.0,
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id;
        let service_id = products
            .create(
                ws,
                NewProduct {
                    name: "Montagem".to_string(),
                    price: 50.0,
                    is_service: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id;

        Fixture {
            db,
            ws,
            client_id,
            stocked_id,
            service_id,
        }
    }

    fn item(product_id: Uuid, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id,
            quantity,
            unit_price: None,
        }
    }

    async fn stock_of(db: &DatabaseConnection, product_id: Uuid) -> i32 {
        Product::find_by_id(product_id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn sold_order_totals_items_and_takes_stock() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.db);

        let (order, items) = repo
            .create(
                f.ws,
                NewOrder {
                    client_id: f.client_id,
                    status: OrderStatus::Sold,
                    notes: None,
                    items: vec![
                        item(f.stocked_id, 2),
                        NewOrderItem {
                            unit_price: Some(80.0),
                            ..item(f.service_id, 1)
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(order.total_amount, 480.0);
        assert_eq!(stock_of(&f.db, f.stocked_id).await, 1);
    }

    #[tokio::test]
    async fn budget_order_leaves_stock_untouched() {
        let f = fixture().await;

        OrderRepository::new(&f.db)
            .create(
                f.ws,
                NewOrder {
                    client_id: f.client_id,
                    status: OrderStatus::Budget,
                    notes: Some("orçamento".to_string()),
                    items: vec![item(f.stocked_id, 10)],
                },
            )
            .await
            .unwrap();

        assert_eq!(stock_of(&f.db, f.stocked_id).await, 3);
    }

    #[tokio::test]
    async fn overselling_conflicts_without_partial_writes() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.db);

        let err = repo
            .create(
                f.ws,
                NewOrder {
                    client_id: f.client_id,
                    status: OrderStatus::Sold,
                    notes: None,
                    items: vec![item(f.stocked_id, 2), item(f.stocked_id, 2)],
                },
            )
            .await
            .unwrap_err();

        assert!(
            matches!(err, RepositoryError::Conflict(ref msg) if msg == "Insufficient stock for product Cadeira")
        );
        assert_eq!(stock_of(&f.db, f.stocked_id).await, 3);
        assert_eq!(Order::find().count(&f.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn foreign_client_or_product_is_not_found() {
        let f = fixture().await;
        let other_ws = create_workspace(&f.db, "Outra").await;
        let repo = OrderRepository::new(&f.db);

        let err = repo
            .create(
                other_ws,
                NewOrder {
                    client_id: f.client_id,
                    status: OrderStatus::Budget,
                    notes: None,
                    items: vec![item(f.stocked_id, 1)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(ref msg) if msg == "Client not found"));

        let err = repo
            .create(
                f.ws,
                NewOrder {
                    client_id: f.client_id,
                    status: OrderStatus::Budget,
                    notes: None,
                    items: vec![item(Uuid::new_v4(), 1)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(ref msg) if msg == "Product not found"));
    }

    #[tokio::test]
    async fn empty_or_non_positive_items_are_invalid() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.db);

        for items in [vec![], vec![item(f.stocked_id, 0)]] {
            let err = repo
                .create(
                    f.ws,
                    NewOrder {
                        client_id: f.client_id,
                        status: OrderStatus::Budget,
                        notes: None,
                        items,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, RepositoryError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn repeated_lines_whose_quantities_overflow_are_invalid() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.db);

        for status in [OrderStatus::Sold, OrderStatus::Budget] {
            let err = repo
                .create(
                    f.ws,
                    NewOrder {
                        client_id: f.client_id,
                        status,
                        notes: None,
                        items: vec![
                            NewOrderItem {
                                product_id: f.stocked_id,
                                quantity: 2_000_000_000,
                                unit_price: None,
                            },
                            NewOrderItem {
                                product_id: f.stocked_id,
                                quantity: 2_000_000_000,
                                unit_price: None,
                            },
                        ],
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, RepositoryError::Validation(_)));
        }

        let stocked = Product::find_by_id(f.stocked_id)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stocked.quantity, 3);
        assert_eq!(Order::find().count(&f.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_counts_items() {
        let f = fixture().await;
        let repo = OrderRepository::new(&f.db);

        for status in [OrderStatus::Budget, OrderStatus::Sold] {
            repo.create(
                f.ws,
                NewOrder {
                    client_id: f.client_id,
                    status,
                    notes: None,
                    items: vec![item(f.stocked_id, 1), item(f.service_id, 1)],
                },
            )
            .await
            .unwrap();
        }

        let (sold, total) = repo
            .list(
                f.ws,
                OrderFilter {
                    status: Some(OrderStatus::Sold),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(sold[0].items_count, 2);
        assert_eq!(sold[0].client.as_ref().map(|c| c.name.as_str()), Some("Ana"));
    }
}

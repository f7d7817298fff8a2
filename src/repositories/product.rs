//! # Product Repository
//!
//! Catalogue and stock queries. Low stock means a non-service product whose
//! quantity is at or below its own `min_stock`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use uuid::Uuid;

use super::{PageRequest, contains_ignore_case};
use crate::error::RepositoryError;
use crate::models::{
    Product,
    product::{self, Model as ProductModel},
};

/// Minimum stock applied to goods created without one
pub const DEFAULT_MIN_STOCK: i32 = 5;

/// Data for a new product
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: f64,
    pub cost_price: Option<f64>,
    pub quantity: Option<i32>,
    pub min_stock: Option<i32>,
    pub is_service: bool,
}

impl NewProduct {
    /// Checks the numeric invariants: no negative prices, quantity or minimum stock.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        let invalid_price = |price: f64| !price.is_finite() || price < 0.0;
        if invalid_price(self.price) || self.cost_price.is_some_and(invalid_price) {
            return Err(RepositoryError::validation_error("Prices cannot be negative"));
        }
        if self.quantity.is_some_and(|q| q < 0) {
            return Err(RepositoryError::validation_error("Quantity cannot be negative"));
        }
        if self.min_stock.is_some_and(|m| m < 0) {
            return Err(RepositoryError::validation_error(
                "Minimum stock cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Condition selecting goods at or below their minimum stock.
pub(crate) fn low_stock_condition() -> Condition {
    Condition::all()
        .add(product::Column::IsService.eq(false))
        .add(Expr::col(product::Column::Quantity).lte(Expr::col(product::Column::MinStock)))
}

pub struct ProductRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProductRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List products ordered by name, searching name and SKU, optionally
    /// restricted to low-stock goods.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        search: Option<&str>,
        low_stock_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<ProductModel>, u64), RepositoryError> {
        let mut query = Product::find().filter(product::Column::WorkspaceId.eq(workspace_id));

        if let Some(term) = search {
            query = query.filter(
                Condition::any()
                    .add(contains_ignore_case(product::Column::Name, term))
                    .add(contains_ignore_case(product::Column::Sku, term)),
            );
        }

        if low_stock_only {
            query = query.filter(low_stock_condition());
        }

        let rows = query
            .clone()
            .order_by_asc(product::Column::Name)
            .order_by_asc(product::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db);
        let total = query.count(self.db);
        let (products, total) = tokio::try_join!(rows, total)?;

        Ok((products, total))
    }

    /// Create a product. Services never carry stock.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        new_product: NewProduct,
    ) -> Result<ProductModel, RepositoryError> {
        new_product.validate()?;

        if let Some(sku) = new_product.sku.as_deref() {
            let taken = Product::find()
                .filter(product::Column::WorkspaceId.eq(workspace_id))
                .filter(product::Column::Sku.eq(sku))
                .count(self.db)
                .await?;
            if taken > 0 {
                return Err(RepositoryError::conflict(
                    "A product with this SKU already exists",
                ));
            }
        }

        let (quantity, min_stock) = if new_product.is_service {
            (0, 0)
        } else {
            (
                new_product.quantity.unwrap_or(0),
                new_product.min_stock.unwrap_or(DEFAULT_MIN_STOCK),
            )
        };

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            name: Set(new_product.name),
            description: Set(new_product.description),
            sku: Set(new_product.sku),
            price: Set(new_product.price),
            cost_price: Set(new_product.cost_price),
            quantity: Set(quantity),
            min_stock: Set(min_stock),
            is_service: Set(new_product.is_service),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;

        Ok(product)
    }
}

/// Load the given products if they all belong to the workspace.
pub(crate) async fn find_in_workspace<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    product_ids: &[Uuid],
) -> Result<Vec<ProductModel>, RepositoryError> {
    Product::find()
        .filter(product::Column::WorkspaceId.eq(workspace_id))
        .filter(product::Column::Id.is_in(product_ids.iter().copied()))
        .all(conn)
        .await
        .map_err(RepositoryError::database_error)
}

/// Take `quantity` units out of stock, only if that many are on hand.
///
/// Returns `false` when the stock was insufficient and nothing changed.
/// `quantity` must be positive.
pub(crate) async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    if quantity <= 0 {
        return Err(RepositoryError::validation_error(
            "Quantity must be greater than zero",
        ));
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Quantity.gte(quantity))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

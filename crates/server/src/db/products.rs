//! Product catalog repository for `PostgreSQL`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use reparto_core::ProductId;

use super::{ProductCatalog, RepositoryError};
use crate::models::Product;

/// Repository for catalog reads.
#[derive(Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT id, name, description, price FROM products ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, description, price FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(ProductRow::into_product))
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
        }
    }
}

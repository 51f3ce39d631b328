//! Product repository
//!
//! CRUD over the `products` table. Update and delete report how many rows
//! they touched; a missing id is simply zero.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Product, ProductInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>>;

    /// Insert under a freshly generated UUIDv4 id
    async fn create(&self, input: &ProductInput) -> Result<Product>;

    async fn update(&self, id: &str, input: &ProductInput) -> Result<u64>;

    async fn delete(&self, id: &str) -> Result<u64>;
}

pub struct SqlxProductRepository {
    pool: DynDatabasePool,
}

impl SqlxProductRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProductRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProductRepository for SqlxProductRepository {
    async fn list(&self) -> Result<Vec<Product>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_products_sqlite(pool).await,
            Backend::Mysql(pool) => list_products_mysql(pool).await,
        }
    }

    async fn create(&self, input: &ProductInput) -> Result<Product> {
        let product = Product::from_input(uuid::Uuid::new_v4().to_string(), input.clone());
        match self.pool.backend() {
            Backend::Sqlite(pool) => insert_product_sqlite(pool, &product).await?,
            Backend::Mysql(pool) => insert_product_mysql(pool, &product).await?,
        }
        Ok(product)
    }

    async fn update(&self, id: &str, input: &ProductInput) -> Result<u64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_product_sqlite(pool, id, input).await,
            Backend::Mysql(pool) => update_product_mysql(pool, id, input).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let result = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(DELETE_PRODUCT)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(DELETE_PRODUCT)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        };
        result.context("Failed to delete product")
    }
}

const SELECT_PRODUCT: &str = "SELECT id, name, description, image, price, available FROM products";
const INSERT_PRODUCT: &str = r#"
    INSERT INTO products (id, name, description, image, price, available)
    VALUES (?, ?, ?, ?, ?, ?)
"#;
const UPDATE_PRODUCT: &str = r#"
    UPDATE products
    SET name = ?, description = ?, image = ?, price = ?, available = ?
    WHERE id = ?
"#;
const DELETE_PRODUCT: &str = "DELETE FROM products WHERE id = ?";

// ============================================================================
// SQLite
// ============================================================================

async fn list_products_sqlite(pool: &SqlitePool) -> Result<Vec<Product>> {
    let rows = sqlx::query(&format!("{} ORDER BY name, id", SELECT_PRODUCT))
        .fetch_all(pool)
        .await
        .context("Failed to list products")?;

    Ok(rows.iter().map(row_to_product_sqlite).collect())
}

async fn insert_product_sqlite(pool: &SqlitePool, product: &Product) -> Result<()> {
    sqlx::query(INSERT_PRODUCT)
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.price)
        .bind(product.available)
        .execute(pool)
        .await
        .context("Failed to create product")?;

    Ok(())
}

async fn update_product_sqlite(pool: &SqlitePool, id: &str, input: &ProductInput) -> Result<u64> {
    let result = sqlx::query(UPDATE_PRODUCT)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.price)
        .bind(input.available)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update product")?;

    Ok(result.rows_affected())
}

fn row_to_product_sqlite(row: &sqlx::sqlite::SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        image: row.get("image"),
        price: row.get("price"),
        available: row.get("available"),
    }
}

// ============================================================================
// MySQL
// ============================================================================

async fn list_products_mysql(pool: &MySqlPool) -> Result<Vec<Product>> {
    let rows = sqlx::query(&format!("{} ORDER BY name, id", SELECT_PRODUCT))
        .fetch_all(pool)
        .await
        .context("Failed to list products")?;

    Ok(rows.iter().map(row_to_product_mysql).collect())
}

async fn insert_product_mysql(pool: &MySqlPool, product: &Product) -> Result<()> {
    sqlx::query(INSERT_PRODUCT)
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.price)
        .bind(product.available)
        .execute(pool)
        .await
        .context("Failed to create product")?;

    Ok(())
}

async fn update_product_mysql(pool: &MySqlPool, id: &str, input: &ProductInput) -> Result<u64> {
    let result = sqlx::query(UPDATE_PRODUCT)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.price)
        .bind(input.available)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update product")?;

    Ok(result.rows_affected())
}

fn row_to_product_mysql(row: &sqlx::mysql::MySqlRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        image: row.get("image"),
        price: row.get("price"),
        available: row.get("available"),
    }
}

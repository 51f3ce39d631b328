//! Product service
//!
//! Thin validation layer over the product repository. Authorization happens
//! in the HTTP layer before these methods are reached.

use crate::db::repositories::ProductRepository;
use crate::models::{Product, ProductInput};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Widths of the `products.name` and `products.image` columns
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_IMAGE_LEN: usize = 1024;

fn validate(input: &ProductInput) -> Result<(), ProductServiceError> {
    if input.name.trim().is_empty() {
        return Err(ProductServiceError::ValidationError(
            "Product name cannot be empty".to_string(),
        ));
    }
    if input.name.chars().count() > MAX_NAME_LEN {
        return Err(ProductServiceError::ValidationError(format!(
            "Product name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if input.image.chars().count() > MAX_IMAGE_LEN {
        return Err(ProductServiceError::ValidationError(format!(
            "Image reference must be at most {} characters",
            MAX_IMAGE_LEN
        )));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ProductServiceError::ValidationError(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Product>, ProductServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Store a new product and return it with its generated id.
    pub async fn create(&self, input: ProductInput) -> Result<Product, ProductServiceError> {
        validate(&input)?;
        let product = self.repo.create(&input).await?;
        tracing::info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    /// Overwrite the product with `id`. A missing id changes nothing and is
    /// not reported.
    pub async fn update(&self, id: &str, input: ProductInput) -> Result<(), ProductServiceError> {
        validate(&input)?;
        let affected = self.repo.update(id, &input).await?;
        tracing::debug!("Update of product {} touched {} row(s)", id, affected);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ProductServiceError> {
        let affected = self.repo.delete(id).await?;
        tracing::debug!("Delete of product {} touched {} row(s)", id, affected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxProductRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> ProductService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ProductService::new(SqlxProductRepository::boxed(pool))
    }

    fn input(name: &str, price: f64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: String::new(),
            image: String::new(),
            price,
            available: 1,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup_test_service().await;

        let created = service.create(input("Candle", 7.25)).await.unwrap();
        let listed = service.list().await.unwrap();

        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_rejects_blank_name_and_bad_price() {
        let service = setup_test_service().await;

        for bad in [input("   ", 1.0), input("Candle", -0.5), input("Candle", f64::NAN), input("Candle", f64::INFINITY)] {
            let result = service.create(bad).await;
            assert!(matches!(result, Err(ProductServiceError::ValidationError(_))));
        }
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_values_wider_than_columns() {
        let service = setup_test_service().await;

        let long_name = input(&"n".repeat(MAX_NAME_LEN + 1), 1.0);
        assert!(matches!(
            service.create(long_name).await,
            Err(ProductServiceError::ValidationError(_))
        ));

        let mut long_image = input("Candle", 1.0);
        long_image.image = "i".repeat(MAX_IMAGE_LEN + 1);
        assert!(matches!(
            service.create(long_image).await,
            Err(ProductServiceError::ValidationError(_))
        ));

        assert!(service.create(input(&"n".repeat(MAX_NAME_LEN), 1.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_free_product_allowed() {
        let service = setup_test_service().await;
        assert!(service.create(input("Sticker", 0.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = setup_test_service().await;
        let created = service.create(input("Candle", 7.25)).await.unwrap();

        service.update(&created.id, input("Big candle", 9.0)).await.unwrap();
        let listed = service.list().await.unwrap();
        assert_eq!(listed[0].name, "Big candle");

        service.delete(&created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_is_acknowledged() {
        let service = setup_test_service().await;

        assert!(service.update("nope", input("Ghost", 1.0)).await.is_ok());
        assert!(service.delete("nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_validates_input() {
        let service = setup_test_service().await;
        let created = service.create(input("Candle", 7.25)).await.unwrap();

        let result = service.update(&created.id, input("", 7.25)).await;
        assert!(matches!(result, Err(ProductServiceError::ValidationError(_))));
        assert_eq!(service.list().await.unwrap()[0].name, "Candle");
    }
}

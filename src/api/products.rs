//! Product catalog endpoints
//!
//! Listing is public; every mutation is mounted behind the admin gate.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::middleware::{ApiError, ApiJson, AppState};
use super::MessageResponse;
use crate::models::{Product, ProductInput};

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    #[serde(default)]
    pub available: i64,
}

impl UpdateProductRequest {
    fn into_parts(self) -> (String, ProductInput) {
        (
            self.id,
            ProductInput {
                name: self.name,
                description: self.description,
                image: self.image,
                price: self.price,
                available: self.available,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ProductCreatedResponse {
    pub message: String,
    pub id: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/get_products", get(get_products))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/add_product", post(add_product))
        .route("/update_product", post(update_product))
        .route("/remove_product", post(remove_product))
}

/// GET /api/v1/get_products
async fn get_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.product_service.list().await?))
}

/// POST /api/v1/add_product
async fn add_product(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductInput>,
) -> Result<Json<ProductCreatedResponse>, ApiError> {
    let product = state.product_service.create(body).await?;

    Ok(Json(ProductCreatedResponse {
        message: "Product added".to_string(),
        id: product.id,
    }))
}

/// POST /api/v1/update_product
async fn update_product(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (id, input) = body.into_parts();
    state.product_service.update(&id, input).await?;

    Ok(Json(MessageResponse::new("Product updated")))
}

/// POST /api/v1/remove_product
async fn remove_product(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RemoveProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.product_service.delete(&body.id).await?;

    Ok(Json(MessageResponse::new("Product removed")))
}

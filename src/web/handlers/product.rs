//! Product catalog handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::db::product::NewProduct;
use crate::db::{Product, ProductRepository};
use crate::web::dto::{
    CreateProductRequest, ListResponse, ProductListQuery, UpdateProductRequest, ValidatedJson,
};
use crate::web::error::ApiError;

use super::AppState;

/// `GET /api/products` — public catalog listing with typed filters.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ListResponse<Product>>, ApiError> {
    let repo = ProductRepository::new(state.db.pool());
    let (filter, pagination) = query.into_filter();

    let total = repo.count(&filter).await?;
    let items = repo.list(&filter).await?;

    Ok(Json(ListResponse {
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
    }))
}

/// `GET /api/products/:id` — public.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let repo = ProductRepository::new(state.db.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(product))
}

/// `POST /api/products` — admin/staff.
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let repo = ProductRepository::new(state.db.pool());

    let new_product = NewProduct {
        name: request.name,
        description: request.description,
        price: request.price,
        sale_price: request.sale_price,
        category: request.category,
        image: request.image,
        in_stock: request.in_stock.unwrap_or(true),
        stock_count: request.stock_count.unwrap_or(0),
        sku: request.sku,
    };

    let product = repo.create(&new_product).await.map_err(|e| {
        // A slug collision surfaces as a unique constraint violation
        if e.to_string().contains("UNIQUE") {
            ApiError::conflict("A product with this name already exists")
        } else {
            e.into()
        }
    })?;

    tracing::info!(product_id = product.id, slug = %product.slug, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/:id` — admin/staff.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let repo = ProductRepository::new(state.db.pool());

    let product = repo
        .update(id, &request.into_update())
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    tracing::info!(product_id = product.id, "Product updated");

    Ok(Json(product))
}

/// `DELETE /api/products/:id` — admin/staff.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = ProductRepository::new(state.db.pool());

    if !repo.delete(id).await? {
        return Err(ApiError::not_found("Product not found"));
    }

    tracing::info!(product_id = id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

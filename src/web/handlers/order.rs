//! Order handlers: public checkout plus back-office management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::db::order::{NewOrder, OrderItem, OrderStatus};
use crate::db::{Order, OrderRepository, ProductRepository};
use crate::web::dto::{
    CreateOrderRequest, ListResponse, OrderListQuery, UpdateOrderStatusRequest, ValidatedJson,
};
use crate::web::error::ApiError;

use super::AppState;

/// `POST /api/orders` — public checkout.
///
/// Line items snapshot the catalog at order time: name and effective price
/// (sale price when set) are copied into the order.
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let products = ProductRepository::new(state.db.pool());

    let mut items = Vec::with_capacity(request.items.len());
    for item in &request.items {
        let product = products
            .get_by_id(item.product_id)
            .await?
            .ok_or_else(|| ApiError::unprocessable(format!("Unknown product {}", item.product_id)))?;

        if !product.in_stock {
            return Err(ApiError::unprocessable(format!(
                "Product '{}' is out of stock",
                product.name
            )));
        }

        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            price: product.sale_price.unwrap_or(product.price),
            quantity: item.quantity,
        });
    }

    let new_order = NewOrder {
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        customer_phone: request.customer_phone,
        shipping_address: request.shipping_address,
        items,
        notes: request.notes,
    };

    let repo = OrderRepository::new(state.db.pool());
    let order = repo.create(&new_order).await?;

    tracing::info!(order_id = order.id, order_number = %order.order_number, "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders` — back-office listing.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ListResponse<Order>>, ApiError> {
    let repo = OrderRepository::new(state.db.pool());
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

/// `GET /api/orders/:id` — back-office.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let repo = OrderRepository::new(state.db.pool());
    let order = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    Ok(Json(order))
}

/// `PUT /api/orders/:id/status` — admin/staff.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: OrderStatus = request
        .status
        .parse()
        .map_err(|e: String| ApiError::unprocessable(e))?;

    let repo = OrderRepository::new(state.db.pool());
    let order = repo
        .update_status(id, status, request.tracking_number.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    tracing::info!(order_id = order.id, status = %order.status, "Order status updated");

    Ok(Json(order))
}

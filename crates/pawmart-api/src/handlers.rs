use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use mongodb::bson::Document;
use pawmart_store::{ListingQuery, ListingUpdate, Store};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::envelope::{
    ApiError, CategoriesResponse, DeleteReceipt, InsertReceipt, ListingResponse,
    ListingsPageResponse, MessageResponse, OrdersResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

/// Raw query-string parameters for `GET /listings`. Kept as strings so
/// malformed numbers clamp to defaults instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        get_root,
        get_categories,
        get_listings,
        get_listing,
        post_listing,
        patch_listing,
        delete_listing,
        post_order,
        get_orders,
        post_contact,
        openapi_json
    ),
    components(
        schemas(pawmart_store::Listing),
        schemas(pawmart_store::ListingUpdate),
        schemas(pawmart_store::Category),
        schemas(pawmart_store::Order),
        schemas(CategoriesResponse),
        schemas(ListingResponse),
        schemas(ListingsPageResponse),
        schemas(OrdersResponse),
        schemas(MessageResponse),
        schemas(InsertReceipt),
        schemas(DeleteReceipt)
    ),
    tags(
        (name = "pawmart", description = "PawMart marketplace API")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = String),
    )
)]
pub async fn get_root() -> &'static str {
    "Server running..."
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = CategoriesResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    )
)]
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state.store.categories().await?;
    debug!("Fetched {} categories", categories.len());
    Ok(Json(CategoriesResponse::new(categories)))
}

#[utoipa::path(
    get,
    path = "/listings",
    responses(
        (status = 200, description = "A page of listings", body = ListingsPageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    params(
        ("page" = Option<String>, Query, description = "Page number, 1-based (default 1)"),
        ("limit" = Option<String>, Query, description = "Page size (default 12)"),
        ("category" = Option<String>, Query, description = "Category filter; \"All\" disables it"),
        ("search" = Option<String>, Query, description = "Substring match on the listing name"),
        ("sort" = Option<String>, Query, description = "price_asc, price_desc, or omitted for newest first")
    )
)]
pub async fn get_listings(
    Query(params): Query<ListingParams>,
    State(state): State<AppState>,
) -> Result<Json<ListingsPageResponse>, ApiError> {
    let query = ListingQuery::from_raw(
        params.page.as_deref(),
        params.limit.as_deref(),
        params.category.as_deref(),
        params.search.as_deref(),
        params.sort.as_deref(),
    );

    let page = state.store.find_listings(&query).await?;
    info!(
        "Listing query returned {}/{} records (page {} of {})",
        page.data.len(),
        page.total,
        page.page,
        page.total_pages
    );
    Ok(Json(ListingsPageResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/listings/{id}",
    responses(
        (status = 200, description = "The listing", body = ListingResponse),
        (status = 404, description = "No such listing", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    params(("id" = String, Path, description = "Listing id"))
)]
pub async fn get_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = state.store.get_listing(&id).await?;
    Ok(Json(ListingResponse::new(listing)))
}

#[utoipa::path(
    post,
    path = "/listing",
    responses(
        (status = 200, description = "Insert acknowledgement", body = InsertReceipt),
        (status = 500, description = "Storage failure", body = MessageResponse),
    )
)]
pub async fn post_listing(
    State(state): State<AppState>,
    Json(listing): Json<Document>,
) -> Result<Json<InsertReceipt>, ApiError> {
    let inserted_id = state.store.insert_listing(listing).await?;
    info!("Inserted listing {}", inserted_id);
    Ok(Json(InsertReceipt::new(inserted_id)))
}

#[utoipa::path(
    patch,
    path = "/listings/{id}",
    responses(
        (status = 200, description = "Listing updated", body = MessageResponse),
        (status = 404, description = "No such listing", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    params(("id" = String, Path, description = "Listing id")),
    request_body = ListingUpdate
)]
pub async fn patch_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(update): Json<ListingUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.update_listing(&id, &update).await?;
    info!("Updated listing {}", id);
    Ok(Json(MessageResponse::ok("Listing updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}",
    responses(
        (status = 200, description = "Delete acknowledgement", body = DeleteReceipt),
        (status = 404, description = "No such listing", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    ),
    params(("id" = String, Path, description = "Listing id"))
)]
pub async fn delete_listing(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteReceipt>, ApiError> {
    let deleted_count = state.store.delete_listing(&id).await?;
    info!("Deleted listing {}", id);
    Ok(Json(DeleteReceipt::new(deleted_count)))
}

#[utoipa::path(
    post,
    path = "/order",
    responses(
        (status = 200, description = "Insert acknowledgement", body = InsertReceipt),
        (status = 500, description = "Storage failure", body = MessageResponse),
    )
)]
pub async fn post_order(
    State(state): State<AppState>,
    Json(order): Json<Document>,
) -> Result<Json<InsertReceipt>, ApiError> {
    let inserted_id = state.store.insert_order(order).await?;
    info!("Inserted order {}", inserted_id);
    Ok(Json(InsertReceipt::new(inserted_id)))
}

#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = OrdersResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    )
)]
pub async fn get_orders(State(state): State<AppState>) -> Result<Json<OrdersResponse>, ApiError> {
    let orders = state.store.orders().await?;
    debug!("Fetched {} orders", orders.len());
    Ok(Json(OrdersResponse::new(orders)))
}

#[utoipa::path(
    post,
    path = "/contact",
    responses(
        (status = 200, description = "Insert acknowledgement", body = InsertReceipt),
        (status = 429, description = "Too many messages in the window", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse),
    )
)]
pub async fn post_contact(
    State(state): State<AppState>,
    Json(message): Json<Document>,
) -> Result<Json<InsertReceipt>, ApiError> {
    let inserted_id = state.store.insert_contact(message).await?;
    info!("Inserted contact message {}", inserted_id);
    Ok(Json(InsertReceipt::new(inserted_id)))
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI specification", body = String),
    )
)]
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    debug!("GET /openapi.json called");
    Json(ApiDoc::openapi())
}

//! Wire envelopes: every JSON response carries `{success: boolean, ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::Bson;
use pawmart_store::{Category, Listing, ListingPage, Order, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    pub data: Vec<Category>,
}

impl CategoriesResponse {
    pub fn new(data: Vec<Category>) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub success: bool,
    pub data: Listing,
}

impl ListingResponse {
    pub fn new(data: Listing) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingsPageResponse {
    pub success: bool,
    pub data: Vec<Listing>,
    pub total: u64,
    pub page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl From<ListingPage> for ListingsPageResponse {
    fn from(page: ListingPage) -> Self {
        Self {
            success: true,
            data: page.data,
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersResponse {
    pub success: bool,
    pub data: Vec<Order>,
}

impl OrdersResponse {
    pub fn new(data: Vec<Order>) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

/// Raw insert acknowledgement, mirroring the driver's result shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct InsertReceipt {
    pub acknowledged: bool,
    #[serde(rename = "insertedId")]
    pub inserted_id: String,
}

impl InsertReceipt {
    pub fn new(inserted_id: Bson) -> Self {
        let inserted_id = match inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            other => other.to_string(),
        };
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Raw delete acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteReceipt {
    pub acknowledged: bool,
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

impl DeleteReceipt {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Handler-level failure. Everything maps onto the `{success: false,
/// message}` envelope; a missing record (or an id that can never name one)
/// gets 404, any storage failure gets 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Store(err) = &self;
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(MessageResponse::failure(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_page_response_uses_camel_case_total_pages() {
        let response = ListingsPageResponse::from(ListingPage {
            data: Vec::new(),
            total: 25,
            page: 2,
            total_pages: 3,
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], serde_json::json!(true));
        assert_eq!(value["totalPages"], serde_json::json!(3));
        assert!(value.get("total_pages").is_none());
    }

    #[test]
    fn test_insert_receipt_renders_hex_id() {
        let id = ObjectId::new();
        let receipt = InsertReceipt::new(Bson::ObjectId(id));
        let value = serde_json::to_value(&receipt).unwrap();

        assert_eq!(value["acknowledged"], serde_json::json!(true));
        assert_eq!(value["insertedId"], serde_json::json!(id.to_hex()));
    }

    #[test]
    fn test_delete_receipt_shape() {
        let value = serde_json::to_value(DeleteReceipt::new(1)).unwrap();
        assert_eq!(value["deletedCount"], serde_json::json!(1));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::from(StoreError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

use mongodb::bson::{Bson, Document, oid::ObjectId};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// An item offered for sale.
///
/// Every named field is optional on the wire; whatever else the caller sent
/// at insert time is kept verbatim in `extra` and round-trips untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_object_id"
    )]
    #[schema(value_type = Option<String>, example = "66b1d2f4a7c0e85f3d9b1a20")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Sortable creation timestamp, supplied by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub date: Option<Bson>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

/// Full-field replacement payload for a listing. All six mutable fields are
/// overwritten together; a field absent from the payload is written as null.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<String>)]
    pub date: Option<Bson>,
}

/// Read-only reference record; only ever enumerated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_object_id"
    )]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

/// A purchase request. The shape is supplied entirely by the caller; only the
/// generated id is split out so it renders as a hex string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_object_id"
    )]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Document,
}

/// Render a generated id as its 24-character hex form instead of the
/// extended-JSON `{"$oid": ...}` the driver would otherwise emit.
fn hex_object_id<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(id) => serializer.serialize_str(&id.to_hex()),
        None => serializer.serialize_none(),
    }
}
